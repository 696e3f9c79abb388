use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::body::Body;
use crate::geometry::{wrap_degrees, Direction, PixelPoint, TileCoord};
use crate::motion::{DirectionIntent, LinearMotion};
use crate::nav::{PathGraph, Route};
use crate::pixels::tile_collision;
use crate::sight::line_of_sight;
use crate::tiles::TileGrid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringTuning {
    pub coarse_sight_step: i32,
    pub cone_half_angle: f64,
    /// Goal counts as reached within `tile_size / goal_tolerance_divisor`.
    pub goal_tolerance_divisor: i32,
    /// Goals overshoot the waypoint by `tile_size / corner_buffer_divisor`.
    pub corner_buffer_divisor: i32,
}

impl Default for SteeringTuning {
    fn default() -> Self {
        Self {
            coarse_sight_step: 44,
            cone_half_angle: 75.0,
            goal_tolerance_divisor: 8,
            corner_buffer_divisor: 4,
        }
    }
}

pub struct SteeringContext<'a> {
    pub grid: &'a TileGrid,
    pub graph: &'a mut PathGraph,
    pub target: PixelPoint,
    pub tuning: &'a SteeringTuning,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SteeringState {
    #[default]
    DirectPursuit,
    Blocked,
    FollowingPath,
    BlockedWhilePathing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GoalProgress {
    Moved,
    /// Inside the tolerance, or no goal at all.
    Reached,
    Obstructed,
}

/// Chase behaviour: head straight for the target while it is in sight,
/// otherwise follow waypoints taken from the path graph.
#[derive(Debug, Clone, Default)]
pub struct SteeringController {
    state: SteeringState,
    local_goal: Option<PixelPoint>,
    goal_attempts: u64,
    graph_generation: u64,
}

impl SteeringController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SteeringState {
        self.state
    }

    pub fn local_goal(&self) -> Option<PixelPoint> {
        self.local_goal
    }

    /// Number of waypoint computations so far.
    pub fn goal_attempts(&self) -> u64 {
        self.goal_attempts
    }

    /// One tick of steering. Returns whether the body moved.
    pub fn steer(
        &mut self,
        body: &mut Body,
        motion: &mut LinearMotion,
        ctx: &mut SteeringContext<'_>,
    ) -> bool {
        if ctx.graph.generation() != self.graph_generation {
            self.graph_generation = ctx.graph.generation();
            if self.local_goal.take().is_some() {
                debug!(
                    generation = self.graph_generation,
                    "steering_goal_dropped_after_rebuild"
                );
            }
        }

        let before = self.state;
        let moved = match self.state {
            SteeringState::DirectPursuit => {
                let centre = body.exact_centre();
                let in_sight = line_of_sight(
                    ctx.grid,
                    centre,
                    ctx.target,
                    ctx.tuning.coarse_sight_step,
                );
                let delta = (ctx.target.x - centre.x, ctx.target.y - centre.y);
                if in_sight && move_directly(body, motion, ctx, delta) {
                    true
                } else {
                    self.state = SteeringState::Blocked;
                    false
                }
            }
            SteeringState::Blocked => {
                if !self.create_goal(body, ctx, false) {
                    false
                } else {
                    match self.move_towards_goal(body, motion, ctx) {
                        GoalProgress::Moved => {
                            self.state = SteeringState::FollowingPath;
                            true
                        }
                        // Already on the goal: following hands back to pursuit next tick.
                        GoalProgress::Reached => {
                            self.state = SteeringState::FollowingPath;
                            false
                        }
                        GoalProgress::Obstructed => false,
                    }
                }
            }
            SteeringState::FollowingPath => match self.move_towards_goal(body, motion, ctx) {
                GoalProgress::Moved => true,
                GoalProgress::Reached => {
                    self.state = SteeringState::DirectPursuit;
                    false
                }
                GoalProgress::Obstructed => {
                    self.state = SteeringState::BlockedWhilePathing;
                    false
                }
            },
            SteeringState::BlockedWhilePathing => {
                self.create_goal(body, ctx, true);
                self.state = SteeringState::FollowingPath;
                self.move_towards_goal(body, motion, ctx) == GoalProgress::Moved
            }
        };

        if before != self.state {
            trace!(from = ?before, to = ?self.state, moved, "steering_state_changed");
        }
        moved
    }

    /// Picks the next waypoint and turns it into a single-axis goal.
    /// Returns `false` (and clears the goal) when no route exists.
    fn create_goal(&mut self, body: &Body, ctx: &mut SteeringContext<'_>, avoid: bool) -> bool {
        self.goal_attempts += 1;
        let centre = body.exact_centre();
        let Some(route) = ctx.graph.solve_path(centre, ctx.target) else {
            debug!(
                x = centre.x,
                y = centre.y,
                expanded = ctx.graph.last_stats().expanded,
                "steering_no_path"
            );
            self.local_goal = None;
            return false;
        };
        let Some(node) =
            calculate_node_goal(&route, ctx.grid, ctx.target, ctx.tuning.coarse_sight_step)
        else {
            self.local_goal = None;
            return false;
        };

        let waypoint = route.tile_centre_px(node);
        let mut dx = waypoint.x - centre.x;
        let mut dy = waypoint.y - centre.y;
        let y_dominant = dx.abs() <= dy.abs();
        if y_dominant != avoid {
            dx = 0;
        } else {
            dy = 0;
        }

        let buffer = ctx.graph.tile_size() as i32 / ctx.tuning.corner_buffer_divisor.max(1);
        let buffer_x = if dx > 0 { buffer } else { -buffer };
        let buffer_y = if dy > 0 { buffer } else { -buffer };
        let goal = PixelPoint::new(
            if dx == 0 { centre.x } else { waypoint.x + buffer_x },
            if dy == 0 { centre.y } else { waypoint.y + buffer_y },
        );
        trace!(
            tile_x = node.x,
            tile_y = node.y,
            goal_x = goal.x,
            goal_y = goal.y,
            avoid,
            "steering_goal_created"
        );
        self.local_goal = Some(goal);
        true
    }

    fn move_towards_goal(
        &mut self,
        body: &mut Body,
        motion: &mut LinearMotion,
        ctx: &SteeringContext<'_>,
    ) -> GoalProgress {
        let Some(goal) = self.local_goal else {
            return GoalProgress::Reached;
        };
        let centre = body.exact_centre();
        let mut dx = goal.x - centre.x;
        let mut dy = goal.y - centre.y;
        let tolerance = ctx.graph.tile_size() as i32 / ctx.tuning.goal_tolerance_divisor.max(1);
        if dx.abs() <= tolerance && dy.abs() <= tolerance {
            return GoalProgress::Reached;
        }
        if dx.abs() <= dy.abs() {
            dx = 0;
        } else {
            dy = 0;
        }
        if move_directly(body, motion, ctx, (dx, dy)) {
            GoalProgress::Moved
        } else {
            GoalProgress::Obstructed
        }
    }
}

/// Walks the route from the agent toward the target and stops at the first
/// turn, or earlier at a node from which the target is already in sight.
pub fn calculate_node_goal(
    route: &Route,
    grid: &TileGrid,
    target: PixelPoint,
    sight_step: i32,
) -> Option<TileCoord> {
    let mut tiles = route.iter();
    let mut current = tiles.next()?;
    let mut bearing: Option<Direction> = None;
    for next in tiles {
        let step = Direction::between(current, next);
        if bearing.is_some() && bearing != step {
            return Some(current);
        }
        bearing = step;
        current = next;
        if line_of_sight(grid, route.tile_centre_px(current), target, sight_step) {
            return Some(current);
        }
    }
    Some(current)
}

/// Cone-based step toward `delta`; on success the body turns to face the
/// travel direction unless that pose would overlap drawn terrain.
fn move_directly(
    body: &mut Body,
    motion: &mut LinearMotion,
    ctx: &SteeringContext<'_>,
    (dx, dy): (i32, i32),
) -> bool {
    let angle = f64::from(dy).atan2(f64::from(dx));
    let degrees = wrap_degrees(angle.to_degrees());
    motion.set_intent(DirectionIntent::from_cone(
        degrees,
        ctx.tuning.cone_half_angle,
    ));
    if !motion.update(body, ctx.grid, false) {
        return false;
    }
    let previous = body.rotation();
    body.face_angle(angle);
    if tile_collision(body, ctx.grid, 0, 0, true) {
        body.set_rotation(previous);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::EnemyKind;
    use crate::motion::MotionTuning;
    use crate::nav::tile_centre_px;
    use crate::test_support::{grid_from_rows, square_body};

    const TILE: u32 = 64;

    fn centre(x: u32, y: u32) -> PixelPoint {
        tile_centre_px(TileCoord::new(x, y), TILE)
    }

    fn zombie_motion() -> LinearMotion {
        LinearMotion::new(EnemyKind::Zombie.default_policy(), MotionTuning::default())
    }

    struct Chase {
        grid: TileGrid,
        graph: PathGraph,
        tuning: SteeringTuning,
        body: Body,
        motion: LinearMotion,
        controller: SteeringController,
        target: PixelPoint,
    }

    impl Chase {
        fn new(rows: &[&str], agent: PixelPoint, target: PixelPoint) -> Self {
            let grid = grid_from_rows(TILE, rows);
            let graph = PathGraph::build(&grid);
            Self {
                grid,
                graph,
                tuning: SteeringTuning::default(),
                body: square_body(agent, 20),
                motion: zombie_motion(),
                controller: SteeringController::new(),
                target,
            }
        }

        fn tick(&mut self) -> bool {
            let mut ctx = SteeringContext {
                grid: &self.grid,
                graph: &mut self.graph,
                target: self.target,
                tuning: &self.tuning,
            };
            self.controller
                .steer(&mut self.body, &mut self.motion, &mut ctx)
        }
    }

    const WALLED: [&str; 4] = ["..#...", "..#...", "..#...", "......"];
    const SEALED: [&str; 4] = ["..#...", "..#...", "..#...", "..#..."];

    #[test]
    fn direct_pursuit_moves_straight_at_visible_target() {
        let mut chase = Chase::new(&["......"; 3], centre(0, 1), centre(5, 1));
        let start = chase.body.position();
        assert!(chase.tick());
        assert!(chase.tick());
        assert_eq!(chase.controller.state(), SteeringState::DirectPursuit);
        assert!(chase.body.position().x > start.x);
        assert_eq!(chase.body.position().y, start.y);
        assert_eq!(chase.controller.goal_attempts(), 0);
    }

    #[test]
    fn losing_sight_blocks_on_the_same_tick() {
        let mut chase = Chase::new(&WALLED, centre(0, 1), centre(4, 1));
        let start = chase.body.position();
        assert!(!chase.tick());
        assert_eq!(chase.controller.state(), SteeringState::Blocked);
        assert_eq!(chase.body.position(), start);
        assert_eq!(chase.controller.goal_attempts(), 0);
    }

    #[test]
    fn blocked_computes_goal_and_starts_following() {
        let mut chase = Chase::new(&WALLED, centre(0, 1), centre(4, 1));
        chase.tick();
        assert!(chase.tick());
        assert_eq!(chase.controller.goal_attempts(), 1);
        assert_eq!(chase.controller.state(), SteeringState::FollowingPath);
        assert!(chase.controller.local_goal().is_some());

        for _ in 0..5 {
            chase.tick();
        }
        assert_eq!(chase.controller.goal_attempts(), 1);
    }

    #[test]
    fn blocked_without_route_retries_every_tick() {
        let mut chase = Chase::new(&SEALED, centre(0, 1), centre(4, 1));
        let start = chase.body.position();
        chase.tick();
        assert!(!chase.tick());
        assert_eq!(chase.controller.state(), SteeringState::Blocked);
        assert_eq!(chase.controller.local_goal(), None);
        assert!(!chase.tick());
        assert_eq!(chase.controller.goal_attempts(), 2);
        assert_eq!(chase.body.position(), start);
    }

    #[test]
    fn close_target_with_wall_behind_is_pursued_directly() {
        let mut chase = Chase::new(
            &["...", "..#", "..."],
            centre(1, 1),
            PixelPoint::new(126, 116),
        );
        let start = chase.body.position();
        let mut moved = 0;
        for _ in 0..6 {
            if chase.tick() {
                moved += 1;
            }
            assert_eq!(chase.controller.state(), SteeringState::DirectPursuit);
        }
        assert!(moved > 0);
        assert_ne!(chase.body.position(), start);
    }

    #[test]
    fn blocked_on_its_goal_follows_then_resumes_pursuit() {
        let mut chase = Chase::new(&["....", "...."], centre(1, 1), centre(1, 1));
        chase.target = PixelPoint::new(chase.target.x + 10, chase.target.y);
        chase.controller.state = SteeringState::Blocked;

        assert!(!chase.tick());
        assert_eq!(chase.controller.goal_attempts(), 1);
        assert_eq!(chase.controller.state(), SteeringState::FollowingPath);

        assert!(!chase.tick());
        assert_eq!(chase.controller.state(), SteeringState::DirectPursuit);

        let start = chase.body.position();
        assert!(chase.tick());
        assert!(chase.body.position().x > start.x);
    }

    #[test]
    fn following_path_eventually_rounds_the_wall() {
        let mut chase = Chase::new(&WALLED, centre(0, 1), centre(4, 1));
        let mut reached_far_side = false;
        for _ in 0..600 {
            chase.tick();
            if chase.body.exact_centre().x > 3 * TILE as i32 {
                reached_far_side = true;
                break;
            }
        }
        assert!(reached_far_side, "stuck at {:?}", chase.body.exact_centre());
    }

    #[test]
    fn graph_rebuild_drops_local_goal() {
        let mut chase = Chase::new(&WALLED, centre(0, 1), centre(4, 1));
        chase.tick();
        chase.tick();
        assert_eq!(chase.controller.state(), SteeringState::FollowingPath);
        chase.graph.rebuild(&chase.grid);
        chase.tick();
        assert_eq!(chase.controller.local_goal(), None);
        assert_eq!(chase.controller.state(), SteeringState::DirectPursuit);
    }

    #[test]
    fn node_goal_stops_at_first_turn() {
        let grid = grid_from_rows(
            TILE,
            &["#######", "#...###", "###.###", "###...#", "#######"],
        );
        let mut graph = PathGraph::build(&grid);
        let target = centre(5, 3);
        let route = graph.solve_path(centre(1, 1), target).expect("route");
        let goal = calculate_node_goal(&route, &grid, target, 44);
        assert_eq!(goal, Some(TileCoord::new(3, 1)));
    }

    #[test]
    fn node_goal_stops_early_once_target_is_visible() {
        let grid = grid_from_rows(TILE, &["###...", "......"]);
        let mut graph = PathGraph::build(&grid);
        let target = centre(5, 0);
        let route = graph.solve_path(centre(0, 1), target).expect("route");
        let goal = calculate_node_goal(&route, &grid, target, 44);
        assert_eq!(goal, Some(TileCoord::new(1, 1)));
    }
}
