use engine::{
    tile_centre_px, Agent, DirectionIntent, PathGraph, PixelPoint, TickInput, TileCoord, Weapon,
    World,
};
use tracing::{debug, info};

/// Pixels either side of a waypoint that count as lined up on that axis.
const AXIS_DEAD_ZONE: i32 = 4;
/// The rifle is only worth switching to with at least this much ammo.
const RIFLE_MIN_AMMO: u32 = 5;
/// Extra slack over the enemy attack range before swinging.
const MELEE_SLACK: i32 = 6;

/// Scripted player for the headless demo: walks its objectives over the path
/// graph and fights whatever has spotted it.
#[derive(Debug)]
pub(crate) struct Autopilot {
    objectives: Vec<TileCoord>,
    next: usize,
    graph: PathGraph,
    graph_generation: u64,
}

impl Autopilot {
    pub(crate) fn new(world: &World, objectives: Vec<TileCoord>) -> Self {
        Self {
            objectives,
            next: 0,
            graph: PathGraph::build(world.grid()),
            graph_generation: world.graph().generation(),
        }
    }

    pub(crate) fn objective(&self) -> Option<TileCoord> {
        self.objectives.get(self.next).copied()
    }

    pub(crate) fn is_done(&self) -> bool {
        self.next >= self.objectives.len()
    }

    pub(crate) fn input(&mut self, world: &World) -> TickInput {
        if world.graph().generation() != self.graph_generation {
            self.graph.rebuild(world.grid());
            self.graph_generation = world.graph().generation();
        }

        let player = world.player();
        let centre = player.body.exact_centre();
        let tile_size = world.config().tile_size;
        let current = world.grid().tile_of_pixel(centre.x, centre.y);
        while let Some(goal) = self.objective() {
            if current != Some(goal) {
                break;
            }
            info!(x = goal.x, y = goal.y, "autopilot_objective_reached");
            self.next += 1;
        }

        let waypoint = self.objective().map(|goal| {
            let goal_px = tile_centre_px(goal, tile_size);
            self.graph
                .solve_path(centre, goal_px)
                .and_then(|route| route.tiles().get(1).map(|&tile| route.tile_centre_px(tile)))
                .unwrap_or(goal_px)
        });
        let intent = waypoint.map_or_else(DirectionIntent::default, |point| {
            intent_towards(centre, point)
        });

        let threat = nearest_threat(world, centre);
        let aim_point = threat
            .map(|enemy| enemy.body.exact_centre())
            .or(waypoint)
            .unwrap_or(PixelPoint::new(centre.x + tile_size as i32, centre.y));

        let weapon = world.weapon();
        let ammo = player.vitals.ammo;
        let switch_weapon = !world.is_firing()
            && match weapon {
                Weapon::Pistol => ammo >= RIFLE_MIN_AMMO,
                Weapon::Rifle => ammo == 0,
            };
        if switch_weapon {
            debug!(from = ?weapon, ammo, "autopilot_weapon_switch");
        }

        let target_in_sights = world.in_sights().target.is_some();
        let close = threat.is_some_and(|enemy| {
            (enemy.body.exact_centre().distance_to(centre) as i32)
                < world.config().attack_range + MELEE_SLACK
        });
        TickInput {
            intent,
            running: false,
            aim_point,
            fire: target_in_sights && !close && !world.is_firing(),
            cease_fire: weapon == Weapon::Rifle && world.is_firing() && !target_in_sights,
            melee: close && !world.is_firing(),
            switch_weapon,
        }
    }
}

fn intent_towards(from: PixelPoint, to: PixelPoint) -> DirectionIntent {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    DirectionIntent {
        up: dy < -AXIS_DEAD_ZONE,
        down: dy > AXIS_DEAD_ZONE,
        left: dx < -AXIS_DEAD_ZONE,
        right: dx > AXIS_DEAD_ZONE,
    }
}

fn nearest_threat(world: &World, centre: PixelPoint) -> Option<&Agent> {
    world
        .agents()
        .iter()
        .filter(|agent| agent.kind().enemy().is_some() && agent.spotted && !agent.is_dead())
        .min_by_key(|agent| agent.body.exact_centre().distance_to(centre) as i32)
}

#[cfg(test)]
mod tests {
    use engine::SimConfig;

    use super::*;
    use crate::app::demo_level::{build_demo_level, load_sprite_store};

    #[test]
    fn intent_ignores_small_offsets() {
        let origin = PixelPoint::new(100, 100);
        assert!(intent_towards(origin, PixelPoint::new(103, 97)).is_idle());
        let intent = intent_towards(origin, PixelPoint::new(140, 60));
        assert!(intent.right && intent.up);
        assert!(!intent.left && !intent.down);
    }

    #[test]
    fn first_input_heads_for_the_door_key() {
        let store = load_sprite_store(None).expect("sprites");
        let level = build_demo_level(SimConfig::default(), &store).expect("level");
        let mut pilot = Autopilot::new(&level.world, level.objectives);
        assert_eq!(pilot.objective(), Some(TileCoord::new(3, 6)));

        let input = pilot.input(&level.world);
        assert!(!input.intent.is_idle());
        assert!(input.intent.down || input.intent.right);
        assert!(!input.fire && !input.melee && !input.switch_weapon);
    }

    #[test]
    fn reaching_an_objective_moves_to_the_next() {
        let store = load_sprite_store(None).expect("sprites");
        let level = build_demo_level(SimConfig::default(), &store).expect("level");
        let mut pilot = Autopilot::new(&level.world, vec![TileCoord::new(1, 1)]);
        assert!(!pilot.is_done());
        let input = pilot.input(&level.world);
        assert!(pilot.is_done());
        assert!(input.intent.is_idle());
    }
}
