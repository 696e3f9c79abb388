use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, trace};

use crate::agent::{
    Agent, AgentId, AgentKind, AgentSprites, EnemyKind, HitOutcome, PickupKind, Vitals, Weapon,
};
use crate::body::{Body, Viewport};
use crate::config::{SimConfig, SimConfigError};
use crate::geometry::PixelPoint;
use crate::motion::{DirectionIntent, LinearMotion, SteeringPolicy};
use crate::nav::PathGraph;
use crate::pixels::{bodies_touch, objects_collide, tile_collision, MaskHandle, SpriteFrames};
use crate::sight::{aim, line_of_sight, trace_sight, InSights, SightCandidate, SightRay};
use crate::steering::SteeringContext;
use crate::tiles::{KeyRing, TileGrid};

include!("types.rs");
include!("systems.rs");

const PLAYER_ID: AgentId = AgentId::new(0);

/// Everything one level needs per tick: terrain, search graph, keys, and the
/// agents moving over them.
#[derive(Debug)]
pub struct World {
    config: SimConfig,
    grid: TileGrid,
    graph: PathGraph,
    keys: KeyRing,
    player: Agent,
    player_sprites: PlayerSprites,
    player_state: PlayerState,
    agents: Vec<Agent>,
    pickup_sprites: HashMap<PickupKind, SpriteFrames>,
    next_agent_id: u32,
    in_sights: InSights,
    sight_line: Option<(PixelPoint, PixelPoint)>,
    viewport: Viewport,
    last_tick_ms: u64,
    ticks: u64,
    last_tick_order: Vec<WorldSystemId>,
}

impl World {
    pub fn new(
        config: SimConfig,
        grid: TileGrid,
        keys: KeyRing,
        player_body: Body,
        player_sprites: PlayerSprites,
        player_vitals: Vitals,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        if grid.tile_size() != config.tile_size {
            return Err(WorldError::TileSizeMismatch {
                grid: grid.tile_size(),
                config: config.tile_size,
            });
        }

        let graph = PathGraph::build(&grid);
        let motion = LinearMotion::new(config.player_policy, config.motion);
        let sprites = AgentSprites {
            walk: player_sprites.pistol_walk.clone(),
            attack: player_sprites.melee.clone(),
            death: player_sprites.pistol_walk.clone(),
        };
        let player = Agent::new(
            PLAYER_ID,
            AgentKind::Player,
            player_body,
            player_vitals,
            motion,
            sprites,
        );
        let viewport = config.viewport.centred_on(player.body.exact_centre());
        info!(
            width = grid.width(),
            height = grid.height(),
            tile_size = grid.tile_size(),
            main_keys = keys.main_keys_total(),
            "world_created"
        );

        Ok(Self {
            config,
            grid,
            graph,
            keys,
            player,
            player_sprites,
            player_state: PlayerState::default(),
            agents: Vec::new(),
            pickup_sprites: HashMap::new(),
            next_agent_id: PLAYER_ID.get() + 1,
            in_sights: InSights::default(),
            sight_line: None,
            viewport,
            last_tick_ms: 0,
            ticks: 0,
            last_tick_order: Vec::new(),
        })
    }

    pub fn spawn_enemy(&mut self, kind: EnemyKind, body: Body, sprites: AgentSprites) -> AgentId {
        let id = self.alloc_agent_id();
        let motion = LinearMotion::new(self.config.enemy_policies.for_kind(kind), self.config.motion);
        let centre = body.exact_centre();
        self.agents.push(Agent::new(
            id,
            AgentKind::Enemy(kind),
            body,
            kind.starting_vitals(),
            motion,
            sprites,
        ));
        debug!(agent = id.get(), kind = ?kind, x = centre.x, y = centre.y, "enemy_spawned");
        id
    }

    pub fn spawn_pickup(&mut self, kind: PickupKind, body: Body) -> AgentId {
        let id = self.alloc_agent_id();
        let sprites = AgentSprites::still(body.current_mask().frames().clone());
        let motion = LinearMotion::new(SteeringPolicy::new(0.0, 0.0), self.config.motion);
        self.agents.push(Agent::new(
            id,
            AgentKind::Pickup(kind),
            body,
            Vitals::default(),
            motion,
            sprites,
        ));
        debug!(agent = id.get(), kind = ?kind, "pickup_spawned");
        id
    }

    /// Frames used for pickups dropped at runtime.
    pub fn register_pickup_sprites(&mut self, kind: PickupKind, frames: SpriteFrames) {
        self.pickup_sprites.insert(kind, frames);
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn graph(&self) -> &PathGraph {
        &self.graph
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    pub fn player(&self) -> &Agent {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Agent {
        &mut self.player
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id() == id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|agent| agent.id() == id)
    }

    pub fn in_sights(&self) -> InSights {
        self.in_sights
    }

    /// Muzzle and end point of the last aim trace, for drawing a laser line.
    pub fn sight_line(&self) -> Option<(PixelPoint, PixelPoint)> {
        self.sight_line
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn weapon(&self) -> Weapon {
        self.player_state.weapon
    }

    pub fn is_firing(&self) -> bool {
        self.player_state.firing
    }

    pub fn is_game_over(&self) -> bool {
        self.player.is_dead()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_tick_order(&self) -> &[WorldSystemId] {
        &self.last_tick_order
    }

    /// Runs every system once if at least `tick_interval_ms` has passed
    /// since the last tick.
    pub fn tick(&mut self, now_ms: u64, input: &TickInput) -> TickReport {
        let mut report = TickReport::default();
        if now_ms.saturating_sub(self.last_tick_ms) < self.config.tick_interval_ms {
            return report;
        }
        self.last_tick_ms = now_ms;
        if self.player.is_dead() {
            report.player_dead = true;
            return report;
        }

        report.ticked = true;
        self.ticks += 1;
        self.last_tick_order.clear();
        for system_id in WORLD_SYSTEM_ORDER {
            self.last_tick_order.push(system_id);
            self.run_system(system_id, now_ms, input, &mut report);
        }

        report.in_sights = self.in_sights;
        report.player_dead = self.player.is_dead();
        trace!(
            tick = self.ticks,
            now_ms,
            player_moved = report.player_moved,
            enemies_moved = report.enemies_moved,
            "world_ticked"
        );
        report
    }

    fn alloc_agent_id(&mut self) -> AgentId {
        let id = AgentId::new(self.next_agent_id);
        self.next_agent_id = self.next_agent_id.saturating_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
