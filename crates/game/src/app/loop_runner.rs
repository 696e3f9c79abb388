use std::process::ExitCode;

use engine::{resolve_app_paths, AssetError, StartupError, TickReport, World};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::autopilot::Autopilot;
use super::bootstrap::AppWiring;
use super::config::{load_sim_config, ConfigError};
use super::demo_level::{build_demo_level, load_sprite_store, DemoError};

#[derive(Debug, Error)]
pub(crate) enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Assets(#[from] AssetError),
    #[error(transparent)]
    Level(#[from] DemoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DemoOutcome {
    LevelProgressed,
    PlayerDied,
    OutOfTicks,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_demo(&app) {
        Ok(outcome) => {
            info!(outcome = ?outcome, "demo_finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}

fn run_demo(app: &AppWiring) -> Result<DemoOutcome, RunError> {
    let config = load_sim_config(app.config_path.as_deref())?;
    let sprites_dir = match resolve_app_paths() {
        Ok(paths) => Some(paths.sprites_dir),
        Err(err @ StartupError::InvalidEnvRoot { .. }) => {
            warn!(error = %err, "asset_root_ignored");
            None
        }
        Err(err) => {
            debug!(error = %err, "asset_root_not_found");
            None
        }
    };
    let store = load_sprite_store(sprites_dir.as_deref())?;
    let level = build_demo_level(config, &store)?;
    let mut world = level.world;
    let mut pilot = Autopilot::new(&world, level.objectives);
    Ok(drive(&mut world, &mut pilot, app.ticks))
}

/// Steps the world on a fixed clock until the level is left, the player dies,
/// or `ticks` world ticks have run.
pub(crate) fn drive(world: &mut World, pilot: &mut Autopilot, ticks: u64) -> DemoOutcome {
    let interval = world.config().tick_interval_ms;
    for step in 1..=ticks {
        let now_ms = step * interval;
        let input = pilot.input(world);
        let report = world.tick(now_ms, &input);
        log_report(step, &report);
        if report.player_dead {
            return DemoOutcome::PlayerDied;
        }
        if report.level_progressed {
            return DemoOutcome::LevelProgressed;
        }
    }
    let player = world.player();
    info!(
        ticks = world.ticks(),
        health = player.vitals.health,
        armour = player.vitals.armour,
        ammo = player.vitals.ammo,
        agents = world.agents().len(),
        main_keys = world.keys().main_keys_activated(),
        objective = ?pilot.objective(),
        "demo_out_of_ticks"
    );
    DemoOutcome::OutOfTicks
}

fn log_report(step: u64, report: &TickReport) {
    if !report.ticked {
        return;
    }
    if report.keys_triggered > 0 || report.graph_rebuilt {
        info!(
            step,
            keys = report.keys_triggered,
            graph_rebuilt = report.graph_rebuilt,
            level_completed = report.level_completed,
            "keys_triggered"
        );
    }
    if !report.shots.is_empty() || !report.player_hits.is_empty() {
        debug!(
            step,
            shots = report.shots.len(),
            kills = report.shots.iter().filter(|shot| shot.outcome.killed).count(),
            player_hits = report.player_hits.len(),
            "combat"
        );
    }
}
