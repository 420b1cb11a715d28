use std::path::Path;
use std::time::Duration;

use sim_core::{LevelSource, Simulation, StaticLevelSource};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::assets::{builtin_level, CsvLevelSource, JsonConfigSource};
use super::autopilot::Autopilot;
use super::loop_runner::{AppError, LoopConfig};
use super::paths::resolve_app_paths;

const RUN_SECONDS_ENV_VAR: &str = "TOPDOWN_RUN_SECONDS";
const QUIT_AFTER_WINS_ENV_VAR: &str = "TOPDOWN_QUIT_AFTER_WINS";
const DEFAULT_QUIT_AFTER_WINS: u32 = 3;
const HEADLESS_WINDOW_SIZE: (u32, u32) = (1280, 720);

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) simulation: Simulation,
    pub(crate) autopilot: Autopilot,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Top-Down Prototype Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        config = %paths.config_path.display(),
        levels = %paths.levels_dir.display(),
        "app_paths"
    );

    let config_source = JsonConfigSource::new(paths.config_path.clone());
    let level_source = build_level_source(&paths.levels_dir)?;
    let simulation = Simulation::new(Box::new(config_source), level_source)?;

    let config = LoopConfig {
        run_duration: parse_run_duration(std::env::var(RUN_SECONDS_ENV_VAR).ok().as_deref()),
        ..LoopConfig::default()
    };
    let quit_after_wins =
        parse_quit_after_wins(std::env::var(QUIT_AFTER_WINS_ENV_VAR).ok().as_deref());

    Ok(AppWiring {
        config,
        simulation,
        autopilot: Autopilot::new(HEADLESS_WINDOW_SIZE, quit_after_wins),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn build_level_source(levels_dir: &Path) -> Result<Box<dyn LevelSource>, AppError> {
    let discovered = CsvLevelSource::discover(levels_dir);
    if discovered.level_count() > 0 {
        info!(
            count = discovered.level_count(),
            dir = %levels_dir.display(),
            "levels_discovered"
        );
        return Ok(Box::new(discovered));
    }

    warn!(dir = %levels_dir.display(), "no_level_files_using_builtin");
    Ok(Box::new(StaticLevelSource::new(vec![builtin_level()?])))
}

/// Positive seconds; anything else means run until quit.
fn parse_run_duration(raw: Option<&str>) -> Option<Duration> {
    let raw = raw?.trim();
    match raw.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => {
            Some(Duration::from_secs_f64(seconds))
        }
        _ => {
            warn!(
                var = RUN_SECONDS_ENV_VAR,
                value = raw,
                "ignoring_invalid_run_seconds"
            );
            None
        }
    }
}

/// `0` disables the autopilot quit; unset uses the default.
fn parse_quit_after_wins(raw: Option<&str>) -> Option<u32> {
    let Some(raw) = raw else {
        return Some(DEFAULT_QUIT_AFTER_WINS);
    };
    match raw.trim().parse::<u32>() {
        Ok(0) => None,
        Ok(wins) => Some(wins),
        Err(_) => {
            warn!(
                var = QUIT_AFTER_WINS_ENV_VAR,
                value = raw,
                "ignoring_invalid_quit_after_wins"
            );
            Some(DEFAULT_QUIT_AFTER_WINS)
        }
    }
}
