use std::thread;
use std::time::{Duration, Instant};

use sim_core::{LevelLoadError, RenderSnapshot, Simulation, SimulationError, TickCommand};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::autopilot::Autopilot;
use super::bootstrap::AppWiring;
use super::metrics::MetricsAccumulator;
use super::paths::StartupError;

#[derive(Debug, Clone)]
pub(crate) struct LoopConfig {
    pub(crate) target_tps: u32,
    pub(crate) max_frame_delta: Duration,
    pub(crate) max_ticks_per_frame: u32,
    pub(crate) metrics_log_interval: Duration,
    /// Frame pacing for the headless driver; `None` spins as fast as possible.
    pub(crate) max_frame_rate: Option<u32>,
    /// Wall-clock limit; `None` runs until the session quits.
    pub(crate) run_duration: Option<Duration>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_frame_rate: Some(60),
            run_duration: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("builtin level is invalid: {0}")]
    BuiltinLevel(#[from] LevelLoadError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopReason {
    Quit,
    TimeLimit,
}

pub(crate) fn run(app: AppWiring) -> std::process::ExitCode {
    let AppWiring {
        config,
        mut simulation,
        mut autopilot,
    } = app;
    let reason = run_headless(&config, &mut simulation, &mut autopilot);
    info!(
        reason = ?reason,
        ticks = simulation.tick_count(),
        wins = autopilot.wins(),
        level = simulation.level_index(),
        "shutdown"
    );
    std::process::ExitCode::SUCCESS
}

fn run_headless(
    config: &LoopConfig,
    simulation: &mut Simulation,
    autopilot: &mut Autopilot,
) -> StopReason {
    let fixed_dt = normalize_non_zero_duration(
        Duration::from_secs_f64(1.0 / f64::from(config.target_tps.max(1))),
        Duration::from_secs_f64(1.0 / 60.0),
    );
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let frame_target = target_frame_duration(normalize_frame_rate_cap(config.max_frame_rate));

    info!(
        target_tps = config.target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        run_seconds = config.run_duration.map(|limit| limit.as_secs_f32()),
        "loop_config"
    );

    let started = Instant::now();
    let mut metrics = MetricsAccumulator::new(config.metrics_log_interval);
    let mut last_frame = started;
    let mut accumulator = Duration::ZERO;

    loop {
        let frame_start = Instant::now();
        let frame_dt = clamp_frame_delta(
            frame_start.saturating_duration_since(last_frame),
            max_frame_delta,
        );
        last_frame = frame_start;

        let plan = plan_sim_steps(
            accumulator.saturating_add(frame_dt),
            fixed_dt,
            max_ticks_per_frame,
        );
        accumulator = plan.remaining_accumulator;
        if !plan.dropped_backlog.is_zero() {
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame,
                "sim_clamp_triggered"
            );
            metrics.record_dropped_backlog(plan.dropped_backlog);
        }

        let mut quit = false;
        for _ in 0..plan.ticks_to_run {
            let input = autopilot.next_input(simulation);
            let command = simulation.tick(fixed_dt_seconds, &input);
            metrics.record_tick();
            for event in simulation.events() {
                debug!(tick = simulation.tick_count(), event = ?event, "sim_event");
            }
            if command == TickCommand::Quit {
                quit = true;
                break;
            }
        }
        metrics.record_frame(frame_dt);

        let alpha = accumulator.as_secs_f32() / fixed_dt_seconds;
        let snapshot = simulation.render_snapshot(alpha);
        if let Some(loop_metrics) = metrics.maybe_snapshot(Instant::now()) {
            info!(
                fps = loop_metrics.fps,
                tps = loop_metrics.tps,
                frame_time_ms = loop_metrics.frame_time_ms,
                dropped_backlog_ms = loop_metrics.dropped_backlog_ms,
                entity_count = snapshot.entities.len(),
                "loop_metrics"
            );
            log_session_status(&snapshot);
        }

        if quit {
            return StopReason::Quit;
        }
        if config
            .run_duration
            .is_some_and(|limit| started.elapsed() >= limit)
        {
            return StopReason::TimeLimit;
        }

        let sleep = compute_cap_sleep(frame_start.elapsed(), frame_target);
        if !sleep.is_zero() {
            thread::sleep(sleep);
        }
    }
}

/// Periodic status line in place of a renderer.
fn log_session_status(snapshot: &RenderSnapshot) {
    let active = snapshot
        .entities
        .iter()
        .filter(|entity| entity.active)
        .count();
    info!(
        flow = ?snapshot.flow,
        level = snapshot.hud.level_index,
        health = snapshot.hud.health,
        max_health = snapshot.hud.max_health,
        tokens = snapshot.hud.tokens_collected,
        tokens_total = snapshot.hud.tokens_total,
        active_entities = active,
        camera_x = snapshot.camera_position.x,
        camera_y = snapshot.camera_position.y,
        "session_status"
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };

    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_frame_rate_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_frame_rate: Option<u32>) -> Option<Duration> {
    max_frame_rate.map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}
