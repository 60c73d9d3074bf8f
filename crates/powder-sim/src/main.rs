//! Headless powder simulation driver.

mod framebuffer;
mod telemetry;

use anyhow::{ensure, Context, Result};
use framebuffer::FrameBuffer;
use powder_behaviours::{builtin_catalog, register_builtins, LIFE_TYPE};
use powder_core::{SeedConfig, SimConfig, TickConfig, TypeCatalog, SWEEP_MARGIN};
use powder_runtime::BehaviourRegistry;
use powder_world::Simulation;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::signal;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

const CONFIG_ENV: &str = "POWDER_SIM_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).or_else(|| std::env::var(CONFIG_ENV).ok());
    let config = match &config_path {
        Some(path) => SimConfig::from_file(path).with_context(|| format!("loading config {path}"))?,
        None => SimConfig::default(),
    };

    telemetry::init_telemetry(&config.logging)?;

    info!("Starting powder simulation");
    info!(
        config = config_path.as_deref().unwrap_or("<defaults>"),
        width = config.grid.width,
        height = config.grid.height,
        tick_rate_hz = config.tick.tick_rate_hz,
        "Configuration loaded"
    );

    let catalog = match &config.type_dir {
        Some(dir) => TypeCatalog::load_dir(dir).with_context(|| format!("loading types from {dir}"))?,
        None => builtin_catalog(),
    };

    let mut behaviours = BehaviourRegistry::new();
    register_builtins(&mut behaviours)?;

    let mut sim = Simulation::new(&config.grid, &catalog, behaviours)?;
    if catalog.contains(LIFE_TYPE) {
        let seeded = seed_life(&mut sim, &config.seed)?;
        info!(seeded, seed = config.seed.seed, "Seeded life cells");
    } else {
        info!("No life type loaded, starting with an empty grid");
    }

    let mut frame = FrameBuffer::new(config.grid.size(), config.grid.background);
    run(&mut sim, &mut frame, &config.tick).await;

    info!(
        ticks = sim.tick_count(),
        powders = sim.registry().powder_count(),
        checksum = frame.checksum(),
        "Shutting down powder simulation"
    );
    Ok(())
}

/// Scatter life cells over the grid interior. The same seed always yields the
/// same layout.
fn seed_life(sim: &mut Simulation, config: &SeedConfig) -> Result<usize> {
    let density = f64::from(config.life_density);
    ensure!(
        (0.0..=1.0).contains(&density),
        "life_density must be within 0..=1, got {density}"
    );

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let registry = sim.registry_mut();
    let mut seeded = 0;

    for pos in registry.grid_size().interior(SWEEP_MARGIN) {
        if rng.gen_bool(density) && registry.create_powder(LIFE_TYPE, pos).is_some() {
            seeded += 1;
        }
    }
    Ok(seeded)
}

/// Drive the simulation at the configured rate until the tick limit or a
/// shutdown signal.
async fn run(sim: &mut Simulation, frame: &mut FrameBuffer, config: &TickConfig) {
    let period = Duration::from_secs_f64(1.0 / f64::from(config.tick_rate_hz.max(1)));
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        if config.max_ticks.is_some_and(|max| sim.tick_count() >= max) {
            info!(ticks = sim.tick_count(), "Tick limit reached");
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                let report = sim.tick(frame);
                if config.log_interval_ticks > 0 && sim.tick_count() % config.log_interval_ticks == 0 {
                    let registry = sim.registry();
                    info!(
                        tick = report.tick,
                        powders = registry.powder_count(),
                        active = registry.active_count(),
                        sleeping = registry.sleeping_count(),
                        evaluated = report.evaluated,
                        dirty = report.dirty,
                        checksum = frame.checksum(),
                        "Simulation status"
                    );
                }
            }
            _ = &mut shutdown => break,
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use powder_core::GridConfig;

    fn life_simulation() -> Simulation {
        let mut behaviours = BehaviourRegistry::new();
        register_builtins(&mut behaviours).unwrap();
        let grid = GridConfig {
            width: 24,
            height: 16,
            ..GridConfig::default()
        };
        Simulation::new(&grid, &builtin_catalog(), behaviours).unwrap()
    }

    #[test]
    fn test_seed_is_deterministic() {
        let config = SeedConfig {
            seed: 7,
            life_density: 0.3,
        };

        let mut a = life_simulation();
        let mut b = life_simulation();
        let seeded = seed_life(&mut a, &config).unwrap();
        seed_life(&mut b, &config).unwrap();

        assert!(seeded > 0);
        assert_eq!(a.registry().powders().len(), seeded);
        let positions = |sim: &Simulation| {
            sim.registry().powders().into_iter().map(|(pos, _)| pos).collect::<Vec<_>>()
        };
        assert_eq!(positions(&a), positions(&b));

        let size = a.registry().grid_size();
        assert!(positions(&a).iter().all(|p| size.contains_interior(*p, SWEEP_MARGIN)));
    }

    #[test]
    fn test_seed_rejects_bad_density() {
        let mut sim = life_simulation();
        let config = SeedConfig {
            seed: 1,
            life_density: 1.5,
        };
        assert!(seed_life(&mut sim, &config).is_err());
        assert_eq!(sim.registry().powder_count(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_at_tick_limit() {
        let mut sim = life_simulation();
        let mut frame = FrameBuffer::new(sim.registry().grid_size(), GridConfig::default().background);
        sim.registry_mut()
            .create_powder(LIFE_TYPE, powder_core::GridPos::new(5, 5))
            .unwrap();

        let config = TickConfig {
            tick_rate_hz: 1000,
            max_ticks: Some(3),
            log_interval_ticks: 1,
        };
        run(&mut sim, &mut frame, &config).await;

        assert_eq!(sim.tick_count(), 3);
        // The lone cell was painted and then cleared.
        assert_eq!(frame.pixel(powder_core::GridPos::new(5, 5)), Some(GridConfig::default().background));
        assert_eq!(sim.registry().powder_count(), 0);
    }
}
