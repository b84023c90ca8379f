use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{Level, info};

use townmud::config::{self, Config};
use townmud::dice::Rng64;
use townmud::game_loop;
use townmud::seed::WorldSeed;
use townmud::session::{self, SessionOptions};
use townmud::world::{World, WorldOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,townmud=info".into()),
        )
        .with_target(false)
        .with_max_level(Level::INFO)
        .init();

    let cfg = config::parse_args();
    let world = Arc::new(load_world(&cfg)?);

    let listener = TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("bind {}", cfg.bind))?;
    info!(
        bind = %cfg.bind,
        rooms = world.room_count(),
        items = world.catalog().len(),
        tick_ms = cfg.tick.as_millis() as u64,
        respawn_pct = world.respawn_pct(),
        "townmud listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    spawn_operator_console(shutdown_tx)?;

    let ticker = tokio::spawn(game_loop::run(
        world.clone(),
        cfg.tick,
        shutdown_rx.clone(),
    ));

    session::serve(
        listener,
        world,
        SessionOptions {
            max_line_len: cfg.max_line_len,
        },
        shutdown_rx,
    )
    .await?;
    let _ = ticker.await;
    info!("shutdown complete");
    Ok(())
}

fn load_world(cfg: &Config) -> anyhow::Result<World> {
    let seed = match &cfg.world_file {
        Some(path) => WorldSeed::load(path)?,
        None => WorldSeed::embedded()?,
    };
    let rng_seed = cfg.rng_seed.unwrap_or_else(|| Rng64::from_clock().next_u64());
    Ok(World::new(
        seed,
        WorldOptions {
            rng_seed,
            respawn_pct: cfg.respawn_pct,
        },
    ))
}

/// `q` on stdin or Ctrl-C stops the server. Stdin is read on a plain thread so a pending read
/// never holds up runtime shutdown.
fn spawn_operator_console(shutdown_tx: watch::Sender<bool>) -> anyhow::Result<()> {
    let shutdown_tx = Arc::new(shutdown_tx);

    let tx = shutdown_tx.clone();
    std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                let Ok(line) = line else {
                    break;
                };
                if line.trim().eq_ignore_ascii_case("q") {
                    info!("operator requested shutdown");
                    let _ = tx.send(true);
                    break;
                }
            }
        })
        .context("spawn console thread")?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            let _ = shutdown_tx.send(true);
        }
    });
    Ok(())
}
