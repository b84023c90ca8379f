use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_BIND: &str = "0.0.0.0:4000";
pub const DEFAULT_TICK_MS: u64 = 5000;
pub const MIN_TICK_MS: u64 = 10;
pub const DEFAULT_RESPAWN_PCT: u32 = 5;

#[derive(Clone, Debug)]
pub struct Config {
    pub bind: SocketAddr,
    pub tick: Duration,
    pub respawn_pct: u32,
    /// `None` seeds the RNG from the clock.
    pub rng_seed: Option<u64>,
    /// `None` uses the built-in town.
    pub world_file: Option<PathBuf>,
    pub max_line_len: usize,
}

pub fn usage_and_exit() -> ! {
    eprintln!(
        "townmud (line-oriented MUD server)\n\n\
USAGE:\n  townmud [--bind HOST:PORT] [--port N] [--tick-ms N] [--respawn-pct N] [--seed N] [--world PATH]\n\n\
ENV:\n  MUD_BIND        default 0.0.0.0:4000\n  WORLD_TICK_MS   default 5000 (minimum 10)\n  RESPAWN_PCT     default 5 (0..=100, per tick per empty spawn site)\n  WORLD_SEED      optional; default derived from the clock\n  WORLD_FILE      optional; YAML world, default is the built-in town\n  MAX_LINE_LEN    default 1024 bytes per inbound line\n\n\
CONSOLE:\n  type q and press enter (or Ctrl-C) to shut down\n"
    );
    std::process::exit(2);
}

pub fn parse_args() -> Config {
    match parse_from(|k| std::env::var(k).ok(), std::env::args().skip(1)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("error: {e:#}\n");
            usage_and_exit()
        }
    }
}

/// Build a config from an environment lookup and command-line arguments (without argv[0]).
/// Arguments override the environment. `--help` is reported as an error.
pub fn parse_from<E, I>(env: E, args: I) -> anyhow::Result<Config>
where
    E: Fn(&str) -> Option<String>,
    I: IntoIterator<Item = String>,
{
    let env = |k: &str| env(k).filter(|v| !v.trim().is_empty());

    let mut bind: SocketAddr = env("MUD_BIND")
        .unwrap_or_else(|| DEFAULT_BIND.to_string())
        .parse()
        .context("MUD_BIND")?;
    let mut tick_ms: u64 = match env("WORLD_TICK_MS") {
        Some(v) => v.trim().parse().context("WORLD_TICK_MS")?,
        None => DEFAULT_TICK_MS,
    };
    let mut respawn_pct: u32 = match env("RESPAWN_PCT") {
        Some(v) => v.trim().parse().context("RESPAWN_PCT")?,
        None => DEFAULT_RESPAWN_PCT,
    };
    let mut rng_seed: Option<u64> = env("WORLD_SEED")
        .map(|v| v.trim().parse().context("WORLD_SEED"))
        .transpose()?;
    let mut world_file: Option<PathBuf> = env("WORLD_FILE").map(PathBuf::from);
    let max_line_len: usize = match env("MAX_LINE_LEN") {
        Some(v) => v.trim().parse().context("MAX_LINE_LEN")?,
        None => mudline::DEFAULT_MAX_LINE_LEN,
    };

    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        let mut value = || it.next().with_context(|| format!("{arg} needs a value"));
        match arg.as_str() {
            "--bind" => bind = value()?.parse().context("--bind")?,
            "--port" => {
                let port: u16 = value()?.parse().context("--port")?;
                bind.set_port(port);
            }
            "--tick-ms" => tick_ms = value()?.parse().context("--tick-ms")?,
            "--respawn-pct" => respawn_pct = value()?.parse().context("--respawn-pct")?,
            "--seed" => rng_seed = Some(value()?.parse().context("--seed")?),
            "--world" => world_file = Some(PathBuf::from(value()?)),
            "-h" | "--help" => anyhow::bail!("help requested"),
            other => anyhow::bail!("unknown argument {other}"),
        }
    }

    Ok(Config {
        bind,
        tick: Duration::from_millis(tick_ms.max(MIN_TICK_MS)),
        respawn_pct: respawn_pct.min(100),
        rng_seed,
        world_file,
        max_line_len: max_line_len.max(1),
    })
}
