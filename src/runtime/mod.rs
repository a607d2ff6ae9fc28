use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

/// Logs go to stderr so `--json` output on stdout stays parseable.
/// `RUST_LOG` wins over the verbosity flag.
pub fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();
    let _ = subscriber.try_init();
    Ok(())
}
