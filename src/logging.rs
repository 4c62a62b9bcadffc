use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes console logging; `RUST_LOG` overrides the default level
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "survey_insight=debug"
    } else {
        "survey_insight=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
