use std::env;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Stdout plus a plain-text log file. `TRACING_LEVEL` wins over `--debug`.
pub fn init_logger(debug: bool, human_readable: bool) -> impl Drop {
    let default_level = if debug { "debug" } else { "info" };
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| default_level.to_string());
    let filter_layer = EnvFilter::new(filter);

    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| "./logs/fdmerge.log".to_string());

    let file_appender = tracing_appender::rolling::never("./", log_file_path);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stdout_layer: Box<dyn Layer<Registry> + Send + Sync> = if human_readable {
        fmt::layer()
            .with_writer(std::io::stdout)
            .pretty()
            .with_file(false)
            .without_time()
            .with_ansi(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .without_time()
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();

    info!("Tracing is configured for stdout and file logging.");

    guard
}
