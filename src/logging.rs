//! Subscriber setup for the binary.
//!
//! Library code logs through `log` with one target per component
//! (see [`crate::target`]). Each component gets its own file under
//! `<log_dir>/<component>_logs/`, and everything at `RUST_LOG` level (info
//! by default) goes to stderr as well.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use crate::target;

const KEPT_LOG_FILES: usize = 3;

/// Rolling appender for one component, writing `<component>_log.txt`.
fn component_appender(log_dir: &Path, component: &str) -> Result<RollingFileAppender> {
    let directory = log_dir.join(format!("{component}_logs"));
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(format!("{component}_log"))
        .filename_suffix("txt")
        .max_log_files(KEPT_LOG_FILES)
        .build(&directory)
        .with_context(|| format!("failed to open log directory {}", directory.display()))
}

pub fn init(log_dir: &Path) -> Result<()> {
    let mut file_layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    for component in target::ALL {
        let layer = fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(component_appender(log_dir, component)?)
            .with_filter(Targets::new().with_target(component, LevelFilter::INFO))
            .boxed();
        file_layers.push(layer);
    }

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(file_layers)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("failed to install log subscriber")
}
