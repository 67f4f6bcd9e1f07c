// Copyright (C) 2024, 2025 Roundkeeper Developers (see AUTHORS)
//
// This file is part of Roundkeeper
//
// Roundkeeper is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Roundkeeper is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// Roundkeeper. If not, see <https://www.gnu.org/licenses/>.

use crate::config::LoggingConfig;
use std::error::Error;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILENAME: &str = "roundkeeper.log";

/// Sets up logging according to the logging configuration
///
/// `RUST_LOG` overrides the configured level. The returned guard flushes the
/// file log when dropped, so keep it alive for the life of the process.
pub fn setup_logging(
    logging_config: &LoggingConfig,
) -> Result<Option<non_blocking::WorkerGuard>, Box<dyn Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging_config.level));

    let console_layer = logging_config.console.unwrap_or(true).then(fmt::layer);

    let (file_layer, guard) = match &logging_config.file {
        Some(file_path) => {
            let (directory, filename) = split_log_path(Path::new(file_path));
            std::fs::create_dir_all(directory)?;

            let file_appender = RollingFileAppender::new(Rotation::DAILY, directory, filename);
            let (non_blocking_appender, guard) = non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking_appender)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    if let Some(file_path) = &logging_config.file {
        info!("File logging is enabled, writing to: {file_path}");
    }
    Ok(guard)
}

/// Directory and file name of the rolling log, defaulting to the current
/// directory and `roundkeeper.log`.
fn split_log_path(file_path: &Path) -> (&Path, &str) {
    let directory = file_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let filename = file_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_LOG_FILENAME);
    (directory, filename)
}
