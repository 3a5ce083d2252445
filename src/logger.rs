use chrono::Local;
use fern::Dispatch;
use log::LevelFilter;
use std::fs;
use std::path::Path;

use crate::api::config_dto::LoggingDto;

const LOG_FILE: &str = "apid.log";

/// Initializes the global logger.
///
/// Call once at the start of `main`, after the service configuration is loaded.
///
/// The level comes from `RUST_LOG` if set, else from `logging.level` in the
/// service configuration, else `info`. Console output goes to stderr; when
/// `logging.logDir` is configured the same lines are appended to `<logDir>/apid.log`.
pub fn init(config: &LoggingDto) {
    let log_level = std::env::var("RUST_LOG").ok().or_else(|| config.level.clone()).unwrap_or_else(|| "info".to_string());

    let log_level_filter = log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);

    let base_config = Dispatch::new()
        .level(log_level_filter)
        .level_for("hyper", LevelFilter::Warn)
        .level_for("hyper_util", LevelFilter::Warn)
        .level_for("tokio", LevelFilter::Warn);

    let console_config = Dispatch::new()
        .format(|out, message, record| {
            let colors = fern::colors::ColoredLevelConfig::new()
                .error(fern::colors::Color::Red)
                .warn(fern::colors::Color::Yellow)
                .info(fern::colors::Color::Green)
                .debug(fern::colors::Color::Blue)
                .trace(fern::colors::Color::BrightBlack);

            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = base_config.chain(console_config);
    let mut log_file_path = None;

    if let Some(log_dir) = &config.log_dir {
        match file_dispatch(log_dir) {
            Ok((file_config, path)) => {
                dispatch = dispatch.chain(file_config);
                log_file_path = Some(path);
            }
            Err(e) => eprintln!("Failed to open log file in '{}': {}", log_dir, e),
        }
    }

    if let Err(e) = dispatch.apply() {
        eprintln!("Failed to apply logger configuration: {}", e);
        return;
    }

    match log_file_path {
        Some(path) => log::info!("Logger initialized at level {}. Logging to console and '{}'.", log_level_filter, path),
        None => log::info!("Logger initialized at level {}. Logging to console.", log_level_filter),
    }
}

fn file_dispatch(log_dir: &str) -> std::io::Result<(Dispatch, String)> {
    fs::create_dir_all(log_dir)?;
    let log_file_path = Path::new(log_dir).join(LOG_FILE).to_string_lossy().into_owned();

    let file_config = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{} {} {}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), record.level(), record.target(), message))
        })
        .chain(fern::log_file(&log_file_path)?);

    Ok((file_config, log_file_path))
}
