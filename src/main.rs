use clap::Parser;
use mazecarve::{
    app,
    config::{Cli, Settings},
    error::AppError,
};
use tracing_appender::non_blocking::WorkerGuard;

/// Routes tracing output to the log file, since stdout belongs to the terminal UI.
/// The returned guard flushes pending lines when dropped.
fn init_logging(settings: &Settings) -> Result<WorkerGuard, AppError> {
    let directory = match settings.log_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    let file_name = settings
        .log_file
        .file_name()
        .ok_or_else(|| AppError::Logging(format!("{:?} is not a file", settings.log_file)))?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_max_level(settings.log_level)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;
    Ok(guard)
}

fn main() -> Result<(), AppError> {
    let settings = Settings::from(Cli::parse());
    let _guard = init_logging(&settings)?;
    tracing::info!("Starting with {:?}", settings);

    if settings.headless {
        return app::run_headless(&settings, &mut std::io::stdout());
    }

    let mut stdout = std::io::stdout();
    app::setup_terminal(&mut stdout)?;
    let result = app::run(&mut stdout, &settings);
    app::restore_terminal(&mut stdout)?;
    if let Err(e) = &result {
        tracing::error!("Viewer stopped: {}", e);
    }
    result
}
