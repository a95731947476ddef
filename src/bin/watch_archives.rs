//! Poll a drop directory and extract every archive that arrives

use archive_intake::{
    AfterProcess, Config, DirectoryScanner, ExtractAndRelocate, FolderWatcher, cancel_on_shutdown,
    logging,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Watch a directory for new archives and extract them
#[derive(Debug, Parser)]
#[command(name = "watch-archives", version, about)]
struct Args {
    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to watch [default: data]
    #[arg(long)]
    src: Option<PathBuf>,

    /// Destination directory for extracted contents [default: archive]
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Where processed archives are moved [default: <src>/processed]
    #[arg(long)]
    processed_dir: Option<PathBuf>,

    /// Polling interval in seconds [default: 5]
    #[arg(long)]
    interval: Option<f64>,

    /// What to do with an archive after extraction
    #[arg(long, value_enum)]
    after_process: Option<AfterProcessArg>,

    /// Leave failed archives alone until they are replaced or the watcher restarts
    #[arg(long)]
    no_retry_failed: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AfterProcessArg {
    MoveToProcessed,
    Delete,
    Keep,
}

impl From<AfterProcessArg> for AfterProcess {
    fn from(arg: AfterProcessArg) -> Self {
        match arg {
            AfterProcessArg::MoveToProcessed => AfterProcess::MoveToProcessed,
            AfterProcessArg::Delete => AfterProcess::Delete,
            AfterProcessArg::Keep => AfterProcess::Keep,
        }
    }
}

impl Args {
    fn into_config(self) -> archive_intake::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(src) = self.src {
            config.extraction.source_dir = src;
        }
        if let Some(dest) = self.dest {
            config.extraction.dest_dir = dest;
        }
        if let Some(dir) = self.processed_dir {
            config.watch.processed_dir = Some(dir);
        }
        if let Some(secs) = self.interval {
            config.watch.interval =
                Duration::try_from_secs_f64(secs).map_err(|e| archive_intake::Error::Config {
                    message: format!("invalid interval {}: {}", secs, e),
                    key: Some("interval".to_string()),
                })?;
        }
        if let Some(action) = self.after_process {
            config.watch.after_process = action.into();
        }
        if self.no_retry_failed {
            config.watch.retry_failed = false;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(&args.log_level);

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let watcher = FolderWatcher::new(
        config.extraction.source_dir.clone(),
        config.watch.clone(),
        Arc::new(DirectoryScanner),
        Arc::new(ExtractAndRelocate::from_config(&config)),
    );

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));

    match watcher.run(cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
