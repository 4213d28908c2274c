use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};

use mdnotes::{
    App, Cli, Config, Controller, FileStore, LoadOutcome, NoteStore, Result, StorageAdapter,
    StreamPane, WriteBehind,
};

pub fn initialize_logger(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.data_dir.clone());

    let adapter = StorageAdapter::new(FileStore::open(&data_dir)?);
    let (snapshot, outcome) = adapter.load();
    if let LoadOutcome::Defaults { reason } = &outcome {
        info!("Starting from the default notes ({})", reason);
    }

    // The store is fully loaded before anything is rendered
    let (store, writer) = if config.write_behind {
        let writer = WriteBehind::spawn(adapter);
        let store = NoteStore::from_loaded(snapshot, outcome, Box::new(writer.sink()));
        (store, Some(writer))
    } else {
        (NoteStore::from_loaded(snapshot, outcome, Box::new(adapter)), None)
    };

    let controller = Controller::new(store);
    let mut app = App::new(controller, config, config_path, StreamPane::new(std::io::stdout()));
    let outcome = app.run(cli.command);

    let store = app.into_store();
    let inline_error = store.persistence_error();
    drop(store);

    let persisted = match writer {
        Some(writer) => writer.shutdown().await,
        None => match inline_error {
            Some(message) => Err(mdnotes::NotesError::StorageError {
                key: "snapshot".to_string(),
                message,
            }),
            None => Ok(()),
        },
    };
    if let Err(e) = &persisted {
        warn!("Changes may not have been saved: {}", e);
    }

    outcome.and(persisted)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let filter = if cli.verbose {
        "debug"
    } else {
        config.default_filter.as_str()
    };
    initialize_logger(filter);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
