mod cli;

use std::{
    process::ExitCode,
    sync::Arc,
    time::Instant,
};

use clap::Parser;
use cli::{
    Cli,
    Commands,
};
use kiku::{
    anki::AnkiConnect,
    builder,
    core::utils::extract_kanji,
    debug_time,
    logging,
    notes::NoteQuery,
    worker::Worker,
    KanjiEngine,
    KikuConfig,
    KikuError,
    SessionContext,
};
use serde::Serialize;

const ANKI_WAIT_SECONDS: u64 = 2;
const ANKI_WAIT_ATTEMPTS: u32 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let start = Instant::now();
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let result = run(cli).await;
    debug_time!(start, "command finished");

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), KikuError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn engine(config: KikuConfig) -> Result<KanjiEngine, KikuError> {
    Ok(KanjiEngine::new(SessionContext::from_config(config)?))
}

async fn run(cli: Cli) -> Result<(), KikuError> {
    let mut config = KikuConfig::load();
    cli.apply(&mut config);

    match cli.command {
        Commands::Similar { kanji } => print_json(&engine(config)?.get_similar_kanji(&kanji).await?),
        Commands::Shared { words } => {
            let kanji = extract_kanji(&words.concat());
            print_json(&engine(config)?.query_shared_and_similar(&kanji).await?)
        }
        Commands::Query { kanji, readings, expressions } => {
            let query = NoteQuery {
                kanji_list: kanji,
                reading_list: readings,
                expression_list: expressions,
            };
            print_json(&engine(config)?.query_notes(&query).await?)
        }
        Commands::Lookup { kanji } => print_json(&engine(config)?.lookup(&kanji).await?),
        Commands::Manifest => print_json(&*engine(config)?.notes_manifest().await?),
        Commands::Serve => {
            tracing::info!(assets = %config.assets_path, "serving worker on stdio");
            Arc::new(Worker::with_engine(engine(config)?)).serve_stdio().await
        }
        Commands::Config { save } => {
            if save {
                config.save().map_err(|e| KikuError::Custom(e.to_string()))?;
            }
            print_json(&config)
        }
        Commands::ExportNotes { out, chunks, profile } => {
            let anki = AnkiConnect::new(config.anki_connect_address());
            if !anki.wait_awake(ANKI_WAIT_SECONDS, ANKI_WAIT_ATTEMPTS).await {
                return Err(KikuError::AnkiConnect(format!(
                    "no answer from {}",
                    anki.address()
                )));
            }
            let manifest = builder::export_notes(&anki, &out, chunks, profile).await?;
            print_json(&manifest)
        }
        Commands::BuildKanjiDb { composition, wanikani, jpdb, meanings, out } => {
            let inputs = builder::KanjiDbInputs::load(&composition, &wanikani, &jpdb, &meanings)?;
            let db = tokio::task::spawn_blocking(move || builder::build_kanji_db(&inputs))
                .await
                .map_err(|e| KikuError::Custom(e.to_string()))?;
            builder::write_kanji_db(&db, &out)?;
            eprintln!("Wrote {} kanji to {}", db.len(), out.display());
            Ok(())
        }
        Commands::Pack { files, archive, manifest } => {
            print_json(&builder::pack_bundle(&files, &archive, &manifest)?)
        }
    }
}
