use std::path::PathBuf;

use clap::{
    Parser,
    Subcommand,
};
use kiku::KikuConfig;

/// Similar kanji, shared notes and kanji metadata for Kiku cards.
#[derive(Parser, Debug)]
#[command(name = "kiku")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Assets location: a directory or an http(s) base URL
    #[arg(long, global = true, env = "KIKU_ASSETS")]
    pub assets: Option<String>,

    /// AnkiConnect port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Query AnkiConnect first and fall back to the exported notes
    #[arg(long, global = true)]
    pub prefer_anki_connect: bool,

    /// Include the alternative similarity sources
    #[arg(long, global = true)]
    pub alternative_sources: bool,

    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log filter, e.g. `debug` or `kiku=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Applies the flags on top of the stored config.
    pub fn apply(&self, config: &mut KikuConfig) {
        if let Some(assets) = &self.assets {
            config.assets_path = assets.clone();
        }
        if let Some(port) = self.port {
            config.anki_connect_port = port;
        }
        if self.prefer_anki_connect {
            config.prefer_anki_connect = true;
        }
        if self.alternative_sources {
            config.use_alternative_sources = true;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Kanji visually similar to KANJI
    Similar { kanji: String },

    /// Notes sharing each kanji of WORDS, plus notes of their similar kanji
    Shared {
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Notes matching kanji, readings or expressions
    Query {
        kanji: Vec<String>,
        #[arg(long = "reading")]
        readings: Vec<String>,
        #[arg(long = "expression")]
        expressions: Vec<String>,
    },

    /// Metadata for one kanji
    Lookup { kanji: String },

    /// Print the notes manifest
    Manifest,

    /// Answer worker requests as JSON lines on stdin/stdout
    Serve,

    /// Print the effective config
    Config {
        /// Write it back to the config file
        #[arg(long)]
        save: bool,
    },

    /// Export every note over AnkiConnect into gzip chunks
    ExportNotes {
        #[arg(long, short)]
        out: PathBuf,
        #[arg(long, default_value_t = kiku::builder::notes::DEFAULT_CHUNK_COUNT)]
        chunks: usize,
        /// Profile name recorded in the export; asks AnkiConnect when omitted
        #[arg(long)]
        profile: Option<String>,
    },

    /// Build the compact kanji table from scraped inputs
    BuildKanjiDb {
        #[arg(long)]
        composition: PathBuf,
        #[arg(long)]
        wanikani: PathBuf,
        #[arg(long)]
        jpdb: PathBuf,
        #[arg(long)]
        meanings: PathBuf,
        #[arg(long, short)]
        out: PathBuf,
    },

    /// Pack files into a tar bundle with a byte-range manifest
    Pack {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        archive: PathBuf,
        #[arg(long)]
        manifest: PathBuf,
    },
}
