use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    persistence::{
        load_json_or_default,
        save_json,
    },
    similarity::SimilaritySource,
};

pub const CONFIG_FILE: &str = "config.json";

/// Names of the assets the engine reads, relative to the assets path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetFiles {
    pub notes_manifest: String,
    pub kanji_lookup: String,
    /// When set, the kanji table is read out of the packed bundle instead
    /// of `kanji_lookup`.
    pub db_bundle: Option<BundleFiles>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleFiles {
    pub manifest: String,
    pub archive: String,
    pub kanji_entry: String,
}

impl Default for AssetFiles {
    fn default() -> Self {
        Self {
            notes_manifest: "_kiku_notes_manifest.json".to_string(),
            kanji_lookup: "_kiku_db_similar_kanji_lookup.json.gz".to_string(),
            db_bundle: None,
        }
    }
}

impl Default for BundleFiles {
    fn default() -> Self {
        Self {
            manifest: "_kiku_db_main_manifest.json".to_string(),
            archive: "_kiku_db_main.tar".to_string(),
            kanji_entry: "_kiku_db_kanji_compact.json.gz".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KikuConfig {
    pub assets_path: String,
    pub anki_connect_port: u16,
    pub prefer_anki_connect: bool,
    pub similar_kanji_min_score: f64,
    pub use_alternative_sources: bool,
    pub note_types: Vec<String>,
    pub expression_field: String,
    pub reading_field: String,
    pub files: AssetFiles,
    pub similar_sources: Vec<SimilaritySource>,
    pub alternative_similar_sources: Vec<SimilaritySource>,
}

impl Default for KikuConfig {
    fn default() -> Self {
        Self {
            assets_path: ".".to_string(),
            anki_connect_port: 8765,
            prefer_anki_connect: false,
            similar_kanji_min_score: 0.5,
            use_alternative_sources: false,
            note_types: vec!["Kiku".to_string(), "Lapis".to_string()],
            expression_field: "Expression".to_string(),
            reading_field: "ExpressionReading".to_string(),
            files: AssetFiles::default(),
            similar_sources: vec![
                SimilaritySource::new("_kiku_db_similar_kanji_from_keisei.json.gz", 0.65),
                SimilaritySource::new("_kiku_db_similar_kanji_manual.json.gz", 0.9),
                SimilaritySource::new("_kiku_db_similar_kanji_wk_niai_noto.json.gz", 0.1),
            ],
            alternative_similar_sources: vec![
                SimilaritySource::new("_kiku_db_similar_kanji_old_script.json.gz", 0.4),
                SimilaritySource::new("_kiku_db_similar_kanji_stroke_edit_dist.json.gz", -0.2),
                SimilaritySource::new("_kiku_db_similar_kanji_yl_radical.json.gz", -0.2),
            ],
        }
    }
}

impl KikuConfig {
    pub fn load() -> Self {
        load_json_or_default(CONFIG_FILE)
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        save_json(self, CONFIG_FILE)
    }

    pub fn anki_connect_address(&self) -> String {
        format!("http://127.0.0.1:{}", self.anki_connect_port)
    }

    /// Sources in resolution order. The alternative tier only takes part
    /// when explicitly enabled and always runs after the primary tier.
    pub fn active_similar_sources(&self) -> Vec<SimilaritySource> {
        let mut sources = self.similar_sources.clone();
        if self.use_alternative_sources {
            sources.extend(self.alternative_similar_sources.iter().cloned());
        }
        sources
    }

    pub fn is_supported_model(&self, model_name: &str) -> bool {
        self.note_types.iter().any(|t| t == model_name)
    }
}
