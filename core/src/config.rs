use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::IdScheme;
use crate::error::{Error, Result};
use crate::merge::DuplicatePolicy;

/// Settings for one indexing run. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding `index.txt`, `docs.json` and `meta.json`.
    pub index_dir: PathBuf,
    /// Where per-stage text is written; stage text only goes to the log when unset.
    pub stage_dir: Option<PathBuf>,
    /// Line-delimited stopword file; the built-in English list when unset.
    pub stopwords: Option<PathBuf>,
    pub id_scheme: IdScheme,
    pub duplicate_policy: DuplicatePolicy,
    pub stemmer_language: String,
    pub tagger: TaggerConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// External tagger command line. The built-in heuristic tagger is used when empty.
    pub command: Vec<String>,
    /// `word TAG` lexicon for the heuristic tagger.
    pub lexicon: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("./index"),
            stage_dir: None,
            stopwords: None,
            id_scheme: IdScheme::default(),
            duplicate_policy: DuplicatePolicy::default(),
            stemmer_language: "english".into(),
            tagger: TaggerConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::Config { path: path.to_path_buf(), message: e.to_string() })?;
        serde_json::from_str(&text).map_err(|e| Error::Config { path: path.to_path_buf(), message: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{"id_scheme": "sha1", "tagger": {"command": ["tagger", "-m", "model"]}}"#).unwrap();
        assert_eq!(cfg.id_scheme, IdScheme::Sha1);
        assert_eq!(cfg.duplicate_policy, DuplicatePolicy::Skip);
        assert_eq!(cfg.stemmer_language, "english");
        assert_eq!(cfg.tagger.command, vec!["tagger", "-m", "model"]);
        assert_eq!(cfg.index_dir, PathBuf::from("./index"));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(serde_json::from_str::<PipelineConfig>(r#"{"duplicate_policy": "sometimes"}"#).is_err());
    }
}
