//! Join feature configuration.
//!
//! Parameters arrive either as a decoder feature line
//! (`JoinScore name=JoinScore0 max-morpheme-state=3`) or from a TOML file
//! with the same kebab-case keys.

use crate::core::context::MorphemeCapacity;
use crate::error::{JoinError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const FEATURE_NAME: &str = "JoinScore";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct JoinScoreConfig {
    /// Instance name in the decoder's feature list.
    pub name: String,
    /// Tunable weights scale counts; otherwise any count is a hard veto.
    pub tuneable: bool,
    pub score_real_words: bool,
    pub score_num_compounds: bool,
    pub score_invalid_joins: bool,
    pub score_compound_word: bool,
    pub max_morpheme_state: i64,
    pub multiplier: f32,
}

impl Default for JoinScoreConfig {
    fn default() -> Self {
        Self {
            name: FEATURE_NAME.to_string(),
            tuneable: true,
            score_real_words: true,
            score_num_compounds: true,
            score_invalid_joins: true,
            score_compound_word: true,
            max_morpheme_state: -1,
            multiplier: 1.0,
        }
    }
}

impl JoinScoreConfig {
    /// Parses a feature line. The leading feature type is optional.
    pub fn from_feature_line(line: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut parts = line.split_whitespace().peekable();
        if let Some(first) = parts.peek() {
            if !first.contains('=') {
                if *first != FEATURE_NAME {
                    return Err(JoinError::config("feature", first, format!("expected {}", FEATURE_NAME)));
                }
                parts.next();
            }
        }
        for part in parts {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| JoinError::config(part, "", "expected key=value"))?;
            config.set_parameter(key, value)?;
        }
        Ok(config)
    }

    /// Loads a TOML config. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Config file not found, using defaults: {:?}", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}: {:?}", path, config);
        Ok(config)
    }

    pub fn set_parameter(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "score-real-words" => self.score_real_words = parse_bool(key, value)?,
            "score-num-compounds" => self.score_num_compounds = parse_bool(key, value)?,
            "score-invalid-joins" => self.score_invalid_joins = parse_bool(key, value)?,
            "score-compound-word" => self.score_compound_word = parse_bool(key, value)?,
            "max-morpheme-state" => {
                self.max_morpheme_state = value
                    .parse()
                    .map_err(|e| JoinError::config(key, value, format!("{}", e)))?;
            }
            "multiplier" => {
                self.multiplier = value
                    .parse()
                    .map_err(|e| JoinError::config(key, value, format!("{}", e)))?;
                self.validate()?;
            }
            _ => self.set_base_parameter(key, value)?,
        }
        Ok(())
    }

    /// Keys shared by every feature function.
    fn set_base_parameter(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "name" => self.name = value.to_string(),
            "tuneable" => self.tuneable = parse_bool(key, value)?,
            _ => return Err(JoinError::config(key, value, "unknown parameter")),
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !self.multiplier.is_finite() {
            return Err(JoinError::config(
                "multiplier",
                &self.multiplier.to_string(),
                "must be finite",
            ));
        }
        Ok(())
    }

    pub fn capacity(&self) -> MorphemeCapacity {
        MorphemeCapacity::from_signed(self.max_morpheme_state)
    }

    /// Width of the score vector.
    pub fn num_components(&self) -> usize {
        [
            self.score_real_words,
            self.score_num_compounds,
            self.score_invalid_joins,
            self.score_compound_word,
        ]
        .iter()
        .filter(|&&on| on)
        .count()
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(JoinError::config(key, value, "expected a boolean")),
    }
}
