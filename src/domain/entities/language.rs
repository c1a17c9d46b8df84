use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Level encoding on the wire: `"oral,written"`, each digit 0-5.
static LEVEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-5],[0-5]$").unwrap());

// ───── Stored Model ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Language {
    pub id: i64,
    pub user_id: i64,
    pub language_name: String,
    pub language_level: String,
}

impl Language {
    /// Parses the stored level pair. Documents written by hand may hold
    /// garbage; callers decide whether to fall back to `0,0`.
    pub fn level(&self) -> Result<LanguageLevel, String> {
        self.language_level.parse()
    }
}

// ───── Level Value Type ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageLevel {
    pub oral: u8,
    pub written: u8,
}

impl FromStr for LanguageLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !LEVEL_RE.is_match(s) {
            return Err(format!("invalid language level: {s:?}"));
        }
        let (oral, written) = s.split_once(',').expect("regex guarantees a comma");
        Ok(LanguageLevel {
            oral: oral.parse().expect("regex guarantees a digit"),
            written: written.parse().expect("regex guarantees a digit"),
        })
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.oral, self.written)
    }
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewLanguage {
    #[validate(length(min = 1, message = "Language name cannot be empty"))]
    pub language_name: String,

    #[validate(custom(function = "validate_language_level"))]
    pub language_level: String,
}

impl NewLanguage {
    pub fn prepare_for_insert(&self, id: i64, user_id: i64) -> Language {
        Language {
            id,
            user_id,
            language_name: self.language_name.clone(),
            language_level: self.language_level.clone(),
        }
    }
}

fn validate_language_level(level: &str) -> Result<(), ValidationError> {
    if LEVEL_RE.is_match(level) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_language_level");
        err.message = Some("Level must be \"oral,written\" with digits 0-5".into());
        Err(err)
    }
}
