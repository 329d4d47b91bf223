///! Name mapper - Maps raw OPUS codes to display names
///!
///! Handles the mapping between:
///! - Target names (e.g., "S RINGS" -> "Rings of Saturn")
///! - Instrument host codes (e.g., "CO" -> "Cassini")

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DEFAULT_TARGET_NAMES: [(&str, &str); 3] = [
    ("S RINGS", "Rings of Saturn"),
    ("J RINGS", "Rings of Jupiter"),
    ("N RINGS", "Rings of Neptune"),
];

const DEFAULT_MISSION_NAMES: [(&str, &str); 6] = [
    ("VG1", "Voyager 1"),
    ("VG2", "Voyager 2"),
    ("HST", "Hubble"),
    ("GO", "Galileo"),
    ("CO", "Cassini"),
    ("NH", "New Horizons"),
];

/// Extra mappings layered over the built-in tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameMappingConfig {
    /// Key: raw target name, Value: display name
    #[serde(default)]
    pub targets: HashMap<String, String>,

    /// Key: instrument host code, Value: display name
    #[serde(default)]
    pub missions: HashMap<String, String>,
}

/// Name mapper
#[derive(Debug, Clone)]
pub struct NameMapper {
    targets: HashMap<String, String>,
    missions: HashMap<String, String>,
}

impl Default for NameMapper {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl NameMapper {
    /// Built-in tables with `config` entries added on top
    pub fn new(config: NameMappingConfig) -> Self {
        let mut mapper = Self::with_defaults();
        mapper.targets.extend(config.targets);
        mapper.missions.extend(config.missions);
        mapper
    }

    /// Create with the built-in tables only
    pub fn with_defaults() -> Self {
        Self {
            targets: to_map(&DEFAULT_TARGET_NAMES),
            missions: to_map(&DEFAULT_MISSION_NAMES),
        }
    }

    /// Display name for a target; unknown targets are title-cased
    pub fn target_name(&self, raw: &str) -> String {
        self.targets
            .get(raw)
            .cloned()
            .unwrap_or_else(|| title_case(raw))
    }

    /// Display name for a mission; unknown codes are returned unchanged
    pub fn mission_name(&self, code: &str) -> String {
        self.missions
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

fn to_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Uppercase the first letter of every word, lowercase the rest.
///
/// A word starts at any letter that does not follow another letter, so
/// "SATURN-RINGS" becomes "Saturn-Rings" and "2004 S 3" is left intact.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }

    out
}
