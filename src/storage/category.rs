//! Entry categories and the write-time classifier
//!
//! Every entry is tagged with an [`EntryCategory`] when it is written. The tag
//! travels with the stored payload (see [`super::codec::frame`]) so cleanup reads
//! the category back instead of guessing from key text.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::settings::StorageSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryCategory {
    /// Must survive emergency cleanup
    Essential,
    /// Cache or temporary data, first to go
    Ephemeral,
    /// Backup or old copy of another entry
    SupersededDuplicate,
    Normal,
}

impl EntryCategory {
    /// One-letter tag used in the stored frame
    pub fn tag(self) -> char {
        match self {
            EntryCategory::Essential => 'e',
            EntryCategory::Ephemeral => 't',
            EntryCategory::SupersededDuplicate => 'd',
            EntryCategory::Normal => 'n',
        }
    }

    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'e' => Some(EntryCategory::Essential),
            't' => Some(EntryCategory::Ephemeral),
            'd' => Some(EntryCategory::SupersededDuplicate),
            'n' => Some(EntryCategory::Normal),
            _ => None,
        }
    }
}

impl fmt::Display for EntryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryCategory::Essential => "essential",
            EntryCategory::Ephemeral => "ephemeral",
            EntryCategory::SupersededDuplicate => "superseded_duplicate",
            EntryCategory::Normal => "normal",
        };
        f.write_str(name)
    }
}

/// Assigns a category to a key at write time
///
/// Precedence: essential set, then the ephemeral survivor (tagged normal), then
/// ephemeral prefixes, then superseded suffixes.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    essential: BTreeSet<String>,
    ephemeral_prefixes: Vec<String>,
    superseded_suffixes: Vec<String>,
    ephemeral_survivor: Option<String>,
}

impl Classifier {
    pub fn new(settings: &StorageSettings) -> Self {
        Self {
            essential: settings.essential_keys.clone(),
            ephemeral_prefixes: settings.ephemeral_prefixes.clone(),
            superseded_suffixes: settings.superseded_suffixes.clone(),
            ephemeral_survivor: settings.ephemeral_survivor.clone(),
        }
    }

    pub fn classify(&self, key: &str) -> EntryCategory {
        if self.essential.contains(key) {
            return EntryCategory::Essential;
        }

        if self.ephemeral_survivor.as_deref() == Some(key) {
            return EntryCategory::Normal;
        }

        if self
            .ephemeral_prefixes
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()))
        {
            return EntryCategory::Ephemeral;
        }

        if self
            .superseded_suffixes
            .iter()
            .any(|suffix| key.ends_with(suffix.as_str()))
        {
            return EntryCategory::SupersededDuplicate;
        }

        EntryCategory::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_classifier() -> Classifier {
        let settings = StorageSettings {
            essential_keys: ["step1_data", "cache_profile"]
                .into_iter()
                .map(String::from)
                .collect(),
            ephemeral_survivor: Some("cache_latest".to_string()),
            ..StorageSettings::default()
        };
        Classifier::new(&settings)
    }

    #[test]
    fn test_tag_roundtrip() {
        for category in [
            EntryCategory::Essential,
            EntryCategory::Ephemeral,
            EntryCategory::SupersededDuplicate,
            EntryCategory::Normal,
        ] {
            assert_eq!(EntryCategory::from_tag(category.tag()), Some(category));
        }
        assert_eq!(EntryCategory::from_tag('x'), None);
    }

    #[test]
    fn test_classify_by_rules() {
        let classifier = create_test_classifier();

        assert_eq!(classifier.classify("step1_data"), EntryCategory::Essential);
        assert_eq!(classifier.classify("cache_suggestions"), EntryCategory::Ephemeral);
        assert_eq!(classifier.classify("temp_draft"), EntryCategory::Ephemeral);
        assert_eq!(
            classifier.classify("step2_data_backup"),
            EntryCategory::SupersededDuplicate
        );
        assert_eq!(classifier.classify("plan_old"), EntryCategory::SupersededDuplicate);
        assert_eq!(classifier.classify("step3_data"), EntryCategory::Normal);
    }

    #[test]
    fn test_essential_wins_over_prefix() {
        let classifier = create_test_classifier();
        assert_eq!(classifier.classify("cache_profile"), EntryCategory::Essential);
    }

    #[test]
    fn test_survivor_is_not_ephemeral() {
        let classifier = create_test_classifier();
        assert_eq!(classifier.classify("cache_latest"), EntryCategory::Normal);
    }
}
