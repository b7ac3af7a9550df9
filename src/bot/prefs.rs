//! Per-chat preferences

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::channels::RecipientId;
use crate::language::LanguageProfile;

/// Settings a user changes through commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    /// Language for `/send_vocab`
    pub vocabulary_language: &'static LanguageProfile,
    /// Voice notes get tutor feedback instead of a plain answer
    pub speech_practice: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            vocabulary_language: LanguageProfile::english(),
            speech_practice: false,
        }
    }
}

/// In-memory preference store; lost on restart
#[derive(Debug, Default)]
pub struct PreferenceStore {
    entries: Mutex<HashMap<RecipientId, Preferences>>,
}

impl PreferenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current preferences, defaults if never set
    #[must_use]
    pub fn get(&self, recipient: RecipientId) -> Preferences {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&recipient)
            .copied()
            .unwrap_or_default()
    }

    /// Apply `change` to the recipient's preferences
    pub fn update(&self, recipient: RecipientId, change: impl FnOnce(&mut Preferences)) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        change(entries.entry(recipient).or_default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_until_changed() {
        let store = PreferenceStore::new();
        assert_eq!(store.get(1), Preferences::default());

        store.update(1, |p| p.speech_practice = true);
        assert!(store.get(1).speech_practice);
        assert_eq!(store.get(1).vocabulary_language.name, "english");
        assert!(!store.get(2).speech_practice);
    }
}
