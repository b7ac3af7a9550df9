//! Vocabulary word lists
//!
//! One file per language, `<dir>/<language>.txt`, one word per line. Lists
//! are read once at startup.

use std::collections::HashMap;
use std::path::Path;

use rand::seq::SliceRandom;

use crate::Result;

/// In-memory word lists keyed by language name
#[derive(Debug, Default, Clone)]
pub struct WordListStore {
    lists: HashMap<String, Vec<String>>,
}

impl WordListStore {
    /// Load `<dir>/<language>.txt` for each of `languages`
    ///
    /// A missing file leaves that language empty.
    ///
    /// # Errors
    ///
    /// Returns error if an existing file cannot be read
    pub fn load(dir: &Path, languages: &[&str]) -> Result<Self> {
        let mut lists = HashMap::new();

        for language in languages {
            let path = dir.join(format!("{language}.txt"));
            if !path.exists() {
                tracing::warn!(path = %path.display(), "word list not found");
                continue;
            }

            let content = std::fs::read_to_string(&path)?;
            let words = parse_words(&content);
            tracing::info!(language, count = words.len(), path = %path.display(), "loaded word list");
            lists.insert((*language).to_string(), words);
        }

        Ok(Self { lists })
    }

    /// Build a store from in-memory lists
    #[must_use]
    pub fn from_lists<I, L, W>(lists: I) -> Self
    where
        I: IntoIterator<Item = (L, Vec<W>)>,
        L: Into<String>,
        W: Into<String>,
    {
        Self {
            lists: lists
                .into_iter()
                .map(|(language, words)| (language.into(), words.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// Pick a uniformly random word, or `None` if the language has no words
    #[must_use]
    pub fn random_word(&self, language: &str) -> Option<String> {
        self.lists
            .get(language)?
            .choose(&mut rand::thread_rng())
            .cloned()
    }

    /// Number of words known for `language`
    #[must_use]
    pub fn count(&self, language: &str) -> usize {
        self.lists.get(language).map_or(0, Vec::len)
    }
}

fn parse_words(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
