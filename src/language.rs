//! Language profiles
//!
//! Static table mapping a language name to the locale used for speech
//! synthesis. Compiled in; never mutated at runtime.

/// A supported language and how to speak it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageProfile {
    /// Lowercase language name used in commands and config (e.g. "german")
    pub name: &'static str,
    /// Locale code passed to the synthesis backend (e.g. "de")
    pub locale: &'static str,
    /// Regional host suffix for accent selection on the Google TTS endpoint
    pub tld: &'static str,
}

const PROFILES: &[LanguageProfile] = &[
    LanguageProfile {
        name: "english",
        locale: "en",
        tld: "com",
    },
    LanguageProfile {
        name: "german",
        locale: "de",
        tld: "de",
    },
    LanguageProfile {
        name: "ukrainian",
        locale: "uk",
        tld: "com.ua",
    },
];

/// Languages a user may pick for vocabulary practice
pub const VOCABULARY_LANGUAGES: &[&str] = &["english", "german"];

impl LanguageProfile {
    /// Look up a profile by name (case-insensitive, surrounding whitespace ignored)
    #[must_use]
    pub fn lookup(name: &str) -> Option<&'static Self> {
        let name = name.trim();
        PROFILES.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// The English profile
    #[must_use]
    pub const fn english() -> &'static Self {
        &PROFILES[0]
    }

    /// Name with a leading capital, for user-facing text
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }
}
