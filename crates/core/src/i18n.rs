//! Localized labels.

use crate::settings::Language;

/// Environment variables consulted for the system locale, in priority order.
const LOCALE_VARIABLES: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// A concrete label language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    En,
    Zh,
}

impl Locale {
    /// Label placed before the page reference in a source attachment.
    pub fn source_label(self) -> &'static str {
        match self {
            Self::En => "Source",
            Self::Zh => "来源",
        }
    }
}

/// Resolves a settings language, reading the process locale for `System`.
pub fn resolve(language: Language) -> Locale {
    resolve_with(language, |name| std::env::var(name).ok())
}

/// [`resolve`] with an explicit environment lookup.
pub fn resolve_with(language: Language, lookup: impl Fn(&str) -> Option<String>) -> Locale {
    match language {
        Language::En => Locale::En,
        Language::Zh => Locale::Zh,
        Language::System => {
            let locale = LOCALE_VARIABLES
                .iter()
                .filter_map(|name| lookup(name))
                .find(|value| !value.trim().is_empty())
                .unwrap_or_default();
            if locale.trim().to_ascii_lowercase().starts_with("zh") { Locale::Zh } else { Locale::En }
        }
    }
}
