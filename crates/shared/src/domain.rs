use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A Yes/No answer as it travels on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    Yes,
    #[default]
    No,
}

impl Answer {
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            Self::Yes
        } else {
            Self::No
        }
    }

    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => f.write_str("Yes"),
            Self::No => f.write_str("No"),
        }
    }
}

/// Interface language. Serialized as the lowercase English name, which is what
/// the recommendation backend expects in its `language` fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiLanguage {
    #[default]
    English,
    Hindi,
    Tamil,
    Telugu,
    Bengali,
    Gujarati,
    Marathi,
    Kannada,
    Malayalam,
    Punjabi,
}

impl UiLanguage {
    pub const ALL: [UiLanguage; 10] = [
        Self::English,
        Self::Hindi,
        Self::Tamil,
        Self::Telugu,
        Self::Bengali,
        Self::Gujarati,
        Self::Marathi,
        Self::Kannada,
        Self::Malayalam,
        Self::Punjabi,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Hindi => "hindi",
            Self::Tamil => "tamil",
            Self::Telugu => "telugu",
            Self::Bengali => "bengali",
            Self::Gujarati => "gujarati",
            Self::Marathi => "marathi",
            Self::Kannada => "kannada",
            Self::Malayalam => "malayalam",
            Self::Punjabi => "punjabi",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Tamil => "ta",
            Self::Telugu => "te",
            Self::Bengali => "bn",
            Self::Gujarati => "gu",
            Self::Marathi => "mr",
            Self::Kannada => "kn",
            Self::Malayalam => "ml",
            Self::Punjabi => "pa",
        }
    }

    /// Lenient lookup used for user-supplied values: unknown or empty input
    /// falls back to English.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl fmt::Display for UiLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language '{0}'")]
pub struct ParseLanguageError(pub String);

impl FromStr for UiLanguage {
    type Err = ParseLanguageError;

    /// Accepts either the English name or the two-letter code, case-insensitively.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.wire_name() == needle || lang.code() == needle)
            .ok_or_else(|| ParseLanguageError(raw.to_string()))
    }
}
