//! Languages of full-text input

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::FtError;

/// Language, identified by its ISO 639-1 code
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
    Fr,
    Nl,
    Pt,
    Ru,
    It,
    Es,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Self::En,
        Self::De,
        Self::Fr,
        Self::Nl,
        Self::Pt,
        Self::Ru,
        Self::It,
        Self::Es,
    ];

    pub const fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
            Self::Fr => "fr",
            Self::Nl => "nl",
            Self::Pt => "pt",
            Self::Ru => "ru",
            Self::It => "it",
            Self::Es => "es",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = FtError;

    /// Parse a language code; region subtags such as `en-US` are ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let primary = s.split(['-', '_']).next().unwrap_or_default().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code() == primary)
            .ok_or_else(|| FtError::UnknownLanguage(s.to_string()))
    }
}
