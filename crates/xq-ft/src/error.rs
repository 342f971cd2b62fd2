//! Full-text errors

use thiserror::Error;
use xq_diagnostics::{ErrorCode, XQC0300};

use crate::Language;

pub type FtResult<T> = Result<T, FtError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FtError {
    /// No registered backend stems this language
    #[error("Stemming not supported for language '{0}'")]
    UnsupportedLanguage(Language),

    /// Language code is not recognized
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),
}

impl FtError {
    pub fn code(&self) -> ErrorCode {
        XQC0300
    }
}
