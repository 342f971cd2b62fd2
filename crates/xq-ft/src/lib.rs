//! Stemming for full-text matching
//!
//! Stemmers are provided by backends registered explicitly in a
//! [`StemmerRegistry`]. The registry picks the available backend with the
//! highest precedence for a language and falls back to the built-in
//! [`EnglishStemmer`].

mod english;
mod error;
mod language;
mod registry;

pub use english::EnglishStemmer;
pub use error::{FtError, FtResult};
pub use language::Language;
pub use registry::{BuiltinBackend, Stemmer, StemmerBackend, StemmerRegistry};
