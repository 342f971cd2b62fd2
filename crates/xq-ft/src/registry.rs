//! Stemmer backends and their registry

use log::{debug, warn};
use std::collections::BTreeSet;

use crate::{EnglishStemmer, FtError, FtResult, Language};

/// Reduces words of one language to their stems
pub trait Stemmer {
    fn language(&self) -> Language;

    fn stem(&self, word: &str) -> String;
}

/// A source of stemmers for one or more languages
pub trait StemmerBackend {
    /// Name used in log output
    fn name(&self) -> &str;

    /// Whether the backend can be used, e.g. its dictionaries are present
    fn is_available(&self) -> bool;

    fn supported_languages(&self) -> BTreeSet<Language>;

    /// Backends with higher precedence are preferred
    fn precedence(&self) -> u32;

    fn create(&self, lang: Language) -> Option<Box<dyn Stemmer>>;
}

/// Backend wrapping the built-in [`EnglishStemmer`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinBackend;

impl StemmerBackend for BuiltinBackend {
    fn name(&self) -> &str {
        "builtin"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn supported_languages(&self) -> BTreeSet<Language> {
        BTreeSet::from([Language::En])
    }

    fn precedence(&self) -> u32 {
        0
    }

    fn create(&self, lang: Language) -> Option<Box<dyn Stemmer>> {
        (lang == Language::En).then(|| Box::new(EnglishStemmer) as Box<dyn Stemmer>)
    }
}

/// Registry of stemmer backends, populated at startup
#[derive(Default)]
pub struct StemmerRegistry {
    /// Sorted by descending precedence
    backends: Vec<Box<dyn StemmerBackend>>,
}

impl StemmerRegistry {
    /// Create an empty registry; English is still served by the built-in stemmer
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry containing the built-in backend
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(BuiltinBackend));
        registry
    }

    pub fn register(&mut self, backend: Box<dyn StemmerBackend>) {
        if backend.is_available() {
            debug!(
                "registered stemmer backend '{}' for {:?}",
                backend.name(),
                backend.supported_languages()
            );
        } else {
            warn!("stemmer backend '{}' is not available", backend.name());
        }
        let pos = self
            .backends
            .iter()
            .position(|b| b.precedence() < backend.precedence())
            .unwrap_or(self.backends.len());
        self.backends.insert(pos, backend);
    }

    fn available(&self) -> impl Iterator<Item = &dyn StemmerBackend> {
        self.backends
            .iter()
            .map(|b| &**b)
            .filter(|b| b.is_available())
    }

    /// Whether any registered backend is available
    pub fn is_available(&self) -> bool {
        self.available().next().is_some()
    }

    /// Languages with a stemmer, including the built-in English fallback
    pub fn supported_languages(&self) -> BTreeSet<Language> {
        let mut langs = BTreeSet::from([Language::En]);
        for backend in self.available() {
            langs.extend(backend.supported_languages());
        }
        langs
    }

    pub fn supports(&self, lang: Language) -> bool {
        lang == Language::En || self.available().any(|b| b.supported_languages().contains(&lang))
    }

    /// Stemmer of the preferred backend for `lang`
    pub fn stemmer(&self, lang: Language) -> FtResult<Box<dyn Stemmer>> {
        let found = self
            .available()
            .filter(|b| b.supported_languages().contains(&lang))
            .find_map(|b| b.create(lang));
        match found {
            Some(stemmer) => Ok(stemmer),
            None if lang == Language::En => Ok(Box::new(EnglishStemmer)),
            None => Err(FtError::UnsupportedLanguage(lang)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Strips a fixed suffix; stands in for a dictionary-based backend
    struct SuffixBackend {
        name: &'static str,
        langs: Vec<Language>,
        suffix: &'static str,
        precedence: u32,
        available: bool,
    }

    struct SuffixStemmer {
        lang: Language,
        suffix: &'static str,
    }

    impl Stemmer for SuffixStemmer {
        fn language(&self) -> Language {
            self.lang
        }

        fn stem(&self, word: &str) -> String {
            word.strip_suffix(self.suffix).unwrap_or(word).to_string()
        }
    }

    impl StemmerBackend for SuffixBackend {
        fn name(&self) -> &str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn supported_languages(&self) -> BTreeSet<Language> {
            self.langs.iter().copied().collect()
        }

        fn precedence(&self) -> u32 {
            self.precedence
        }

        fn create(&self, lang: Language) -> Option<Box<dyn Stemmer>> {
            Some(Box::new(SuffixStemmer {
                lang,
                suffix: self.suffix,
            }))
        }
    }

    fn backend(name: &'static str, langs: &[Language], suffix: &'static str, precedence: u32) -> Box<SuffixBackend> {
        Box::new(SuffixBackend {
            name,
            langs: langs.to_vec(),
            suffix,
            precedence,
            available: true,
        })
    }

    #[test]
    fn test_english_fallback() {
        let registry = StemmerRegistry::new();
        assert!(!registry.is_available());
        assert!(registry.supports(Language::En));
        assert_eq!(registry.stemmer(Language::En).unwrap().stem("cats"), "cat");
        assert_eq!(
            registry.stemmer(Language::De).err(),
            Some(FtError::UnsupportedLanguage(Language::De))
        );
    }

    #[test]
    fn test_precedence() {
        let mut registry = StemmerRegistry::with_builtin();
        registry.register(backend("low", &[Language::De], "en", 10));
        registry.register(backend("high", &[Language::De, Language::En], "n", 200));

        let de = registry.stemmer(Language::De).unwrap();
        assert_eq!(de.language(), Language::De);
        assert_eq!(de.stem("laufen"), "laufe");
        assert_eq!(registry.stemmer(Language::En).unwrap().stem("run"), "ru");
    }

    #[test]
    fn test_unavailable_backend_is_skipped() {
        let mut registry = StemmerRegistry::new();
        let mut missing = backend("missing", &[Language::Fr], "s", 100);
        missing.available = false;
        registry.register(missing);

        assert!(!registry.is_available());
        assert!(!registry.supports(Language::Fr));
        assert_eq!(registry.supported_languages(), BTreeSet::from([Language::En]));
        assert!(registry.stemmer(Language::Fr).is_err());
    }

    #[test]
    fn test_supported_languages() {
        let mut registry = StemmerRegistry::with_builtin();
        registry.register(backend("snowball", &[Language::Nl, Language::Ru], "", 200));
        assert!(registry.is_available());
        assert_eq!(
            registry.supported_languages(),
            BTreeSet::from([Language::En, Language::Nl, Language::Ru])
        );
        assert!(registry.supports(Language::Ru));
        assert!(!registry.supports(Language::Es));
    }
}
