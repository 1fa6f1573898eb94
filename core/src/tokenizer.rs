use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

pub type StopwordSet = HashSet<String>;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_'.\-]*").expect("valid regex");
    // single letters separated by dots, e.g. u.s.a. -> usa
    static ref ACRONYM: Regex = Regex::new(r"^(?:[a-z]\.){1,5}[a-z]\.?$").expect("valid regex");
}

/// Stopword list used when the caller does not supply one.
pub fn default_stopwords() -> StopwordSet {
    let words: &[&str] = &[
        "a", "all", "an", "and", "any", "are", "as", "be", "been", "but", "by", "few", "for",
        "have", "he", "her", "here", "him", "his", "how", "i", "in", "is", "it", "its", "many",
        "me", "my", "none", "of", "on", "or", "our", "she", "some", "the", "their", "them",
        "there", "they", "that", "this", "us", "was", "what", "when", "where", "which", "who",
        "why", "will", "with", "you", "your",
    ];
    words.iter().map(|w| w.to_string()).collect()
}

/// Produces normalized terms for both the indexing and query paths.
///
/// Holds the stopword set and the memoizing stem cache as owned state so
/// nothing here is process-global; construct one and pass it by reference
/// wherever terms are produced.
pub struct Analyzer {
    stopwords: StopwordSet,
    stemmer: Option<Stemmer>,
    stem_cache: HashMap<String, String>,
}

impl Analyzer {
    pub fn new(stopwords: StopwordSet, stemming: bool) -> Self {
        Self {
            stopwords,
            stemmer: stemming.then(|| Stemmer::create(Algorithm::English)),
            stem_cache: HashMap::new(),
        }
    }

    pub fn is_stopword(&self, term: &str) -> bool {
        self.stopwords.contains(term)
    }

    pub fn stopwords(&self) -> &StopwordSet {
        &self.stopwords
    }

    /// Tokenize with NFKC normalization and lowercasing. Stopwords are kept:
    /// the inversion engine counts them toward document statistics before
    /// discarding them.
    pub fn tokenize(&mut self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut tokens = Vec::new();
        for mat in WORD.find_iter(&normalized) {
            for piece in split_token(mat.as_str()) {
                tokens.push(self.analyze(&piece));
            }
        }
        tokens
    }

    /// Query-side tokenization: same pipeline as documents, minus stopwords.
    pub fn query_terms(&mut self, text: &str) -> Vec<String> {
        self.tokenize(text)
            .into_iter()
            .filter(|t| !self.stopwords.contains(t))
            .collect()
    }

    fn analyze(&mut self, piece: &str) -> String {
        // stopwords stay unstemmed so the predicate keeps matching them
        if self.stopwords.contains(piece) {
            return piece.to_string();
        }
        self.stem(piece)
    }

    fn stem(&mut self, token: &str) -> String {
        let Some(stemmer) = &self.stemmer else {
            return token.to_string();
        };
        if let Some(hit) = self.stem_cache.get(token) {
            return hit.clone();
        }
        let stemmed = stemmer.stem(token).to_string();
        self.stem_cache.insert(token.to_string(), stemmed.clone());
        stemmed
    }
}

/// Re-tokenize a raw match: collapse dotted acronyms, otherwise split on
/// punctuation and drop pieces without an alphabetic character.
fn split_token(token: &str) -> Vec<String> {
    if ACRONYM.is_match(token) {
        return vec![token.replace('.', "")];
    }
    token
        .split(|c: char| !c.is_alphanumeric())
        .filter(|p| p.chars().any(|c| c.is_alphabetic()))
        .map(|p| p.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_acronyms() {
        let mut analyzer = Analyzer::new(StopwordSet::new(), false);
        let tokens = analyzer.tokenize("works at i.b.m. now");
        assert!(tokens.contains(&"ibm".to_string()));
    }

    #[test]
    fn drops_non_alphabetic_pieces() {
        let mut analyzer = Analyzer::new(StopwordSet::new(), false);
        let tokens = analyzer.tokenize("mach 0.8 flow");
        assert_eq!(tokens, vec!["mach", "flow"]);
    }

    #[test]
    fn stem_cache_is_consistent() {
        let mut analyzer = Analyzer::new(StopwordSet::new(), true);
        let first = analyzer.tokenize("running");
        let second = analyzer.tokenize("running");
        assert_eq!(first, second);
        assert_eq!(first, vec!["run"]);
    }
}
