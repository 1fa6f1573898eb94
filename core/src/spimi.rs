//! Single-pass in-memory inversion.
//!
//! The engine consumes a stream of (term, docId) pairs with docIds arriving
//! in non-decreasing order and builds the sorted dictionary plus per-document
//! statistics in one scan. Using an ordered map for the dictionary means no
//! sort pass is needed at the end: in-order iteration is already the
//! lexicographic term order the codec and ranker rely on.

use std::collections::BTreeMap;

use crate::tokenizer::StopwordSet;
use crate::DocId;

/// Per-document aggregates, created on the first occurrence of a docId and
/// updated by every later token attributed to it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Largest within-document term frequency seen so far, stopwords included.
    pub max_term_frequency: u32,
    /// Count of token occurrences in the document, stopwords included.
    pub document_length: u32,
}

/// A term's postings: document frequency plus an ordered docId -> term
/// frequency map. Ascending docId order falls out of map iteration.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PostingsEntry {
    /// Number of distinct documents containing the term, counting the one
    /// that introduced it.
    pub document_frequency: u32,
    pub postings: BTreeMap<DocId, u32>,
}

/// The finalized in-memory index: the sole input to both the codec and the
/// ranker. Immutable once built.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Index {
    pub dictionary: BTreeMap<String, PostingsEntry>,
    pub doc_info: BTreeMap<DocId, DocumentInfo>,
}

impl Index {
    pub fn num_docs(&self) -> usize {
        self.doc_info.len()
    }

    pub fn num_terms(&self) -> usize {
        self.dictionary.len()
    }

    /// Corpus document frequency of a term; zero when absent.
    pub fn document_frequency(&self, term: &str) -> u32 {
        self.dictionary
            .get(term)
            .map(|e| e.document_frequency)
            .unwrap_or(0)
    }

    /// Mean document length over the collection, stopwords included.
    pub fn avg_doc_len(&self) -> f64 {
        if self.doc_info.is_empty() {
            return 0.0;
        }
        let total: u64 = self
            .doc_info
            .values()
            .map(|d| d.document_length as u64)
            .sum();
        total as f64 / self.doc_info.len() as f64
    }
}

/// The inversion engine. Owns the dictionary and document statistics for the
/// duration of the build; `invert` is strictly sequential.
#[derive(Debug)]
pub struct Spimi {
    dictionary: BTreeMap<String, PostingsEntry>,
    doc_info: BTreeMap<DocId, DocumentInfo>,
    stopwords: StopwordSet,
}

impl Spimi {
    /// The stopword set is read-only configuration for the whole build;
    /// stopwords count toward document statistics but never enter the
    /// dictionary.
    pub fn new(stopwords: StopwordSet) -> Self {
        Self {
            dictionary: BTreeMap::new(),
            doc_info: BTreeMap::new(),
            stopwords,
        }
    }

    /// Process one token occurrence. Callers must supply docIds in
    /// non-decreasing order across the whole stream; all occurrences of a
    /// docId are contiguous, so document boundaries stay implicit.
    pub fn invert(&mut self, term: &str, doc_id: DocId) {
        self.doc_info.entry(doc_id).or_default().document_length += 1;
        if self.stopwords.contains(term) {
            return;
        }

        let entry = self.dictionary.entry(term.to_string()).or_default();
        let tf = entry.postings.entry(doc_id).or_insert(0);
        if *tf == 0 {
            entry.document_frequency += 1;
        }
        *tf += 1;
        let tf = *tf;

        // Track the within-document maximum term frequency, not the term's
        // corpus-wide document frequency.
        if let Some(info) = self.doc_info.get_mut(&doc_id) {
            if tf > info.max_term_frequency {
                info.max_term_frequency = tf;
            }
        }
    }

    /// Feed a whole document's token stream through `invert`.
    pub fn add_document(&mut self, doc_id: DocId, tokens: &[String]) {
        for token in tokens {
            self.invert(token, doc_id);
        }
    }

    pub fn finish(self) -> Index {
        tracing::debug!(
            num_terms = self.dictionary.len(),
            num_docs = self.doc_info.len(),
            "finalized in-memory index"
        );
        Index {
            dictionary: self.dictionary,
            doc_info: self.doc_info,
        }
    }
}
