//! Vector-space retrieval over the in-memory index.
//!
//! A ranking call weights every posting in the dictionary, accumulates each
//! document's weighted-length norm, scores documents by dot product against
//! the query vector, and normalizes by both vector lengths. All per-document
//! accumulators live in scratch state owned by the call, so concurrent
//! queries against the same index share nothing mutable.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::spimi::Index;
use crate::DocId;

/// Selectable document term weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    /// w1: scales tf against the document's maximum term frequency.
    MaxTf,
    /// w2: Okapi-style scaling of tf against document length relative to
    /// the corpus mean.
    LengthNorm,
}

/// Bag-of-words view of a parsed query. Terms arrive normalized and
/// stopword-free from the analyzer.
#[derive(Debug, Default)]
pub struct QueryBag {
    terms: BTreeMap<String, u32>,
    max_tf: u32,
}

impl QueryBag {
    pub fn from_terms<I>(terms: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut bag = QueryBag::default();
        for term in terms {
            let tf = bag.terms.entry(term.into()).or_insert(0);
            *tf += 1;
            bag.max_tf = bag.max_tf.max(*tf);
        }
        bag
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn max_tf(&self) -> u32 {
        self.max_tf
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, u32)> {
        self.terms.iter().map(|(t, &tf)| (t, tf))
    }
}

/// ln(N/df)/ln(N), the shared rarity factor of both weightings. Guarded so
/// degenerate collections (N <= 1) contribute zero instead of NaN.
fn idf(n: f64, df: u32) -> f64 {
    if df == 0 {
        return 0.0;
    }
    let value = (n / df as f64).ln() / n.ln();
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// w1: `(0.4 + 0.6 * ln(tf + 0.5) / ln(maxTf + 1)) * ln(N/df)/ln(N)`.
fn max_tf_weight(tf: u32, max_tf: u32, df: u32, n: f64) -> f64 {
    if tf == 0 || max_tf == 0 || df == 0 {
        return 0.0;
    }
    let scaled = 0.4 + 0.6 * (tf as f64 + 0.5).ln() / (max_tf as f64 + 1.0).ln();
    scaled * idf(n, df)
}

/// w2: `(0.4 + 0.6 * tf / (tf + 0.5 + 1.5 * docLen/avgDocLen)) * ln(N/df)/ln(N)`.
fn length_norm_weight(tf: u32, doc_len: u32, df: u32, n: f64, avg_doc_len: f64) -> f64 {
    if tf == 0 || doc_len == 0 || df == 0 {
        return 0.0;
    }
    let tf = tf as f64;
    let scaled = 0.4 + 0.6 * tf / (tf + 0.5 + 1.5 * doc_len as f64 / avg_doc_len);
    scaled * idf(n, df)
}

/// Weighted term frequency of one posting under the selected weighting.
fn doc_weight(
    index: &Index,
    weighting: Weighting,
    doc_id: DocId,
    tf: u32,
    df: u32,
    n: f64,
    avg_doc_len: f64,
) -> f64 {
    let Some(info) = index.doc_info.get(&doc_id) else {
        return 0.0;
    };
    match weighting {
        Weighting::MaxTf => max_tf_weight(tf, info.max_term_frequency, df, n),
        Weighting::LengthNorm => {
            length_norm_weight(tf, info.document_length, df, n, avg_doc_len)
        }
    }
}

/// Rank the collection against a query and return the top `k` documents as
/// `(docId, score)` in descending score order, ties broken by ascending
/// docId. A query of only unknown terms yields an empty list.
pub fn rank(index: &Index, query_terms: &[String], k: usize, weighting: Weighting) -> Vec<(DocId, f64)> {
    let bag = QueryBag::from_terms(query_terms.iter().cloned());
    if bag.is_empty() {
        return Vec::new();
    }
    let n = index.num_docs() as f64;
    let avg_doc_len = index.avg_doc_len();

    // Weighted-length pass over the whole dictionary. The accumulator is
    // fresh per call, which is what makes repeated and concurrent queries
    // read the same norms.
    let mut norms: HashMap<DocId, f64> = HashMap::new();
    for entry in index.dictionary.values() {
        for (&doc_id, &tf) in &entry.postings {
            let w = doc_weight(
                index,
                weighting,
                doc_id,
                tf,
                entry.document_frequency,
                n,
                avg_doc_len,
            );
            *norms.entry(doc_id).or_insert(0.0) += w * w;
        }
    }

    // Dot product of query and document vectors. Query weights always use
    // the maxTf form against the bag's own maximum frequency.
    let mut scores: HashMap<DocId, f64> = HashMap::new();
    let mut query_len_sq = 0.0;
    for (term, tf_q) in bag.iter() {
        let Some(entry) = index.dictionary.get(term) else {
            // absent from the dictionary: contributes zero, not an error
            continue;
        };
        let w_q = max_tf_weight(tf_q, bag.max_tf(), entry.document_frequency, n);
        if w_q == 0.0 {
            continue;
        }
        query_len_sq += w_q * w_q;
        for (&doc_id, &tf) in &entry.postings {
            let w_td = doc_weight(
                index,
                weighting,
                doc_id,
                tf,
                entry.document_frequency,
                n,
                avg_doc_len,
            );
            *scores.entry(doc_id).or_insert(0.0) += w_q * w_td;
        }
    }

    let query_len = query_len_sq.sqrt();
    let mut ranked: Vec<(DocId, f64)> = scores
        .into_iter()
        .map(|(doc_id, dot)| {
            let doc_len = norms.get(&doc_id).copied().unwrap_or(0.0).sqrt();
            let denominator = doc_len * query_len;
            let score = if denominator > 0.0 {
                dot / denominator
            } else {
                0.0
            };
            (doc_id, score)
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(k);
    ranked
}
