use anyhow::Result;
use quiver_core::persist::{load_meta, read_uncompressed, IndexPaths};
use quiver_core::rank::{rank, Weighting};
use quiver_core::spimi::Index;
use quiver_core::tokenizer::{default_stopwords, Analyzer};
use quiver_core::DocId;

/// A loaded index plus the analyzer configuration queries are parsed with.
pub struct Searcher {
    index: Index,
    analyzer: Analyzer,
}

impl Searcher {
    /// Load the uncompressed variant from an index directory.
    pub fn open(index_dir: &str, stemming: bool) -> Result<Self> {
        let paths = IndexPaths::new(index_dir);
        let index = read_uncompressed(&paths)?;
        if let Ok(meta) = load_meta(&paths) {
            tracing::debug!(
                num_docs = meta.num_docs,
                created_at = %meta.created_at,
                "loaded index metadata"
            );
        }
        tracing::info!(
            num_docs = index.num_docs(),
            num_terms = index.num_terms(),
            "index loaded"
        );
        Ok(Self {
            index,
            analyzer: Analyzer::new(default_stopwords(), stemming),
        })
    }

    /// Analyze the query text and return the top-k `(docId, score)` pairs.
    /// A query of only stopwords or unknown terms returns an empty list.
    pub fn search(&mut self, query: &str, k: usize, weighting: Weighting) -> Vec<(DocId, f64)> {
        let terms = self.analyzer.query_terms(query);
        tracing::debug!(?terms, "parsed query");
        rank(&self.index, &terms, k, weighting)
    }
}
