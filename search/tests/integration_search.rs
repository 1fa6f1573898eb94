use quiver_core::persist::{save_meta, write_uncompressed, IndexPaths, MetaFile};
use quiver_core::rank::Weighting;
use quiver_core::spimi::Spimi;
use quiver_core::tokenizer::StopwordSet;
use quiver_search::Searcher;
use tempfile::tempdir;

fn build_tiny_index(dir: &std::path::Path) {
    let stopwords: StopwordSet = ["the", "a"].iter().map(|w| w.to_string()).collect();
    let mut spimi = Spimi::new(stopwords);
    for token in ["the", "cat", "sat"] {
        spimi.invert(token, 1);
    }
    for token in ["the", "cat", "ran", "fast"] {
        spimi.invert(token, 2);
    }
    for token in ["a", "dog", "ran"] {
        spimi.invert(token, 3);
    }
    let index = spimi.finish();

    let paths = IndexPaths::new(dir);
    write_uncompressed(&index, &paths).unwrap();
    save_meta(
        &paths,
        &MetaFile {
            num_docs: 3,
            created_at: "2026-01-01T00:00:00Z".into(),
            version: 1,
        },
    )
    .unwrap();
}

#[test]
fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let mut searcher = Searcher::open(dir.path().to_str().unwrap(), false).unwrap();
    let results = searcher.search("cat ran", 2, Weighting::MaxTf);
    assert_eq!(results.len(), 2);
    // doc2 holds both query terms and must outrank the single-term docs
    assert_eq!(results[0].0, 2);
    assert!(results[0].1 > results[1].1);
}

#[test]
fn stopword_only_query_is_empty_not_an_error() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let mut searcher = Searcher::open(dir.path().to_str().unwrap(), false).unwrap();
    assert!(searcher.search("the a", 10, Weighting::MaxTf).is_empty());
    assert!(searcher
        .search("zebra xylophone", 10, Weighting::LengthNorm)
        .is_empty());
}

#[test]
fn both_weightings_rank_the_same_winner_here() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let mut searcher = Searcher::open(dir.path().to_str().unwrap(), false).unwrap();
    for weighting in [Weighting::MaxTf, Weighting::LengthNorm] {
        let results = searcher.search("cat ran", 3, weighting);
        assert_eq!(results[0].0, 2, "winner changed under {weighting:?}");
    }
}
