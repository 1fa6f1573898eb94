use quiver_core::tokenizer::{default_stopwords, Analyzer};

#[test]
fn it_normalizes_and_stems() {
    let mut analyzer = Analyzer::new(default_stopwords(), true);
    let tokens = analyzer.tokenize("Running Runners RUN! The café menu.");
    // Stemming to "run" should appear
    assert!(tokens.contains(&"run".to_string()));
    // Unicode normalization keeps the accented word intact but lowercased
    assert!(tokens.contains(&"café".to_string()) || tokens.contains(&"cafe".to_string()));
}

#[test]
fn stopwords_survive_tokenization_for_statistics() {
    let mut analyzer = Analyzer::new(default_stopwords(), false);
    let tokens = analyzer.tokenize("The quick brown fox and the lazy dog");
    // the indexing path keeps stopwords so document lengths count them
    assert!(tokens.contains(&"the".to_string()));
    assert!(analyzer.is_stopword("the"));
}

#[test]
fn query_terms_drop_stopwords() {
    let mut analyzer = Analyzer::new(default_stopwords(), false);
    let terms = analyzer.query_terms("the cat and a dog");
    assert_eq!(terms, vec!["cat", "dog"]);
}

#[test]
fn stopwords_are_not_stemmed() {
    // "was" would stem to "wa", which would no longer match the predicate
    let mut analyzer = Analyzer::new(default_stopwords(), true);
    let tokens = analyzer.tokenize("it was here");
    assert_eq!(tokens, vec!["it", "was", "here"]);
}
