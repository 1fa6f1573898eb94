use quiver_core::spimi::Spimi;
use quiver_core::tokenizer::StopwordSet;
use quiver_core::DocId;
use std::collections::{HashMap, HashSet};

fn stopwords(words: &[&str]) -> StopwordSet {
    words.iter().map(|w| w.to_string()).collect()
}

/// The three-document collection used across the integration tests:
/// doc1 "the cat sat", doc2 "the cat ran fast", doc3 "a dog ran", with
/// "the" and "a" as stopwords.
fn tiny_collection() -> Vec<(DocId, Vec<&'static str>)> {
    vec![
        (1, vec!["the", "cat", "sat"]),
        (2, vec!["the", "cat", "ran", "fast"]),
        (3, vec!["a", "dog", "ran"]),
    ]
}

fn build(collection: &[(DocId, Vec<&'static str>)], passes: usize) -> Spimi {
    let mut spimi = Spimi::new(stopwords(&["the", "a"]));
    for _ in 0..passes {
        for (doc_id, tokens) in collection {
            for token in tokens {
                spimi.invert(token, *doc_id);
            }
        }
    }
    spimi
}

#[test]
fn builds_expected_dictionary() {
    let index = build(&tiny_collection(), 1).finish();

    let terms: Vec<&String> = index.dictionary.keys().collect();
    assert_eq!(terms, ["cat", "dog", "fast", "ran", "sat"]);

    let cat = &index.dictionary["cat"];
    assert_eq!(cat.document_frequency, 2);
    assert_eq!(
        cat.postings.iter().map(|(&d, &tf)| (d, tf)).collect::<Vec<_>>(),
        [(1, 1), (2, 1)]
    );
    let ran = &index.dictionary["ran"];
    assert_eq!(ran.document_frequency, 2);
    assert_eq!(
        ran.postings.iter().map(|(&d, &tf)| (d, tf)).collect::<Vec<_>>(),
        [(2, 1), (3, 1)]
    );
    for term in ["dog", "fast", "sat"] {
        assert_eq!(index.dictionary[term].document_frequency, 1);
    }

    assert_eq!(index.doc_info[&1].document_length, 3);
    assert_eq!(index.doc_info[&2].document_length, 4);
    assert_eq!(index.doc_info[&3].document_length, 3);
}

#[test]
fn df_sum_matches_distinct_terms_per_document() {
    let collection = tiny_collection();
    let index = build(&collection, 1).finish();

    let df_sum: u32 = index
        .dictionary
        .values()
        .map(|e| e.document_frequency)
        .sum();

    // count distinct non-stopword terms per document straight off the stream
    let stop = stopwords(&["the", "a"]);
    let mut distinct: HashMap<DocId, HashSet<&str>> = HashMap::new();
    for (doc_id, tokens) in &collection {
        for token in tokens {
            if !stop.contains(*token) {
                distinct.entry(*doc_id).or_default().insert(token);
            }
        }
    }
    let per_doc_sum: u32 = distinct.values().map(|s| s.len() as u32).sum();
    assert_eq!(df_sum, per_doc_sum);
}

#[test]
fn duplicate_ingestion_doubles_frequencies_not_df() {
    let collection = tiny_collection();
    let once = build(&collection, 1).finish();
    let twice = build(&collection, 2).finish();

    for (term, entry) in &once.dictionary {
        let doubled = &twice.dictionary[term];
        assert_eq!(doubled.document_frequency, entry.document_frequency);
        for (doc_id, tf) in &entry.postings {
            assert_eq!(doubled.postings[doc_id], tf * 2);
        }
    }
    for (doc_id, info) in &once.doc_info {
        assert_eq!(
            twice.doc_info[doc_id].document_length,
            info.document_length * 2
        );
    }
}

#[test]
fn avg_doc_len_includes_stopwords() {
    let index = build(&tiny_collection(), 1).finish();
    assert!((index.avg_doc_len() - 10.0 / 3.0).abs() < 1e-12);
}
