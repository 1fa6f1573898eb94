use anyhow::Result;
use clap::{Parser, Subcommand};
use quiver_core::codes::GapCode;
use quiver_core::persist::{
    save_meta, write_compressed, write_uncompressed, CompressionParams, IndexPaths, MetaFile,
};
use quiver_core::spimi::Spimi;
use quiver_core::tokenizer::{default_stopwords, Analyzer};
use quiver_core::DocId;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    #[allow(dead_code)]
    id: Option<String>,
    #[allow(dead_code)]
    title: Option<String>,
    body: String,
}

#[derive(Parser)]
#[command(name = "quiver-indexer")]
#[command(about = "Build a compressed inverted index from a document collection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Dictionary terms per compressed block
        #[arg(long, default_value_t = 8)]
        block_size: usize,
        /// Stem tokens with an English stemmer
        #[arg(long, default_value_t = false)]
        stemming: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            block_size,
            stemming,
        } => build_index(&input, &output, block_size, stemming),
    }
}

fn build_index(input: &str, output: &str, block_size: usize, stemming: bool) -> Result<()> {
    let input_path = Path::new(input);
    let mut analyzer = Analyzer::new(default_stopwords(), stemming);
    let mut spimi = Spimi::new(analyzer.stopwords().clone());
    let mut next_doc_id: DocId = 1;

    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    }

    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            ingest_jsonl(&file, &mut analyzer, &mut spimi, &mut next_doc_id)?;
        } else {
            ingest_json(&file, &mut analyzer, &mut spimi, &mut next_doc_id)?;
        }
    }

    let index = spimi.finish();
    let num_docs = index.num_docs() as u32;
    tracing::info!(
        num_docs,
        num_terms = index.num_terms(),
        "ingested documents"
    );

    let paths = IndexPaths::new(output);
    write_uncompressed(&index, &paths)?;
    write_compressed(
        &index,
        &paths,
        &CompressionParams {
            block_size,
            code: GapCode::Gamma,
            front_coding: false,
        },
    )?;
    write_compressed(
        &index,
        &paths,
        &CompressionParams {
            block_size,
            code: GapCode::Delta,
            front_coding: true,
        },
    )?;

    let meta = MetaFile {
        num_docs,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: 1,
    };
    save_meta(&paths, &meta)?;

    tracing::info!(output, "index build complete");
    Ok(())
}

/// Tokenize a document and feed it through the inversion engine. DocIds are
/// assigned sequentially, which keeps the engine's non-decreasing ordering
/// contract intact.
fn ingest_doc(
    doc: &InputDoc,
    analyzer: &mut Analyzer,
    spimi: &mut Spimi,
    next_doc_id: &mut DocId,
) {
    let doc_id = *next_doc_id;
    *next_doc_id += 1;
    let tokens = analyzer.tokenize(&doc.body);
    spimi.add_document(doc_id, &tokens);
}

fn ingest_jsonl(
    file: &Path,
    analyzer: &mut Analyzer,
    spimi: &mut Spimi,
    next_doc_id: &mut DocId,
) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line)?;
        ingest_doc(&doc, analyzer, spimi, next_doc_id);
    }
    Ok(())
}

fn ingest_json(
    file: &Path,
    analyzer: &mut Analyzer,
    spimi: &mut Spimi,
    next_doc_id: &mut DocId,
) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for value in arr {
                let doc: InputDoc = serde_json::from_value(value)?;
                ingest_doc(&doc, analyzer, spimi, next_doc_id);
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json)?;
            ingest_doc(&doc, analyzer, spimi, next_doc_id);
        }
        _ => {}
    }
    Ok(())
}
