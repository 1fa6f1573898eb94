use anyhow::Result;
use clap::{Parser, ValueEnum};
use quiver_core::rank::Weighting;
use quiver_search::Searcher;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WeightingArg {
    /// maxTf-scaled term weighting
    W1,
    /// document-length-normalized term weighting
    W2,
}

impl From<WeightingArg> for Weighting {
    fn from(arg: WeightingArg) -> Self {
        match arg {
            WeightingArg::W1 => Weighting::MaxTf,
            WeightingArg::W2 => Weighting::LengthNorm,
        }
    }
}

#[derive(Parser)]
#[command(name = "quiver-search")]
#[command(about = "Rank documents against a free-text query", long_about = None)]
struct Args {
    /// Index directory path
    #[arg(long, default_value = "./index")]
    index: String,
    /// Number of results to return
    #[arg(long, default_value_t = 10)]
    k: usize,
    /// Term weighting function
    #[arg(long, value_enum, default_value = "w1")]
    weighting: WeightingArg,
    /// Stem query tokens (must match how the index was built)
    #[arg(long, default_value_t = false)]
    stemming: bool,
    /// Query text
    query: Vec<String>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let mut searcher = Searcher::open(&args.index, args.stemming)?;
    let query = args.query.join(" ");
    let results = searcher.search(&query, args.k, args.weighting.into());

    if results.is_empty() {
        println!("no matching documents");
        return Ok(());
    }
    for (rank, (doc_id, score)) in results.iter().enumerate() {
        println!("{:>3}. doc {:<8} {:.6}", rank + 1, doc_id, score);
    }
    Ok(())
}
