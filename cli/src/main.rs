//! `codescout` binary: offline code search and grounded answers over a
//! previously built JSON vector index.

use anyhow::Result;
use clap::{Parser, Subcommand};
use codescout_embeddings::EmbeddingService;
use codescout_retrieval::{
    ContextualReranker, RetrievalConfig, SearchEngine, SearchOutcome, SearchRequest,
};
use codescout_synthesis::{AnswerSynthesizer, OllamaClient, OllamaConfig, OllamaRewriter, OllamaSynthesizer};
use codescout_vector_index::JsonVectorIndex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "codescout", version, about = "Offline code search and grounded answers")]
struct Cli {
    /// Path to the JSON vector index
    #[arg(long, global = true, default_value = ".codescout/index.json")]
    index: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Retrieve the top-k code chunks for a query
    #[command(visible_alias = "s")]
    Search {
        query: String,

        /// Number of results to return
        #[arg(short, default_value_t = 5)]
        k: usize,

        /// Restrict results to one repository
        #[arg(long)]
        repo: Option<String>,

        /// Apply contextual re-ranking to the fused scores
        #[arg(long)]
        rerank: bool,

        /// Skip the model-backed query rewrite
        #[arg(long)]
        no_rewrite: bool,

        /// Print full chunk content, not just provenance
        #[arg(long)]
        show_chunks: bool,
    },

    /// Answer a question grounded in retrieved code
    #[command(visible_alias = "a")]
    Answer {
        question: String,

        /// Number of supporting chunks
        #[arg(short, default_value_t = 5)]
        k: usize,

        /// Restrict retrieval to one repository
        #[arg(long)]
        repo: Option<String>,

        /// Apply contextual re-ranking to the fused scores
        #[arg(long)]
        rerank: bool,

        /// Skip the model-backed query rewrite
        #[arg(long)]
        no_rewrite: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Search {
            query,
            k,
            repo,
            rerank,
            no_rewrite,
            show_chunks,
        } => {
            let engine = build_engine(&cli.index, rerank, no_rewrite).await?;
            let mut request = SearchRequest::new(query, k);
            if let Some(repo) = repo {
                request = request.with_repo(repo);
            }

            let outcome = engine.search(&request).await?;
            print_outcome(&outcome, show_chunks);
        }
        Command::Answer {
            question,
            k,
            repo,
            rerank,
            no_rewrite,
        } => {
            let engine = build_engine(&cli.index, rerank, no_rewrite).await?;
            let mut request = SearchRequest::new(question.clone(), k);
            if let Some(repo) = repo {
                request = request.with_repo(repo);
            }

            let outcome = engine.search(&request).await?;
            print_outcome(&outcome, false);

            let synthesizer =
                OllamaSynthesizer::new(OllamaClient::new(OllamaConfig::synthesis()));
            let answer = synthesizer.synthesize(&question, &outcome.results).await?;
            println!("\n{answer}");
        }
    }

    Ok(())
}

async fn build_engine(index_path: &Path, rerank: bool, no_rewrite: bool) -> Result<SearchEngine> {
    let embedder = Arc::new(EmbeddingService::new().await?);
    let index = Arc::new(JsonVectorIndex::open(index_path).await?);

    let mut engine = SearchEngine::new(embedder, index, RetrievalConfig::default())?;
    if !no_rewrite {
        let client = OllamaClient::new(OllamaConfig::rewrite());
        engine = engine.with_rewriter(Arc::new(OllamaRewriter::new(client)));
    }
    if rerank {
        engine = engine.with_reranker(Arc::new(ContextualReranker::new()));
    }
    Ok(engine)
}

fn print_outcome(outcome: &SearchOutcome, show_chunks: bool) {
    println!("\n--------------------------------------");
    println!("Original Query: {}", outcome.query);
    println!("Refined Query : {}", outcome.refined_query);
    println!("--------------------------------------");

    if outcome.filter_bypassed {
        println!("No filtered candidates - showing raw top-k.");
    }

    for result in &outcome.results {
        let chunk = &result.chunk;
        println!("\n=== Result {} ===", result.rank + 1);
        println!("Path     : {}", chunk.path);
        println!("Name     : {}", chunk.name);
        println!(
            "Qualified: {}",
            chunk.qualified_name.as_deref().unwrap_or("-")
        );
        println!("Kind     : {:?}", chunk.kind);
        println!("Repo     : {}", chunk.repo);
        println!("Score    : {:.3}", result.scores.final_score);

        if show_chunks {
            println!("\nCode:\n\n{}", chunk.content);
        }
    }

    let stats = &outcome.stats;
    println!(
        "\n{} results in {}ms ({} seeds, {} expanded, {} discovered)",
        outcome.len(),
        stats.total_time_ms,
        stats.seed_count,
        stats.expanded_count,
        stats.discovered_count
    );
    if stats.symbols_skipped > 0 {
        println!("{} symbol lookups skipped", stats.symbols_skipped);
    }
    if stats.cancelled {
        println!("expansion was cancelled before completion");
    }
}
