use clap::Parser;
use std::path::PathBuf;
use tabrag::analysis::{answer_question, clarify_question, GeminiGenerator};
use tabrag::archive;
use tabrag::embeddings::build_embedder;
use tabrag::ingest::{classify_table, ThresholdClassifier};
use tabrag::store::ProgressStore;
use tabrag::Config;

#[derive(Parser, Debug)]
#[command(name = "ask")]
#[command(about = "Answer a question about an ingested member via retrieval + generation")]
struct Args {
    /// Path to the zip archive
    zip: PathBuf,

    /// Name of the member inside the archive
    member: String,

    /// Question in natural language
    question: String,

    /// Rewrite the question for clarity before answering
    #[arg(short, long)]
    clarify: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();
    let config = Config::load()?;

    let zip_bytes = std::fs::read(&args.zip)?;
    let key = ProgressStore::derive_key(&archive::archive_hash(&zip_bytes), &args.member);
    let store = ProgressStore::new(config.state_dir());
    let snapshot = store.load(&key).ok_or_else(|| {
        anyhow::anyhow!(
            "no persisted snapshot for {}; run `ingest` first",
            args.member
        )
    })?;

    let mut table = snapshot.table;
    let classes = classify_table(&mut table, &ThresholdClassifier::default());

    let api_key = std::env::var(&config.generation.api_key_env).map_err(|_| {
        anyhow::anyhow!(
            "Environment variable {} not set",
            config.generation.api_key_env
        )
    })?;
    let generator = GeminiGenerator::new(api_key, config.generation.model.clone());
    let embedder = build_embedder(&config)?;

    let question = if args.clarify {
        let clarified = clarify_question(&args.question, &generator).await;
        if clarified != args.question {
            log::info!("Clarified question: {}", clarified);
        }
        clarified
    } else {
        args.question.clone()
    };

    let reply = answer_question(
        &question,
        &table,
        &classes,
        Some(&snapshot.index),
        &snapshot.documents,
        &args.member,
        embedder.as_ref(),
        &generator,
        config.retrieval.top_k,
        None,
    )
    .await;

    // Generation failure is rendered to the user, not propagated as a crash.
    match reply {
        Ok(answer) => println!("\n{}", answer.trim()),
        Err(e) => println!("\nError: {}", e),
    }

    Ok(())
}
