use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tabrag::archive;
use tabrag::embeddings::build_embedder;
use tabrag::ingest::{run_ingestion, ThresholdClassifier};
use tabrag::store::ProgressStore;
use tabrag::Config;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Ingest one archive member into the vector index (resumes by default)")]
struct Args {
    /// Path to the zip archive
    zip: PathBuf,

    /// Name of the member inside the archive
    member: String,

    /// Discard any persisted snapshot and start over
    #[arg(short, long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();

    log::info!("Starting tabrag ingestion");

    let config = Config::load()?;
    log::info!("Configuration loaded successfully");
    log::info!("State dir: {}", config.state_dir().display());

    let zip_bytes = std::fs::read(&args.zip)?;
    let member = archive::find_member(&zip_bytes, &args.member)?;
    log::info!("Member {} ({} columns)", member.name, member.column_count);

    let store = ProgressStore::new(config.state_dir());
    if args.fresh {
        let key = ProgressStore::derive_key(&archive::archive_hash(&zip_bytes), &member.name);
        store.clear(&key);
        log::info!("Cleared persisted snapshot, starting fresh");
    }

    let embedder = build_embedder(&config)?;
    let classifier = ThresholdClassifier::default();

    let start = Instant::now();
    let state = run_ingestion(
        &zip_bytes,
        &member,
        embedder.as_ref(),
        &classifier,
        &store,
        config.tabrag.chunk_size,
    )
    .await?;
    let duration = start.elapsed();

    let table = state
        .table
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("ingestion produced no table"))?;

    println!("\nIngestion complete in {:.1}s", duration.as_secs_f64());
    println!("Rows: {}", table.row_count());
    println!("Indexed documents: {}", state.documents.len());
    println!("\nColumns:");
    for name in table.columns() {
        let class = state
            .column_classes
            .get(name)
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("  {} ({})", name, class);
    }

    Ok(())
}
