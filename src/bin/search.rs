use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tabrag::archive;
use tabrag::embeddings::build_embedder;
use tabrag::search::retrieve_context;
use tabrag::store::ProgressStore;
use tabrag::Config;

#[derive(Parser, Debug)]
#[command(name = "search")]
#[command(about = "Retrieve the closest row documents for a query from a persisted index")]
struct Args {
    /// Path to the zip archive
    zip: PathBuf,

    /// Name of the member inside the archive
    member: String,

    /// Natural-language query
    query: String,

    /// Number of results to return
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    if args.query.trim().is_empty() {
        anyhow::bail!("Query cannot be empty");
    }

    let config = Config::load()?;
    let top_k = args.top_k.unwrap_or(config.retrieval.top_k);

    let zip_bytes = std::fs::read(&args.zip)?;
    let key = ProgressStore::derive_key(&archive::archive_hash(&zip_bytes), &args.member);
    let store = ProgressStore::new(config.state_dir());
    let snapshot = store.load(&key).ok_or_else(|| {
        anyhow::anyhow!(
            "no persisted index for {}; run `ingest` first",
            args.member
        )
    })?;

    let embedder = build_embedder(&config)?;

    let start = Instant::now();
    let results = retrieve_context(
        &args.query,
        Some(&snapshot.index),
        &snapshot.documents,
        embedder.as_ref(),
        top_k,
    )
    .await?;
    let duration = start.elapsed();

    println!("\nQuery: \"{}\"\n", args.query);

    if results.is_empty() {
        println!("No results found.");
    } else {
        for result in &results {
            println!("─────────────────────────────────────────────────────────────");
            println!("Row {} (distance: {:.3})", result.row, result.distance);
            println!("{}", result.document);
        }
        println!("─────────────────────────────────────────────────────────────");
    }

    println!(
        "\n{} result(s) in {:.0}ms over {} indexed rows.",
        results.len(),
        duration.as_secs_f64() * 1000.0,
        snapshot.index.len()
    );

    Ok(())
}
