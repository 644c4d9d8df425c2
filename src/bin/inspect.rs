use clap::Parser;
use std::path::PathBuf;
use tabrag::archive;

#[derive(Parser, Debug)]
#[command(name = "inspect")]
#[command(about = "List the tabular members of a zip archive with their headers")]
struct Args {
    /// Path to the zip archive
    zip: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let zip_bytes = std::fs::read(&args.zip)?;
    let members = archive::inspect_archive(&zip_bytes)?;

    println!("Archive: {}", args.zip.display());
    println!("Content hash: {}", archive::archive_hash(&zip_bytes));
    println!();

    if members.is_empty() {
        println!("No tabular members found.");
        return Ok(());
    }

    for member in &members {
        println!("─────────────────────────────────────────────────────────────");
        println!("{} ({:?}, {} columns)", member.name, member.format, member.column_count);
        println!("Columns: {}", member.schema_text());
    }
    println!("─────────────────────────────────────────────────────────────");
    println!("\n{} tabular member(s).", members.len());

    Ok(())
}
