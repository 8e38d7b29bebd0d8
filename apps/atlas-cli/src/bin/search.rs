use std::env;

use atlas_cli::args::SearchArgs;
use atlas_cli::{build_index, init_tracing};
use atlas_core::config::Config;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = match SearchArgs::parse(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Usage: atlas-search <query> [--limit N]");
            eprintln!("Example: atlas-search 'cardiologist available Monday' --limit 5");
            std::process::exit(1);
        }
    };

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    let index = build_index(&settings, &env::current_dir()?);

    let hits = index.search(&args.query, args.limit);
    println!("Found {} results for: \"{}\"", hits.len(), args.query);
    for (i, hit) in hits.iter().enumerate() {
        let doc = hit.document;
        println!(
            "\n  {}. score={:.4}  id={}  name={}  specialty={}",
            i + 1,
            hit.score,
            doc.id,
            doc.display_name(),
            doc.specialty.as_deref().unwrap_or("-")
        );
        if let Some(availability) = doc.availability.as_deref() {
            println!("     availability: {availability}");
        }
        if let Some(bio) = doc.bio.as_deref() {
            println!("     {bio}");
        }
    }
    Ok(())
}
