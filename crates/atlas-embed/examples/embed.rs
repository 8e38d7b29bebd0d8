use atlas_core::config::Config;
use atlas_embed::get_default_embedder;

fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let embedder = get_default_embedder(&settings.embed)?;
    let texts = vec!["cardiologist available Monday".to_string(), "طبيب قلب".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("B={} dim={}", embs.len(), embedder.dim());
    Ok(())
}
