use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use imgcluster::{
    acquire,
    config::Config,
    constants::{DEFAULT_HTML_PATH, DEFAULT_INPUT_DIR, DEFAULT_RESULT_PATH},
    embeddings,
    models::ClusteringResult,
    render, ClusteringPipeline,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imgcluster")]
#[command(about = "Group visually similar images by clustering their embeddings")]
#[command(version)]
struct Cli {
    /// Config file (defaults to config/settings.toml or ~/.config/imgcluster/settings.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed and cluster a directory of images
    Cluster {
        /// Directory containing images
        #[arg(long, default_value = DEFAULT_INPUT_DIR)]
        input: PathBuf,
        /// Where to write the clustering result
        #[arg(long, default_value = DEFAULT_RESULT_PATH)]
        output: PathBuf,
        /// Minimum images per cluster (overrides config)
        #[arg(long)]
        min_cluster_size: Option<usize>,
        /// JSON file of precomputed embeddings (overrides config)
        #[arg(long, value_name = "FILE")]
        embeddings: Option<PathBuf>,
    },
    /// Render a clustering result as an HTML page
    Render {
        /// Clustering result to render
        #[arg(long, default_value = DEFAULT_RESULT_PATH)]
        input: PathBuf,
        /// Where to write the HTML page
        #[arg(long, default_value = DEFAULT_HTML_PATH)]
        output: PathBuf,
        /// Image directory as seen from the HTML page (overrides config)
        #[arg(long)]
        image_dir: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("imgcluster=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Cluster {
            input,
            output,
            min_cluster_size,
            embeddings: vectors,
        } => {
            let min_cluster_size = min_cluster_size.unwrap_or(config.clustering.min_cluster_size);
            let provider = embeddings::from_config(&config, vectors)?;

            let images = acquire::discover_images(&input)?;
            if images.is_empty() {
                anyhow::bail!("No images found in {}", input.display());
            }
            println!("Found {} images", images.len());

            info!(model = provider.model_id(), "Generating embeddings");
            let acquisition =
                acquire::embed_images(provider.as_ref(), images, config.embedding.concurrency).await;
            if acquisition.embedded.is_empty() {
                anyhow::bail!("No embeddings generated");
            }

            let pipeline = ClusteringPipeline::new(min_cluster_size);
            info!(min_cluster_size = pipeline.min_cluster_size(), "Clustering embeddings");
            let result = pipeline
                .run(&acquisition.embedded, provider.model_id())
                .context("Clustering failed")?;

            write_result(&result, &output)?;
            print_report(&result, &output);
        }
        Commands::Render {
            input,
            output,
            image_dir,
        } => {
            let result = render::load_result(&input)?;
            let image_dir = image_dir.unwrap_or(config.render.image_dir);
            let html = render::render_html(&result, &image_dir);

            create_parent_dir(&output)?;
            std::fs::write(&output, html)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            println!("Visualization saved to: {}", output.display());
            let absolute = std::fs::canonicalize(&output).unwrap_or(output);
            println!("Open in browser: file://{}", absolute.display());
        }
    }

    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

fn write_result(result: &ClusteringResult, output: &Path) -> Result<()> {
    create_parent_dir(output)?;
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(output, json).with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

fn print_report(result: &ClusteringResult, output: &Path) {
    println!("\n{}", "=".repeat(50));
    println!("CLUSTERING RESULTS");
    println!("{}", "=".repeat(50));
    println!("Total images:     {}", result.summary.total_images);
    println!("Clusters formed:  {}", result.summary.num_clusters);
    println!("Unclustered:      {}", result.summary.num_unclustered);
    println!();

    for cluster in &result.clusters {
        println!(
            "  {}: {} images (countries: {})",
            cluster.id,
            cluster.size,
            cluster.countries().join(", ")
        );
        println!("    Representative: {}", cluster.representative.filename);
    }

    if !result.unclustered.is_empty() {
        println!("\n  Unclustered ({} images):", result.unclustered.len());
        for record in &result.unclustered {
            println!("    - {}", record.filename);
        }
    }

    println!("\nOutput saved to: {}", output.display());
}
