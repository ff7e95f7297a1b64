use anyhow::Result;
use clap::{Parser, Subcommand};
use geo::Coord;
use seoul_choropleth::{config::AppConfig, matcher, pipeline, render};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join the datasets and write the render payload
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print the region containing a coordinate
    Locate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            info!(config = ?config, "Generating render payload");
            let app_config = AppConfig::load_from_file(config)?;

            // 1. Fetch every input as one batch
            let sources = pipeline::fetch_sources(&app_config.input).await?;

            // 2. Join and derive
            let enriched = pipeline::run(&app_config, &sources)?;

            // 3. Hand off to the renderer
            let render_config = app_config.render.clone().with_env_token();
            render::write_outputs(&app_config.output.dir, &enriched, &render_config)?;

            info!("Generation complete");
        }
        Commands::Locate { config, lon, lat } => {
            let app_config = AppConfig::load_from_file(config)?;
            let sources = pipeline::fetch_sources(&app_config.input).await?;
            let enriched = pipeline::run(&app_config, &sources)?;

            let point = Coord { x: *lon, y: *lat };
            match matcher::locate(point, enriched.index.regions()) {
                Some(region) => {
                    let body = serde_json::json!({
                        "key": region.key,
                        "name": region.name,
                        "data": enriched.index.record(&region.key),
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                None => println!("null"),
            }
        }
    }

    Ok(())
}
