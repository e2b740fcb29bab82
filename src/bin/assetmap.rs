//! Command-line front end of the asset map: one-shot commands against the
//! file-backed map, or `serve` for newline-delimited JSON requests on stdin.

use anyhow::Context;
use assetmap::api::{AssetMapService, RequestRouter};
use assetmap::core::config::Config;
use assetmap::core::geometry::Boundary;
use assetmap::core::indexing::kdmap::{Asset, Removal, UuidNodeIds};
use assetmap::core::storage::FileDocumentStore;
use assetmap::event_engine::handler::{ClientEvent, EventKind, ResidentAssetDelivery};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct AssetArgs {
    asset_id: String,
    xmin: f64,
    ymin: f64,
    zmin: f64,
    xmax: f64,
    ymax: f64,
    zmax: f64,
}

impl AssetArgs {
    fn into_asset(self) -> Asset {
        let boundary = Boundary::new(self.xmin, self.ymin, self.zmin, self.xmax, self.ymax, self.zmax);
        Asset::new(self.asset_id, boundary)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert an asset and save the map.
    #[command(allow_negative_numbers = true)]
    Insert(AssetArgs),
    /// Remove an asset and save the map.
    #[command(allow_negative_numbers = true)]
    Remove(AssetArgs),
    /// Print the whole map document.
    Tree,
    /// Print the bounding-box hierarchy.
    Boxes {
        #[arg(long)]
        mode: Option<String>,
    },
    /// Print the configs a `near` event for this node URI would produce.
    Near { node_uri: String },
    /// Answer JSON requests read line by line from stdin.
    Serve,
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    init_tracing(&config);

    let store = FileDocumentStore::open(&config.data_dir)
        .with_context(|| format!("opening data directory {}", config.data_dir.display()))?;
    let ids = Box::new(UuidNodeIds::new(config.node_id_prefix.clone()));
    let service =
        AssetMapService::start_with(store, config, ids, Box::new(ResidentAssetDelivery)).await?;

    match cli.command {
        Commands::Insert(args) => {
            let placement = service.insert_asset(args.into_asset()).await?;
            println!("placed in node {} at depth {}", placement.node, placement.depth);
        }
        Commands::Remove(args) => {
            let asset = args.into_asset();
            match service.remove_asset(&asset.asset_id, &asset.boundary).await? {
                Removal::Removed { node, .. } => println!("removed from node {}", node),
                Removal::NotFound => println!("asset '{}' not found", asset.asset_id),
            }
        }
        Commands::Tree => print_json(&service.get_asset_map().await)?,
        Commands::Boxes { mode } => {
            let boxes = service.get_asset_map_bounding_boxes(mode.as_deref()).await?;
            print_json(&boxes.into_scene_configs()?)?;
        }
        Commands::Near { node_uri } => {
            let configs = service
                .get_asset_map_updates(&[ClientEvent::new(EventKind::Near, node_uri)])
                .await?;
            print_json(&configs)?;
        }
        Commands::Serve => serve(RequestRouter::new(Arc::new(service))).await?,
    }
    Ok(())
}

async fn serve(router: RequestRouter<FileDocumentStore>) -> anyhow::Result<()> {
    info!("serving requests on stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = router.handle_text(&line).await;
        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }
    if router.service().is_dirty().await {
        router.service().flush().await?;
    }
    info!("stdin closed, shutting down");
    Ok(())
}
