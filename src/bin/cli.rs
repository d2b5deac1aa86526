use std::path::{Path, PathBuf};

use anyhow::Result;
use cbir::{
    build_database, query_embedding, query_grass, query_image, FeatureDb, GrassQuery, Registry,
    TaskId,
};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use log::{debug, error, info};

#[derive(Parser, Debug)]
#[command(name = "cbir", about = "Content-based image retrieval")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract one task's features for every image of a directory.
    BuildDb {
        image_dir: PathBuf,
        output: PathBuf,
        #[arg(default_value = "1")]
        task_id: String,
    },
    /// Rank a feature database against a target image.
    QueryDb {
        target: PathBuf,
        image_dir: PathBuf,
        features: PathBuf,
        top_n: usize,
        #[arg(default_value = "1")]
        task_id: String,
    },
    /// Rank external embeddings by cosine distance to a stored target.
    #[command(alias = "query-task5")]
    QueryEmbedding {
        target: String,
        embeddings: PathBuf,
        top_n: usize,
    },
    /// Rank by embedding distance fused with vegetation features.
    #[command(alias = "query-task7-grass")]
    QueryGrass {
        target: PathBuf,
        image_dir: PathBuf,
        embeddings: PathBuf,
        top_n: usize,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                std::process::exit(0);
            }
            _ => {
                let _ = e.print();
                std::process::exit(-1);
            }
        },
    };
    if let Err(e) = run(cli.command) {
        error!("{e:#}");
        std::process::exit(-1);
    }
}

fn run(command: Commands) -> Result<()> {
    let registry = Registry::default();
    match command {
        Commands::BuildDb {
            image_dir,
            output,
            task_id,
        } => {
            let spec = registry.spec(task_id.parse::<TaskId>()?);
            let report = build_database(&image_dir, &output, &spec)?;
            println!(
                "Wrote {} feature rows to {} (skipped {})",
                report.written,
                output.display(),
                report.skipped
            );
        }
        Commands::QueryDb {
            target,
            image_dir,
            features,
            top_n,
            task_id,
        } => {
            let spec = registry.spec(task_id.parse::<TaskId>()?);
            let db = FeatureDb::open(&features)?;
            let matches = query_image(&target, &db, &spec, top_n.max(1))?;
            println!("Top {} matches for target: {}", top_n.max(1), target.display());
            for (i, m) in matches.iter().enumerate() {
                println!(
                    "{}) {}  dist={}  fullpath={}",
                    i + 1,
                    m.filename,
                    m.distance,
                    full_path(&image_dir, &m.filename)
                );
            }
        }
        Commands::QueryEmbedding {
            target,
            embeddings,
            top_n,
        } => {
            let db = FeatureDb::open(&embeddings)?;
            let matches = query_embedding(&target, &db, top_n.max(1))?;
            println!("Top {} matches (cosine) for target: {}", top_n.max(1), target);
            for (i, m) in matches.iter().enumerate() {
                println!("{}) {}  dist={}", i + 1, m.filename, m.distance);
            }
        }
        Commands::QueryGrass {
            target,
            image_dir,
            embeddings,
            top_n,
        } => {
            let db = FeatureDb::open(&embeddings)?;
            let ranking = query_grass(&target, &image_dir, &db, &GrassQuery::default())?;
            info!("target green ratio: {}", ranking.target[0]);

            let top_n = top_n.max(1);
            println!("Grass/lawn query - Top {} matches", top_n);
            println!("Target: {}", target.display());
            for (i, m) in ranking.matches.iter().take(top_n).enumerate() {
                println!("{}. {} (distance: {})", i + 1, m.filename, m.distance);
            }
            let tail = ranking.matches.len().saturating_sub(5);
            for (i, m) in ranking.matches.iter().enumerate().skip(tail) {
                debug!("bottom {}: {} (distance: {})", i + 1, m.filename, m.distance);
            }
        }
    }
    Ok(())
}

fn full_path(dir: &Path, name: &str) -> String {
    dir.join(name).display().to_string()
}
