// src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use repomd::{Config, DependencyKind, HttpFetcher, Package, Repository};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "repomd")]
#[command(author, version, about = "Query dnf/yum repository metadata", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Also fetch file lists
    #[arg(long, global = true)]
    filelists: bool,

    /// Repository root, mirror list URL, or local path
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the number of packages
    Count,
    /// Print the NEVRA of every package
    List,
    /// Print the NEVRA of the last package with this name
    Find { name: String },
    /// Print the NEVRA of every package with this name
    FindAll { name: String },
    /// Show details of the last package with this name
    Info { name: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if cli.filelists {
        config.load.filelists = true;
    }
    debug!("Effective configuration: {:?}", config);

    let fetcher = HttpFetcher::with_config(&config.http)?;
    let repo = Repository::load_with(&cli.url, &fetcher, &config.load)
        .with_context(|| format!("Failed to load repository {}", cli.url))?;

    match cli.command {
        Commands::Count => {
            println!("{}", repo.count()?);
        }
        Commands::List => {
            for package in repo.iter() {
                println!("{}", package?.nevra()?);
            }
        }
        Commands::Find { name } => match repo.find(&name)? {
            Some(package) => println!("{}", package.nevra()?),
            None => anyhow::bail!("No package named {} in {}", name, repo),
        },
        Commands::FindAll { name } => {
            for package in repo.find_all(&name)? {
                println!("{}", package.nevra()?);
            }
        }
        Commands::Info { name } => {
            let package = repo
                .find(&name)?
                .with_context(|| format!("No package named {} in {}", name, repo))?;
            print_info(&package)?;
        }
    }

    Ok(())
}

fn print_info(package: &Package) -> Result<()> {
    println!("Name         : {}", package.name);
    println!("Epoch        : {}", package.epoch);
    println!("Version      : {}", package.version);
    println!("Release      : {}", package.release);
    println!("Architecture : {}", package.arch);
    println!("NEVRA        : {}", package.nevra()?);
    println!("Size         : {}", package.size_package);
    println!("Source       : {}", package.sourcerpm);
    if let Some(time) = package.build_time() {
        println!("Build Date   : {}", time.to_rfc2822());
    }
    println!("Packager     : {}", package.packager);
    println!("Vendor       : {}", package.vendor);
    println!("URL          : {}", package.url);
    println!("License      : {}", package.license);
    println!("Location     : {}", package.location);
    println!("Summary      : {}", package.summary);
    println!("Description  :");
    for line in package.description.lines() {
        println!("  {}", line);
    }

    for kind in DependencyKind::ALL {
        let entries = package.dependencies(kind);
        if entries.is_empty() {
            continue;
        }
        println!("{}:", kind.name());
        for entry in entries {
            let (name, condition) = entry.pair()?;
            if condition == "-" {
                println!("  {}", name);
            } else {
                println!("  {} {}", name, condition);
            }
        }
    }

    if !package.files.is_empty() {
        println!("files:");
        for file in &package.files {
            println!("  {}", file);
        }
    }

    Ok(())
}
