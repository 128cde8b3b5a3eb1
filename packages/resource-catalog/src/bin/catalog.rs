//! CLI for browsing the resource catalog
//!
//! Reads storage settings from the environment (`CATALOG_ENDPOINT`,
//! `CATALOG_BUCKET`, `CATALOG_CREDENTIAL`, optional `.env`) and prints
//! resources or programs as text or JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use resource_catalog::{
    LoadReport, LoaderConfig, Program, ResourceFilters, ResourceItem, ResourceRepository,
    ResourceType, SortField, SortOrder, StorageConfig, StrategyOutcome,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Browse the member portal's resource catalog")]
struct Cli {
    /// Print which acquisition strategies ran
    #[arg(long, global = true)]
    verbose: bool,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// JSON file holding an array of bookmarked resource ids
    #[arg(long, global = true, env = "CATALOG_BOOKMARKS")]
    bookmarks: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List resources, filtered and sorted
    Resources {
        /// Program slug (repeatable)
        #[arg(long)]
        program: Vec<Program>,

        /// Resource type label, e.g. "Documentation Forms" (repeatable)
        #[arg(long = "type")]
        resource_type: Vec<ResourceType>,

        #[arg(long)]
        category: Option<String>,

        /// Required tag (repeatable; all must match)
        #[arg(long)]
        tag: Vec<String>,

        #[arg(long)]
        search: Option<String>,

        /// name | lastUpdated | downloadCount | category
        #[arg(long, default_value = "name")]
        sort_by: SortField,

        /// asc | desc
        #[arg(long, default_value = "asc")]
        order: SortOrder,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// List programs that have resources
    Programs,

    /// Show one resource
    Show { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,resource_catalog=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let storage = StorageConfig::from_env().context("Failed to load storage configuration")?;
    let config = LoaderConfig::from_env().context("Failed to load loader configuration")?;

    let mut repository = ResourceRepository::from_config(storage, &config)
        .context("Failed to create resource repository")?
        .with_session_cache();
    if let Some(path) = &cli.bookmarks {
        repository = repository.with_bookmarks(read_bookmarks(path)?);
    }

    let report = repository.reload().await.context("Failed to load resource catalog")?;
    if cli.verbose {
        print_report(&report);
    }

    match cli.command {
        Commands::Resources {
            program,
            resource_type,
            category,
            tag,
            search,
            sort_by,
            order,
            offset,
            limit,
        } => {
            let mut filters = ResourceFilters::new()
                .with_tags(tag)
                .sorted_by(sort_by, order)
                .paginate(offset, limit);
            if !program.is_empty() {
                filters = filters.with_programs(program);
            }
            if !resource_type.is_empty() {
                filters = filters.with_types(resource_type);
            }
            if let Some(category) = category {
                filters = filters.with_category(category);
            }
            if let Some(search) = search {
                filters = filters.with_search(search);
            }

            let resources = repository
                .get_resources(&filters)
                .await
                .context("Failed to query resources")?;

            if cli.json {
                print_json(&resources)?;
            } else if resources.is_empty() {
                println!("No resources matched.");
            } else {
                for item in &resources {
                    print_resource_line(item);
                }
                println!("\n{} resource(s)", resources.len());
            }
        }

        Commands::Programs => {
            let programs = repository
                .get_programs()
                .await
                .context("Failed to derive programs")?;

            if cli.json {
                print_json(&programs)?;
            } else {
                for program in &programs {
                    println!(
                        "{:<8} {:<24} {:>4}  {}",
                        program.slug, program.name, program.resource_count, program.description
                    );
                }
            }
        }

        Commands::Show { id } => {
            let item = repository
                .get_resource_by_id(&id)
                .await
                .with_context(|| format!("Failed to look up resource {}", id))?;

            if cli.json {
                print_json(&item)?;
            } else {
                print_resource_detail(&item);
            }
        }
    }

    Ok(())
}

fn read_bookmarks(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bookmarks from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Bookmarks file {} must be a JSON array of ids", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn print_report(report: &LoadReport) {
    eprintln!(
        "Loaded {} entries via {}",
        report.entries.len(),
        report.source.map(|s| s.as_str()).unwrap_or("nothing")
    );
    for attempt in &report.attempts {
        let outcome = match &attempt.outcome {
            StrategyOutcome::Loaded { rows } => format!("loaded {} rows", rows),
            StrategyOutcome::Empty => "empty".to_string(),
            StrategyOutcome::Failed { error } => format!("failed: {}", error),
        };
        eprintln!("  {:<18} tries={} {}", attempt.strategy, attempt.tries, outcome);
    }
}

fn print_resource_line(item: &ResourceItem) {
    let marker = if item.bookmarked { "*" } else { " " };
    println!(
        "{} {:<8} {:<22} {:<40} {}",
        marker,
        item.program,
        item.resource_type.label(),
        item.name,
        item.category.as_deref().unwrap_or("-")
    );
}

fn print_resource_detail(item: &ResourceItem) {
    println!("{}", item.name);
    println!("  id:        {}", item.id);
    println!("  program:   {}", item.program);
    println!("  type:      {}", item.resource_type.label());
    println!("  category:  {}", item.category.as_deref().unwrap_or("-"));
    println!("  tags:      {}", item.tag_list().join(", "));
    println!("  url:       {}", item.file_url.as_deref().unwrap_or("-"));
    if let Some(size) = item.size_mb {
        println!("  size:      {:.2} MB", size);
    }
    if let Some(updated) = &item.last_updated_iso {
        println!("  updated:   {}", updated);
    }
    if let Some(downloads) = item.download_count {
        println!("  downloads: {}", downloads);
    }
    println!("  bookmarked: {}", item.bookmarked);
}
