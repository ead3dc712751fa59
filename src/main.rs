use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use reel::{Category, Gateway, GatewayConfig};

mod util;

#[derive(Parser, Debug)]
#[command(name = "reel", version, about = "Browse, search and play titles from the catalog", long_about = None)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// TOML config file (defaults to $REEL_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Trending hero plus the home sections
    Home {
        #[arg(short, long, default_value_t = 8)]
        limit: usize,
    },

    /// List the known categories
    Categories,

    /// One page of a category
    #[command(visible_alias = "ls")]
    Category {
        id: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Search the catalog
    Search { query: String },

    /// Show details for a detail ref
    Detail { detail_ref: String },

    /// Open a title's stream in the browser
    #[command(visible_alias = "watch")]
    Play {
        detail_ref: String,
        /// 1-based episode number
        #[arg(short, long)]
        episode: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_logging(cli.debug);

    if let Commands::Categories = cli.command {
        if cli.json {
            let rows: Vec<_> = Category::ALL.iter().map(|c| (c.id(), c.label())).collect();
            util::print_output(&rows);
        } else {
            for c in Category::ALL {
                println!("{:<20} {}", c.id().cyan(), c.label());
            }
        }
        return Ok(());
    }

    let cfg = GatewayConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let gateway = Gateway::new(cfg).context("failed to set up the gateway")?;

    match cli.command {
        Commands::Categories => Ok(()),
        Commands::Home { limit } => {
            let pb = util::spinner("Loading home feed...", cli.json);
            let sections = gateway.home_feed(limit).await;
            pb.finish_and_clear();
            if cli.json {
                util::print_output(&sections);
            } else {
                util::print_home(&sections);
            }
            Ok(())
        }
        Commands::Category { id, page } => {
            let pb = util::spinner(&format!("Loading {}...", reel::types::category_label(&id)), cli.json);
            let result = gateway.list_content(&id, page).await;
            pb.finish_and_clear();
            if cli.json {
                util::print_output(&result);
            } else {
                util::print_list(&result);
            }
            Ok(())
        }
        Commands::Search { query } => {
            let pb = util::spinner(&format!("Searching for \"{}\"...", query.trim()), cli.json);
            let result = gateway.search_content(&query).await;
            pb.finish_and_clear();
            if cli.json {
                util::print_output(&result);
            } else if result.succeeded && result.items.is_empty() {
                println!("{} {}", "No results for".yellow(), query.trim().bold());
            } else {
                util::print_list(&result);
            }
            Ok(())
        }
        Commands::Detail { detail_ref } => {
            let pb = util::spinner("Loading details...", cli.json);
            let outcome = gateway.get_detail(&detail_ref).await;
            pb.finish_and_clear();
            match outcome {
                Ok(result) if cli.json => util::print_output(&result),
                Ok(result) => match &result.detail {
                    Some(detail) => util::print_detail_human(detail),
                    None => println!("{}", "This title is not available.".yellow()),
                },
                Err(failure) if cli.json => util::print_output(&failure),
                Err(failure) => {
                    println!("{}", failure.kind.retry_reason().red().bold());
                    println!("Run the same command again to retry.");
                }
            }
            Ok(())
        }
        Commands::Play { detail_ref, episode } => {
            let pb = util::spinner("Resolving stream...", cli.json);
            let outcome = gateway.get_detail(&detail_ref).await;
            pb.finish_and_clear();
            let detail = match outcome {
                Ok(result) => match result.detail {
                    Some(detail) => detail,
                    None => bail!("title not available: {}", detail_ref),
                },
                Err(failure) => bail!("{}", failure.message),
            };
            let Some(stream) = detail.stream_for(episode) else {
                match episode {
                    Some(n) => bail!("{} has no playable episode {}", detail.title, n),
                    None => bail!("{} has no playable stream", detail.title),
                }
            };
            println!("Opening {} in the browser: {}", detail.title.bold(), stream.cyan());
            util::open_stream(stream).await?;
            Ok(())
        }
    }
}
