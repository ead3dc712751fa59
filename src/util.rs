use std::time::Duration;

use anyhow::{bail, Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Url;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use reel::sources::looks_like_url;
use reel::{CatalogItem, ContentDetail, HomeSection, ListResult};

/// Logs go to stderr so `--json` output on stdout stays parseable.
pub fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            "warn,reel=debug".into()
        } else {
            "warn".into()
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn print_output<T: Serialize + std::fmt::Debug>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(_) => println!("{:?}", value),
    }
}

/// Spinner on stderr while a request is in flight; hidden in JSON mode.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn print_items_table(items: &[CatalogItem]) {
    println!("{} {}", "Total".bold(), items.len());

    let index_header = "#";
    let title_header = "Title";
    let meta_header = "Info";

    let index_width = std::cmp::max(index_header.len(), format!("{}", items.len()).len());
    let title_width = std::cmp::max(
        title_header.len(),
        items.iter().map(|i| i.title.chars().count()).max().unwrap_or(0),
    );

    println!(
        "{:<iw$}  {:<tw$}  {}",
        index_header.bold(),
        title_header.bold(),
        meta_header.bold(),
        iw = index_width,
        tw = title_width
    );
    println!(
        "{:<iw$}  {:<tw$}  {}",
        "-".repeat(index_width),
        "-".repeat(title_width),
        "-".repeat(10),
        iw = index_width,
        tw = title_width
    );

    for (idx, item) in items.iter().enumerate() {
        let meta: Vec<&str> = [&item.year, &item.rating, &item.kind]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .collect();
        println!(
            "{:<iw$}  {:<tw$}  {}",
            idx + 1,
            item.title,
            meta.join(" | ").dimmed(),
            iw = index_width,
            tw = title_width
        );
        if !item.detail_ref.is_empty() {
            println!("{:<iw$}  {}", "", item.detail_ref.cyan(), iw = index_width);
        }
    }
}

pub fn print_list(result: &ListResult) {
    if !result.succeeded {
        println!("{}", "Could not load this page. Try again later.".red().bold());
        return;
    }
    if result.items.is_empty() {
        println!("{}", "Nothing found.".yellow());
        return;
    }
    print_items_table(&result.items);
    if result.has_more_pages {
        println!(
            "\n{} page {} loaded, use --page {} for more",
            "»".green(),
            result.page_number,
            result.page_number + 1
        );
    }
}

pub fn print_home(sections: &[HomeSection]) {
    if sections.is_empty() {
        println!("{}", "Nothing to show right now.".yellow());
        return;
    }
    for (i, section) in sections.iter().enumerate() {
        if i == 0 {
            if let Some(hero) = section.items.first() {
                println!("{} {}", "★".yellow().bold(), hero.title.bold());
                if !hero.detail_ref.is_empty() {
                    println!("  {}", hero.detail_ref.cyan());
                }
                println!();
            }
        }
        println!("{} {}", "==".green(), section.label.green().bold());
        for item in &section.items {
            let year = item.year.as_deref().map(|y| format!(" ({})", y)).unwrap_or_default();
            println!("  - {}{}", item.title, year.dimmed());
        }
        println!();
    }
}

pub fn print_detail_human(detail: &ContentDetail) {
    println!("{}", detail.title.bold());
    if let Some(year) = &detail.year {
        println!("Year:     {}", year);
    }
    if let Some(rating) = &detail.rating {
        println!("Rating:   {}", rating);
    }
    if let Some(genre) = &detail.genre {
        println!("Genre:    {}", genre);
    }
    if let Some(duration) = &detail.duration {
        println!("Duration: {}", duration);
    }
    if let Some(director) = &detail.director {
        println!("Director: {}", director);
    }
    if let Some(cast) = &detail.cast {
        println!("Cast:     {}", cast);
    }
    if !detail.poster.is_empty() {
        println!("Poster:   {}", detail.poster);
    }
    println!("\n{}", detail.description);
    if let Some(stream) = detail.default_stream() {
        println!("\n{} {}", "Stream:".green().bold(), stream.cyan());
    }
    if detail.is_series() {
        println!("\n{} {}", "Episodes:".bold(), detail.episodes.len());
        for (i, ep) in detail.episodes.iter().enumerate() {
            println!("  {:>3}. {}", i + 1, ep.title);
        }
    }
}

/// Program and arguments that hand `url` to the desktop's default handler.
fn opener_command(url: &Url) -> (&'static str, Vec<String>) {
    let url = url.as_str().to_string();
    if cfg!(target_os = "windows") {
        ("cmd", vec!["/C".into(), "start".into(), String::new(), url])
    } else if cfg!(target_os = "macos") {
        ("open", vec![url])
    } else {
        ("xdg-open", vec![url])
    }
}

/// Checks that a stream ref is an absolute http(s) URL, since relative refs
/// only mean something to the backend that issued them.
pub fn playable_url(stream: &str) -> Result<Url> {
    if !looks_like_url(stream) {
        bail!("stream reference is not a URL: {}", stream);
    }
    Url::parse(stream.trim()).with_context(|| format!("malformed stream URL: {}", stream))
}

/// Opens a stream in the system browser or player.
pub async fn open_stream(stream: &str) -> Result<()> {
    let url = playable_url(stream)?;
    let (program, args) = opener_command(&url);
    tracing::debug!(program, url = url.as_str(), "opening stream");
    let status = tokio::process::Command::new(program)
        .args(&args)
        .status()
        .await
        .with_context(|| format!("failed to launch {}", program))?;
    if !status.success() {
        bail!("{} could not open {} (exit code {:?})", program, url, status.code());
    }
    Ok(())
}
