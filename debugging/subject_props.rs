//! Fetch a TMDB listing or search and print the subjects the shim would serve.
//! Usage:
//!   cargo run --bin subject_props -- list <movie|tv> <tag> [page]
//!   cargo run --bin subject_props -- search <query> [page]
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use subjectshim::catalog::Catalog;
use subjectshim::config::Config;
use subjectshim::subject::MediaKind;
use subjectshim::tmdb::TmdbClient;

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin subject_props -- list <movie|tv> <tag> [page]");
    eprintln!("       cargo run --bin subject_props -- search <query> [page]");
    std::process::exit(1);
}

fn page_arg(arg: Option<&String>) -> Result<u32> {
    match arg {
        Some(p) => p.parse().context("page must be a positive integer"),
        None => Ok(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        usage();
    }

    let config = Config::from_env()?;
    let client = TmdbClient::new(config.clone())?;
    // Go through try_fetch once so failures print their cause instead of an empty list.
    client
        .try_fetch("configuration", &[])
        .await
        .context("TMDB is not reachable with this key")?;
    let catalog = Catalog::new(Arc::new(client), config);

    let subjects = match args[1].as_str() {
        "list" => {
            let kind = MediaKind::from_str(&args[2])?;
            let tag = args.get(3).map(String::as_str).unwrap_or("hot");
            let page = page_arg(args.get(4))?;
            catalog.list_subjects(kind, tag, page, 20).await
        }
        "search" => {
            let page = page_arg(args.get(3))?;
            catalog.search_subjects(&args[2], page).await
        }
        _ => usage(),
    };

    println!("{}", serde_json::to_string_pretty(&subjects)?);
    eprintln!("{} subjects", subjects.len());
    Ok(())
}
