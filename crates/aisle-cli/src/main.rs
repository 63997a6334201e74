use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use aisle_cli::interactive::{HELP, LineCommand, keystrokes, merge_filters, parse_line};
use aisle_cli::render::{SnapshotPrinter, facet_lines, product_line, status_line};
use aisle_cli::{Command, Config, FacetArgs, Settings};
use aisle_client::StorefrontClient;
use aisle_core::{
    AppError, Facets, InitialSearch, SearchHandle, SearchSession, SearchState, SearchStatus,
    TracingReporter, load_storefront_config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = Config::parse();

    let file = load_storefront_config(config.config.clone())
        .context("Failed to load storefront configuration")?;
    let settings = config.resolve(file).context("Invalid configuration")?;

    let client = StorefrontClient::with_config(&settings.base_url, &settings.http)
        .context("Failed to create storefront client")?;
    info!(
        base_url = %client.base_url(),
        per_page = settings.search.per_page,
        debounce_ms = settings.search.debounce.as_millis() as u64,
        "Using storefront"
    );

    match config.command {
        Command::Search {
            query,
            facets,
            pages,
        } => {
            search(client, &settings, &query, &facets, pages).await?;
        }
        Command::Interactive { query, facets } => {
            interactive(client, &settings, query, &facets).await?;
        }
    }

    Ok(())
}

/// Waits until the page after `loaded` has been applied, or the fetch failed.
async fn settle(handle: &SearchHandle, loaded: u32) -> Result<SearchState, AppError> {
    handle
        .wait_for(|s| {
            s.status == SearchStatus::Error || (s.status == SearchStatus::Idle && s.page > loaded)
        })
        .await
}

async fn search(
    client: StorefrontClient,
    settings: &Settings,
    query: &str,
    facets: &FacetArgs,
    pages: u32,
) -> anyhow::Result<()> {
    if query.trim().is_empty() {
        anyhow::bail!("Search query must not be blank");
    }
    info!("Searching for: '{}' (pages: {})", query.trim(), pages);

    let initial = InitialSearch::default()
        .with_query(query)
        .with_filters(facets.filters())
        .with_sort(facets.sort);
    let handle = SearchSession::spawn(client, settings.search.clone(), initial, TracingReporter);

    let mut state = settle(&handle, 1).await?;
    for _ in 1..pages {
        if !state.has_more || state.status == SearchStatus::Error {
            break;
        }
        let loaded = state.page;
        handle.on_scrolled_near_bottom()?;
        state = settle(&handle, loaded).await?;
    }
    handle.close();

    if state.items.is_empty() && state.error.is_none() {
        println!("\nNo products found for: \"{}\"\n", query.trim());
        println!("Try:");
        println!("  - Using different keywords");
        println!("  - Removing filters (--category, --item-type, --skin-type, --concern)");
        return Ok(());
    }

    println!("\nSearch results for: \"{}\"\n", query.trim());
    for (i, product) in state.items.iter().enumerate() {
        println!("{}", product_line(i, product));
    }
    println!("\n{}\n", status_line(&state));

    if let Some(error) = state.error {
        anyhow::bail!("{}", error.message);
    }
    Ok(())
}

async fn interactive(
    client: StorefrontClient,
    settings: &Settings,
    query: Option<String>,
    facets: &FacetArgs,
) -> anyhow::Result<()> {
    let initial = InitialSearch::default()
        .with_query(query.unwrap_or_default())
        .with_filters(facets.filters())
        .with_sort(facets.sort);
    let handle = SearchSession::spawn(
        client.clone(),
        settings.search.clone(),
        initial,
        TracingReporter,
    );
    let mut facets: Option<Facets> = None;

    let mut updates = handle.subscribe();
    let renderer = tokio::spawn(async move {
        let mut printer = SnapshotPrinter::new();
        loop {
            let lines = {
                let state = updates.borrow_and_update();
                printer.lines(&state)
            };
            for line in lines {
                println!("{}", line);
            }
            if updates.changed().await.is_err() {
                break;
            }
        }
    });

    println!("Type to search, :help for commands.");
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = input.next_line() => line.context("Failed to read input")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let command = match parse_line(&line) {
            Ok(LineCommand::Facets) => {
                match client.facets().await {
                    Ok(loaded) => {
                        for line in facet_lines(&loaded) {
                            println!("{}", line);
                        }
                        facets = Some(loaded);
                    }
                    Err(e) => eprintln!("{}", e.user_message()),
                }
                continue;
            }
            other => other,
        };

        match command.and_then(|command| dispatch(&handle, command, facets.as_ref())) {
            Ok(true) => {}
            Ok(false) => break,
            Err(AppError::SessionClosed) => break,
            Err(e) => eprintln!("{}", e),
        }
    }

    handle.close();
    renderer.await.context("Renderer task failed")?;
    Ok(())
}

/// Forwards one line command to the session. Returns false on quit.
fn dispatch(
    handle: &SearchHandle,
    command: LineCommand,
    facets: Option<&Facets>,
) -> Result<bool, AppError> {
    match command {
        LineCommand::Query(text) => {
            for typed in keystrokes(&text) {
                handle.on_query_text_changed(typed)?;
            }
        }
        LineCommand::More => handle.on_scrolled_near_bottom()?,
        LineCommand::Refresh => handle.on_pull_to_refresh()?,
        LineCommand::Retry => handle.retry()?,
        LineCommand::Sort(key) => handle.on_sort_selected(key)?,
        LineCommand::Filter(pairs) => {
            let filters = merge_filters(handle.snapshot().filters, &pairs, facets)?;
            handle.on_filter_sheet_applied(filters)?;
        }
        LineCommand::Clear => handle.on_query_text_changed("")?,
        // Fetched by the input loop, which owns the client.
        LineCommand::Facets => {}
        LineCommand::Help => println!("{}", HELP),
        LineCommand::Quit => return Ok(false),
        LineCommand::Nothing => {}
    }
    Ok(true)
}
