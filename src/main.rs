//! # Tide Finder Application Entry Point
//!
//! This binary wires the library together: configuration, location catalog,
//! NOAA client and sunrise calculator feed one shared engine, which is then
//! either served over HTTP or run once from the command line.
//!
//! ## Usage
//! ```text
//! tide-finder [--config tide-config.toml]                  # serve POST /submit-form
//! tide-finder [--config tide-config.toml] --stdout form.json # one query, text table
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use std::env;
use std::sync::Arc;
use tide_finder_lib::{
    analysis::TideFilterEngine, config::Config, form::SubmitForm, renderer::render_table,
    server::create_router, solar::SpaSunCalculator, tide_data::NoaaClient,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Value following `flag` on the command line, if present.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// Main application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    let config = match flag_value(&args, "--config") {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    let catalog = config
        .location_catalog()
        .context("loading location catalog")?;
    let tides = NoaaClient::new(&config.noaa).context("building NOAA client")?;
    let engine = Arc::new(TideFilterEngine::new(catalog, tides, SpaSunCalculator));

    // Development mode: one query from a form file, printed as a table
    if let Some(form_path) = flag_value(&args, "--stdout") {
        let contents = tokio::fs::read_to_string(&form_path)
            .await
            .with_context(|| format!("reading form {form_path}"))?;
        let form: SubmitForm =
            serde_json::from_str(&contents).with_context(|| format!("parsing form {form_path}"))?;
        let rows = engine.analyze(&form.into_query()?).await?;
        print!("{}", render_table(&rows));
        return Ok(());
    }

    let app = create_router(engine);
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
        })
        .await?;

    Ok(())
}
