//! Command handlers: connect to the browser and drive the overlay engine.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use webmarker_cdp::{CdpClient, CdpDocument};
use webmarker_config::Config;
use webmarker_core::{MarkOptions, MarkSession, Marker, Rect};

use crate::cli::MarkArgs;

/// Live connection to one page. The client owns the socket the document talks through.
pub(crate) struct Connection {
    _client: CdpClient,
    document: Arc<CdpDocument>,
}

impl Connection {
    pub async fn open(config: &Config) -> Result<Self> {
        let client =
            CdpClient::connect_with_timeout(&config.browser.endpoint, config.browser.request_timeout())
                .await
                .with_context(|| format!("Failed to connect to {}", config.browser.endpoint))?;
        let page = client
            .attach(config.browser.target.as_deref())
            .await
            .context("Failed to attach to page")?;
        info!(target_id = page.target_id(), "Attached to page");
        let document = Arc::new(CdpDocument::new(page).await?);
        Ok(Self {
            _client: client,
            document,
        })
    }

    fn marker(&self, config: &Config) -> Marker {
        Marker::new(self.document.clone()).with_naming(&config.mark.to_options())
    }
}

/// One row of the printed label mapping.
#[derive(Debug, Serialize)]
pub(crate) struct LabelEntry {
    pub label: String,
    pub tag: String,
    pub rect: Option<Rect>,
}

pub(crate) async fn handle_mark(mut config: Config, args: MarkArgs) -> Result<()> {
    args.apply(&mut config.mark);
    let conn = Connection::open(&config).await?;
    let marker = conn.marker(&config);

    let options = config.mark.to_options();
    let session = marker.mark(options.clone()).await?;
    finish_mark(&conn, &marker, session, &options, &args).await
}

pub(crate) async fn handle_refresh(mut config: Config, args: MarkArgs) -> Result<()> {
    args.apply(&mut config.mark);
    let conn = Connection::open(&config).await?;
    let marker = conn.marker(&config);

    let options = config.mark.to_options();
    let session = marker.refresh(None, options.clone()).await?;
    finish_mark(&conn, &marker, session, &options, &args).await
}

async fn finish_mark(
    conn: &Connection,
    marker: &Marker,
    session: MarkSession,
    options: &MarkOptions,
    args: &MarkArgs,
) -> Result<()> {
    let entries = label_entries(marker, &session).await?;
    println!("{}", serde_json::to_string_pretty(&entries)?);

    if let Some(path) = &args.screenshot {
        save_screenshot(conn, path).await?;
    }

    if args.watch {
        info!("Tracking {} label(s), press Ctrl-C to unmark", session.len());
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;
        marker.unmark(session).await?;
        info!("Unmarked");
    } else {
        // This process exits now; the page keeps the overlays in place itself.
        drop(session);
        if let Err(e) = conn.document.keep_attached(options).await {
            warn!(error = %e, "Labels will not follow layout changes");
        }
    }
    Ok(())
}

async fn label_entries(marker: &Marker, session: &MarkSession) -> Result<Vec<LabelEntry>> {
    let document = marker.document();
    let mut entries = Vec::with_capacity(session.len());
    for marked in session.elements().iter() {
        let rect = document.bounding_rect(marked.element).await?;
        entries.push(LabelEntry {
            label: marked.label.clone(),
            tag: marked.tag_name.clone(),
            rect,
        });
    }
    Ok(entries)
}

async fn save_screenshot(conn: &Connection, path: &Path) -> Result<()> {
    let png = conn.document.page().screenshot_png().await?;
    std::fs::write(path, &png)
        .with_context(|| format!("Failed to write screenshot to {}", path.display()))?;
    debug!(bytes = png.len(), "Screenshot captured");
    eprintln!("Screenshot saved to {}", path.display());
    Ok(())
}

pub(crate) async fn handle_unmark(config: Config) -> Result<()> {
    let conn = Connection::open(&config).await?;
    conn.marker(&config).unmark(None).await?;
    Ok(())
}

pub(crate) async fn handle_status(config: Config) -> Result<()> {
    let conn = Connection::open(&config).await?;
    let marked = conn.marker(&config).is_marked().await?;
    println!("{}", if marked { "marked" } else { "unmarked" });
    Ok(())
}

pub(crate) async fn handle_pages(config: Config) -> Result<()> {
    let client =
        CdpClient::connect_with_timeout(&config.browser.endpoint, config.browser.request_timeout())
            .await
            .with_context(|| format!("Failed to connect to {}", config.browser.endpoint))?;
    let pages: Vec<_> = client
        .list_pages()
        .await?
        .into_iter()
        .filter(|p| p.is_page())
        .collect();

    if pages.is_empty() {
        println!("No pages open.");
        return Ok(());
    }
    println!("{:<34} {:<40} URL", "ID", "TITLE");
    for page in pages {
        println!("{:<34} {:<40} {}", page.id, truncate(&page.title, 40), page.url);
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
        out.push_str("...");
        out
    }
}
