//! CLI definitions for WebMarker.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use webmarker_config::{LabelScheme, MarkConfig};
use webmarker_core::Placement;

/// WebMarker CLI.
#[derive(Parser)]
#[command(name = "webmarker")]
#[command(about = "Overlay labels on the interactive elements of a live web page")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ./webmarker.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Remote debugging endpoint, overrides `browser.endpoint`
    #[arg(long, global = true, env = "WEBMARKER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Target id of the page to use, overrides `browser.target`
    #[arg(long, global = true)]
    pub target: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Mark the page and print the label mapping as JSON
    Mark(MarkArgs),

    /// Remove every label, mask and attribute left by a previous mark
    Unmark,

    /// Unmark, then mark again with fresh positions
    Refresh(MarkArgs),

    /// Print `marked` or `unmarked`
    Status,

    /// List debuggable pages
    Pages,
}

#[derive(Args, Debug, Default)]
pub(crate) struct MarkArgs {
    /// CSS selector choosing the elements to mark
    #[arg(short, long)]
    pub selector: Option<String>,

    /// Label placement, e.g. top-start, bottom, right-end
    #[arg(short, long)]
    pub placement: Option<Placement>,

    /// Do not draw bounding boxes
    #[arg(long)]
    pub no_masks: bool,

    /// Only mark elements intersecting the visible window
    #[arg(long)]
    pub viewport_only: bool,

    /// Label scheme (numeric, alpha)
    #[arg(long)]
    pub labels: Option<LabelScheme>,

    /// Save a PNG screenshot of the marked page
    #[arg(long, value_name = "FILE")]
    pub screenshot: Option<PathBuf>,

    /// Track from this process until Ctrl-C, then unmark. Without it the page
    /// keeps labels attached on its own until the next unmark
    #[arg(short, long)]
    pub watch: bool,
}

impl MarkArgs {
    /// Layer command-line flags over the `[mark]` section.
    pub fn apply(&self, mark: &mut MarkConfig) {
        if let Some(selector) = &self.selector {
            mark.selector = selector.clone();
        }
        if let Some(placement) = self.placement {
            mark.placement = placement;
        }
        if let Some(labels) = self.labels {
            mark.labels = labels;
        }
        if self.no_masks {
            mark.show_masks = false;
        }
        if self.viewport_only {
            mark.viewport_only = true;
        }
    }
}
