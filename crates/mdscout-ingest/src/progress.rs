//! Progress bar utilities for the CLI

use indicatif::{ProgressBar, ProgressStyle};

const ITEM_TEMPLATE: &str =
    "{prefix} {spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

/// Bar over a run's items; length is set once the item count is known
pub fn create_item_progress(prefix: &str) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template(ITEM_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");

    let pb = ProgressBar::new(0);
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb
}

/// Visible bar when interactive, hidden otherwise
pub fn progress_for(prefix: &str, enabled: bool) -> ProgressBar {
    if enabled {
        create_item_progress(prefix)
    } else {
        ProgressBar::hidden()
    }
}
