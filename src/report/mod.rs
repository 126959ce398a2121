pub mod html;
pub mod json;

pub use html::{HtmlOptions, HtmlReport};
pub use json::JsonLinesReport;

use crate::core::engine::DecisionSink;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Bulma page of image cards
    #[default]
    #[value(name = "html")]
    Html,
    /// One JSON object per line
    #[value(name = "json")]
    Json,
}

/// Builds the renderer for `format` writing to `out`.
pub fn renderer<'a, W: Write + 'a>(
    format: OutputFormat,
    out: W,
    options: HtmlOptions,
) -> Box<dyn DecisionSink + 'a> {
    match format {
        OutputFormat::Html => Box::new(HtmlReport::new(out, options)),
        OutputFormat::Json => Box::new(JsonLinesReport::new(out)),
    }
}
