//! PsychoStats Lesson Markup
//!
//! Turns the markdown-like text of a generated lesson into a flat sequence of
//! typed [`RenderBlock`]s, and renders those blocks for a terminal or as JSON.
//!
//! # Example
//!
//! ```rust
//! use psychostats_markup::{render, RenderBlock};
//!
//! let blocks = render("### 4. Laboratorio de Práctica\n- [ ] Calcula el **promedio**");
//! assert!(matches!(blocks[0], RenderBlock::TaskHeader { .. }));
//! assert!(matches!(blocks[1], RenderBlock::ChecklistItem { checked: false, .. }));
//! ```

mod inline;
mod interpreter;
pub mod json;
pub mod terminal;

use serde::{Deserialize, Serialize};

pub use inline::parse_inline;
pub use interpreter::{render, TASK_KEYWORDS};
pub use json::JsonExporter;
pub use terminal::TerminalRenderer;

/// Errors that can occur while exporting rendered blocks.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    /// Failed to serialize blocks to JSON.
    #[error("failed to serialize blocks: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to write output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for markup export operations.
pub type Result<T> = std::result::Result<T, MarkupError>;

/// A styled fragment of inline text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", content = "text", rename_all = "snake_case")]
pub enum Span {
    /// Unstyled text.
    Plain(String),
    /// Emphasized text, written `**like this**`.
    Bold(String),
    /// A formula or literal, written `` `like this` ``.
    Code(String),
}

impl Span {
    /// Returns the text without styling.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Bold(text) | Self::Code(text) => text,
        }
    }
}

/// Joins the text of spans without styling.
#[must_use]
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(Span::text).collect()
}

/// Cells of one table row, each already split into spans.
pub type TableRow = Vec<Vec<Span>>;

/// One structural unit of rendered lesson content.
///
/// Blocks appear in input line order; a run of table lines collapses into a
/// single [`RenderBlock::Table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderBlock {
    /// A section heading.
    Heading {
        /// Heading text.
        spans: Vec<Span>,
    },
    /// Heading of a practice section; list items that follow are tasks.
    TaskHeader {
        /// Heading text.
        spans: Vec<Span>,
    },
    /// A task inside a practice section.
    ChecklistItem {
        /// Task text with checkbox and emphasis markup removed.
        spans: Vec<Span>,
        /// Whether the source marked the task as done (`[x]`).
        checked: bool,
        /// Whether this item opens a new list.
        starts_list: bool,
    },
    /// A plain bullet.
    BulletItem {
        /// Item text.
        spans: Vec<Span>,
        /// Whether this item opens a new list.
        starts_list: bool,
    },
    /// A numbered step.
    NumberedItem {
        /// The numeral as written in the source.
        label: String,
        /// Step text.
        spans: Vec<Span>,
    },
    /// A data table.
    Table {
        /// Column titles.
        header: TableRow,
        /// Data rows, separator rows removed.
        rows: Vec<TableRow>,
    },
    /// A paragraph of text.
    Paragraph {
        /// Paragraph text.
        spans: Vec<Span>,
    },
}

impl RenderBlock {
    /// Returns the block kind as a string.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Heading { .. } => "heading",
            Self::TaskHeader { .. } => "task_header",
            Self::ChecklistItem { .. } => "checklist_item",
            Self::BulletItem { .. } => "bullet_item",
            Self::NumberedItem { .. } => "numbered_item",
            Self::Table { .. } => "table",
            Self::Paragraph { .. } => "paragraph",
        }
    }

    /// Returns the inline text of non-table blocks.
    #[must_use]
    pub fn spans(&self) -> Option<&[Span]> {
        match self {
            Self::Heading { spans }
            | Self::TaskHeader { spans }
            | Self::ChecklistItem { spans, .. }
            | Self::BulletItem { spans, .. }
            | Self::NumberedItem { spans, .. }
            | Self::Paragraph { spans } => Some(spans),
            Self::Table { .. } => None,
        }
    }
}
