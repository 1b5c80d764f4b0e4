//! Line-oriented interpreter for generated lesson text.
//!
//! Each line is classified in priority order: table row, blank line,
//! heading, bullet, numbered step, paragraph. Consecutive table rows are
//! buffered and emitted as one block when the run ends.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::inline::parse_inline;
use crate::{RenderBlock, TableRow};

/// Heading keywords that open a practice section.
pub const TASK_KEYWORDS: &[&str] = &["laboratorio", "práctica", "tarea"];

/// Checkbox markers removed from task text.
const CHECKBOX_MARKERS: &[&str] = &["[ ]", "[x]", "[X]"];

static NUMBERED_ITEM: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^(\d+)\.\s*(.*)$").ok());

static SEPARATOR_CELL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[-:]+$").ok());

/// Converts lesson text into render blocks.
///
/// Never fails: anything unrecognized becomes a paragraph. Lines starting
/// with a single `#` (the lesson title) produce no block.
#[must_use]
pub fn render(text: &str) -> Vec<RenderBlock> {
    let mut interpreter = Interpreter::default();
    for line in text.lines() {
        interpreter.line(line.trim());
    }
    interpreter.finish()
}

#[derive(Default)]
struct Interpreter {
    blocks: Vec<RenderBlock>,
    table: Vec<String>,
    in_list: bool,
    in_tasks: bool,
}

impl Interpreter {
    fn line(&mut self, line: &str) {
        if line.starts_with('|') {
            self.table.push(line.to_string());
            return;
        }
        self.flush_table();

        if line.is_empty() {
            self.in_list = false;
        } else if line.starts_with("##") {
            self.heading(line);
        } else if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            self.bullet(rest);
        } else if let Some((label, rest)) = numbered(line) {
            self.blocks.push(RenderBlock::NumberedItem {
                label: label.to_string(),
                spans: parse_inline(rest),
            });
        } else if !line.starts_with('#') {
            self.in_list = false;
            self.blocks.push(RenderBlock::Paragraph {
                spans: parse_inline(line),
            });
        }
    }

    fn heading(&mut self, line: &str) {
        self.in_list = false;
        let text = line.trim_start_matches('#').trim_start();
        let lower = text.to_lowercase();
        self.in_tasks = TASK_KEYWORDS.iter().any(|keyword| lower.contains(keyword));

        let spans = parse_inline(text);
        self.blocks.push(if self.in_tasks {
            RenderBlock::TaskHeader { spans }
        } else {
            RenderBlock::Heading { spans }
        });
    }

    fn bullet(&mut self, rest: &str) {
        let text = rest.trim_start();
        let starts_list = !self.in_list;
        self.in_list = true;

        let block = if self.in_tasks {
            let checked = text.contains("[x]") || text.contains("[X]");
            let mut task = text.to_string();
            for marker in CHECKBOX_MARKERS {
                task = task.replace(marker, "");
            }
            task = task.replace("**", "");
            RenderBlock::ChecklistItem {
                spans: parse_inline(task.trim()),
                checked,
                starts_list,
            }
        } else {
            RenderBlock::BulletItem {
                spans: parse_inline(text),
                starts_list,
            }
        };
        self.blocks.push(block);
    }

    fn flush_table(&mut self) {
        if self.table.is_empty() {
            return;
        }
        let lines = std::mem::take(&mut self.table);
        if let Some(block) = table_block(&lines) {
            self.blocks.push(block);
        }
    }

    fn finish(mut self) -> Vec<RenderBlock> {
        self.flush_table();
        self.blocks
    }
}

fn numbered(line: &str) -> Option<(&str, &str)> {
    let pattern = NUMBERED_ITEM.as_ref()?;
    let captures = pattern.captures(line)?;
    Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

fn split_row(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 2 {
        return Vec::new();
    }
    parts[1..parts.len() - 1]
        .iter()
        .map(|cell| cell.trim().to_string())
        .collect()
}

fn is_separator(row: &[String]) -> bool {
    let Some(pattern) = SEPARATOR_CELL.as_ref() else {
        return false;
    };
    row.iter().all(|cell| pattern.is_match(cell))
}

fn table_block(lines: &[String]) -> Option<RenderBlock> {
    let mut rows = lines
        .iter()
        .map(|line| split_row(line))
        .filter(|row| !is_separator(row))
        .map(|row| row.iter().map(|cell| parse_inline(cell)).collect::<TableRow>());

    let header = rows.next()?;
    let rows: Vec<TableRow> = rows.collect();
    if rows.is_empty() {
        return None;
    }
    Some(RenderBlock::Table { header, rows })
}
