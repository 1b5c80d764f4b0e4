//! Terminal rendering of lesson blocks.
//!
//! Tables are drawn as a small spreadsheet: lettered columns and numbered
//! data rows, with the table's own header shown under the column letters.

use std::fmt::Write;

use crate::{plain_text, RenderBlock, Span, TableRow};

/// Caption printed above every table.
pub const TABLE_CAPTION: &str = "Vista de Datos (Ejemplo)";

const BOLD: &str = "\x1b[1m";
const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Renders [`RenderBlock`]s as terminal text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalRenderer {
    color: bool,
}

impl TerminalRenderer {
    /// Creates a renderer; `color` enables ANSI styling.
    #[must_use]
    pub const fn new(color: bool) -> Self {
        Self { color }
    }

    /// Renders all blocks into one string.
    #[must_use]
    pub fn render(&self, blocks: &[RenderBlock]) -> String {
        let mut output = String::new();
        for block in blocks {
            self.write_block(&mut output, block);
        }
        output
    }

    fn write_block(&self, output: &mut String, block: &RenderBlock) {
        match block {
            RenderBlock::Heading { spans } => self.write_heading(output, spans),
            RenderBlock::TaskHeader { spans } => self.write_task_header(output, spans),
            RenderBlock::ChecklistItem {
                spans,
                checked,
                starts_list,
            } => {
                let mark = if *checked { "[x]" } else { "[ ]" };
                self.write_item(output, mark, spans, *starts_list);
            }
            RenderBlock::BulletItem { spans, starts_list } => {
                self.write_item(output, "•", spans, *starts_list);
            }
            RenderBlock::NumberedItem { label, spans } => {
                self.write_item(output, &format!("{label}."), spans, false);
            }
            RenderBlock::Table { header, rows } => self.write_table(output, header, rows),
            RenderBlock::Paragraph { spans } => {
                let _ = writeln!(output, "{}\n", self.inline(spans));
            }
        }
    }

    fn write_heading(&self, output: &mut String, spans: &[Span]) {
        let text = plain_text(spans);
        let rule = "─".repeat(text.chars().count());
        let _ = writeln!(output, "{}", self.paint(BOLD, &self.paint(CYAN, &text)));
        let _ = writeln!(output, "{}\n", self.paint(DIM, &rule));
    }

    fn write_task_header(&self, output: &mut String, spans: &[Span]) {
        let text = format!("▶ {}", plain_text(spans));
        let _ = writeln!(output, "{}\n", self.paint(BOLD, &self.paint(YELLOW, &text)));
    }

    fn write_item(&self, output: &mut String, marker: &str, spans: &[Span], starts_list: bool) {
        if starts_list && !output.is_empty() && !output.ends_with("\n\n") {
            output.push('\n');
        }
        let _ = writeln!(output, "  {marker} {}", self.inline(spans));
    }

    fn write_table(&self, output: &mut String, header: &TableRow, rows: &[TableRow]) {
        let columns = rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);

        let header_text = texts(header, columns);
        let row_texts: Vec<Vec<String>> = rows.iter().map(|row| texts(row, columns)).collect();
        let letters: Vec<String> = (0..columns).map(column_letter).collect();
        let index_width = rows.len().to_string().len().max(1);

        let mut widths: Vec<usize> = letters.iter().map(|l| l.chars().count()).collect();
        for row in std::iter::once(&header_text).chain(&row_texts) {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let border = {
            let mut line = format!("+{}+", "-".repeat(index_width + 2));
            for width in &widths {
                let _ = write!(line, "{}+", "-".repeat(width + 2));
            }
            line
        };

        let _ = writeln!(output, "{}", self.paint(DIM, TABLE_CAPTION));
        let _ = writeln!(output, "{border}");
        let _ = writeln!(output, "{}", grid_line("#", index_width, &letters, &widths));
        let _ = writeln!(output, "{}", grid_line("", index_width, &header_text, &widths));
        let _ = writeln!(output, "{border}");
        for (index, row) in row_texts.iter().enumerate() {
            let number = (index + 1).to_string();
            let _ = writeln!(output, "{}", grid_line(&number, index_width, row, &widths));
        }
        let _ = writeln!(output, "{border}\n");
    }

    fn inline(&self, spans: &[Span]) -> String {
        spans
            .iter()
            .map(|span| match span {
                Span::Plain(text) => text.clone(),
                Span::Bold(text) => self.paint(BOLD, text),
                Span::Code(text) => self.paint(GREEN, text),
            })
            .collect()
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.color {
            format!("{style}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

/// Spreadsheet column name for a zero-based index: `A`, `B`, ..., `Z`, `AA`.
#[must_use]
pub fn column_letter(index: usize) -> String {
    let mut name = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = u8::try_from((n - 1) % 26).unwrap_or(0);
        name.push(char::from(b'A' + rem));
        n = (n - 1) / 26;
    }
    name.iter().rev().collect()
}

fn texts(row: &[Vec<Span>], columns: usize) -> Vec<String> {
    let mut cells: Vec<String> = row.iter().map(|cell| plain_text(cell)).collect();
    cells.resize(columns, String::new());
    cells
}

fn grid_line(index: &str, index_width: usize, cells: &[String], widths: &[usize]) -> String {
    let mut line = format!("| {index:<index_width$} |");
    for (cell, width) in cells.iter().zip(widths) {
        let pad = width.saturating_sub(cell.chars().count());
        let _ = write!(line, " {cell}{} |", " ".repeat(pad));
    }
    line
}
