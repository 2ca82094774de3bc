//! Plain-text view of a rendered table.

use std::fmt::Write;

use tabula_lib::prelude::*;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const SEPARATOR: &str = " │ ";
const TOGGLE_WIDTH: usize = 3;

fn toggle(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn select_all(state: SelectAllState) -> &'static str {
    match state {
        SelectAllState::Unchecked => "[ ]",
        SelectAllState::Indeterminate => "[-]",
        SelectAllState::Checked => "[x]",
    }
}

/// Cut `text` to at most `width` columns, marking the cut with an ellipsis.
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn pad(text: &str, width: usize, align: Alignment) -> String {
    let text = truncate(text, width);
    let gap = width.saturating_sub(text.width());
    match align {
        Alignment::Left => format!("{}{}", text, " ".repeat(gap)),
        Alignment::Right => format!("{}{}", " ".repeat(gap), text),
        Alignment::Center => {
            let left = gap / 2;
            format!("{}{}{}", " ".repeat(left), text, " ".repeat(gap - left))
        }
    }
}

fn cell_text(cell: &Cell) -> &str {
    match &cell.content {
        CellContent::Text(text) => text,
        CellContent::Toggle { checked, .. } => toggle(*checked),
    }
}

/// Width of each column: fixed widths win, otherwise the widest content.
fn column_widths(table: &RenderedTable) -> Vec<usize> {
    let mut widths: Vec<usize> = table
        .header
        .iter()
        .map(|cell| match cell {
            HeaderCell::SelectAll { .. } => TOGGLE_WIDTH,
            HeaderCell::Column { label, .. } => label.width(),
        })
        .collect();

    for row in table.rows() {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell_text(cell).width());
        }
    }

    for (width, cell) in widths.iter_mut().zip(&table.header) {
        if let HeaderCell::Column {
            width: Size::Fixed(fixed),
            ..
        } = cell
        {
            *width = usize::from(*fixed);
        }
    }
    widths
}

fn footer_line(footer: &FooterModel) -> String {
    let mut line = String::new();
    line.push_str(if footer.has_prev() { "‹ " } else { "  " });
    for item in &footer.items {
        match item {
            PageItem::Page(page) if *page == footer.page => {
                let _ = write!(line, "[{}] ", page);
            }
            PageItem::Page(page) => {
                let _ = write!(line, "{} ", page);
            }
            PageItem::Ellipsis => line.push_str("… "),
        }
    }
    line.push_str(if footer.has_next() { "›" } else { " " });

    match footer.range {
        Some((first, last)) => {
            let _ = write!(line, "   {}-{} of {}", first, last, footer.total);
        }
        None => {
            let _ = write!(line, "   0 of {}", footer.total);
        }
    }

    let options: Vec<String> = footer.page_size_options.iter().map(u32::to_string).collect();
    let _ = write!(line, "   {}/page ({})", footer.page_size, options.join(", "));
    line.trim_end().to_string()
}

/// Draw `table` as text lines.
pub fn render_text(table: &RenderedTable) -> String {
    let widths = column_widths(table);
    let total_width =
        widths.iter().sum::<usize>() + SEPARATOR.width() * widths.len().saturating_sub(1);
    let mut out = String::new();

    let header: Vec<String> = table
        .header
        .iter()
        .zip(&widths)
        .map(|(cell, width)| match cell {
            HeaderCell::SelectAll { state, .. } => pad(select_all(*state), *width, Alignment::Center),
            HeaderCell::Column { label, align, .. } => pad(label, *width, *align),
        })
        .collect();
    let _ = writeln!(out, "{}", header.join(SEPARATOR).trim_end());

    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("─┼─"));

    match &table.body {
        Body::Skeleton { rows, .. } => {
            for _ in 0..*rows {
                let _ = writeln!(out, "{}", "░".repeat(total_width));
            }
        }
        Body::Empty { message, .. } => {
            let _ = writeln!(out, "{}", pad(message, total_width, Alignment::Center).trim_end());
        }
        Body::Error { panel, .. } => {
            let _ = writeln!(out, "{}", panel.title);
            let _ = writeln!(out, "{}", panel.description);
            let _ = writeln!(out, "[ {} ]", panel.retry_label);
        }
        Body::Rows { rows } | Body::Refreshing { rows } => {
            for row in rows {
                let cells: Vec<String> = row
                    .cells
                    .iter()
                    .zip(&widths)
                    .map(|(cell, width)| pad(cell_text(cell), *width, cell.align))
                    .collect();
                let _ = writeln!(out, "{}", cells.join(SEPARATOR).trim_end());
            }
        }
    }

    if let Some(footer) = &table.footer {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", footer_line(footer));
    }
    out
}
