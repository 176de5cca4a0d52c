//! Terminal output for the `retail-etl` binary.

use crate::extract::SourceKind;
use crate::report::{QualityReport, SourceSummary};
use crate::retail_store::EntityCounts;
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Stylize};
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_styles() -> Styles {
    let heading = Style::new()
        .bold()
        .underline()
        .fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
    let good = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Green)));
    let bad = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Red)));

    Styles::styled()
        .usage(heading)
        .header(heading)
        .literal(good)
        .valid(good)
        .invalid(bad)
        .error(bad)
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Palette
// ═══════════════════════════════════════════════════════════════════════════════

pub mod colors {
    use crossterm::style::Color;

    pub const ACCENT: Color = Color::Rgb {
        r: 0,
        g: 190,
        b: 210,
    };
    pub const GOOD: Color = Color::Rgb {
        r: 0,
        g: 220,
        b: 120,
    };
    pub const WARN: Color = Color::Rgb {
        r: 255,
        g: 165,
        b: 0,
    };
    pub const MUTED: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
    pub const TEXT: Color = Color::Rgb {
        r: 235,
        g: 235,
        b: 235,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Box Drawing Characters
// ═══════════════════════════════════════════════════════════════════════════════

pub mod box_chars {
    pub const HORIZONTAL: &str = "─";
    pub const VERTICAL: &str = "│";

    pub const ROUND_TOP_LEFT: &str = "╭";
    pub const ROUND_TOP_RIGHT: &str = "╮";
    pub const ROUND_BOTTOM_LEFT: &str = "╰";
    pub const ROUND_BOTTOM_RIGHT: &str = "╯";

    pub const T_LEFT: &str = "├";
    pub const T_RIGHT: &str = "┤";
    pub const T_TOP: &str = "┬";
    pub const T_BOTTOM: &str = "┴";
    pub const CROSS: &str = "┼";

    pub const BULLET: &str = "●";
    pub const BULLET_EMPTY: &str = "○";
    pub const CHECK: &str = "✓";
    pub const WARNING: &str = "⚠";
}

const SECTION_WIDTH: usize = 60;

// ═══════════════════════════════════════════════════════════════════════════════
// Status Indicators
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_success(message: &str) {
    println!(
        " {} {}",
        box_chars::CHECK.with(colors::GOOD).bold(),
        message.with(colors::GOOD)
    );
}

pub fn print_warning(message: &str) {
    println!(
        " {} {}",
        box_chars::WARNING.with(colors::WARN).bold(),
        message.with(colors::WARN)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sections and Key-Value Display
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_section_header(title: &str) {
    let title_len = title.width();
    let left = SECTION_WIDTH.saturating_sub(title_len + 4) / 2;
    let right = SECTION_WIDTH.saturating_sub(title_len + 4 + left);

    println!();
    println!(
        "{}{} {} {}{}",
        box_chars::ROUND_TOP_LEFT.with(colors::ACCENT),
        box_chars::HORIZONTAL.repeat(left).with(colors::ACCENT),
        title.with(colors::ACCENT).bold().attribute(Attribute::Italic),
        box_chars::HORIZONTAL.repeat(right).with(colors::ACCENT),
        box_chars::ROUND_TOP_RIGHT.with(colors::ACCENT),
    );
}

pub fn print_section_footer() {
    println!(
        "{}{}{}",
        box_chars::ROUND_BOTTOM_LEFT.with(colors::ACCENT),
        box_chars::HORIZONTAL
            .repeat(SECTION_WIDTH)
            .with(colors::ACCENT),
        box_chars::ROUND_BOTTOM_RIGHT.with(colors::ACCENT),
    );
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::BULLET.with(colors::ACCENT),
        format!("{}:", key).with(colors::MUTED),
        value.with(colors::TEXT)
    );
}

pub fn print_key_value_highlight(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::BULLET.with(colors::GOOD),
        format!("{}:", key).with(colors::ACCENT).bold(),
        value.with(colors::GOOD).bold()
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        box_chars::BULLET_EMPTY.with(colors::MUTED),
        message.with(colors::MUTED).attribute(Attribute::Italic)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tables
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Box-drawn table. Cells are measured by display width, so accented names
/// line up.
pub struct TableBuilder {
    headers: Vec<String>,
    aligns: Vec<Align>,
    rows: Vec<Vec<String>>,
    col_widths: Vec<usize>,
}

impl TableBuilder {
    pub fn new(headers: &[&str]) -> Self {
        TableBuilder {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            aligns: vec![Align::Left; headers.len()],
            rows: Vec::new(),
            col_widths: headers.iter().map(|h| h.width()).collect(),
        }
    }

    /// Right-align the given columns, typically counts and amounts.
    pub fn align_right(mut self, columns: &[usize]) -> Self {
        for &c in columns {
            if let Some(a) = self.aligns.get_mut(c) {
                *a = Align::Right;
            }
        }
        self
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = self.col_widths.get_mut(i) {
                *w = (*w).max(cell.width());
            }
        }
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn border(&self, left: &str, junction: &str, right: &str) -> String {
        let segments: Vec<String> = self
            .col_widths
            .iter()
            .map(|w| box_chars::HORIZONTAL.repeat(w + 2))
            .collect();
        format!("{}{}{}", left, segments.join(junction), right)
    }

    fn line(&self, cells: &[String]) -> String {
        let mut out = String::from(box_chars::VERTICAL);
        for (i, width) in self.col_widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let pad = " ".repeat(width.saturating_sub(cell.width()));
            match self.aligns[i] {
                Align::Left => out.push_str(&format!(" {}{} ", cell, pad)),
                Align::Right => out.push_str(&format!(" {}{} ", pad, cell)),
            }
            out.push_str(box_chars::VERTICAL);
        }
        out
    }

    /// Uncolored rendering, one string per terminal line.
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.rows.len() + 4);
        lines.push(self.border(
            box_chars::ROUND_TOP_LEFT,
            box_chars::T_TOP,
            box_chars::ROUND_TOP_RIGHT,
        ));
        lines.push(self.line(&self.headers));
        lines.push(self.border(box_chars::T_LEFT, box_chars::CROSS, box_chars::T_RIGHT));
        for row in &self.rows {
            lines.push(self.line(row));
        }
        lines.push(self.border(
            box_chars::ROUND_BOTTOM_LEFT,
            box_chars::T_BOTTOM,
            box_chars::ROUND_BOTTOM_RIGHT,
        ));
        lines
    }

    pub fn print(&self) {
        let lines = self.render();
        let last = lines.len() - 1;
        for (i, line) in lines.into_iter().enumerate() {
            if i == 1 {
                println!("{}", line.with(colors::ACCENT).bold());
            } else if i <= 2 || i == last {
                println!("{}", line.with(colors::ACCENT));
            } else {
                println!("{}", line.with(colors::TEXT));
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Run Summaries
// ═══════════════════════════════════════════════════════════════════════════════

fn source_label(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Customers => "Customers",
        SourceKind::Products => "Products",
        SourceKind::Sales => "Sales",
    }
}

pub fn source_table(sources: &[SourceSummary]) -> TableBuilder {
    let mut table =
        TableBuilder::new(&["Source", "Rows", "Clean", "Rejected", "Merged", "Repaired"])
            .align_right(&[1, 2, 3, 4, 5]);
    for s in sources {
        table.add_row(vec![
            source_label(s.source).to_string(),
            s.total.to_string(),
            s.clean.to_string(),
            s.rejected.to_string(),
            s.merged.to_string(),
            s.repaired.to_string(),
        ]);
    }
    table
}

pub fn print_entity_counts(title: &str, counts: &EntityCounts) {
    print_section_header(title);
    print_key_value("Customers", &counts.customers.to_string());
    print_key_value("Products", &counts.products.to_string());
    print_key_value("Orders", &counts.orders.to_string());
    print_key_value("Order items", &counts.order_items.to_string());
    print_section_footer();
}

pub fn print_quality_summary(report: &QualityReport) {
    print_section_header("Data Quality");
    source_table(&report.sources).print();
    print_key_value(
        "Generated at",
        &report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    print_key_value("Anomalies", &report.anomalies.len().to_string());
    if report.orders_dropped > 0 {
        print_warning(&format!(
            "{} order(s) dropped with no valid lines",
            report.orders_dropped
        ));
    }
    print_section_footer();
}

pub fn flush() {
    let _ = io::stdout().flush();
}
