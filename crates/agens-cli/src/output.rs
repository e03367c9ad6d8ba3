//! Terminal output formatting.

use std::collections::VecDeque;

use anyhow::Result;
use colored::Colorize;
use serde_json::{Map, Value};
use unicode_width::UnicodeWidthStr;

use agens_core::ddl::LabelKind;
use agens_core::{Edge, Entity, GraphPath, LabelHierarchy, Row, Vertex};
use agens_graph::HistoryEntry;

/// Widest a table column is allowed to get.
const MAX_CELL_WIDTH: usize = 48;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_info(msg: &str) {
    println!("{}", msg.dimmed());
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string respecting visual width.
fn truncate_visual(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > max_width - 2 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("..");
    result
}

fn vertex_text(v: &Vertex) -> String {
    let props = Value::Object(v.properties().clone());
    format!("(:{} {} {})", v.label().unwrap_or(""), v.id(), props)
}

fn edge_text(e: &Edge) -> String {
    let props = Value::Object(e.properties().clone());
    format!("[:{} {} {}->{} {}]", e.label().unwrap_or(""), e.id(), e.sid(), e.tid(), props)
}

fn path_text(p: &GraphPath) -> String {
    let mut out = vertex_text(p.start());
    for (edge, vertex) in p.edges().iter().zip(p.vertices().iter().skip(1)) {
        out.push('-');
        out.push_str(&edge_text(edge));
        out.push_str("->");
        out.push_str(&vertex_text(vertex));
    }
    out
}

/// Human-readable text for one result cell.
fn cell_text(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "NULL".to_string();
    };
    if let Some(entity) = Entity::parse_any(raw) {
        return match entity {
            Entity::Vertex(v) => vertex_text(&v),
            Entity::Edge(e) => edge_text(&e),
        };
    }
    if raw.starts_with('[') && raw.ends_with(']') {
        if let Ok(path) = raw.parse::<GraphPath>() {
            return path_text(&path);
        }
    }
    raw.to_string()
}

/// JSON value for one result cell.
fn cell_json(raw: Option<&str>) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };
    if let Some(entity) = Entity::parse_any(raw) {
        return Ok(serde_json::to_value(entity)?);
    }
    if raw.starts_with('[') && raw.ends_with(']') {
        if let Ok(path) = raw.parse::<GraphPath>() {
            return Ok(serde_json::to_value(path)?);
        }
    }
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
}

/// Print rows as a table.
pub fn print_rows(rows: &[Row]) {
    let Some(first) = rows.first() else {
        println!("{}", "(no rows)".dimmed());
        return;
    };

    let columns = first.columns();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            row.values()
                .iter()
                .map(|v| truncate_visual(&cell_text(v.as_deref()), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .filter_map(|r| r.get(i))
                .map(|c| UnicodeWidthStr::width(c.as_str()))
                .chain(std::iter::once(UnicodeWidthStr::width(name.as_str())))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(name, w)| pad_right(name, *w).bold().to_string())
        .collect();
    println!("{}", header.join(" │ "));
    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    println!("{}", rule.join("─┼─").dimmed());

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad_right(cell, *w))
            .collect();
        println!("{}", line.join(" │ "));
    }

    println!();
    println!("{}", format!("({} row{})", rows.len(), if rows.len() == 1 { "" } else { "s" }).dimmed());
}

/// Print rows as a JSON array of objects keyed by column name.
pub fn print_rows_json(rows: &[Row]) -> Result<()> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut obj = Map::new();
        for (name, value) in row.columns().iter().zip(row.values()) {
            obj.insert(name.clone(), cell_json(value.as_deref())?);
        }
        out.push(Value::Object(obj));
    }
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

pub fn print_history(history: &VecDeque<HistoryEntry>) {
    println!();
    println!("{}", "History".bold());
    for (i, entry) in history.iter().enumerate() {
        println!(
            "{:>3}  {}  {}",
            i + 1,
            entry.executed_at.format("%H:%M:%S%.3f").to_string().dimmed(),
            entry.command
        );
    }
}

/// Print label names with optional entity counts.
pub fn print_labels(kind: LabelKind, labels: &[(String, Option<u64>)]) {
    let title = match kind {
        LabelKind::Vertex => "Vertex labels",
        LabelKind::Edge => "Edge labels",
    };
    println!("{}", title.bold());

    if labels.is_empty() {
        println!("  {}", "(none)".dimmed());
        return;
    }

    let width = labels
        .iter()
        .map(|(name, _)| UnicodeWidthStr::width(name.as_str()))
        .max()
        .unwrap_or(0);
    for (name, count) in labels {
        match count {
            Some(n) => println!("  {} {}", pad_right(name, width).cyan(), n.to_string().green()),
            None => println!("  {}", name.cyan()),
        }
    }
}

pub fn print_hierarchy(hierarchy: &LabelHierarchy) {
    let tree = hierarchy.render_tree();
    if tree.is_empty() {
        println!("{}", "No labels.".dimmed());
    } else {
        print!("{}", tree);
    }
}
