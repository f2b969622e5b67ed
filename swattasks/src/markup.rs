//! Lightweight markup formatting for task descriptions and notes
//!
//! Converts a small markup subset into an HTML fragment that is safe to
//! render directly:
//! - `**strong**`, `*emphasis*`, `==highlight==`
//! - `[label](https://...)` links, opened in a new browsing context
//! - pipe-delimited tables with a `| --- |` separator row (cells of dashes
//!   and colons)
//!
//! Angle brackets are escaped before anything else, so the only tags in the
//! output are the ones inserted here. Anything that does not parse cleanly
//! is left as literal text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static STRONG_EMPHASIS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*\*([^*\n]+?)\*\*\*").expect("valid strong emphasis regex")
});
static STRONG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid strong regex"));
static EMPHASIS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^*])\*([^*\n]+)\*").expect("valid emphasis regex"));
static HIGHLIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"==(.+?)==").expect("valid highlight regex"));
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]\n]+)\]\((https?://[^)\s]+)\)").expect("valid link regex")
});
static TABLE_ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\|.*\|\s*$").expect("valid table row regex"));
static TABLE_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\|(\s*[-:]+\s*\|)+\s*$").expect("valid table separator regex")
});

/// Format markup text into a sanitized HTML fragment.
///
/// Passes run in a fixed order. Each pass only sees the output of the
/// previous ones, so inserted tags are never re-interpreted as input.
pub fn format_markup(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let text = escape_angle_brackets(input);
    // Triple markers first so the tags nest
    let text = STRONG_EMPHASIS_RE.replace_all(&text, "<strong><em>$1</em></strong>");
    let text = STRONG_RE.replace_all(&text, "<strong>$1</strong>");
    let text = EMPHASIS_RE.replace_all(&text, "${1}<em>${2}</em>");
    let text = HIGHLIGHT_RE.replace_all(&text, "<mark>$1</mark>");
    let text = LINK_RE.replace_all(&text, |caps: &Captures| {
        format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
            escape_url_quotes(&caps[2]),
            escape_label_quotes(&caps[1])
        )
    });

    convert_tables(&text)
}

/// Format a loosely-typed value. Anything other than a string yields an
/// empty fragment.
pub fn format_markup_value(value: &Value) -> String {
    match value {
        Value::String(text) => format_markup(text),
        _ => String::new(),
    }
}

fn escape_angle_brackets(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_label_quotes(label: &str) -> String {
    label.replace('"', "&quot;").replace('\'', "&#39;")
}

fn escape_url_quotes(url: &str) -> String {
    url.replace('"', "%22").replace('\'', "%27")
}

/// Replace runs of pipe-delimited lines with table markup.
fn convert_tables(text: &str) -> String {
    let mut output: Vec<String> = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if TABLE_ROW_RE.is_match(line) {
            block.push(line);
            continue;
        }
        flush_table_block(&mut block, &mut output);
        output.push(line.to_string());
    }
    flush_table_block(&mut block, &mut output);

    output.join("\n")
}

fn flush_table_block(block: &mut Vec<&str>, output: &mut Vec<String>) {
    if block.is_empty() {
        return;
    }

    match render_table(block) {
        Some(table) => output.push(table),
        None => output.extend(block.iter().map(|line| line.to_string())),
    }
    block.clear();
}

/// Render a block as a table. Needs a header line followed by a separator
/// line; anything else is not a table.
fn render_table(lines: &[&str]) -> Option<String> {
    if lines.len() < 2 || !TABLE_SEPARATOR_RE.is_match(lines[1]) {
        return None;
    }

    let mut html = String::from("<table><thead><tr>");
    for cell in split_cells(lines[0]) {
        html.push_str("<th>");
        html.push_str(cell);
        html.push_str("</th>");
    }
    html.push_str("</tr></thead><tbody>");

    for line in &lines[2..] {
        html.push_str("<tr>");
        for cell in split_cells(line) {
            html.push_str("<td>");
            html.push_str(cell);
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");

    Some(html)
}

fn split_cells(line: &str) -> Vec<&str> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(str::trim).collect()
}
