use crate::error::Result;
use crate::models::ColumnMapping;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").expect("table selector"));
static CAPTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("caption").expect("caption selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("tr selector"));
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").expect("cell selector"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector"));

// ── Raw tables ────────────────────────────────────────────────────────────────

/// An owned snapshot of one `<table>`: its caption plus, per `<tr>`, the
/// cell texts and anchor hrefs. Detached from the DOM so it can outlive the
/// parsed document (comment-embedded tables live in their own fragments).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub caption: Option<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub spacer: bool,
    pub cells: Vec<String>,
    pub hrefs: Vec<String>,
}

impl RawTable {
    fn from_element(table: ElementRef) -> Self {
        let caption = table
            .select(&CAPTION)
            .next()
            .map(|c| c.text().collect::<String>().trim().to_string());

        let rows = table
            .select(&ROW)
            .map(|tr| RawRow {
                spacer: tr.value().classes().any(|c| c == "spacer"),
                cells: tr.select(&CELL).map(cell_text).collect(),
                hrefs: tr
                    .select(&ANCHOR)
                    .filter_map(|a| a.value().attr("href"))
                    .map(str::to_string)
                    .collect(),
            })
            .collect();

        Self { caption, rows }
    }

    /// Caption text with the literal word "Table" removed.
    pub fn name(&self) -> Option<String> {
        self.caption_text(true)
    }

    pub fn caption_text(&self, remove_table: bool) -> Option<String> {
        let caption = self.caption.as_deref()?;
        if remove_table && caption.contains("Table") {
            Some(caption.replace("Table", "").trim().to_string())
        } else {
            Some(caption.to_string())
        }
    }

    /// Rows that are not spacer rows.
    pub fn clean_rows(&self) -> impl Iterator<Item = &RawRow> {
        self.rows.iter().filter(|r| !r.spacer)
    }
}

/// Text of a cell: every text node trimmed, empty ones skipped, joined with
/// no separator. fbref relies on this (a flag code and a country name in
/// adjacent nodes come out as `"engEngland"`).
fn cell_text(el: ElementRef) -> String {
    el.text().map(str::trim).filter(|t| !t.is_empty()).collect()
}

// ── Table locator ─────────────────────────────────────────────────────────────

/// Every table in document order, followed by every table hidden in an
/// HTML comment.
pub fn find_all_tables(doc: &Html) -> Vec<RawTable> {
    let mut tables: Vec<RawTable> = doc.select(&TABLE).map(RawTable::from_element).collect();

    let commented: Vec<RawTable> = doc
        .tree
        .root()
        .descendants()
        .filter_map(|node| node.value().as_comment())
        .filter(|comment| comment.contains("<table"))
        .filter_map(|comment| {
            let fragment = Html::parse_fragment(comment);
            fragment.select(&TABLE).next().map(RawTable::from_element)
        })
        .collect();

    debug!("Found {} tables, {} inside comments", tables.len() + commented.len(), commented.len());
    tables.extend(commented);
    tables
}

/// Parse an HTML page and return all of its tables.
pub fn tables_from_html(html: &str) -> Vec<RawTable> {
    let doc = Html::parse_document(html);
    find_all_tables(&doc)
}

pub fn compile_patterns(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| Regex::new(p).map_err(Into::into)).collect()
}

/// Tables whose caption matches any of `patterns`.
///
/// Tables are visited in order; the first matching pattern selects a table.
/// A table whose matched text was already selected is skipped, so the first
/// of two same-captioned tables wins. An empty result means "not available".
pub fn find_by_caption<'a>(tables: &'a [RawTable], patterns: &[Regex]) -> Vec<&'a RawTable> {
    let mut selected = Vec::new();
    let mut seen: Vec<Vec<String>> = Vec::new();

    for table in tables {
        let Some(name) = table.name() else { continue };
        for pattern in patterns {
            let matched = find_all(pattern, &name);
            if matched.is_empty() {
                continue;
            }
            if !seen.contains(&matched) {
                seen.push(matched);
                selected.push(table);
            }
            break;
        }
    }
    selected
}

/// All non-overlapping matches: the first capture group when the pattern
/// has one, otherwise the whole match.
fn find_all(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn first_match(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|p| {
        p.captures(text)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| m.as_str().to_string())
    })
}

// ── Row / table parser ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Skip one leading row (tables with two stacked header rows).
    pub skip_row: bool,
    /// Fixed number of trailing data rows to drop.
    pub drop_rows: usize,
    /// Drop trailing rows whose first cell contains "Total"; overrides `drop_rows`.
    pub exclude_totals: bool,
}

impl ParseOptions {
    pub fn skip_header() -> Self {
        Self { skip_row: true, ..Self::default() }
    }
}

/// Header cells plus the data rows that survived filtering. Column data and
/// embedded ids are both derived from the same row set, so they always line up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Parse a table into header + aligned data rows.
///
/// Data rows whose cell count differs from the header's are dropped after
/// totals/trailing rows are removed.
pub fn parse_table(table: &RawTable, opts: ParseOptions) -> ParsedTable {
    let mut rows: Vec<&RawRow> = table.clean_rows().collect();
    if opts.skip_row && !rows.is_empty() {
        rows.remove(0);
    }
    let Some((header, data)) = rows.split_first() else {
        return ParsedTable::default();
    };

    let data = trim_trailing(data, opts);
    let width = header.cells.len();
    build(header, data.iter().copied().filter(|r| r.cells.len() == width))
}

/// Stricter variant for per-player/per-team statistic tables: rows whose cell
/// count differs from the header's are removed before anything else, since
/// unplayed matches and suspended players carry only a handful of cells.
pub fn parse_stat_table(table: &RawTable, opts: ParseOptions) -> ParsedTable {
    let rows: Vec<&RawRow> = table.clean_rows().collect();
    let header_idx = usize::from(opts.skip_row);
    let Some(header) = rows.get(header_idx) else {
        return ParsedTable::default();
    };

    let width = header.cells.len();
    let data: Vec<&RawRow> = rows[header_idx + 1..]
        .iter()
        .copied()
        .filter(|r| r.cells.len() == width)
        .collect();

    let data = trim_trailing(&data, opts);
    build(header, data.iter().copied())
}

fn trim_trailing<'a>(data: &'a [&'a RawRow], opts: ParseOptions) -> &'a [&'a RawRow] {
    let drop = if opts.exclude_totals {
        count_totals_rows(data)
    } else {
        opts.drop_rows
    };
    &data[..data.len().saturating_sub(drop)]
}

/// Number of trailing rows whose first cell contains "Total".
pub fn count_totals_rows(rows: &[&RawRow]) -> usize {
    rows.iter()
        .rev()
        .take_while(|r| r.cells.first().is_some_and(|c| c.contains("Total")))
        .count()
}

fn build<'a>(header: &RawRow, data: impl Iterator<Item = &'a RawRow>) -> ParsedTable {
    let headers = dedup_headers(header.cells.iter().map(|h| format_field(h)).collect());
    ParsedTable {
        headers,
        rows: data.cloned().collect(),
    }
}

/// `" Goals Scored "` → `"goals_scored"`.
pub fn format_field(field: &str) -> String {
    field.trim().to_lowercase().replace(' ', "_")
}

/// Suffix repeated header names with an increasing integer; the first
/// occurrence keeps its bare name: `gls, gls, gls` → `gls, gls1, gls2`.
pub fn dedup_headers(headers: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .map(|h| {
            let n = counts.entry(h.clone()).or_insert(0);
            *n += 1;
            if *n == 1 { h } else { format!("{}{}", h, *n - 1) }
        })
        .collect()
}

impl ParsedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column-oriented view: header → one string value per data row.
    pub fn to_column_mapping(&self) -> ColumnMapping {
        self.headers
            .iter()
            .enumerate()
            .map(|(j, h)| {
                let values = self
                    .rows
                    .iter()
                    .map(|r| Value::String(r.cells.get(j).cloned().unwrap_or_default()))
                    .collect();
                (h.clone(), crate::models::Column::Values(values))
            })
            .collect()
    }

    /// One entry per data row: the first capture of the first pattern that
    /// matches one of the row's hrefs, or `None`.
    pub fn extract_ids(&self, patterns: &[Regex]) -> Vec<Option<String>> {
        self.rows
            .iter()
            .map(|row| row.hrefs.iter().find_map(|href| first_match(patterns, href)))
            .collect()
    }

    /// Per row, the first two distinct ids matched in the row's hrefs
    /// (home/away, or team/opponent). Rows with fewer than two yield `None`
    /// for both.
    pub fn extract_id_pairs(&self, patterns: &[Regex]) -> (Vec<Option<String>>, Vec<Option<String>>) {
        self.rows
            .iter()
            .map(|row| {
                let mut distinct: Vec<String> = Vec::new();
                for id in row.hrefs.iter().filter_map(|h| first_match(patterns, h)) {
                    if !distinct.contains(&id) {
                        distinct.push(id);
                    }
                }
                match distinct.as_slice() {
                    [first, second, ..] => (Some(first.clone()), Some(second.clone())),
                    _ => (None, None),
                }
            })
            .unzip()
    }
}
