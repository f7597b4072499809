use crate::error::{Result, ScrapeError};
use crate::models::{Column, ColumnMapping, Record};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Value, json};
use std::sync::LazyLock;

static COUNTRY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(.*)").expect("country prefix pattern"));
static SHOOTOUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*\((\d+)\)").expect("shootout pattern"));

// ── Scalar cleaners ───────────────────────────────────────────────────────────

/// Strip a leading 2-3 letter lowercase country/confederation code and any
/// trailing dash-delimited qualifier.
/// "engArsenal" → "Arsenal" | "Real Madrid-Spain" → "Real Madrid"
pub fn clean_team_name(name: &str) -> String {
    let name = match COUNTRY_PREFIX.captures(name) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => name,
    };
    let parts: Vec<&str> = name.split('-').collect();
    let name = if parts.len() > 1 {
        parts[..parts.len() - 1].join(" ")
    } else {
        name.to_string()
    };
    name.trim().to_string()
}

/// "2 (4)" → "2". Goals from a penalty shootout are dropped.
pub fn clean_gf_ga(s: &str) -> String {
    match SHOOTOUT.captures(s) {
        Some(caps) => caps[1].to_string(),
        None => s.to_string(),
    }
}

/// "FW,MF" → ["FW", "MF"]; single positions stay a string.
pub fn clean_position(s: &str) -> Value {
    if s.contains(',') {
        Value::Array(s.split(',').map(|p| json!(p.trim())).collect())
    } else {
        json!(s)
    }
}

/// "25-123" (years-days) → "25".
pub fn clean_age(s: &str) -> String {
    s.split('-').next().unwrap_or_default().to_string()
}

/// "1,234" → "1234".
pub fn clean_minutes(s: &str) -> String {
    s.replace(',', "")
}

/// "Men/Women" → ["M", "F"]; anything unrecognised → null.
pub fn clean_national_teams(s: &str) -> Value {
    match s {
        "Men/Women" => json!(["M", "F"]),
        "Men" => json!(["M"]),
        "Women" => json!(["F"]),
        _ => Value::Null,
    }
}

/// Split a "player-goals" cell.
/// "Messi-20" → {"player": "Messi", "goals_scored": 20}
/// "Messi,Ronaldo-10" → {"player": ["Messi", "Ronaldo"], "goals_scored": 10}
pub fn split_top_scorer(cell: &str) -> Result<(Value, Value)> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok((Value::Null, Value::Null));
    }
    let (players, goals) = cell.rsplit_once('-').ok_or_else(|| ScrapeError::Coercion {
        column: "top_scorer".into(),
        value: cell.into(),
        target: "player-goals",
    })?;
    let goals: i64 = goals.trim().parse().map_err(|_| ScrapeError::Coercion {
        column: "top_scorer".into(),
        value: cell.into(),
        target: "int",
    })?;
    let player = if players.contains(',') {
        Value::Array(players.split(',').map(|p| json!(p.trim())).collect())
    } else {
        json!(players.trim())
    };
    Ok((player, json!(goals)))
}

/// Replace a "player-goals" column with a nested `{player, goals_scored}` column.
pub fn nest_top_scorer(mut mapping: ColumnMapping, key: &str) -> Result<ColumnMapping> {
    let Some(values) = mapping.values(key).map(<[Value]>::to_vec) else {
        return Ok(mapping);
    };
    let mut players = Vec::with_capacity(values.len());
    let mut goals = Vec::with_capacity(values.len());
    for v in &values {
        let (p, g) = split_top_scorer(v.as_str().unwrap_or_default())?;
        players.push(p);
        goals.push(g);
    }
    let mut nested = ColumnMapping::new();
    nested.insert_values("player", players);
    nested.insert_values("goals_scored", goals);
    mapping.insert(key, Column::Nested(nested));
    Ok(mapping)
}

/// "March 3, 1990" or "1990-03-03" → "1990-03-03".
pub fn parse_date(s: &str) -> Option<String> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d", "%B %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.format("%Y-%m-%d").to_string());
        }
    }
    None
}

/// Apply a string cleaner to every string value of a column; other values pass through.
pub fn clean_column(mapping: &mut ColumnMapping, key: &str, f: impl Fn(&str) -> String) {
    mapping.map_column(key, |v| match v {
        Value::String(s) => Value::String(f(s)),
        other => other.clone(),
    });
}

// ── Type coercion ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Int,
    Float,
}

/// Convert the listed columns from text to integers / floats.
///
/// Empty strings and nulls become null, never zero. Thousands separators are
/// ignored. A non-empty value that does not parse is an error: it means the
/// page layout or the column map changed.
pub fn convert<S: AsRef<str>>(mut mapping: ColumnMapping, int_keys: &[S], float_keys: &[S]) -> Result<ColumnMapping> {
    for (keys, target) in [(int_keys, Target::Int), (float_keys, Target::Float)] {
        for key in keys {
            let key = key.as_ref();
            let Some(values) = mapping.values(key) else { continue };
            let converted = values
                .iter()
                .map(|v| coerce(key, v, target))
                .collect::<Result<Vec<_>>>()?;
            mapping.insert_values(key, converted);
        }
    }
    Ok(mapping)
}

fn coerce(column: &str, value: &Value, target: Target) -> Result<Value> {
    let s = match value {
        Value::Null => return Ok(Value::Null),
        Value::String(s) => s.trim(),
        Value::Number(_) => return Ok(value.clone()),
        other => {
            return Err(ScrapeError::Coercion {
                column: column.into(),
                value: other.to_string(),
                target: target_name(target),
            });
        }
    };
    if s.is_empty() {
        return Ok(Value::Null);
    }
    let err = || ScrapeError::Coercion {
        column: column.into(),
        value: s.into(),
        target: target_name(target),
    };
    let digits = s.replace(',', "");
    match target {
        Target::Int => digits.parse::<i64>().map(Value::from).map_err(|_| err()),
        Target::Float => digits.parse::<f64>().map(|f| json!(f)).map_err(|_| err()),
    }
}

fn target_name(target: Target) -> &'static str {
    match target {
        Target::Int => "int",
        Target::Float => "float",
    }
}

// ── Key shaping ───────────────────────────────────────────────────────────────

/// Rename one key. Missing keys are left alone.
pub fn rename(mut mapping: ColumnMapping, old: &str, new: &str) -> ColumnMapping {
    if let Some(column) = mapping.remove(old) {
        mapping.insert(new, column);
    }
    mapping
}

/// Project onto `order`: only keys present in both, in `order`'s sequence.
/// Keys not listed are dropped.
pub fn reorder<S: AsRef<str>>(mapping: ColumnMapping, order: &[S]) -> ColumnMapping {
    let mut columns = mapping.into_columns();
    order
        .iter()
        .filter_map(|key| {
            let pos = columns.iter().position(|(k, _)| k == key.as_ref())?;
            Some(columns.swap_remove(pos))
        })
        .collect()
}

pub fn delete_keys<S: AsRef<str>>(mut mapping: ColumnMapping, keys: &[S]) -> ColumnMapping {
    for key in keys {
        mapping.remove(key.as_ref());
    }
    mapping
}

/// Same projection as [`reorder`] for a single record.
pub fn reorder_record<S: AsRef<str>>(mut record: Record, order: &[S]) -> Record {
    order
        .iter()
        .filter_map(|key| record.remove(key.as_ref()).map(|v| (key.as_ref().to_string(), v)))
        .collect()
}

// ── Reorientation ─────────────────────────────────────────────────────────────

/// Column-oriented → row records. The row count is the length of `id_key`'s
/// column; nested columns are indexed at the same row. A missing `id_key`
/// means no rows.
pub fn reorient(mapping: &ColumnMapping, id_key: &str) -> Vec<Record> {
    let rows = mapping.get(id_key).map_or(0, Column::len);
    (0..rows).map(|i| mapping.record_at(i)).collect()
}
