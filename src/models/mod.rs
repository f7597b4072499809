use serde::Serialize;
use serde_json::{Map, Value};

// ── Column-oriented data ──────────────────────────────────────────────────────

/// One output row: header name → scalar (or nested) value, in insertion order.
pub type Record = Map<String, Value>;

/// A single column of a [`ColumnMapping`].
///
/// Most columns hold one value per row. A `Nested` column groups several
/// parallel columns under one key (e.g. `top_scorer` → `player` +
/// `goals_scored`) and is indexed recursively when reoriented.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Values(Vec<Value>),
    Nested(ColumnMapping),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Values(v) => v.len(),
            Column::Nested(m) => m.row_count(),
        }
    }

    /// Value at row `i`. Out-of-range rows are `null`, never a panic.
    pub fn value_at(&self, i: usize) -> Value {
        match self {
            Column::Values(v) => v.get(i).cloned().unwrap_or(Value::Null),
            Column::Nested(m) => Value::Object(m.record_at(i)),
        }
    }

    pub fn as_values(&self) -> Option<&[Value]> {
        match self {
            Column::Values(v) => Some(v),
            Column::Nested(_) => None,
        }
    }
}

/// Header name → column, preserving header order.
///
/// Within a mapping produced by the row parser every column has the same
/// length; that length is the table's row count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    columns: Vec<(String, Column)>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a column. A replaced column keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, column: Column) {
        let name = name.into();
        match self.columns.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = column,
            None => self.columns.push((name, column)),
        }
    }

    pub fn insert_values(&mut self, name: impl Into<String>, values: Vec<Value>) {
        self.insert(name, Column::Values(values));
    }

    /// Insert a column of optional strings (the shape produced by id extraction).
    pub fn insert_opt_strings(&mut self, name: impl Into<String>, values: Vec<Option<String>>) {
        let values = values
            .into_iter()
            .map(|v| v.map(Value::String).unwrap_or(Value::Null))
            .collect();
        self.insert_values(name, values);
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(k, _)| k == name).map(|(_, c)| c)
    }

    pub fn values(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Column::as_values)
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|(k, _)| k == name)?;
        Some(self.columns.remove(pos).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(k, c)| (k.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Length of the longest column.
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }

    /// Every column indexed at row `i`.
    pub fn record_at(&self, i: usize) -> Record {
        self.columns
            .iter()
            .map(|(k, c)| (k.clone(), c.value_at(i)))
            .collect()
    }

    /// Apply `f` to every value of a plain column, if present.
    pub fn map_column(&mut self, name: &str, mut f: impl FnMut(&Value) -> Value) {
        if let Some((_, Column::Values(values))) = self.columns.iter_mut().find(|(k, _)| k == name) {
            for v in values.iter_mut() {
                *v = f(v);
            }
        }
    }

    pub(crate) fn into_columns(self) -> Vec<(String, Column)> {
        self.columns
    }
}

impl FromIterator<(String, Column)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (String, Column)>>(iter: I) -> Self {
        let mut mapping = ColumnMapping::new();
        for (k, c) in iter {
            mapping.insert(k, c);
        }
        mapping
    }
}

// ── Reassembled stat records ──────────────────────────────────────────────────

/// One entity (player, team, match) after multi-category reassembly.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct EntityRecord {
    pub meta_data: Record,
    /// Category name → that category's non-meta fields for this entity.
    pub stats: Map<String, Value>,
}

// ── Response shapes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Countries endpoint: the full list, or a single record when filtered by name.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CountriesResponse {
    All(DataResponse<Vec<Record>>),
    Single(Record),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeagueGroup {
    pub league_type: String,
    pub leagues: Vec<Record>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeagueSeasonDetails {
    pub lg_id: u32,
    pub season_id: String,
    pub league_start: Option<String>,
    pub league_end: Option<String>,
    pub league_type: Option<String>,
    pub has_adv_stats: Option<String>,
    pub rounds: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StandingsTable {
    pub standings_type: String,
    pub standings: Vec<Record>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TeamResponse {
    pub team_roster: DataResponse<Vec<Record>>,
    pub team_schedule: DataResponse<Vec<Record>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PlayerProfile {
    pub player_id: String,
    pub full_name: Option<String>,
    pub positions: Option<Vec<String>>,
    pub footed: Option<String>,
    pub date_of_birth: Option<String>,
    pub birth_city: Option<String>,
    pub nationality: Option<String>,
    pub wages: Option<String>,
    pub height: Option<f64>,
    pub photo_url: Option<String>,
    pub birth_country: Option<String>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PlayerSeasonStats {
    pub players: Vec<EntityRecord>,
    pub keepers: Vec<EntityRecord>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MatchTeamStats {
    pub team_name: String,
    pub home_away: String,
    pub players: Vec<EntityRecord>,
    pub keepers: Vec<Record>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut m = ColumnMapping::new();
        m.insert_values("a", vec![json!("1")]);
        m.insert_values("b", vec![json!("2")]);
        m.insert_values("a", vec![json!("3")]);
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(m.values("a"), Some(&[json!("3")][..]));
    }

    #[test]
    fn test_record_at_out_of_range_is_null() {
        let mut m = ColumnMapping::new();
        m.insert_values("long", vec![json!(1), json!(2)]);
        m.insert_values("short", vec![json!(1)]);
        let rec = m.record_at(1);
        assert_eq!(rec["long"], json!(2));
        assert_eq!(rec["short"], Value::Null);
    }
}
