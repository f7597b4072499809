//! Column-map-driven cleaning of multi-category statistic tables and their
//! reassembly into one record per entity.

use crate::error::Result;
use crate::models::{ColumnMapping, EntityRecord, Record};
use crate::registry::{CategoryConfig, EntityColumnMap, StatMode};
use crate::scraper::cleaner::{
    clean_age, clean_column, clean_gf_ga, clean_minutes, clean_position, clean_team_name, convert,
    delete_keys, rename, reorder, reorder_record,
};
use crate::scraper::parsers::{RawTable, compile_patterns, find_by_caption};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// Cleaned (or raw) per-category column mappings, in category order.
pub type StatCategoryMap = Vec<(String, ColumnMapping)>;

/// More categories than `threshold` means the advanced layout.
pub fn select_mode(categories_present: usize, threshold: usize) -> StatMode {
    if categories_present > threshold {
        StatMode::Advanced
    } else {
        StatMode::NonAdvanced
    }
}

/// Pair each category with the first table whose caption matches its
/// pattern. Categories with no matching table are left out.
pub fn locate_categories<'a>(
    tables: &'a [RawTable],
    categories: &[(&str, &str)],
) -> Result<Vec<(String, &'a RawTable)>> {
    let mut found = Vec::with_capacity(categories.len());
    for (category, pattern) in categories {
        let patterns = compile_patterns(&[*pattern])?;
        match find_by_caption(tables, &patterns).first() {
            Some(table) => found.push((category.to_string(), *table)),
            None => debug!("No table for category {}", category),
        }
    }
    Ok(found)
}

// ── Per-category cleaning ─────────────────────────────────────────────────────

/// Fix known problem columns before any renaming happens.
pub fn apply_scalar_cleaners(mapping: &mut ColumnMapping) {
    for key in ["pos", "position", "positions"] {
        mapping.map_column(key, |v| match v {
            Value::String(s) => clean_position(s),
            other => other.clone(),
        });
    }
    clean_column(mapping, "age", clean_age);
    clean_column(mapping, "min", clean_minutes);
    for key in ["opponent", "squad", "team_name"] {
        clean_column(mapping, key, clean_team_name);
    }
    for key in ["gf", "ga"] {
        clean_column(mapping, key, clean_gf_ga);
    }
}

/// Scalar cleaners, then drop → rename → project → coerce per `config`.
pub fn clean_category(mut mapping: ColumnMapping, config: &CategoryConfig) -> Result<ColumnMapping> {
    apply_scalar_cleaners(&mut mapping);
    let mut mapping = delete_keys(mapping, &config.drop_columns);

    let original: Vec<String> = mapping.keys().map(str::to_string).collect();
    for key in &original {
        if let Some(new) = config.name_mapping.get(key) {
            mapping = rename(mapping, key, new);
        }
    }

    let mapping = reorder(mapping, &config.final_order);
    convert(mapping, &config.int_columns, &config.float_columns)
}

pub fn clean_categories(raw: StatCategoryMap, entity: &EntityColumnMap, mode: StatMode) -> Result<StatCategoryMap> {
    raw.into_iter()
        .map(|(category, mapping)| {
            let config = entity.category(mode, &category)?;
            Ok((category, clean_category(mapping, config)?))
        })
        .collect()
}

/// Pick the layout from the category count, clean every category against
/// it and reassemble one record per row of `reference` (category, column).
pub fn build_records(
    entity: &EntityColumnMap,
    raw: StatCategoryMap,
    threshold: usize,
    reference: (&str, &str),
) -> Result<Vec<EntityRecord>> {
    let mode = select_mode(raw.len(), threshold);
    debug!("{} categories, {} layout", raw.len(), mode.as_str());
    let cleaned = clean_categories(raw, entity, mode)?;
    Ok(reassemble(&cleaned, reference.0, reference.1, &entity.meta_data))
}

// ── Reassembly ────────────────────────────────────────────────────────────────

/// Merge per-category mappings into one [`EntityRecord`] per row.
///
/// The row count comes from `reference_column` of `reference_category`.
/// Meta fields are taken from the first category that carries them. Any
/// other field belongs to the first category (in order) that has a value
/// for it at that row; later categories omit it. A category shorter than
/// the reference yields `null` for its fields.
pub fn reassemble(
    categories: &[(String, ColumnMapping)],
    reference_category: &str,
    reference_column: &str,
    meta_fields: &[String],
) -> Vec<EntityRecord> {
    let rows = categories
        .iter()
        .find(|(name, _)| name == reference_category)
        .and_then(|(_, mapping)| mapping.get(reference_column))
        .map_or(0, |column| column.len());

    (0..rows)
        .map(|i| {
            let mut meta_data = Record::new();
            let mut stats = Map::new();
            let mut used: HashSet<&str> = HashSet::new();

            for (category, mapping) in categories {
                let mut fields = Record::new();
                for (field, column) in mapping.iter() {
                    if meta_fields.iter().any(|m| m == field) {
                        if !meta_data.contains_key(field) {
                            meta_data.insert(field.to_string(), column.value_at(i));
                        }
                    } else if used.contains(field) {
                        continue;
                    } else if i < column.len() {
                        fields.insert(field.to_string(), column.value_at(i));
                        used.insert(field);
                    } else {
                        fields.insert(field.to_string(), Value::Null);
                    }
                }
                stats.insert(category.clone(), Value::Object(fields));
            }

            EntityRecord {
                meta_data: reorder_record(meta_data, meta_fields),
                stats,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::parsers::tables_from_html;
    use serde_json::json;
    use std::collections::HashMap;

    fn mapping(columns: &[(&str, Vec<&str>)]) -> ColumnMapping {
        let mut m = ColumnMapping::new();
        for (name, values) in columns {
            m.insert_values(*name, values.iter().map(|v| json!(v)).collect());
        }
        m
    }

    fn meta(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_select_mode() {
        assert_eq!(select_mode(11, 5), StatMode::Advanced);
        assert_eq!(select_mode(5, 5), StatMode::NonAdvanced);
        assert_eq!(select_mode(2, 1), StatMode::Advanced);
        assert_eq!(select_mode(1, 1), StatMode::NonAdvanced);
    }

    #[test]
    fn test_meta_field_taken_from_first_category() {
        let categories = vec![
            ("a".to_string(), mapping(&[("date", vec!["2024-01-01"]), ("gls", vec!["1"])])),
            ("b".to_string(), mapping(&[("date", vec!["1999-09-09"]), ("tkl", vec!["4"])])),
        ];
        let records = reassemble(&categories, "a", "date", &meta(&["date"]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].meta_data["date"], json!("2024-01-01"));
        assert_eq!(records[0].stats["a"], json!({"gls": "1"}));
        assert_eq!(records[0].stats["b"], json!({"tkl": "4"}));
    }

    #[test]
    fn test_repeated_stat_owned_by_first_category() {
        let categories = vec![
            ("summary".to_string(), mapping(&[("player", vec!["A", "B"]), ("min", vec!["90", "45"])])),
            ("passing".to_string(), mapping(&[("player", vec!["A", "B"]), ("min", vec!["90", "45"]), ("cmp", vec!["30", "12"])])),
        ];
        let records = reassemble(&categories, "summary", "player", &[]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].stats["summary"], json!({"player": "B", "min": "45"}));
        assert_eq!(records[1].stats["passing"], json!({"cmp": "12"}));
    }

    #[test]
    fn test_short_category_yields_nulls() {
        let categories = vec![
            ("stats".to_string(), mapping(&[("player_id", vec!["p1", "p2", "p3"]), ("gls", vec!["1", "2", "3"])])),
            ("keepers".to_string(), mapping(&[("player_id", vec!["p1"]), ("saves", vec!["5"])])),
        ];
        let records = reassemble(&categories, "stats", "player_id", &meta(&["player_id"]));
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].stats["keepers"], json!({"saves": "5"}));
        assert_eq!(records[2].stats["keepers"], json!({"saves": null}));
        assert_eq!(records[2].meta_data["player_id"], json!("p3"));
    }

    #[test]
    fn test_meta_data_follows_meta_list_order() {
        let categories = vec![(
            "stats".to_string(),
            mapping(&[("team_id", vec!["t1"]), ("team_name", vec!["Arsenal"])]),
        )];
        let records = reassemble(&categories, "stats", "team_id", &meta(&["team_name", "team_id"]));
        let keys: Vec<&String> = records[0].meta_data.keys().collect();
        assert_eq!(keys, vec!["team_name", "team_id"]);
    }

    #[test]
    fn test_missing_reference_means_no_rows() {
        let categories = vec![("stats".to_string(), mapping(&[("gls", vec!["1"])]))];
        assert!(reassemble(&categories, "stats", "team_id", &[]).is_empty());
        assert!(reassemble(&categories, "keepers", "gls", &[]).is_empty());
    }

    #[test]
    fn test_clean_category_pipeline() {
        let raw = mapping(&[
            ("squad", vec!["engArsenal", "Chelsea"]),
            ("age", vec!["25-123", "30"]),
            ("min", vec!["1,234", ""]),
            ("poss", vec!["55", "45"]),
            ("junk", vec!["x", "y"]),
        ]);
        let config = CategoryConfig {
            drop_columns: vec!["poss".into()],
            name_mapping: HashMap::from([("squad".to_string(), "team_name".to_string())]),
            final_order: meta(&["team_name", "age", "min", "poss"]),
            int_columns: meta(&["age", "min"]),
            float_columns: vec![],
        };
        let cleaned = clean_category(raw, &config).unwrap();
        assert_eq!(cleaned.keys().collect::<Vec<_>>(), vec!["team_name", "age", "min"]);
        assert_eq!(cleaned.values("team_name").unwrap(), &[json!("Arsenal"), json!("Chelsea")]);
        assert_eq!(cleaned.values("age").unwrap(), &[json!(25), json!(30)]);
        assert_eq!(cleaned.values("min").unwrap(), &[json!(1234), Value::Null]);
    }

    #[test]
    fn test_clean_categories_unknown_category_is_configuration_error() {
        let entity = EntityColumnMap::default();
        let raw = vec![("stats".to_string(), mapping(&[("gls", vec!["1"])]))];
        assert!(clean_categories(raw, &entity, StatMode::Advanced).is_err());
    }

    #[test]
    fn test_locate_categories_by_pattern() {
        let html = "<table><caption>Squad Shooting Table</caption><tr><th>a</th></tr></table>\
                    <table><caption>Squad Standard Stats Table</caption><tr><th>b</th></tr></table>";
        let tables = tables_from_html(html);
        let found = locate_categories(
            &tables,
            &[("stats", r"^Squad\sStandard"), ("keepers", r"^Squad\sGoalkeeping"), ("shooting", r"^Squad\sShooting")],
        )
        .unwrap();
        let names: Vec<&str> = found.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["stats", "shooting"]);
        assert_eq!(found[0].1.rows[0].cells, vec!["b"]);
    }
}
