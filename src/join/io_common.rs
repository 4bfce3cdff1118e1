use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use vote_join::{Cell, Record};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn resolve_path_buf(root: &Path, file_path: &str) -> PathBuf {
    // An absolute path replaces the root when joined.
    root.join(file_path)
}

pub fn resolve_path(root: &Path, file_path: &str) -> String {
    resolve_path_buf(root, file_path).display().to_string()
}

/// The first of the candidate fields that appears in the header.
pub fn find_field(header: &[String], candidates: &[String]) -> Option<String> {
    candidates.iter().find(|c| header.contains(c)).cloned()
}

pub fn cell_of_text(s: &str) -> Cell {
    if s.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::Text(s.to_string())
    }
}

pub fn cell_to_json(cell: &Cell) -> JSValue {
    match cell {
        Cell::Text(s) => json!(s),
        Cell::Number(f) if f.fract() == 0.0 && f.abs() < 1e15 => json!(*f as i64),
        Cell::Number(f) => json!(f),
        Cell::Empty => JSValue::Null,
    }
}

pub fn record_to_json_map(record: &Record) -> JSMap<String, JSValue> {
    record
        .fields
        .iter()
        .map(|(name, cell)| (name.clone(), cell_to_json(cell)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup() {
        let header: Vec<String> = vec!["id".to_string(), "Latitud".to_string(), "lng".to_string()];
        let lats: Vec<String> = vec!["lat".to_string(), "Latitud".to_string()];
        assert_eq!(find_field(&header, &lats), Some("Latitud".to_string()));
        assert_eq!(find_field(&header, &["x".to_string()]), None);
    }

    #[test]
    fn cells() {
        assert_eq!(cell_of_text("  "), Cell::Empty);
        assert_eq!(cell_to_json(&Cell::Number(2.0)), json!(2));
        assert_eq!(cell_to_json(&Cell::Number(2.5)), json!(2.5));
        let r = Record::from_pairs(vec![("a", "x"), ("b", "")]);
        let m = record_to_json_map(&r);
        assert_eq!(m.get("a"), Some(&json!("x")));
        assert_eq!(m.get("b"), Some(&JSValue::Null));
    }
}
