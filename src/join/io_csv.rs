// Primitives for reading CSV files.

use snafu::prelude::*;

use crate::join::{
    io_common::{cell_of_text, find_field, simplify_file_name},
    *,
};

/// Reads a table with a header row. Every cell is kept as text.
pub fn read_csv_table(path: &str) -> BJoinResult<VoteTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvHeaderSnafu { path })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    debug!("read_csv_table: {}: header: {:?}", simplify_file_name(path), header);

    let mut rows: Vec<VoteRow> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is on the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let mut row = Record::new();
        for (name, value) in header.iter().zip(line.iter()) {
            row.insert(name, cell_of_text(value));
        }
        debug!("read_csv_table: lineno: {:?} row: {:?}", lineno, row);
        rows.push(row);
    }
    info!("Read {} rows from {}", rows.len(), path);
    Ok(VoteTable { header, rows })
}

/// Reads point records (polling stations, ...) with their coordinates.
///
/// Rows without valid coordinates are kept, with a null geometry.
pub fn read_csv_points(path: &str, source: &AreaSource) -> BJoinResult<Vec<AreaRecord<JSValue>>> {
    let table = read_csv_table(path)?;
    let lat_field = find_field(&table.header, &source.lat_fields());
    let lon_field = find_field(&table.header, &source.lon_fields());
    if lat_field.is_none() || lon_field.is_none() {
        warn!(
            "read_csv_points: no latitude/longitude columns in {} (header: {:?})",
            path, table.header
        );
    }

    let mut res: Vec<AreaRecord<JSValue>> = Vec::new();
    for (idx, row) in table.rows.into_iter().enumerate() {
        let lat = lat_field.as_deref().and_then(|f| coordinate(row.get(f)));
        let lon = lon_field.as_deref().and_then(|f| coordinate(row.get(f)));
        let geometry = match (lat, lon) {
            (Some(lat), Some(lon)) => json!({"type": "Point", "coordinates": [lon, lat]}),
            _ => {
                debug!("read_csv_points: row {}: no coordinates", idx);
                JSValue::Null
            }
        };
        res.push(AreaRecord {
            properties: row,
            geometry,
        });
    }
    Ok(res)
}

fn coordinate(cell: Option<&Cell>) -> Option<f64> {
    match cell {
        Some(Cell::Text(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Some(Cell::Number(f)) if f.is_finite() => Some(*f),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_with_ragged_lines() {
        let p = std::env::temp_dir().join(format!("votejoin-ragged-{}.csv", std::process::id()));
        fs::write(&p, "id, A ,B\n01,3,4\n02,5\n").unwrap();
        let table = read_csv_table(&p.display().to_string()).unwrap();
        assert_eq!(table.header, vec!["id", "A", "B"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get("id"), Some(&Cell::Text("01".to_string())));
        assert_eq!(table.rows[1].get("B"), None);
    }

    #[test]
    fn missing_file() {
        let res = read_csv_table("/nonexistent/votejoin/votes.csv");
        assert!(matches!(res.map_err(|e| *e), Err(JoinError::CsvOpen { .. })));
    }

    #[test]
    fn coordinates() {
        assert_eq!(coordinate(Some(&Cell::from(" 3.5 "))), Some(3.5));
        assert_eq!(coordinate(Some(&Cell::from("abc"))), None);
        assert_eq!(coordinate(Some(&Cell::Empty)), None);
        assert_eq!(coordinate(None), None);
    }
}
