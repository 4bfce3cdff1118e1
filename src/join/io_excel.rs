use calamine::{open_workbook, DataType, Reader, Xlsx};
use snafu::prelude::*;

use crate::join::{io_common::simplify_file_name, *};

/// Reads a table of votes from an Excel workbook.
///
/// The first row is the header. The first worksheet is used, unless a name is given.
pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> BJoinResult<VoteTable> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };

    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(|c| header_name(c))
        .collect();
    debug!(
        "read_excel_table: {}: header: {:?}",
        simplify_file_name(path),
        header
    );

    let mut rows: Vec<VoteRow> = Vec::new();
    for (idx, line) in iter.enumerate() {
        let mut row = Record::new();
        for (name, elt) in header.iter().zip(line.iter()) {
            if name.is_empty() {
                continue;
            }
            row.insert(name, read_cell(elt));
        }
        debug!("read_excel_table: row {:?}: {:?}", idx + 2, row);
        rows.push(row);
    }
    info!("Read {} rows from {}", rows.len(), path);
    Ok(VoteTable { header, rows })
}

fn header_name(cell: &DataType) -> String {
    match read_cell(cell) {
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(f) => format!("{}", f),
        Cell::Empty => "".to_string(),
    }
}

fn read_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::String(s) if s.trim().is_empty() => Cell::Empty,
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Float(f) => Cell::Number(*f),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Bool(b) => Cell::Text(b.to_string()),
        DataType::Empty => Cell::Empty,
        // Dates and error cells are not counts: keep them as text for the output.
        other => Cell::Text(format!("{:?}", other)),
    }
}
