use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use vote_join::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::join::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_geojson;

#[derive(Debug, Snafu)]
pub enum JoinError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the output"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("Error writing the output to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening the CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading the header of the CSV file {path}"))]
    CsvHeader { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of the CSV file {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening the Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file {path} has no worksheet or no header row"))]
    EmptyExcel { path: String },
    #[snafu(display("The worksheet {name} is missing from the Excel file {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("The file {path} is not a GeoJSON feature collection: {detail}"))]
    GeoJsonStructure { path: String, detail: String },
    #[snafu(display("Provider not implemented: {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Cannot find the directory of the configuration file"))]
    MissingParentDir {},
    #[snafu(display("No {what} specified, either in the configuration or on the command line"))]
    MissingInput { what: String },
    #[snafu(display("No candidates: list them in the configuration or set a candidate prefix"))]
    NoCandidates {},
    #[snafu(display("The join failed"))]
    Joining { source: JoinErrors },
    #[snafu(display("Difference detected between the output and the reference"))]
    ReferenceMismatch {},
}

pub type JoinResult<T> = Result<T, JoinError>;
pub type BJoinResult<T> = Result<T, Box<JoinError>>;

/// A table of vote rows, as read by the loaders.
#[derive(PartialEq, Debug, Clone)]
pub struct VoteTable {
    pub header: Vec<String>,
    pub rows: Vec<VoteRow>,
}

fn metrics_to_json(m: &Metrics) -> JSValue {
    json!({
        "total": m.total,
        "winner": m.winner,
        "winnerVotes": m.winner_votes,
        "runnerUp": m.runner_up,
        "runnerUpVotes": m.runner_up_votes,
        "margin": m.margin,
        "marginShare": m.margin_share(),
        "winnerShare": m.winner_share(),
    })
}

// Derived fields take precedence over the properties of the area with the same name.
fn insert_derived(properties: &mut JSMap<String, JSValue>, key: &str, value: JSValue) -> bool {
    let replaced = properties.insert(key.to_string(), value).is_some();
    if replaced {
        warn!(
            "record_to_json: the area property {:?} is replaced by the derived field",
            key
        );
    }
    replaced
}

fn record_to_json(jr: &JoinedRecord<JSValue>, rules: &JoinRules) -> JSValue {
    let mut properties: JSMap<String, JSValue> = io_common::record_to_json_map(&jr.area.properties);
    insert_derived(&mut properties, "joinKey", json!(jr.key));
    let metrics_js = jr.metrics.as_ref().map(metrics_to_json).unwrap_or(JSValue::Null);
    insert_derived(&mut properties, "metrics", metrics_js);
    // The votes of each candidate, for the consumers that draw bars or tooltips.
    let votes_js = match &jr.row {
        Some(row) => {
            let mut votes: JSMap<String, JSValue> = JSMap::new();
            for c in rules.candidates.iter() {
                votes.insert(
                    c.name.clone(),
                    json!(metrics::coerce_count(row.get(&c.field))),
                );
            }
            JSValue::Object(votes)
        }
        None => JSValue::Null,
    };
    insert_derived(&mut properties, "votes", votes_js);
    json!({
        "type": "Feature",
        "properties": properties,
        "geometry": jr.area.geometry,
    })
}

fn report_to_json(report: &JoinReport) -> JSValue {
    json!({
        "numAreas": report.num_areas,
        "numRows": report.num_rows,
        "numMatched": report.num_matched,
        "numExcludedRows": report.num_excluded_rows,
        "unmatchedAreas": report.unmatched_areas,
        "unusedRows": report.unused_rows,
        "duplicateKeys": report.duplicate_keys,
    })
}

fn build_output_js(config: &JoinConfig, rules: &JoinRules, outcome: &JoinOutcome<JSValue>) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.jurisdiction.clone(),
        candidates: rules.candidates.iter().map(|c| c.name.clone()).collect(),
    };
    let features: Vec<JSValue> = outcome
        .records
        .iter()
        .map(|jr| record_to_json(jr, rules))
        .collect();
    json!({
        "type": "FeatureCollection",
        "features": features,
        "summary": {
            "config": c,
            "report": report_to_json(&outcome.report),
        }
    })
}

/// Builds the join rules out of the configuration.
///
/// The candidates are either listed, or detected from the header of the vote
/// tables with a prefix.
fn validate_rules(config: &JoinConfig, header: &[String]) -> JoinResult<JoinRules> {
    let candidates: Vec<Candidate> = if !config.candidates.is_empty() {
        config
            .candidates
            .iter()
            .map(|c| Candidate {
                name: c.name.clone(),
                field: match c.field.clone() {
                    Some(x) if x.is_empty() => c.name.clone(),
                    Some(x) => x,
                    None => c.name.clone(),
                },
            })
            .collect()
    } else if let Some(prefix) = config.candidate_prefix.as_deref() {
        let trailing = config.trailing_candidates.clone().unwrap_or_default();
        detect_candidates(header, prefix, &trailing)
    } else {
        Vec::new()
    };
    ensure!(!candidates.is_empty(), NoCandidatesSnafu {});

    let mut candidates = candidates;
    let remainder = config.remainder.as_ref().map(|rc| {
        if !candidates.iter().any(|c| c.field == rc.field) {
            let candidate = match (&rc.name, config.candidate_prefix.as_deref()) {
                (Some(name), _) => Candidate {
                    name: name.clone(),
                    field: rc.field.clone(),
                },
                (None, Some(prefix)) => Candidate::from_prefixed_field(&rc.field, prefix),
                (None, None) => Candidate::from_field(&rc.field),
            };
            debug!("validate_rules: adding the remainder candidate {:?}", candidate);
            candidates.push(candidate);
        }
        Remainder {
            field: rc.field.clone(),
            whole: rc.whole.unwrap_or(RemainderConfig::DEFAULT_WHOLE),
        }
    });

    let mut rules = JoinRules::new(&candidates);
    rules.remainder = remainder;
    if let Some(fields) = config.area_source.as_ref().and_then(|s| s.id_fields.clone()) {
        rules.area_id_fields = fields;
    }
    // All the vote sources share the same identifier fields: take the union, in order.
    let mut vote_id_fields: Vec<String> = Vec::new();
    for vs in config.vote_sources.iter() {
        for f in vs.id_fields.clone().unwrap_or_default() {
            if !vote_id_fields.contains(&f) {
                vote_id_fields.push(f);
            }
        }
    }
    if !vote_id_fields.is_empty() {
        rules.vote_id_fields = vote_id_fields;
    }
    rules.auxiliary_fields = config.auxiliary_fields.clone().unwrap_or_default();
    rules.total_field = config.total_field.clone();
    rules.aliases = config.aliases.clone().unwrap_or_default();
    rules.excluded_ids = config.excluded_ids.clone().unwrap_or_default();
    Ok(rules)
}

fn read_areas(root: &Path, source: &AreaSource) -> BJoinResult<Vec<AreaRecord<JSValue>>> {
    let p = io_common::resolve_path(root, &source.file_path);
    info!("Attempting to read area file {:?}", p);
    match source.provider.as_str() {
        "geojson" => io_geojson::read_geojson(&p),
        "csv" => io_csv::read_csv_points(&p, source),
        x => Err(Box::new(JoinError::UnknownProvider {
            provider: x.to_string(),
        })),
    }
}

fn read_votes(root: &Path, source: &VoteSource) -> BJoinResult<VoteTable> {
    let p = io_common::resolve_path(root, &source.file_path);
    info!("Attempting to read vote file {:?}", p);
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_table(&p),
        "xlsx" | "excel" => io_excel::read_excel_table(&p, source.excel_worksheet_name.as_deref()),
        x => Err(Box::new(JoinError::UnknownProvider {
            provider: x.to_string(),
        })),
    }
}

/// Runs the join described by a configuration, and returns the output document.
///
/// Arguments:
/// * `config` the configuration
/// * `root` the directory against which relative file paths are resolved
pub fn run_join(config: &JoinConfig, root: &Path) -> BJoinResult<JSValue> {
    let area_source = config.area_source.as_ref().context(MissingInputSnafu {
        what: "area source".to_string(),
    })?;
    ensure!(
        !config.vote_sources.is_empty(),
        MissingInputSnafu {
            what: "vote source".to_string()
        }
    );

    let areas = read_areas(root, area_source)?;
    let mut header: Vec<String> = Vec::new();
    let mut rows: Vec<VoteRow> = Vec::new();
    for vs in config.vote_sources.iter() {
        let mut table = read_votes(root, vs)?;
        for h in table.header {
            if !header.contains(&h) {
                header.push(h);
            }
        }
        rows.append(&mut table.rows);
    }
    debug!("run_join: vote header: {:?}", header);

    let rules = validate_rules(config, &header)?;
    info!("rules: {:?}", rules);

    let outcome = join_records(&areas, &rows, &rules).context(JoiningSnafu {})?;
    if !outcome.report.unmatched_areas.is_empty() {
        warn!(
            "{} areas without vote data: {:?}",
            outcome.report.unmatched_areas.len(),
            outcome.report.unmatched_areas
        );
    }

    Ok(build_output_js(config, &rules, &outcome))
}

/// Writes the output to a file, or to the standard output when no path is given
/// or the path is `stdout`.
fn write_output(out_path: Option<PathBuf>, pretty_js: &str) -> BJoinResult<()> {
    match out_path {
        Some(p) if p.as_os_str() != "stdout" => {
            info!("Writing output to {:?}", p);
            let path = p.display().to_string();
            fs::write(&p, pretty_js).context(WritingOutputSnafu { path })?;
        }
        _ => {
            println!("{}", pretty_js);
        }
    }
    Ok(())
}

/// Compares the output with a reference document, printing the differences.
fn check_reference(reference_path: &str, pretty_js: &str) -> BJoinResult<()> {
    let reference = read_reference(reference_path)?;
    debug!("reference: {:?}", reference);
    let pretty_js_ref = serde_json::to_string_pretty(&reference).context(WritingJsonSnafu {})?;
    if pretty_js_ref != pretty_js {
        warn!("Found differences with the reference output");
        print_diff(pretty_js_ref.as_str(), pretty_js, "\n");
        return Err(Box::new(JoinError::ReferenceMismatch {}));
    }
    info!("Output matches the reference {}", reference_path);
    Ok(())
}

/// Runs a full join: reads the inputs, joins, writes the output and optionally
/// checks it against a reference.
///
/// Arguments:
/// * `config` the configuration
/// * `root` the directory of the configuration file
/// * `out_path` the destination, overriding the one in the configuration
/// * `reference_path` a reference output to compare with
pub fn run_join_io(
    config: &JoinConfig,
    root: &Path,
    out_path: Option<PathBuf>,
    reference_path: Option<String>,
) -> BJoinResult<()> {
    let result_js = run_join(config, root)?;
    let pretty_js = serde_json::to_string_pretty(&result_js).context(WritingJsonSnafu {})?;

    let out = out_path.or_else(|| {
        config
            .output_settings
            .output_path
            .as_ref()
            .map(|p| io_common::resolve_path_buf(root, p))
    });
    write_output(out, &pretty_js)?;

    if let Some(reference) = reference_path {
        check_reference(&reference, &pretty_js)?;
    }
    Ok(())
}

/// Reads a configuration file, lets the caller amend it, and runs it.
pub fn run_join_file<F>(
    config_path: &str,
    overrides: F,
    out_path: Option<PathBuf>,
    reference_path: Option<String>,
) -> BJoinResult<()>
where
    F: FnOnce(JoinConfig) -> JoinConfig,
{
    let config = overrides(read_config(config_path)?);
    let root = Path::new(config_path)
        .parent()
        .context(MissingParentDirSnafu {})?;
    run_join_io(&config, root, out_path, reference_path)
}
