/*!
Joins geographic areas with the vote counts of each area.

The two datasets typically come from different sources that do not agree on
how to spell identifiers: `"007"` against `"7"`, `"Cañaveral"` against
`"CANAVERAL"`. The join compares [normalized](normalize) identifiers and
annotates each area with the [`Metrics`] of its vote row: total, winner,
runner-up and margin.

```
use vote_join::*;

let rules = JoinRules::new(&[Candidate::from_field("A"), Candidate::from_field("B")]);
let areas = vec![
    AreaRecord { properties: Record::from_pairs(vec![("id", "3")]), geometry: () },
    AreaRecord { properties: Record::from_pairs(vec![("id", "9")]), geometry: () },
];
let rows = vec![Record::from_pairs(vec![("id", "03"), ("A", "120"), ("B", "80")])];

let outcome = join_records(&areas, &rows, &rules)?;
assert_eq!(outcome.records[0].metrics.as_ref().map(|m| m.margin), Some(40));
assert_eq!(outcome.records[1].metrics, None);
# Ok::<(), JoinErrors>(())
```
*/
mod config;

pub mod builder;
pub mod manual;
pub mod metrics;
pub mod normalize;

use log::{debug, info, warn};

use std::collections::{BTreeSet, HashMap, HashSet};

pub use crate::config::*;
pub use crate::metrics::{compute_metrics, with_remainder};
pub use crate::normalize::{normalize_key, normalize_name};

/// The vote rows, indexed by normalized identifier.
#[derive(PartialEq, Debug, Clone)]
pub struct RowIndex {
    pub rows: HashMap<String, VoteRow>,
    pub duplicate_keys: Vec<String>,
    pub num_excluded: usize,
}

/// Returns the first identifier found under the given field names.
///
/// Fields that are missing or only hold whitespace are skipped.
pub fn extract_id(record: &Record, fields: &[String]) -> Option<String> {
    fields
        .iter()
        .filter_map(|f| record.get(f).and_then(|c| c.as_text()))
        .find(|s| !s.trim().is_empty())
}

// The join key, after alias resolution.
fn join_key(raw: &str, aliases: &HashMap<String, String>) -> String {
    let key = normalize_key(raw);
    aliases.get(&key).cloned().unwrap_or(key)
}

fn normalized_aliases(rules: &JoinRules) -> HashMap<String, String> {
    rules
        .aliases
        .iter()
        .map(|(alias, canonical)| (normalize_key(alias), normalize_key(canonical)))
        .collect()
}

/// Builds the lookup table of the vote rows.
///
/// When several rows share a key, the last one wins and the key is reported in
/// `duplicate_keys`. Rows whose key is excluded are dropped.
pub fn index_rows(rows: &[VoteRow], rules: &JoinRules) -> Result<RowIndex, JoinErrors> {
    let aliases = normalized_aliases(rules);
    let excluded: HashSet<String> = rules
        .excluded_ids
        .iter()
        .map(|s| join_key(s, &aliases))
        .collect();

    let mut index: HashMap<String, VoteRow> = HashMap::new();
    let mut duplicates: BTreeSet<String> = BTreeSet::new();
    let mut num_excluded: usize = 0;
    for (idx, row) in rows.iter().enumerate() {
        let raw_id = extract_id(row, &rules.vote_id_fields).ok_or_else(|| {
            JoinErrors::MalformedInput {
                side: RecordSide::Vote,
                index: idx,
                tried: rules.vote_id_fields.clone(),
            }
        })?;
        let key = join_key(&raw_id, &aliases);
        if excluded.contains(&key) {
            debug!("index_rows: skipping excluded row {:?}", raw_id);
            num_excluded += 1;
            continue;
        }
        if index.insert(key.clone(), row.clone()).is_some() {
            duplicates.insert(key);
        }
    }
    for k in duplicates.iter() {
        warn!("index_rows: duplicate vote key {:?}, keeping the last row", k);
    }
    Ok(RowIndex {
        rows: index,
        duplicate_keys: duplicates.into_iter().collect(),
        num_excluded,
    })
}

/// Joins each area with its vote row and computes the metrics.
///
/// The output holds exactly one record per area, in the order of the input.
/// Areas without a row are kept, with no metrics.
///
/// Arguments:
/// * `areas` the geographic units
/// * `rows` the vote counts
/// * `rules` the identifier fields, candidates and totals to use
pub fn join_records<G: Clone>(
    areas: &[AreaRecord<G>],
    rows: &[VoteRow],
    rules: &JoinRules,
) -> Result<JoinOutcome<G>, JoinErrors> {
    info!(
        "Joining {:?} areas with {:?} vote rows, candidates: {:?}",
        areas.len(),
        rows.len(),
        rules.candidates
    );
    let index = index_rows(rows, rules)?;
    let aliases = normalized_aliases(rules);

    let mut used_keys: HashSet<String> = HashSet::new();
    let mut unmatched: Vec<String> = Vec::new();
    let mut records: Vec<JoinedRecord<G>> = Vec::with_capacity(areas.len());
    for (idx, area) in areas.iter().enumerate() {
        let raw_id = extract_id(&area.properties, &rules.area_id_fields).ok_or_else(|| {
            JoinErrors::MalformedInput {
                side: RecordSide::Area,
                index: idx,
                tried: rules.area_id_fields.clone(),
            }
        })?;
        let key = join_key(&raw_id, &aliases);
        let row = index.rows.get(&key).map(|r| match &rules.remainder {
            Some(rem) => with_remainder(r, &rules.candidates, rem),
            None => r.clone(),
        });
        let metrics = row.as_ref().map(|r| {
            compute_metrics(
                r,
                &rules.candidates,
                &rules.auxiliary_fields,
                rules.total_field.as_deref(),
            )
        });
        if row.is_some() {
            used_keys.insert(key.clone());
        } else {
            unmatched.push(raw_id.clone());
        }
        debug!("join_records: area {:?} key {:?}: {:?}", raw_id, key, metrics);
        records.push(JoinedRecord {
            area: area.clone(),
            key,
            row,
            metrics,
        });
    }

    let mut unused_rows: Vec<String> = index
        .rows
        .keys()
        .filter(|k| !used_keys.contains(*k))
        .cloned()
        .collect();
    unused_rows.sort();

    if !unmatched.is_empty() {
        warn!("join_records: areas without a vote row: {:?}", unmatched);
    }
    if !unused_rows.is_empty() {
        info!("join_records: vote rows without an area: {:?}", unused_rows);
    }

    let report = JoinReport {
        num_areas: areas.len(),
        num_rows: rows.len(),
        num_matched: records.len() - unmatched.len(),
        unmatched_areas: unmatched,
        unused_rows,
        duplicate_keys: index.duplicate_keys,
        num_excluded_rows: index.num_excluded,
    };
    info!(
        "Joined {:?} of {:?} areas",
        report.num_matched, report.num_areas
    );
    Ok(JoinOutcome { records, report })
}

/// Finds the candidate columns of a table.
///
/// Returns the columns starting with `prefix`, sorted alphabetically, except
/// for those listed in `trailing` (typically an "others" column) which come last.
pub fn detect_candidates(header: &[String], prefix: &str, trailing: &[String]) -> Vec<Candidate> {
    let mut fields: Vec<&String> = header.iter().filter(|h| h.starts_with(prefix)).collect();
    fields.sort_by_key(|f| (trailing.contains(f), f.to_string()));
    fields.dedup();
    fields
        .into_iter()
        .map(|f| Candidate::from_prefixed_field(f, prefix))
        .collect()
}
