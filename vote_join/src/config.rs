// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// A raw value, as handed over by a loader.
///
/// The loaders do not interpret the content beyond this: the numeric coercion
/// happens when the metrics are computed.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// The textual form of the cell, if it carries any content.
    ///
    /// Integral numbers are rendered without a fractional part, so that an
    /// identifier read as `7.0` from a spreadsheet becomes `"7"`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Text(s) => Some(s.clone()),
            // Formatted rather than cast: a cast saturates above 2^63.
            // Adding 0.0 turns -0.0 into 0.0.
            Cell::Number(f) if f.is_finite() && f.fract() == 0.0 => {
                Some(format!("{:.0}", *f + 0.0))
            }
            Cell::Number(f) if f.is_finite() => Some(f.to_string()),
            Cell::Number(_) => None,
            Cell::Empty => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Cell {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<u64> for Cell {
    fn from(x: u64) -> Cell {
        Cell::Number(x as f64)
    }
}

/// An ordered bag of named fields.
///
/// Both the attributes of a geographic area and a row of vote counts are
/// records. The order of the fields is the order of the source.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Record {
    pub fields: Vec<(String, Cell)>,
}

impl Record {
    pub fn new() -> Record {
        Record { fields: Vec::new() }
    }

    /// Builds a record from pairs of field names and values.
    pub fn from_pairs<K: Into<String>, V: Into<Cell>>(pairs: Vec<(K, V)>) -> Record {
        Record {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Sets a field. An existing field with the same name is replaced in place.
    pub fn insert(&mut self, name: &str, value: Cell) {
        if let Some(elt) = self.fields.iter_mut().find(|(n, _)| n == name) {
            elt.1 = value;
        } else {
            self.fields.push((name.to_string(), value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|(n, _)| n.clone()).collect()
    }
}

/// A geographic unit (a district, a polling station, ...).
///
/// The geometry is opaque to this crate: it is carried from the input to the
/// output without being looked at.
#[derive(PartialEq, Debug, Clone)]
pub struct AreaRecord<G> {
    pub properties: Record,
    pub geometry: G,
}

/// The vote counts for one unit.
pub type VoteRow = Record;

/// A candidate as seen by the metrics calculation.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Candidate {
    /// The name reported as winner or runner-up.
    pub name: String,
    /// The column holding the number of votes.
    pub field: String,
}

impl Candidate {
    pub fn from_field(field: &str) -> Candidate {
        Candidate {
            name: field.to_string(),
            field: field.to_string(),
        }
    }

    /// Builds a candidate from a column such as `%_Alvaro_Eder`, whose display
    /// name becomes `Alvaro Eder`.
    pub fn from_prefixed_field(field: &str, prefix: &str) -> Candidate {
        let stripped = field.strip_prefix(prefix).unwrap_or(field);
        Candidate {
            name: stripped.replace('_', " ").trim().to_string(),
            field: field.to_string(),
        }
    }
}

// ******** Output data structures *********

/// Derived figures for one vote row.
///
/// Invariants: `margin == winner_votes - runner_up_votes` and
/// `total >= winner_votes + runner_up_votes`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Metrics {
    pub total: u64,
    pub winner: Option<String>,
    pub winner_votes: u64,
    pub runner_up: Option<String>,
    pub runner_up_votes: u64,
    pub margin: u64,
}

impl Metrics {
    /// The margin as a fraction of the total. Zero when nobody voted.
    pub fn margin_share(&self) -> f64 {
        share(self.margin, self.total)
    }

    /// The winning votes as a fraction of the total. Zero when nobody voted.
    pub fn winner_share(&self) -> f64 {
        share(self.winner_votes, self.total)
    }
}

fn share(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// An area, together with its vote row if one matched.
///
/// `metrics` is `None` when no row matched the area: this is a normal
/// outcome that consumers are expected to handle.
#[derive(PartialEq, Debug, Clone)]
pub struct JoinedRecord<G> {
    pub area: AreaRecord<G>,
    pub key: String,
    pub row: Option<VoteRow>,
    pub metrics: Option<Metrics>,
}

/// What went right and wrong during a join.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct JoinReport {
    pub num_areas: usize,
    pub num_rows: usize,
    pub num_matched: usize,
    /// Raw identifiers of the areas without a vote row, in input order.
    pub unmatched_areas: Vec<String>,
    /// Normalized keys of the vote rows that no area asked for, sorted.
    pub unused_rows: Vec<String>,
    /// Normalized keys seen on more than one vote row, sorted.
    /// The last row with a given key is the one kept.
    pub duplicate_keys: Vec<String>,
    /// Number of rows dropped because their key is in the excluded list.
    pub num_excluded_rows: usize,
}

#[derive(PartialEq, Debug, Clone)]
pub struct JoinOutcome<G> {
    pub records: Vec<JoinedRecord<G>>,
    pub report: JoinReport,
}

/// The two inputs of a join.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RecordSide {
    Area,
    Vote,
}

impl Display for RecordSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordSide::Area => write!(f, "area"),
            RecordSide::Vote => write!(f, "vote row"),
        }
    }
}

/// Errors that prevent a join from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum JoinErrors {
    /// A record has no usable identifier under any of the configured field names.
    MalformedInput {
        side: RecordSide,
        index: usize,
        tried: Vec<String>,
    },
}

impl Error for JoinErrors {}

impl Display for JoinErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinErrors::MalformedInput { side, index, tried } => write!(
                f,
                "{} #{} has no usable identifier (tried fields {:?})",
                side, index, tried
            ),
        }
    }
}

// ********* Configuration **********

/// A candidate whose count may be missing from the data, and is then derived
/// as what the other candidates leave out of a whole.
///
/// Typical for percentage tables where the minor candidates are not listed:
/// with `whole = 100`, the "others" column is `100 - sum(other columns)`,
/// clamped to `[0, 100]`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Remainder {
    /// The column of the remainder. The value is only derived when a row lacks it.
    pub field: String,
    pub whole: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct JoinRules {
    /// Identifier fields of the areas, tried in order.
    pub area_id_fields: Vec<String>,
    /// Identifier fields of the vote rows, tried in order.
    pub vote_id_fields: Vec<String>,
    pub candidates: Vec<Candidate>,
    /// Counts that are not candidates but belong to the total (blank, null, void ballots).
    pub auxiliary_fields: Vec<String>,
    /// A column with a pre-aggregated total. When present and positive, it takes
    /// precedence over the sum of the counts.
    pub total_field: Option<String>,
    /// Alternative spellings, from alias to canonical name. Both sides are
    /// normalized before use.
    pub aliases: HashMap<String, String>,
    /// Vote rows that do not correspond to any area (national aggregates, ...).
    pub excluded_ids: Vec<String>,
    /// Derives the count of one of the candidates when a row does not carry it.
    pub remainder: Option<Remainder>,
}

impl JoinRules {
    pub const DEFAULT_ID_FIELDS: [&'static str; 3] = ["ID", "Id", "id"];

    pub fn new(candidates: &[Candidate]) -> JoinRules {
        let id_fields: Vec<String> = JoinRules::DEFAULT_ID_FIELDS
            .iter()
            .map(|s| s.to_string())
            .collect();
        JoinRules {
            area_id_fields: id_fields.clone(),
            vote_id_fields: id_fields,
            candidates: candidates.to_vec(),
            auxiliary_fields: Vec::new(),
            total_field: None,
            aliases: HashMap::new(),
            excluded_ids: Vec::new(),
            remainder: None,
        }
    }
}

impl Default for JoinRules {
    fn default() -> JoinRules {
        JoinRules::new(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_text_of_integral_number() {
        assert_eq!(Cell::Number(7.0).as_text(), Some("7".to_string()));
        assert_eq!(Cell::Number(2.5).as_text(), Some("2.5".to_string()));
        assert_eq!(Cell::Number(f64::NAN).as_text(), None);
        assert_eq!(Cell::Empty.as_text(), None);
        assert_eq!(Cell::from(""), Cell::Empty);
    }

    #[test]
    fn cell_text_of_huge_integral_number() {
        assert_eq!(
            Cell::Number(1e20).as_text(),
            Some("100000000000000000000".to_string())
        );
        assert_eq!(
            Cell::Number(2e20).as_text(),
            Some("200000000000000000000".to_string())
        );
        assert_eq!(Cell::Number(-7.0).as_text(), Some("-7".to_string()));
        assert_eq!(Cell::Number(-0.0).as_text(), Some("0".to_string()));
    }

    #[test]
    fn record_insert_replaces() {
        let mut r = Record::from_pairs(vec![("id", "3"), ("name", "Siloé")]);
        r.insert("id", Cell::from("4"));
        r.insert("extra", Cell::Number(1.0));
        assert_eq!(r.get("id"), Some(&Cell::Text("4".to_string())));
        assert_eq!(r.field_names(), vec!["id", "name", "extra"]);
    }

    #[test]
    fn prefixed_candidate_name() {
        let c = Candidate::from_prefixed_field("%_Alvaro_Eder", "%_");
        assert_eq!(c.name, "Alvaro Eder");
        assert_eq!(c.field, "%_Alvaro_Eder");
    }

    #[test]
    fn shares_with_zero_total() {
        let m = Metrics {
            total: 0,
            winner: None,
            winner_votes: 0,
            runner_up: None,
            runner_up_votes: 0,
            margin: 0,
        };
        assert_eq!(m.margin_share(), 0.0);
        assert_eq!(m.winner_share(), 0.0);
    }
}
