use snafu::prelude::*;

use crate::join::*;

use std::collections::HashMap;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "jurisdiction")]
    pub jurisdiction: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

/// The description of the contest, as written in the output summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub candidates: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AreaSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "idFields")]
    pub id_fields: Option<Vec<String>>,
    // Only for point records
    #[serde(rename = "latFields")]
    pub lat_fields: Option<Vec<String>>,
    #[serde(rename = "lonFields")]
    pub lon_fields: Option<Vec<String>>,
}

impl AreaSource {
    pub const DEFAULT_LAT_FIELDS: [&'static str; 5] =
        ["lat", "latitude", "LAT", "Latitud", "latitud"];
    pub const DEFAULT_LON_FIELDS: [&'static str; 7] = [
        "lon",
        "lng",
        "long",
        "longitude",
        "LON",
        "Longitud",
        "longitud",
    ];

    pub fn lat_fields(&self) -> Vec<String> {
        self.lat_fields
            .clone()
            .unwrap_or_else(|| to_strings(&AreaSource::DEFAULT_LAT_FIELDS))
    }

    pub fn lon_fields(&self) -> Vec<String> {
        self.lon_fields
            .clone()
            .unwrap_or_else(|| to_strings(&AreaSource::DEFAULT_LON_FIELDS))
    }
}

fn to_strings(l: &[&str]) -> Vec<String> {
    l.iter().map(|s| s.to_string()).collect()
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoteSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "idFields")]
    pub id_fields: Option<Vec<String>>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CandidateConfig {
    pub name: String,
    /// The column of the votes. Defaults to the name.
    pub field: Option<String>,
}

/// A candidate filled in as what the others leave out of a whole, for the
/// rows that lack its column.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RemainderConfig {
    pub field: String,
    /// Defaults to the column name, without the candidate prefix.
    pub name: Option<String>,
    pub whole: Option<u64>,
}

impl RemainderConfig {
    // Percentages
    pub const DEFAULT_WHOLE: u64 = 100;
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JoinConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "areaSource")]
    pub area_source: Option<AreaSource>,
    #[serde(rename = "voteSources", default)]
    pub vote_sources: Vec<VoteSource>,
    #[serde(default)]
    pub candidates: Vec<CandidateConfig>,
    #[serde(rename = "candidatePrefix")]
    pub candidate_prefix: Option<String>,
    #[serde(rename = "trailingCandidates")]
    pub trailing_candidates: Option<Vec<String>>,
    #[serde(rename = "auxiliaryFields")]
    pub auxiliary_fields: Option<Vec<String>>,
    #[serde(rename = "totalField")]
    pub total_field: Option<String>,
    pub aliases: Option<HashMap<String, String>>,
    #[serde(rename = "excludedIds")]
    pub excluded_ids: Option<Vec<String>>,
    pub remainder: Option<RemainderConfig>,
}

impl JoinConfig {
    /// An empty configuration, to be filled from the command line.
    pub fn empty(contest_name: &str) -> JoinConfig {
        JoinConfig {
            output_settings: OutputSettings {
                contest_name: contest_name.to_string(),
                contest_date: None,
                jurisdiction: None,
                output_path: None,
            },
            area_source: None,
            vote_sources: Vec::new(),
            candidates: Vec::new(),
            candidate_prefix: None,
            trailing_candidates: None,
            auxiliary_fields: None,
            total_field: None,
            aliases: None,
            excluded_ids: None,
            remainder: None,
        }
    }
}

pub fn read_config(path: &str) -> JoinResult<JoinConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: JoinConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    info!("config: {:?}", config);
    Ok(config)
}

pub fn read_reference(path: &str) -> JoinResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}
