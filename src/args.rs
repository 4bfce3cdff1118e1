use clap::Parser;

/// This program joins electoral results with map areas, and computes the winner and
/// margin of each area.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the description of the join (JSON).
    /// Relative paths in this file are resolved against its directory.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the expected output in JSON format. If provided,
    /// votejoin will check that the output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the output will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) The areas. Setting this option overrides the area source of the --config option.
    #[clap(short, long, value_parser)]
    pub areas: Option<String>,

    /// (default geojson) The type of the areas: geojson or csv (point records with coordinates).
    #[clap(long, value_parser)]
    pub areas_type: Option<String>,

    /// (file path) The vote counts. Setting this option overrides the vote sources of the --config option.
    #[clap(short, long, value_parser)]
    pub votes: Option<String>,

    /// (default csv) The type of the vote counts: csv or xlsx.
    #[clap(long, value_parser)]
    pub votes_type: Option<String>,

    /// (list of comma-separated values) The columns of the candidates, in order of precedence for ties.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub candidates: Option<Vec<String>>,

    /// If specified, all the columns starting with this prefix are candidates.
    #[clap(long, value_parser)]
    pub candidate_prefix: Option<String>,

    /// (list of comma-separated values, default ID,Id,id) The fields holding the identifiers,
    /// tried in order, for both the areas and the votes.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub id_fields: Option<Vec<String>>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
