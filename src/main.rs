use clap::Parser;
use log::{debug, info};
use snafu::ErrorCompat;

use std::path::{Path, PathBuf};

mod args;
mod join;

use crate::args::Args;
use crate::join::config_reader::*;
use crate::join::*;

// Paths given on the command line are relative to the working directory, not
// to the configuration file.
fn absolute(p: &str) -> String {
    std::env::current_dir()
        .map(|d| d.join(p))
        .unwrap_or_else(|_| PathBuf::from(p))
        .display()
        .to_string()
}

/// Applies the command line options on top of the configuration.
fn apply_args(config: JoinConfig, args: &Args) -> JoinConfig {
    let mut config = config;

    if let Some(areas) = &args.areas {
        config.area_source = Some(AreaSource {
            provider: args
                .areas_type
                .clone()
                .unwrap_or_else(|| "geojson".to_string()),
            file_path: absolute(areas),
            id_fields: args.id_fields.clone(),
            lat_fields: None,
            lon_fields: None,
        });
    } else if let Some(source) = config.area_source.as_mut() {
        if let Some(provider) = &args.areas_type {
            source.provider = provider.clone();
        }
        if args.id_fields.is_some() {
            source.id_fields = args.id_fields.clone();
        }
    }

    if let Some(votes) = &args.votes {
        config.vote_sources = vec![VoteSource {
            provider: args
                .votes_type
                .clone()
                .unwrap_or_else(|| "csv".to_string()),
            file_path: absolute(votes),
            id_fields: args.id_fields.clone(),
            excel_worksheet_name: args.excel_worksheet_name.clone(),
        }];
    } else {
        for source in config.vote_sources.iter_mut() {
            if let Some(provider) = &args.votes_type {
                source.provider = provider.clone();
            }
            if args.id_fields.is_some() {
                source.id_fields = args.id_fields.clone();
            }
            if args.excel_worksheet_name.is_some() {
                source.excel_worksheet_name = args.excel_worksheet_name.clone();
            }
        }
    }

    if let Some(candidates) = &args.candidates {
        config.candidates = candidates
            .iter()
            .map(|name| CandidateConfig {
                name: name.trim().to_string(),
                field: None,
            })
            .collect();
    }
    if args.candidate_prefix.is_some() {
        config.candidate_prefix = args.candidate_prefix.clone();
    }
    config
}

fn run(args: &Args) -> BJoinResult<()> {
    let out_path: Option<PathBuf> = args.out.as_ref().map(|p| {
        if p == "stdout" {
            PathBuf::from(p)
        } else {
            PathBuf::from(absolute(p))
        }
    });

    match &args.config {
        Some(config_path) => {
            info!("Reading configuration {}", config_path);
            run_join_file(
                config_path,
                |c| apply_args(c, args),
                out_path,
                args.reference.clone(),
            )
        }
        None => {
            let config = apply_args(JoinConfig::empty("votejoin"), args);
            run_join_io(&config, Path::new("."), out_path, args.reference.clone())
        }
    }
}

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    debug!("args: {:?}", args);

    if let Err(e) = run(&args) {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&*e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_override_config() {
        let args = Args::parse_from([
            "votejoin",
            "--votes-type",
            "xlsx",
            "--excel-worksheet-name",
            "Comunas",
            "--candidates",
            "EDER, ORTIZ",
            "--id-fields",
            "Nombre Comuna,id",
        ]);
        let mut config = JoinConfig::empty("test");
        config.vote_sources = vec![VoteSource {
            provider: "csv".to_string(),
            file_path: "votos.csv".to_string(),
            id_fields: None,
            excel_worksheet_name: None,
        }];
        let config = apply_args(config, &args);
        let vs = &config.vote_sources[0];
        assert_eq!(vs.provider, "xlsx");
        assert_eq!(vs.file_path, "votos.csv");
        assert_eq!(vs.excel_worksheet_name, Some("Comunas".to_string()));
        assert_eq!(
            vs.id_fields,
            Some(vec!["Nombre Comuna".to_string(), "id".to_string()])
        );
        let names: Vec<&str> = config.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["EDER", "ORTIZ"]);
        assert_eq!(config.area_source, None);
    }

    #[test]
    fn arguments_without_config() {
        let args = Args::parse_from(["votejoin", "-a", "map.geojson", "-v", "votes.csv"]);
        let config = apply_args(JoinConfig::empty("votejoin"), &args);
        let area_source = config.area_source.unwrap();
        assert_eq!(area_source.provider, "geojson");
        assert!(Path::new(&area_source.file_path).is_absolute());
        assert_eq!(config.vote_sources[0].provider, "csv");
        assert_eq!(config.vote_sources[0].id_fields, None);
    }
}
