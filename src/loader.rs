use crate::models::{AdmissionRecord, YearlyRankRow};
use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// True for round files belonging to the given year ({year}-{round}.csv).
fn is_round_file(file_name: &str, year: u16) -> bool {
    let pattern = Regex::new(r"^(\d{4})-(\d+)\.csv$").unwrap();
    pattern
        .captures(file_name)
        .map(|caps| caps[1] == year.to_string())
        .unwrap_or(false)
}

/// Extract the 4-digit year from a per-year program-ranks file name
/// ({year}_{category}_program_ranks.csv) for the given category tag.
fn year_from_ranks_file(file_name: &str, category_tag: &str) -> Option<String> {
    let pattern = Regex::new(r"^(\d{4})_([a-z]+)_program_ranks\.csv$").unwrap();
    let caps = pattern.captures(file_name)?;
    if &caps[2] == category_tag {
        Some(caps[1].to_string())
    } else {
        None
    }
}

fn list_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read data directory: {}", data_dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    // Deterministic processing order, like a sorted glob.
    files.sort();
    Ok(files)
}

/// All round files for one year, sorted by name.
pub fn round_files_for_year(data_dir: &Path, year: u16) -> Result<Vec<PathBuf>> {
    let files = list_files(data_dir)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| is_round_file(name, year))
                .unwrap_or(false)
        })
        .collect();
    Ok(files)
}

/// All per-year program-ranks files for one category, with their years,
/// sorted by name.
pub fn ranks_files_for_category(
    data_dir: &Path,
    category_tag: &str,
) -> Result<Vec<(String, PathBuf)>> {
    let files = list_files(data_dir)?
        .into_iter()
        .filter_map(|path| {
            let year = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| year_from_ranks_file(name, category_tag))?;
            Some((year, path))
        })
        .collect();
    Ok(files)
}

pub fn load_round_file(path: &Path) -> Result<Vec<AdmissionRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open round file: {}", path.display()))?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: AdmissionRecord =
            row.with_context(|| format!("Malformed row in {}", path.display()))?;
        records.push(record);
    }
    Ok(records)
}

pub fn load_ranks_file(path: &Path) -> Result<Vec<YearlyRankRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open program-ranks file: {}", path.display()))?;

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        let row: YearlyRankRow =
            row.with_context(|| format!("Malformed row in {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}
