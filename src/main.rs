mod analyzer;
mod loader;
mod models;

use analyzer::ProgramRanker;
use anyhow::Result;
use clap::{Arg, Command};
use models::{Config, FilterCategory, ProgramRankSummary, WeightedSummaryRow};
use std::path::Path;

fn main() -> Result<()> {
    let matches = Command::new("josaa-rank-analyzer")
        .version("1.0")
        .about("Ranks academic programs by admission competitiveness across counselling years")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("category")
                .long("category")
                .value_name("TAG")
                .help("Filter category to process: noniit, iit or all")
                .default_value("all"),
        )
        .get_matches();

    let config_file = matches.get_one::<String>("config").unwrap();

    // Load or create configuration; the generated defaults are complete,
    // so a fresh run proceeds immediately.
    let config = if Path::new(config_file).exists() {
        println!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        let default_config = Config::default();
        default_config.save_to_file(config_file)?;
        default_config
    };

    if config.first_year > config.last_year {
        anyhow::bail!(
            "Invalid year range in configuration: first_year {} is after last_year {}",
            config.first_year,
            config.last_year
        );
    }

    let category_arg = matches.get_one::<String>("category").unwrap();
    let categories: Vec<FilterCategory> = if category_arg == "all" {
        FilterCategory::all().to_vec()
    } else {
        vec![category_arg.parse()?]
    };

    run_yearly_rankings(&config, &categories)?;
    run_weighted_rankings(&config, &categories)?;

    println!("\n✅ Analysis complete!");
    Ok(())
}

/// Stage 1: one preference-ranked output file per (year, category).
fn run_yearly_rankings(config: &Config, categories: &[FilterCategory]) -> Result<()> {
    let data_dir = Path::new(config.data_directory.as_deref().unwrap_or("data"));

    for year in config.years() {
        let round_files = loader::round_files_for_year(data_dir, year)?;
        if round_files.is_empty() {
            println!("⚠️  No round files found for {}. Skipping.", year);
            continue;
        }
        println!("📥 Processing year {} with {} rounds...", year, round_files.len());

        let mut records = Vec::new();
        for file in &round_files {
            records.extend(loader::load_round_file(file)?);
        }

        for category in categories {
            let summaries = ProgramRanker::new(*category).rank_programs(&records);
            let output_file =
                data_dir.join(format!("{}_{}_program_ranks.csv", year, category.tag()));
            write_program_ranks(&output_file, &summaries)?;
            println!("✅ Saved: {}", output_file.display());
        }
    }

    println!("🏁 All years processed.");
    Ok(())
}

/// Stage 2: one weighted multi-year summary file per category, built from
/// the stage-1 outputs found in the data directory.
fn run_weighted_rankings(config: &Config, categories: &[FilterCategory]) -> Result<()> {
    let data_dir = Path::new(config.data_directory.as_deref().unwrap_or("data"));

    for category in categories {
        let files = loader::ranks_files_for_category(data_dir, category.tag())?;
        println!("\n📂 Found {} per-year files for category '{}'", files.len(), category);

        let mut weighted_rows = Vec::new();
        let mut used_files = 0;
        for (year, path) in &files {
            let Some(weight) = config.weight_for(year) else {
                println!("⚠️  No weight configured for {}. Skipping {}.", year, path.display());
                continue;
            };
            for row in loader::load_ranks_file(path)? {
                weighted_rows.push((row, weight));
            }
            used_files += 1;
        }

        if used_files == 0 {
            anyhow::bail!(
                "No weighted per-year data found for category '{}'. Run the per-year stage first.",
                category
            );
        }

        let summaries = analyzer::weighted_average_rankings(&weighted_rows);
        let output_file = data_dir.join(format!(
            "{}_program_weighted_average_rankings.csv",
            category.tag()
        ));
        write_weighted_rankings(&output_file, &summaries)?;
        println!("✅ Weighted average summary saved to: {}", output_file.display());
    }

    Ok(())
}

fn write_program_ranks(path: &Path, summaries: &[ProgramRankSummary]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(&[
        "Institute",
        "Academic Program Name",
        "Quota",
        "Opening_Rank",
        "Closing_Rank",
        "Preference_Rank",
    ])?;

    for summary in summaries {
        writer.write_record(&[
            &summary.key.institute,
            &summary.key.program,
            &summary.key.quota,
            &summary.opening_rank.to_string(),
            &summary.closing_rank.to_string(),
            &summary.preference_rank.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn write_weighted_rankings(path: &Path, summaries: &[WeightedSummaryRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(&[
        "Institute",
        "Academic Program Name",
        "Quota",
        "Avg Preference Rank",
        "Avg Opening Rank",
        "Avg Closing Rank",
    ])?;

    for summary in summaries {
        writer.write_record(&[
            &summary.key.institute,
            &summary.key.program,
            &summary.key.quota,
            &format!("{:.2}", summary.avg_preference_rank),
            &summary.avg_opening_rank.to_string(),
            &summary.avg_closing_rank.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
