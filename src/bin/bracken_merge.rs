//! bracken-merge - merge per-sample Bracken results into cohort tables.

use bracken_merge::prelude::*;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Merge Bracken results into abundance, relative-abundance and
/// group-average tables.
#[derive(Parser)]
#[command(name = "bracken-merge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input directory containing Bracken results (with S/, G/, P/ subdirs)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for merged tables
    #[arg(short, long)]
    output: PathBuf,

    /// Comma-separated taxonomic level codes
    #[arg(short, long, default_value = "S,G,P")]
    levels: String,

    /// Metadata file with sample_id and age_group columns
    #[arg(short, long)]
    metadata: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let groups = match &cli.metadata {
        Some(path) => {
            let groups = SampleGroupMap::from_tsv(path)?;
            eprintln!("Loaded metadata for {} samples", groups.len());
            eprintln!("  Groups: {}", groups.distinct_labels().join(", "));
            Some(groups)
        }
        None => {
            eprintln!("No metadata given; tables will not carry group annotations");
            None
        }
    };

    if !cli.input.is_dir() {
        return Err(MergeError::InputDirMissing(cli.input.clone()));
    }
    std::fs::create_dir_all(&cli.output)?;

    let levels: Vec<String> = cli
        .levels
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    eprintln!("Input directory: {:?}", cli.input);
    eprintln!("Output directory: {:?}", cli.output);
    eprintln!("Processing levels: {}", levels.join(", "));

    for code in &levels {
        let level_dir = cli.input.join(code);
        let name = level_name(code);

        let Some(tables) = merge_level(&level_dir, groups.as_ref())? else {
            eprintln!("Skipping level {}: no usable samples in {:?}", code, level_dir);
            continue;
        };
        eprintln!(
            "Level {} ({}): {} taxa x {} samples",
            code,
            name,
            tables.abundance.n_taxa(),
            tables.abundance.n_samples()
        );

        write_level_tables(&cli.output, name, &tables, groups.as_ref())?;
    }

    let summary = build_sample_summary(&cli.input, &levels)?;
    if !summary.is_empty() {
        let path = cli.output.join("sample_summary.tsv");
        summary.to_tsv(&path, groups.as_ref())?;
        eprintln!("Sample summary saved: {:?} ({} samples)", path, summary.n_samples());
    }

    Ok(())
}

fn write_level_tables(
    output: &Path,
    name: &str,
    tables: &LevelTables,
    groups: Option<&SampleGroupMap>,
) -> Result<()> {
    let abundance_path = output.join(format!("{}_abundance.tsv", name));
    tables.abundance.to_tsv(&abundance_path)?;
    eprintln!("  {:?}", abundance_path);

    let relative_path = output.join(format!("{}_relative_abundance.tsv", name));
    tables.relative.to_tsv(&relative_path)?;
    eprintln!("  {:?}", relative_path);

    let Some(groups) = groups else {
        return Ok(());
    };
    if !has_group_annotations(tables.abundance.sample_ids(), groups) {
        return Ok(());
    }

    let annotated_path = output.join(format!("{}_abundance_annotated.tsv", name));
    tables.abundance.to_tsv_annotated(&annotated_path, groups)?;
    eprintln!("  {:?}", annotated_path);

    let stats = group_statistics(&tables.abundance, groups);
    if stats.is_empty() {
        return Ok(());
    }
    let averages_path = output.join(format!("{}_group_averages.tsv", name));
    write_group_averages(&averages_path, tables.abundance.taxa(), &stats)?;
    eprintln!("  {:?}", averages_path);

    let rel_stats = group_statistics(&tables.relative, groups);
    let rel_averages_path = output.join(format!("{}_group_relative_averages.tsv", name));
    write_group_averages(&rel_averages_path, tables.relative.taxa(), &rel_stats)?;
    eprintln!("  {:?}", rel_averages_path);

    for s in &stats {
        eprintln!("    {}: n={}", s.group.name(), s.n);
    }

    Ok(())
}
