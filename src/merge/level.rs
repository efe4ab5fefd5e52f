//! Merging one taxonomic level's per-sample files into wide tables.

use crate::data::{
    parse_bracken_file, sample_id_from_path, AbundanceMatrix, RelativeAbundanceMatrix,
    SampleGroupMap, UNKNOWN_LABEL, UNKNOWN_RANK,
};
use crate::error::Result;
use log::{info, warn};
use nalgebra::DMatrix;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// The merged tables for one taxonomic level.
#[derive(Debug, Clone)]
pub struct LevelTables {
    /// Raw read counts, zero-filled.
    pub abundance: AbundanceMatrix,
    /// Per-sample percentages derived from `abundance`.
    pub relative: RelativeAbundanceMatrix,
}

/// Human-readable name for a taxonomic level code. Unrecognized codes are
/// used verbatim.
pub fn level_name(code: &str) -> &str {
    match code {
        "S" => "species",
        "G" => "genus",
        "P" => "phylum",
        "C" => "class",
        "O" => "order",
        "F" => "family",
        other => other,
    }
}

/// List a level directory's `*.bracken` files in lexical filename order.
///
/// The fixed order makes taxon discovery order (and therefore tie-breaking
/// among equal-total rows) deterministic across filesystems.
pub(crate) fn bracken_files(level_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(level_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("bracken"))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Merge all samples of one taxonomic level into wide tables.
///
/// Returns `Ok(None)` when the directory does not exist or contains no
/// usable sample file (missing directory, unreadable, malformed or empty
/// files are per-unit conditions: they are logged and do not fail the run).
///
/// Column order is (group rank, sample id); without metadata this reduces
/// to lexical sample id. Row order is descending total read count across
/// all samples, stable with respect to first-discovery order on ties.
pub fn merge_level(
    level_dir: &Path,
    groups: Option<&SampleGroupMap>,
) -> Result<Option<LevelTables>> {
    if !level_dir.is_dir() {
        info!("level directory not found: {:?}", level_dir);
        return Ok(None);
    }

    // Pass one: parse every sample, collecting the union of taxa in
    // discovery order.
    let mut counts: HashMap<String, HashMap<String, f64>> = HashMap::new();
    let mut sample_ids: Vec<String> = Vec::new();
    let mut taxa: Vec<String> = Vec::new();
    let mut seen_taxa: HashSet<String> = HashSet::new();

    for path in bracken_files(level_dir)? {
        let Some(sample_id) = sample_id_from_path(&path) else {
            warn!("skipping file with unusable name: {:?}", path);
            continue;
        };

        let records = match parse_bracken_file(&path) {
            Ok(records) => records,
            Err(e) => {
                warn!("skipping {:?}: {}", path, e);
                continue;
            }
        };
        if records.is_empty() {
            info!("sample {} has no rows at this level, excluded", sample_id);
            continue;
        }

        let mut abundances = HashMap::with_capacity(records.len());
        for record in records {
            if !seen_taxa.contains(&record.taxon) {
                seen_taxa.insert(record.taxon.clone());
                taxa.push(record.taxon.clone());
            }
            abundances.insert(record.taxon, record.reads);
        }

        if counts.insert(sample_id.clone(), abundances).is_some() {
            warn!(
                "duplicate sample id '{}' in {:?}; keeping the later file",
                sample_id, level_dir
            );
        } else {
            sample_ids.push(sample_id);
        }
    }

    if counts.is_empty() {
        return Ok(None);
    }

    // Column ordering: group rank first, sample id as tie-break.
    sample_ids.sort_by(|a, b| {
        let rank = |s: &str| groups.map_or(UNKNOWN_RANK, |g| g.rank(s));
        rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
    });

    // Row ordering: descending total across samples, stable on ties so
    // equal-total taxa keep discovery order.
    let totals: Vec<f64> = taxa
        .iter()
        .map(|t| {
            counts
                .values()
                .map(|m| m.get(t).copied().unwrap_or(0.0))
                .sum()
        })
        .collect();
    let mut order: Vec<usize> = (0..taxa.len()).collect();
    order.sort_by(|&a, &b| totals[b].partial_cmp(&totals[a]).unwrap_or(std::cmp::Ordering::Equal));
    let taxa: Vec<String> = order.into_iter().map(|i| taxa[i].clone()).collect();

    // Pass two: materialize every (taxon, sample) cell, absent entries
    // defaulting to zero reads.
    let mut data = DMatrix::zeros(taxa.len(), sample_ids.len());
    for (j, sample_id) in sample_ids.iter().enumerate() {
        let abundances = &counts[sample_id];
        for (i, taxon) in taxa.iter().enumerate() {
            data[(i, j)] = abundances.get(taxon).copied().unwrap_or(0.0);
        }
    }

    let abundance = AbundanceMatrix::new(data, taxa, sample_ids)?;
    let relative = abundance.to_relative();
    Ok(Some(LevelTables {
        abundance,
        relative,
    }))
}

/// Whether any merged sample carries a group label other than `unknown`.
/// Gates the annotated export and the group-averages tables.
pub fn has_group_annotations(sample_ids: &[String], groups: &SampleGroupMap) -> bool {
    sample_ids.iter().any(|s| groups.label(s) != UNKNOWN_LABEL)
}
