//! Per-group summary statistics over abundance matrices.

use crate::data::{AbundanceMatrix, AgeGroup, RelativeAbundanceMatrix, SampleGroupMap};
use crate::error::Result;
use statrs::statistics::Statistics;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Row/column view shared by the raw and relative abundance matrices, so
/// group statistics can be computed over either.
pub trait TaxaMatrix {
    fn taxa(&self) -> &[String];
    fn sample_ids(&self) -> &[String];
    fn get(&self, row: usize, col: usize) -> f64;
}

impl TaxaMatrix for AbundanceMatrix {
    fn taxa(&self) -> &[String] {
        self.taxa()
    }
    fn sample_ids(&self) -> &[String] {
        self.sample_ids()
    }
    fn get(&self, row: usize, col: usize) -> f64 {
        self.get(row, col)
    }
}

impl TaxaMatrix for RelativeAbundanceMatrix {
    fn taxa(&self) -> &[String] {
        self.taxa()
    }
    fn sample_ids(&self) -> &[String] {
        self.sample_ids()
    }
    fn get(&self, row: usize, col: usize) -> f64 {
        self.get(row, col)
    }
}

/// Summary statistics for one recognized group: per-taxon mean and sample
/// standard deviation over exactly that group's columns, plus the member
/// count.
///
/// The standard deviation uses the (n−1) estimator; with a single member it
/// is mathematically undefined and held as NaN, never zero.
#[derive(Debug, Clone)]
pub struct GroupStatistics {
    /// Which group these statistics describe.
    pub group: AgeGroup,
    /// Number of member samples (columns) in the matrix.
    pub n: usize,
    /// Per-taxon mean, in matrix row order.
    pub mean: Vec<f64>,
    /// Per-taxon sample standard deviation, in matrix row order.
    pub std_dev: Vec<f64>,
}

/// Compute statistics for every recognized group with at least one member
/// column, in rank order. Groups with zero members are omitted entirely.
/// NaN cells (zero-total samples in a relative matrix) do not enter the
/// mean or standard deviation, though their columns still count toward n.
pub fn group_statistics<M: TaxaMatrix>(matrix: &M, groups: &SampleGroupMap) -> Vec<GroupStatistics> {
    let mut stats = Vec::new();

    for group in AgeGroup::ALL {
        let member_cols: Vec<usize> = matrix
            .sample_ids()
            .iter()
            .enumerate()
            .filter(|(_, s)| groups.group(s) == Some(group))
            .map(|(j, _)| j)
            .collect();
        if member_cols.is_empty() {
            continue;
        }

        let n_taxa = matrix.taxa().len();
        let mut mean = Vec::with_capacity(n_taxa);
        let mut std_dev = Vec::with_capacity(n_taxa);
        for i in 0..n_taxa {
            // A zero-total sample holds NaN throughout the relative matrix;
            // such cells are left out of the moments. n still counts every
            // member column.
            let values: Vec<f64> = member_cols
                .iter()
                .map(|&j| matrix.get(i, j))
                .filter(|v| !v.is_nan())
                .collect();
            mean.push((&values).mean());
            // statrs returns NaN below two entries, the required n=1 sentinel
            std_dev.push((&values).std_dev());
        }

        stats.push(GroupStatistics {
            group,
            n: member_cols.len(),
            mean,
            std_dev,
        });
    }

    stats
}

/// Write group statistics as a TSV table: one row per taxon, columns
/// `{group}_mean`, `{group}_std`, `{group}_n` for each populated group.
pub fn write_group_averages<P: AsRef<Path>>(
    path: P,
    taxa: &[String],
    stats: &[GroupStatistics],
) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write!(writer, "taxon")?;
    for s in stats {
        let g = s.group.name();
        write!(writer, "\t{}_mean\t{}_std\t{}_n", g, g, g)?;
    }
    writeln!(writer)?;

    for (i, taxon) in taxa.iter().enumerate() {
        write!(writer, "{}", taxon)?;
        for s in stats {
            write!(writer, "\t{}\t{}\t{}", s.mean[i], s.std_dev[i], s.n)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}
