//! Dense taxa × samples abundance matrices.

use crate::data::metadata::SampleGroupMap;
use crate::error::{MergeError, Result};
use nalgebra::DMatrix;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A merged abundance matrix: raw read counts, taxa as rows, samples as
/// columns.
///
/// Every (taxon, sample) cell is materialized; a taxon not detected in a
/// sample holds 0.0, not a missing value. Row and column order carry the
/// presentation policy chosen at merge time and do not affect any
/// computed value.
#[derive(Debug, Clone)]
pub struct AbundanceMatrix {
    /// Read counts (taxa × samples).
    data: DMatrix<f64>,
    /// Taxon names (row labels).
    taxa: Vec<String>,
    /// Sample identifiers (column labels).
    sample_ids: Vec<String>,
}

/// Per-sample relative abundances, in percent.
///
/// Derived from an [`AbundanceMatrix`] by dividing each column by its total
/// and scaling to 100. A sample with zero total reads yields an all-NaN
/// column; the NaN is deliberate and propagates into output unchanged.
#[derive(Debug, Clone)]
pub struct RelativeAbundanceMatrix {
    data: DMatrix<f64>,
    taxa: Vec<String>,
    sample_ids: Vec<String>,
}

impl AbundanceMatrix {
    /// Create a matrix from parts, checking dimensions.
    pub fn new(data: DMatrix<f64>, taxa: Vec<String>, sample_ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != taxa.len() {
            return Err(MergeError::DimensionMismatch {
                expected: nrows,
                actual: taxa.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(MergeError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        Ok(Self {
            data,
            taxa,
            sample_ids,
        })
    }

    /// Read count for a taxon row and sample column.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Number of taxa (rows).
    #[inline]
    pub fn n_taxa(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Taxon names.
    #[inline]
    pub fn taxa(&self) -> &[String] {
        &self.taxa
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Total reads per taxon, across all samples.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.n_taxa())
            .map(|i| self.data.row(i).iter().sum())
            .collect()
    }

    /// Total reads per sample, across all taxa.
    pub fn col_sums(&self) -> Vec<f64> {
        (0..self.n_samples())
            .map(|j| self.data.column(j).iter().sum())
            .collect()
    }

    /// Derive per-sample relative abundances in percent.
    ///
    /// Each column is divided by its own total and scaled by 100. A
    /// zero-total column divides 0/0 into NaN, which is kept: substituting
    /// zero would misrepresent a sample with no classified reads.
    pub fn to_relative(&self) -> RelativeAbundanceMatrix {
        let totals = self.col_sums();
        let mut data = self.data.clone();
        for j in 0..self.n_samples() {
            let total = totals[j];
            for i in 0..self.n_taxa() {
                data[(i, j)] = data[(i, j)] / total * 100.0;
            }
        }
        RelativeAbundanceMatrix {
            data,
            taxa: self.taxa.clone(),
            sample_ids: self.sample_ids.clone(),
        }
    }

    /// Write the matrix as a TSV table with a `taxon` corner header.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_table(path, &self.taxa, &self.sample_ids, &self.data, None)
    }

    /// Write the matrix with an extra leading `GROUP` row carrying each
    /// sample's verbatim group label.
    pub fn to_tsv_annotated<P: AsRef<Path>>(&self, path: P, groups: &SampleGroupMap) -> Result<()> {
        let labels: Vec<&str> = self.sample_ids.iter().map(|s| groups.label(s)).collect();
        write_table(path, &self.taxa, &self.sample_ids, &self.data, Some(&labels))
    }
}

impl RelativeAbundanceMatrix {
    /// Relative abundance (percent) for a taxon row and sample column.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Number of taxa (rows).
    #[inline]
    pub fn n_taxa(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Taxon names.
    #[inline]
    pub fn taxa(&self) -> &[String] {
        &self.taxa
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Write the matrix as a TSV table with a `taxon` corner header.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_table(path, &self.taxa, &self.sample_ids, &self.data, None)
    }
}

/// Render one numeric cell. `f64`'s `Display` prints integral values
/// without a trailing `.0` and NaN as `NaN`.
pub(crate) fn format_cell(value: f64) -> String {
    value.to_string()
}

fn write_table<P: AsRef<Path>>(
    path: P,
    taxa: &[String],
    sample_ids: &[String],
    data: &DMatrix<f64>,
    group_row: Option<&[&str]>,
) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write!(writer, "taxon")?;
    for sample_id in sample_ids {
        write!(writer, "\t{}", sample_id)?;
    }
    writeln!(writer)?;

    if let Some(labels) = group_row {
        write!(writer, "GROUP")?;
        for label in labels {
            write!(writer, "\t{}", label)?;
        }
        writeln!(writer)?;
    }

    for (i, taxon) in taxa.iter().enumerate() {
        write!(writer, "{}", taxon)?;
        for j in 0..sample_ids.len() {
            write!(writer, "\t{}", format_cell(data[(i, j)]))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn create_test_matrix() -> AbundanceMatrix {
        // 2 taxa × 3 samples; sample C has no reads at all
        let data = DMatrix::from_row_slice(2, 3, &[10.0, 0.0, 0.0, 30.0, 20.0, 0.0]);
        AbundanceMatrix::new(
            data,
            vec!["X".into(), "Y".into()],
            vec!["A".into(), "B".into(), "C".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_dimension_check() {
        let data = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        let result = AbundanceMatrix::new(data, vec!["X".into()], vec!["A".into()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sums() {
        let mat = create_test_matrix();
        assert_eq!(mat.row_sums(), vec![10.0, 50.0]);
        assert_eq!(mat.col_sums(), vec![40.0, 20.0, 0.0]);
    }

    #[test]
    fn test_relative_columns_sum_to_100() {
        let mat = create_test_matrix();
        let rel = mat.to_relative();

        for j in 0..2 {
            let col_sum: f64 = (0..rel.n_taxa()).map(|i| rel.get(i, j)).sum();
            assert_relative_eq!(col_sum, 100.0, epsilon = 1e-9);
        }
        assert_relative_eq!(rel.get(0, 0), 25.0, epsilon = 1e-9);
        assert_relative_eq!(rel.get(1, 0), 75.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_total_column_is_nan() {
        let mat = create_test_matrix();
        let rel = mat.to_relative();

        assert!(rel.get(0, 2).is_nan());
        assert!(rel.get(1, 2).is_nan());
        // other columns unaffected
        assert!(rel.get(0, 0).is_finite());
    }

    #[test]
    fn test_to_tsv_format() {
        let mat = create_test_matrix();
        let temp = NamedTempFile::new().unwrap();
        mat.to_tsv(temp.path()).unwrap();

        let content = std::fs::read_to_string(temp.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "taxon\tA\tB\tC");
        assert_eq!(lines[1], "X\t10\t0\t0");
        assert_eq!(lines[2], "Y\t30\t20\t0");
    }

    #[test]
    fn test_to_tsv_annotated() {
        let mut meta = NamedTempFile::new().unwrap();
        writeln!(meta, "sample_id\tage_group").unwrap();
        writeln!(meta, "A\tyoung").unwrap();
        writeln!(meta, "B\tcentenarian").unwrap();
        meta.flush().unwrap();
        let groups = SampleGroupMap::from_tsv(meta.path()).unwrap();

        let mat = create_test_matrix();
        let temp = NamedTempFile::new().unwrap();
        mat.to_tsv_annotated(temp.path(), &groups).unwrap();

        let content = std::fs::read_to_string(temp.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "taxon\tA\tB\tC");
        assert_eq!(lines[1], "GROUP\tyoung\tcentenarian\tunknown");
        assert_eq!(lines[2], "X\t10\t0\t0");
    }

    #[test]
    fn test_fractional_counts_render_exactly() {
        let data = DMatrix::from_row_slice(1, 1, &[92.5]);
        let mat = AbundanceMatrix::new(data, vec!["X".into()], vec!["A".into()]).unwrap();
        let temp = NamedTempFile::new().unwrap();
        mat.to_tsv(temp.path()).unwrap();

        let content = std::fs::read_to_string(temp.path()).unwrap();
        assert!(content.contains("X\t92.5"));
    }
}
