//! Parsing of single-sample Bracken output files.

use crate::error::{MergeError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One row of a Bracken output file: a taxon and its re-estimated read count.
///
/// Counts are kept as `f64` because Bracken's abundance re-estimation can
/// produce fractional reads.
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceRecord {
    /// Taxon name, unique within one sample's output.
    pub taxon: String,
    /// Estimated read count (non-negative, possibly fractional).
    pub reads: f64,
}

/// Parse a Bracken output file into abundance records.
///
/// Expected format: tab-delimited with a header row containing at least the
/// `name` and `new_est_reads` columns (any position, other columns ignored).
///
/// A file with a valid header but zero data rows yields an empty vector —
/// the sample produced no classifications at this level, which is not an
/// error. A missing required column or an unparseable count cell is an
/// error; callers treat it as a per-file skip.
pub fn parse_bracken_file<P: AsRef<Path>>(path: P) -> Result<Vec<AbundanceRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header_line = lines.next().ok_or_else(|| MergeError::MissingColumn {
        column: "name".to_string(),
        path: path.to_path_buf(),
    })??;
    let header: Vec<&str> = header_line.split('\t').collect();

    let col_index = |column: &str| -> Result<usize> {
        header
            .iter()
            .position(|h| *h == column)
            .ok_or_else(|| MergeError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            })
    };
    let name_idx = col_index("name")?;
    let reads_idx = col_index("new_est_reads")?;

    let mut records = Vec::new();
    for line_result in lines {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() <= name_idx.max(reads_idx) {
            continue;
        }
        let taxon = fields[name_idx].to_string();
        let raw = fields[reads_idx].trim();
        let reads: f64 = raw.parse().map_err(|_| MergeError::InvalidCount {
            value: raw.to_string(),
            taxon: taxon.clone(),
            path: path.to_path_buf(),
        })?;
        records.push(AbundanceRecord { taxon, reads });
    }

    Ok(records)
}

/// Derive the sample identifier from a file path: the base name with the
/// extension stripped. Case-sensitive.
pub fn sample_id_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
