//! Sample group metadata for cohort-aware merging.

use crate::error::{MergeError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The study's recognized age groups, in cohort rank order.
///
/// Only these labels participate in column ordering and group statistics;
/// anything else in the metadata is retained verbatim for display but
/// treated as unknown for aggregation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeGroup {
    Young,
    Elderly,
    Centenarian,
}

impl AgeGroup {
    /// All recognized groups in rank order.
    pub const ALL: [AgeGroup; 3] = [AgeGroup::Young, AgeGroup::Elderly, AgeGroup::Centenarian];

    /// Parse a metadata label. Exact, case-sensitive match.
    pub fn parse(label: &str) -> Option<AgeGroup> {
        match label {
            "young" => Some(AgeGroup::Young),
            "elderly" => Some(AgeGroup::Elderly),
            "centenarian" => Some(AgeGroup::Centenarian),
            _ => None,
        }
    }

    /// The label used in output column names.
    pub fn name(&self) -> &'static str {
        match self {
            AgeGroup::Young => "young",
            AgeGroup::Elderly => "elderly",
            AgeGroup::Centenarian => "centenarian",
        }
    }

    /// Sort rank: young < elderly < centenarian < unknown.
    pub fn rank(&self) -> usize {
        match self {
            AgeGroup::Young => 0,
            AgeGroup::Elderly => 1,
            AgeGroup::Centenarian => 2,
        }
    }
}

/// Rank used for samples with no recognized group.
pub const UNKNOWN_RANK: usize = 3;

/// Label used for samples absent from metadata.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Mapping from sample identifier to its metadata group label.
///
/// Read-only after load; freely shareable across per-level processing.
#[derive(Debug, Clone, Default)]
pub struct SampleGroupMap {
    labels: HashMap<String, String>,
}

impl SampleGroupMap {
    /// Load sample metadata from a TSV file.
    ///
    /// The header must contain `sample_id` and `age_group` columns; a missing
    /// column is fatal to the run. Labels are kept verbatim. A sample id
    /// listed twice keeps the last label.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines.next().ok_or_else(|| MergeError::MissingColumn {
            column: "sample_id".to_string(),
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
        let id_idx = col_index("sample_id")?;
        let group_idx = col_index("age_group")?;

        let mut labels = HashMap::new();
        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() <= id_idx.max(group_idx) {
                continue;
            }
            labels.insert(fields[id_idx].to_string(), fields[group_idx].to_string());
        }

        Ok(Self { labels })
    }

    /// Number of samples with metadata.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether any metadata was loaded.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The verbatim label for a sample, or `"unknown"` when absent.
    pub fn label(&self, sample_id: &str) -> &str {
        self.labels
            .get(sample_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    /// The recognized group for a sample, if its label is one of the
    /// fixed vocabulary.
    pub fn group(&self, sample_id: &str) -> Option<AgeGroup> {
        self.labels.get(sample_id).and_then(|l| AgeGroup::parse(l))
    }

    /// Sort rank for a sample: recognized group rank, else the trailing
    /// unknown rank.
    pub fn rank(&self, sample_id: &str) -> usize {
        self.group(sample_id).map_or(UNKNOWN_RANK, |g| g.rank())
    }

    /// Distinct labels present in the metadata, sorted.
    pub fn distinct_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.labels.values().cloned().collect();
        labels.sort();
        labels.dedup();
        labels
    }
}
