//! Merging of per-sample Bracken abundance estimates into cohort tables.
//!
//! Bracken emits one abundance file per sample per taxonomic level. This
//! library folds those into wide (taxa × samples) tables, derives relative
//! abundances, and computes per-age-group summary statistics for the
//! young / elderly / centenarian cohort design.
//!
//! # Overview
//!
//! - **data**: parsing and core structures (`AbundanceRecord`,
//!   `SampleGroupMap`, `AbundanceMatrix`, `RelativeAbundanceMatrix`)
//! - **merge**: per-level merging with zero-fill and ordering policy
//! - **stats**: per-group mean / standard deviation / count
//! - **summary**: per-sample, per-level read and taxa totals
//!
//! # Example
//!
//! ```no_run
//! use bracken_merge::prelude::*;
//! use std::path::Path;
//!
//! let groups = SampleGroupMap::from_tsv("metadata.tsv").unwrap();
//! if let Some(tables) = merge_level(Path::new("bracken/S"), Some(&groups)).unwrap() {
//!     tables.abundance.to_tsv("species_abundance.tsv").unwrap();
//!     tables.relative.to_tsv("species_relative_abundance.tsv").unwrap();
//!     let stats = group_statistics(&tables.abundance, &groups);
//!     write_group_averages("species_group_averages.tsv", tables.abundance.taxa(), &stats)
//!         .unwrap();
//! }
//! ```

pub mod data;
pub mod error;
pub mod merge;
pub mod stats;
pub mod summary;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{
        parse_bracken_file, sample_id_from_path, AbundanceMatrix, AbundanceRecord, AgeGroup,
        RelativeAbundanceMatrix, SampleGroupMap, UNKNOWN_LABEL,
    };
    pub use crate::error::{MergeError, Result};
    pub use crate::merge::{has_group_annotations, level_name, merge_level, LevelTables};
    pub use crate::stats::{group_statistics, write_group_averages, GroupStatistics, TaxaMatrix};
    pub use crate::summary::{build_sample_summary, LevelCounts, SampleSummary};
}
