//! Data structures for merging Bracken abundance estimates.

mod matrix;
mod metadata;
mod record;

pub use matrix::{AbundanceMatrix, RelativeAbundanceMatrix};
pub use metadata::{AgeGroup, SampleGroupMap, UNKNOWN_LABEL, UNKNOWN_RANK};
pub use record::{parse_bracken_file, sample_id_from_path, AbundanceRecord};

pub(crate) use matrix::format_cell;
