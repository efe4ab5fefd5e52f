//! Group-level summary statistics.

mod group;

pub use group::{group_statistics, write_group_averages, GroupStatistics, TaxaMatrix};
