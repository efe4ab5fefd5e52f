//! Per-level merging of sample abundance files.

mod level;

pub use level::{has_group_annotations, level_name, merge_level, LevelTables};

pub(crate) use level::bracken_files;
