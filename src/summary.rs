//! Per-sample, per-level summary statistics.

use crate::data::{format_cell, parse_bracken_file, sample_id_from_path, SampleGroupMap};
use crate::error::Result;
use crate::merge::bracken_files;
use log::warn;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Totals for one sample at one taxonomic level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelCounts {
    /// Sum of estimated reads across all taxa in the sample's file.
    pub total_reads: f64,
    /// Number of taxa with a record in the sample's file.
    pub n_taxa: usize,
}

/// One row per sample: per-level read and taxa totals, joined with the
/// sample's group label when metadata is available.
///
/// A sample absent from a level has no entry for that level — on output the
/// cells are left empty, which is distinct from zero reads: the sample was
/// not classified at that level in this run. A sample whose file is present
/// but has zero rows gets explicit zero counts instead.
#[derive(Debug, Clone)]
pub struct SampleSummary {
    /// Level codes in the order they were requested.
    levels: Vec<String>,
    /// sample id → level code → counts; BTreeMap keeps rows sorted by id.
    rows: BTreeMap<String, HashMap<String, LevelCounts>>,
}

impl SampleSummary {
    /// Number of samples seen across all levels.
    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    /// Whether no sample was seen at any level.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sample ids, sorted.
    pub fn sample_ids(&self) -> Vec<&str> {
        self.rows.keys().map(String::as_str).collect()
    }

    /// Counts for one sample at one level, if the sample appeared there.
    pub fn counts(&self, sample_id: &str, level: &str) -> Option<LevelCounts> {
        self.rows.get(sample_id).and_then(|m| m.get(level)).copied()
    }

    /// Write the summary as a TSV table. With metadata, an `age_group`
    /// column carrying the verbatim label comes first; read totals are
    /// truncated toward zero to whole reads.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P, groups: Option<&SampleGroupMap>) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "sample_id")?;
        if groups.is_some() {
            write!(writer, "\tage_group")?;
        }
        for level in &self.levels {
            write!(writer, "\t{}_reads\t{}_taxa", level, level)?;
        }
        writeln!(writer)?;

        for (sample_id, by_level) in &self.rows {
            write!(writer, "{}", sample_id)?;
            if let Some(groups) = groups {
                write!(writer, "\t{}", groups.label(sample_id))?;
            }
            for level in &self.levels {
                match by_level.get(level) {
                    Some(counts) => write!(
                        writer,
                        "\t{}\t{}",
                        format_cell(counts.total_reads.trunc()),
                        counts.n_taxa
                    )?,
                    None => write!(writer, "\t\t")?,
                }
            }
            writeln!(writer)?;
        }

        Ok(())
    }
}

/// Scan the per-level directories and accumulate per-sample totals.
///
/// Runs independently of matrix construction over the same input files.
/// Missing level directories and malformed sample files are skipped the
/// same way the merger skips them; empty sample files are kept as
/// zero-count rows, unlike in the merger.
pub fn build_sample_summary(input_dir: &Path, levels: &[String]) -> Result<SampleSummary> {
    let mut rows: BTreeMap<String, HashMap<String, LevelCounts>> = BTreeMap::new();

    for level in levels {
        let level_dir = input_dir.join(level);
        if !level_dir.is_dir() {
            continue;
        }
        for path in bracken_files(&level_dir)? {
            let Some(sample_id) = sample_id_from_path(&path) else {
                continue;
            };
            let records = match parse_bracken_file(&path) {
                Ok(records) => records,
                Err(e) => {
                    warn!("skipping {:?} in summary: {}", path, e);
                    continue;
                }
            };
            // A header-only file still counts here: the sample ran at this
            // level and yielded nothing, which is 0 reads / 0 taxa, not a
            // missing cell. Only the merger excludes such samples.
            let counts = LevelCounts {
                // fold from +0.0: an empty iterator's `sum()` is -0.0,
                // which would render as "-0" in the TSV
                total_reads: records.iter().map(|r| r.reads).fold(0.0, |a, r| a + r),
                n_taxa: records.len(),
            };
            rows.entry(sample_id).or_default().insert(level.clone(), counts);
        }
    }

    Ok(SampleSummary {
        levels: levels.to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write as _;
    use tempfile::tempdir;

    fn write_sample(dir: &Path, level: &str, sample: &str, rows: &[(&str, f64)]) {
        let level_dir = dir.join(level);
        fs::create_dir_all(&level_dir).unwrap();
        let mut file = fs::File::create(level_dir.join(format!("{}.bracken", sample))).unwrap();
        writeln!(file, "name\tnew_est_reads").unwrap();
        for (taxon, reads) in rows {
            writeln!(file, "{}\t{}", taxon, reads).unwrap();
        }
    }

    fn groups_from(rows: &[(&str, &str)]) -> SampleGroupMap {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sample_id\tage_group").unwrap();
        for (sample, group) in rows {
            writeln!(file, "{}\t{}", sample, group).unwrap();
        }
        file.flush().unwrap();
        SampleGroupMap::from_tsv(file.path()).unwrap()
    }

    fn levels(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_totals_per_level() {
        let dir = tempdir().unwrap();
        write_sample(dir.path(), "S", "A", &[("X", 10.0), ("Y", 20.5)]);
        write_sample(dir.path(), "G", "A", &[("Xg", 30.0)]);

        let summary = build_sample_summary(dir.path(), &levels(&["S", "G"])).unwrap();
        assert_eq!(summary.n_samples(), 1);

        let s = summary.counts("A", "S").unwrap();
        assert_eq!(s.total_reads, 30.5);
        assert_eq!(s.n_taxa, 2);
        let g = summary.counts("A", "G").unwrap();
        assert_eq!(g.n_taxa, 1);
    }

    #[test]
    fn test_absent_level_is_missing_not_zero() {
        let dir = tempdir().unwrap();
        write_sample(dir.path(), "S", "A", &[("X", 10.0)]);
        write_sample(dir.path(), "S", "B", &[("X", 5.0)]);
        write_sample(dir.path(), "G", "A", &[("Xg", 7.0)]);

        let summary = build_sample_summary(dir.path(), &levels(&["S", "G"])).unwrap();
        assert!(summary.counts("B", "G").is_none());

        let temp = tempfile::NamedTempFile::new().unwrap();
        summary.to_tsv(temp.path(), None).unwrap();
        let content = std::fs::read_to_string(temp.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "sample_id\tS_reads\tS_taxa\tG_reads\tG_taxa");
        assert_eq!(lines[1], "A\t10\t1\t7\t1");
        assert_eq!(lines[2], "B\t5\t1\t\t");
    }

    #[test]
    fn test_metadata_join() {
        let dir = tempdir().unwrap();
        write_sample(dir.path(), "S", "A", &[("X", 10.0)]);
        write_sample(dir.path(), "S", "B", &[("X", 5.0)]);
        let groups = groups_from(&[("A", "young")]);

        let summary = build_sample_summary(dir.path(), &levels(&["S"])).unwrap();
        let temp = tempfile::NamedTempFile::new().unwrap();
        summary.to_tsv(temp.path(), Some(&groups)).unwrap();

        let content = std::fs::read_to_string(temp.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "sample_id\tage_group\tS_reads\tS_taxa");
        assert_eq!(lines[1], "A\tyoung\t10\t1");
        assert_eq!(lines[2], "B\tunknown\t5\t1");
    }

    #[test]
    fn test_fractional_reads_truncated_in_output() {
        let dir = tempdir().unwrap();
        write_sample(dir.path(), "S", "A", &[("X", 10.4), ("Y", 0.3)]);

        let summary = build_sample_summary(dir.path(), &levels(&["S"])).unwrap();
        let temp = tempfile::NamedTempFile::new().unwrap();
        summary.to_tsv(temp.path(), None).unwrap();

        // 10.7 total reads truncates to 10
        let content = std::fs::read_to_string(temp.path()).unwrap();
        assert!(content.contains("A\t10\t2"));
    }

    #[test]
    fn test_empty_sample_file_counted_as_zero_not_missing() {
        let dir = tempdir().unwrap();
        write_sample(dir.path(), "S", "A", &[("X", 10.0)]);
        write_sample(dir.path(), "S", "empty", &[]);

        let summary = build_sample_summary(dir.path(), &levels(&["S"])).unwrap();
        let counts = summary.counts("empty", "S").unwrap();
        assert_eq!(counts.total_reads, 0.0);
        assert_eq!(counts.n_taxa, 0);

        let temp = tempfile::NamedTempFile::new().unwrap();
        summary.to_tsv(temp.path(), None).unwrap();
        let content = std::fs::read_to_string(temp.path()).unwrap();
        // present-but-empty renders zeros, not empty cells
        assert!(content.contains("empty\t0\t0"));
    }

    #[test]
    fn test_empty_tree_yields_empty_summary() {
        let dir = tempdir().unwrap();
        let summary = build_sample_summary(dir.path(), &levels(&["S", "G"])).unwrap();
        assert!(summary.is_empty());
    }
}
