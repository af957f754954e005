//! Entry pattern matching and ordering.
//!
//! Patterns are ordered; a file's priority is the index of the first
//! pattern it satisfies. Without patterns, every known test file is an
//! entry.

pub mod deps;

use glob::Pattern;

use crate::compiler::EntryPoint;
use crate::error::PackError;
use crate::store::TrackedFile;

/// Ordered entry patterns.
#[derive(Debug, Default)]
pub struct EntryPatterns {
    patterns: Vec<Pattern>,
    raw: Vec<String>,
}

/// Outcome of matching the tracked set against the patterns.
#[derive(Debug, Default)]
pub struct EntrySelection {
    /// Qualifying entries, sorted by pattern priority (stable).
    pub entries: Vec<EntryPoint>,
    /// Patterns that matched zero files; diagnosed once per run.
    pub unmatched_patterns: Vec<String>,
}

impl EntryPatterns {
    pub fn parse(raw: &[String]) -> Result<Self, PackError> {
        let patterns = raw
            .iter()
            .map(|p| Pattern::new(p).map_err(|e| PackError::Pattern(p.clone(), e)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            raw: raw.to_vec(),
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Index of the first pattern the file's store-relative path satisfies.
    pub fn first_match(&self, file: &TrackedFile) -> Option<usize> {
        self.patterns
            .iter()
            .position(|p| p.matches_path(&file.path))
    }

    /// Match the current file set against the patterns.
    ///
    /// With no patterns configured, every known test file is an entry, in
    /// declared order and without a pattern priority. Otherwise qualifying
    /// files are sorted by the index of their first matching pattern,
    /// stable within equal priorities; files matching nothing are not
    /// compiled as entries.
    pub fn select(&self, all_files: &[TrackedFile], test_files: &[TrackedFile]) -> EntrySelection {
        if self.is_empty() {
            return EntrySelection {
                entries: test_files
                    .iter()
                    .enumerate()
                    .map(|(declared, file)| EntryPoint {
                        file: file.clone(),
                        priority: None,
                        declared,
                    })
                    .collect(),
                unmatched_patterns: Vec::new(),
            };
        }

        let mut matched_pattern = vec![false; self.patterns.len()];
        let mut entries: Vec<EntryPoint> = all_files
            .iter()
            .filter_map(|file| {
                let priority = self.first_match(file)?;
                matched_pattern[priority] = true;
                let mut file = file.clone();
                file.entry_ordinal = Some(priority);
                Some(EntryPoint {
                    file,
                    priority: Some(priority),
                    declared: 0,
                })
            })
            .collect();
        for (declared, entry) in entries.iter_mut().enumerate() {
            entry.declared = declared;
        }
        entries.sort_by_key(|e| e.priority);

        let unmatched_patterns = self
            .raw
            .iter()
            .zip(&matched_pattern)
            .filter(|(_, matched)| !**matched)
            .map(|(raw, _)| raw.clone())
            .collect();

        EntrySelection {
            entries,
            unmatched_patterns,
        }
    }
}
