//! Class id to label mapping.

use crate::constants::FALLBACK_LABEL;
use crate::error::{Error, Result};
use std::path::Path;

/// Built-in class table: generic categories followed by recyclable waste.
const DEFAULT_CLASS_NAMES: [&str; 13] = [
    "person",
    "bicycle",
    "car",
    "motorbike",
    "aeroplane",
    "bus",
    "train",
    "truck",
    "boat",
    "plastic_bottle",
    "cardboard_box",
    "plastic_bag",
    "can",
];

/// Maps model class ids to human-readable labels.
///
/// Ids outside the table resolve to [`FALLBACK_LABEL`].
#[derive(Debug, Clone)]
pub struct ClassNameResolver {
    labels: Vec<String>,
}

impl Default for ClassNameResolver {
    fn default() -> Self {
        Self {
            labels: DEFAULT_CLASS_NAMES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl ClassNameResolver {
    /// Build a resolver from an explicit label list, indexed by class id.
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Load labels from a file with one label per line.
    ///
    /// Line `n` (zero-based) names class `n`. Surrounding whitespace is
    /// trimmed and a blank line leaves its class unnamed. Trailing blank
    /// lines are ignored.
    pub fn from_labels_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::LabelsRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut labels: Vec<String> = contents
            .lines()
            .map(|line| line.trim().to_string())
            .collect();
        while labels.last().is_some_and(String::is_empty) {
            labels.pop();
        }

        Ok(Self::new(labels))
    }

    /// Resolve a class id to its label.
    pub fn resolve(&self, class_id: i64) -> &str {
        usize::try_from(class_id)
            .ok()
            .and_then(|idx| self.labels.get(idx))
            .filter(|label| !label.is_empty())
            .map_or(FALLBACK_LABEL, String::as_str)
    }

    /// Number of known classes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the table is empty (every id resolves to the fallback).
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_known_ids() {
        let resolver = ClassNameResolver::default();
        assert_eq!(resolver.resolve(0), "person");
        assert_eq!(resolver.resolve(9), "plastic_bottle");
        assert_eq!(resolver.resolve(10), "cardboard_box");
        assert_eq!(resolver.resolve(11), "plastic_bag");
        assert_eq!(resolver.resolve(12), "can");
        assert_eq!(resolver.len(), 13);
    }

    #[test]
    fn test_unknown_ids_fall_back() {
        let resolver = ClassNameResolver::default();
        assert_eq!(resolver.resolve(13), "Other Waste");
        assert_eq!(resolver.resolve(79), "Other Waste");
        assert_eq!(resolver.resolve(-1), "Other Waste");
    }

    #[test]
    fn test_labels_file_replaces_table() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "glass\n  paper  \nmetal\n").unwrap();

        let resolver = ClassNameResolver::from_labels_file(file.path()).unwrap();
        assert_eq!(resolver.len(), 3);
        assert_eq!(resolver.resolve(1), "paper");
        assert_eq!(resolver.resolve(3), "Other Waste");
    }

    #[test]
    fn test_blank_label_line_keeps_later_ids() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "glass\n\npaper").unwrap();

        let resolver = ClassNameResolver::from_labels_file(file.path()).unwrap();
        assert_eq!(resolver.len(), 3);
        assert_eq!(resolver.resolve(0), "glass");
        assert_eq!(resolver.resolve(1), "Other Waste");
        assert_eq!(resolver.resolve(2), "paper");
    }

    #[test]
    fn test_missing_labels_file() {
        let result = ClassNameResolver::from_labels_file(Path::new("/nonexistent/labels.txt"));
        assert!(matches!(result, Err(Error::LabelsRead { .. })));
    }
}
