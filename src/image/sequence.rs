//! Numbered sample files: `{prefix}{index}.{ext}`, counting from 1.

use std::path::PathBuf;

fn numbered_path(prefix: &str, index: usize, extension: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}{index}.{extension}"))
}

/// `{prefix}1.{ext}` through `{prefix}{count}.{ext}`, whether or not they exist.
pub fn numbered_paths(prefix: &str, extension: &str, count: usize) -> Vec<PathBuf> {
    (1..=count).map(|i| numbered_path(prefix, i, extension)).collect()
}

/// Existing numbered files, stopping at the first index that is missing.
#[derive(Debug, Clone)]
pub struct NumberedImages {
    prefix: String,
    extension: String,
    next: usize,
    done: bool,
}

impl NumberedImages {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
            next: 1,
            done: false,
        }
    }
}

impl Iterator for NumberedImages {
    /// `(index, path)`
    type Item = (usize, PathBuf);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let path = numbered_path(&self.prefix, self.next, &self.extension);
        if !path.exists() {
            self.done = true;
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some((index, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn lists_fixed_count() {
        let paths = numbered_paths("data/sig_", "png", 3);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("data/sig_1.png"),
                PathBuf::from("data/sig_2.png"),
                PathBuf::from("data/sig_3.png"),
            ]
        );
        assert!(numbered_paths("x", "png", 0).is_empty());
    }

    #[test]
    fn stops_at_first_gap() {
        let dir = tempfile::tempdir().unwrap();
        for i in [1, 2, 3, 5] {
            File::create(dir.path().join(format!("test{i}.png"))).unwrap();
        }
        let prefix = format!("{}/test", dir.path().display());

        let found: Vec<usize> = NumberedImages::new(prefix, "png").map(|(i, _)| i).collect();
        assert_eq!(found, vec![1, 2, 3]);
    }

    #[test]
    fn empty_when_first_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/none", dir.path().display());
        assert_eq!(NumberedImages::new(prefix, "png").count(), 0);
    }
}
