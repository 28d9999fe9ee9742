use regex::{Regex, RegexBuilder};

use super::structures::ZipFileEntry;
use crate::error::Result;

/// Case-insensitive regex over in-archive paths (forward-slash separated).
#[derive(Debug, Clone)]
pub struct EntryFilter {
    regex: Regex,
}

impl EntryFilter {
    /// Compile `pattern`. An empty pattern matches every entry.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, entry: &ZipFileEntry) -> bool {
        self.regex.is_match(&entry.file_name)
    }

    /// Matching entries, in their original order.
    pub fn apply<'a>(&self, entries: &'a [ZipFileEntry]) -> Vec<&'a ZipFileEntry> {
        entries.iter().filter(|e| self.is_match(e)).collect()
    }
}
