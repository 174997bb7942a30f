//! Counter name and help string tables.
//!
//! The OS publishes both tables as one multi-string value: decimal id,
//! text, id, text, ... This module only parses that layout. Which locale
//! the strings are in is up to whoever supplies them.

use rustc_hash::FxHashMap;

use crate::{Error, NameKind, Result};

/// Id to display string mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameTable {
    entries: FxHashMap<u32, String>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse alternating id/text entries. A trailing id without text is ignored.
    pub fn from_entries<I, S>(kind: NameKind, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries: Vec<S> = entries.into_iter().collect();
        let mut table = FxHashMap::default();
        table.reserve(entries.len() / 2);

        for pair in entries.chunks_exact(2) {
            let id = pair[0].as_ref();
            let Ok(key) = id.trim().parse::<u32>() else {
                return Err(Error::CorruptNameTable {
                    kind,
                    entry: id.to_string(),
                });
            };
            table.insert(key, pair[1].as_ref().to_string());
        }
        Ok(Self { entries: table })
    }

    /// Parse a `REG_MULTI_SZ` value: NUL-separated UTF-16LE strings ending in an empty one.
    pub fn from_multi_sz(kind: NameKind, data: &[u8]) -> Result<Self> {
        let units: Vec<u16> = data
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let mut strings: Vec<String> = units
            .split(|&unit| unit == 0)
            .map(String::from_utf16_lossy)
            .collect();
        // Terminating double NUL.
        while strings.last().is_some_and(String::is_empty) {
            strings.pop();
        }
        Self::from_entries(kind, strings)
    }

    /// Parse a text file with one entry per line.
    pub fn from_lines(kind: NameKind, text: &str) -> Result<Self> {
        Self::from_entries(kind, text.lines())
    }

    pub fn get(&self, id: u32) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    pub fn insert(&mut self, id: u32, text: impl Into<String>) {
        self.entries.insert(id, text.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(u32, S)> for NameTable {
    fn from_iter<T: IntoIterator<Item = (u32, S)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(id, text)| (id, text.into())).collect(),
        }
    }
}
