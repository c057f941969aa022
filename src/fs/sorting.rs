//! Directory listing order.
//!
//! Directories always come before files. Within each group entries are
//! ordered by the chosen key; by-date ties fall back to descending name order
//! regardless of direction.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::entries::EntryInfo;

/// Unknown sort key or direction.
#[derive(Debug, thiserror::Error)]
#[error("unknown {what} {value:?}")]
pub struct ParseSortError {
    what: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Name,
    Date,
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc", alias = "ascending")]
    Ascending,
    #[serde(rename = "desc", alias = "descending")]
    Descending,
}

impl FromStr for SortBy {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortBy::Name),
            "date" => Ok(SortBy::Date),
            "size" => Ok(SortBy::Size),
            _ => Err(ParseSortError {
                what: "sort key",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortBy::Name => "name",
            SortBy::Date => "date",
            SortBy::Size => "size",
        })
    }
}

impl FromStr for SortDirection {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(ParseSortError {
                what: "sort direction",
                value: s.to_string(),
            }),
        }
    }
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Sort `entries` in place.
pub fn sort_entries(entries: &mut [EntryInfo], by: SortBy, direction: SortDirection) {
    entries.sort_by(|a, b| compare(a, b, by, direction));
}

fn compare(a: &EntryInfo, b: &EntryInfo, by: SortBy, direction: SortDirection) -> Ordering {
    // `true` sorts after `false`, so invert to put directories first.
    let dirs_first = b.is_dir.cmp(&a.is_dir);
    if dirs_first != Ordering::Equal {
        return dirs_first;
    }

    match by {
        SortBy::Name => direction.apply(a.name.cmp(&b.name)),
        SortBy::Date => direction
            .apply(a.modified.cmp(&b.modified))
            .then_with(|| b.name.cmp(&a.name)),
        SortBy::Size => direction
            .apply(a.size.cmp(&b.size))
            .then_with(|| a.name.cmp(&b.name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::extract_names;
    use std::time::{Duration, SystemTime};

    fn entry(name: &str, is_dir: bool, size: u64, age_secs: u64) -> EntryInfo {
        EntryInfo {
            name: name.to_string(),
            is_dir,
            size,
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000 - age_secs),
        }
    }

    fn sample() -> Vec<EntryInfo> {
        vec![
            entry("b.txt", false, 30, 10),
            entry("docs", true, 0, 50),
            entry("a.txt", false, 10, 20),
            entry("c.txt", false, 20, 10),
            entry("assets", true, 0, 5),
        ]
    }

    #[test]
    fn by_name_puts_directories_first() {
        let mut entries = sample();
        sort_entries(&mut entries, SortBy::Name, SortDirection::Ascending);
        assert_eq!(extract_names(&entries), vec!["assets", "docs", "a.txt", "b.txt", "c.txt"]);

        sort_entries(&mut entries, SortBy::Name, SortDirection::Descending);
        assert_eq!(extract_names(&entries), vec!["docs", "assets", "c.txt", "b.txt", "a.txt"]);
    }

    #[test]
    fn by_date_breaks_ties_by_descending_name() {
        let mut entries = sample();
        sort_entries(&mut entries, SortBy::Date, SortDirection::Ascending);
        assert_eq!(extract_names(&entries), vec!["docs", "assets", "a.txt", "c.txt", "b.txt"]);

        sort_entries(&mut entries, SortBy::Date, SortDirection::Descending);
        assert_eq!(extract_names(&entries), vec!["assets", "docs", "c.txt", "b.txt", "a.txt"]);
    }

    #[test]
    fn by_size() {
        let mut entries = sample();
        sort_entries(&mut entries, SortBy::Size, SortDirection::Descending);
        assert_eq!(extract_names(&entries), vec!["assets", "docs", "b.txt", "c.txt", "a.txt"]);
    }

    #[test]
    fn parses_keys_and_directions() {
        assert_eq!("Date".parse::<SortBy>().unwrap(), SortBy::Date);
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Descending);
        assert_eq!("ascending".parse::<SortDirection>().unwrap(), SortDirection::Ascending);
        assert!("colour".parse::<SortBy>().is_err());
        assert_eq!(SortBy::Size.to_string(), "size");
    }
}
