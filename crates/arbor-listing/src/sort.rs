use std::cmp::Ordering;

use arbor_core::Entry;

/// Sort key for a flat listing. Directories always come first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingSort {
    /// Case-insensitive name.
    #[default]
    Name,
    /// Size, smallest first. Entries without a size sort first.
    Size,
    /// Modification time, oldest first. Entries without a time sort first.
    Modified,
}

fn by_name(a: &Entry, b: &Entry) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

/// Sort `entries` in place: directories first, then by `key`, ties by name.
pub fn sort_entries(entries: &mut [Entry], key: ListingSort) {
    entries.sort_by(|a, b| {
        b.is_dir.cmp(&a.is_dir).then_with(|| match key {
            ListingSort::Name => by_name(a, b),
            ListingSort::Size => a.size.cmp(&b.size).then_with(|| by_name(a, b)),
            ListingSort::Modified => a.modified.cmp(&b.modified).then_with(|| by_name(a, b)),
        })
    });
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn sample() -> Vec<Entry> {
        vec![
            Entry::file("b.txt", 10).with_modified(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
            Entry::dir("Zeta"),
            Entry::file("A.txt", 300).with_modified(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
            Entry::dir("alpha"),
            Entry::file("c.txt", 5),
        ]
    }

    #[test]
    fn test_name_sort_puts_directories_first() {
        let mut entries = sample();
        sort_entries(&mut entries, ListingSort::Name);
        assert_eq!(names(&entries), ["alpha", "Zeta", "A.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_size_sort() {
        let mut entries = sample();
        sort_entries(&mut entries, ListingSort::Size);
        assert_eq!(names(&entries), ["alpha", "Zeta", "c.txt", "b.txt", "A.txt"]);
    }

    #[test]
    fn test_modified_sort_puts_unknown_first() {
        let mut entries = sample();
        sort_entries(&mut entries, ListingSort::Modified);
        assert_eq!(names(&entries), ["alpha", "Zeta", "c.txt", "A.txt", "b.txt"]);
    }
}
