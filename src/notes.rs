use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::portal::Note;

/// Merge notes from two sources, dropping duplicates.
///
/// Two notes are the same when text, timestamp and category all match. The
/// first occurrence wins (notes from `a` before `b`) and the result is
/// ordered by `added_at`, ties keeping their merged order.
pub fn merge_notes(a: &[Note], b: &[Note]) -> Vec<Note> {
    let mut seen: HashSet<(&str, DateTime<Utc>, Option<&str>)> = HashSet::new();
    let mut merged: Vec<Note> = Vec::with_capacity(a.len() + b.len());

    for note in a.iter().chain(b.iter()) {
        let key = (note.note.as_str(), note.added_at, note.category.as_deref());
        if seen.insert(key) {
            merged.push(note.clone());
        }
    }

    merged.sort_by_key(|n| n.added_at);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn note(text: &str, day: u32, category: Option<&str>, by: &str) -> Note {
        Note {
            note: text.to_string(),
            added_by: by.to_string(),
            added_at: Utc.with_ymd_and_hms(2026, 4, day, 12, 0, 0).unwrap(),
            category: category.map(str::to_string),
        }
    }

    #[test]
    fn test_duplicates_collapse_to_first_occurrence() {
        let a = vec![note("fixed VAT", 3, Some("sales"), "dashboard")];
        let b = vec![note("fixed VAT", 3, Some("sales"), "notes-api")];

        let merged = merge_notes(&a, &b);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].added_by, "dashboard");
    }

    #[test]
    fn test_category_is_part_of_identity() {
        let a = vec![note("late upload", 3, Some("sales"), "c")];
        let b = vec![note("late upload", 3, Some("bank"), "c")];

        assert_eq!(merge_notes(&a, &b).len(), 2);
    }

    #[test]
    fn test_result_is_sorted_by_time() {
        let a = vec![note("third", 9, None, "c"), note("first", 1, None, "c")];
        let b = vec![note("second", 5, Some("month"), "c")];

        let merged = merge_notes(&a, &b);
        let texts: Vec<&str> = merged.iter().map(|n| n.note.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(merge_notes(&[], &[]).is_empty());
        let only = vec![note("x", 2, None, "c")];
        assert_eq!(merge_notes(&only, &[]), only);
        assert_eq!(merge_notes(&[], &only), only);
    }
}
