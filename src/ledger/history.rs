use crate::model::Entry;
use serde::Serialize;

/// One line of the transaction history display.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct HistoryRow {
    /// Position in the display, starting at 1.
    pub number: usize,
    #[serde(flatten)]
    pub entry: Entry,
}

/// Newest first. Entries with equal timestamps keep their insertion order because the sort is
/// stable. The source slice is not reordered.
pub(super) fn history(entries: &[Entry]) -> Vec<HistoryRow> {
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.transaction.timestamp().cmp(&a.transaction.timestamp()));
    sorted
        .into_iter()
        .enumerate()
        .map(|(ix, entry)| HistoryRow {
            number: ix + 1,
            entry: entry.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Candidate, Transaction, TxnId};

    fn entry(id: &str, date: &str, time: Option<&str>) -> Entry {
        let mut c = Candidate::new(date, id, "1", "Food");
        c.time = time.map(str::to_string);
        Entry::new(TxnId::new(id), Transaction::try_from(c).unwrap())
    }

    fn ids(rows: &[HistoryRow]) -> Vec<&str> {
        rows.iter().map(|r| r.entry.id.as_str()).collect()
    }

    #[test]
    fn test_newest_first_numbered_from_one() {
        let entries = vec![
            entry("a", "2024-01-05", None),
            entry("b", "2024-03-01", None),
            entry("c", "2024-02-10", None),
        ];
        let rows = history(&entries);
        assert_eq!(ids(&rows), vec!["b", "c", "a"]);
        assert_eq!(
            rows.iter().map(|r| r.number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        // The ledger order is untouched
        assert_eq!(entries[0].id.as_str(), "a");
    }

    #[test]
    fn test_time_of_day_orders_within_a_day() {
        let entries = vec![
            entry("morning", "2024-01-05", Some("08:00")),
            entry("no-time", "2024-01-05", None),
            entry("evening", "2024-01-05", Some("19:30")),
        ];
        assert_eq!(
            ids(&history(&entries)),
            vec!["evening", "morning", "no-time"]
        );
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let entries = vec![
            entry("first", "2024-01-05", None),
            entry("second", "2024-01-05", None),
        ];
        assert_eq!(ids(&history(&entries)), vec!["first", "second"]);
    }

    #[test]
    fn test_serializes_flat() {
        let rows = history(&[entry("x", "2024-01-05", Some("12:00"))]);
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["number"], 1);
        assert_eq!(json["id"], "x");
        assert_eq!(json["time"], "12:00:00");
    }
}
