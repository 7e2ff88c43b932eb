//! Date grouping of the mirrored log.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{RecordId, SleepRecord};

/// Sort newest first; equal timestamps fall back to ascending id.
pub fn sort_newest_first(records: &mut [SleepRecord]) {
    records.sort_by(|left, right| {
        right
            .timestamp
            .cmp(&left.timestamp)
            .then_with(|| left.id.cmp(&right.id))
    });
}

/// Records sharing one stored `dateString`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateGroup {
    pub date_string: String,
    pub records: Vec<SleepRecord>,
}

/// The mirror partitioned by `dateString`, in the order dates first appear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GroupedView {
    groups: Vec<DateGroup>,
}

impl GroupedView {
    /// Group `records`, which must already be in display order.
    ///
    /// Records of one date need not be adjacent: dates rendered on devices in
    /// different offsets can interleave, and each still lands in one group.
    pub fn from_sorted(records: &[SleepRecord]) -> Self {
        let mut groups: Vec<DateGroup> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for record in records {
            let slot = *index
                .entry(record.date_string.as_str())
                .or_insert_with(|| {
                    groups.push(DateGroup {
                        date_string: record.date_string.clone(),
                        records: Vec::new(),
                    });
                    groups.len() - 1
                });
            groups[slot].records.push(record.clone());
        }

        Self { groups }
    }

    pub fn groups(&self) -> &[DateGroup] {
        &self.groups
    }

    pub fn iter(&self) -> impl Iterator<Item = &DateGroup> {
        self.groups.iter()
    }

    /// Number of distinct dates.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.date_string.as_str())
    }

    pub fn get(&self, date_string: &str) -> Option<&[SleepRecord]> {
        self.groups
            .iter()
            .find(|group| group.date_string == date_string)
            .map(|group| group.records.as_slice())
    }

    /// Total records across all groups.
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|group| group.records.len()).sum()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.groups
            .iter()
            .any(|group| group.records.iter().any(|record| &record.id == id))
    }
}

impl<'a> IntoIterator for &'a GroupedView {
    type Item = &'a DateGroup;
    type IntoIter = std::slice::Iter<'a, DateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(id: &str, timestamp: i64, date: &str) -> SleepRecord {
        SleepRecord {
            id: id.parse().unwrap(),
            timestamp,
            date_string: date.to_string(),
            time_string: "下午11:00".to_string(),
            user_id: "uid".to_string(),
            user_name: None,
        }
    }

    #[test]
    fn sort_orders_by_timestamp_then_id() {
        let mut records = vec![
            record("b", 10, "d1"),
            record("c", 30, "d1"),
            record("a", 10, "d1"),
        ];
        sort_newest_first(&mut records);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn groups_follow_first_appearance() {
        let records = vec![
            record("3", 300, "2024/1/6"),
            record("2", 200, "2024/1/5"),
            record("1", 100, "2024/1/5"),
        ];
        let view = GroupedView::from_sorted(&records);

        assert_eq!(view.dates().collect::<Vec<_>>(), vec!["2024/1/6", "2024/1/5"]);
        assert_eq!(view.get("2024/1/5").unwrap().len(), 2);
        assert_eq!(view.record_count(), 3);
    }

    #[test]
    fn interleaved_dates_still_form_one_group_each() {
        let records = vec![
            record("3", 300, "2024/1/6"),
            record("2", 200, "2024/1/5"),
            record("1", 100, "2024/1/6"),
        ];
        let view = GroupedView::from_sorted(&records);

        assert_eq!(view.len(), 2);
        let ids: Vec<&str> = view
            .get("2024/1/6")
            .unwrap()
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[test]
    fn empty_mirror_has_no_groups() {
        let view = GroupedView::from_sorted(&[]);
        assert!(view.is_empty());
        assert!(!view.contains(&"x".parse().unwrap()));
    }
}
