//! Calendar-day grouping of timestamp axes.

use chrono::{DateTime, NaiveDate, Utc};

/// Indices along a time axis that fall on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub indices: Vec<usize>,
}

impl DayGroup {
    /// `YYYY-MM-DD`, used as the output file prefix.
    pub fn label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Group time steps by UTC calendar day, ordered by date.
///
/// Indices within a group keep their axis order. Days with no samples do not
/// appear.
pub fn group_by_day(times: &[DateTime<Utc>]) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    for (idx, t) in times.iter().enumerate() {
        let date = t.date_naive();
        match groups.iter_mut().find(|g| g.date == date) {
            Some(group) => group.indices.push(idx),
            None => groups.push(DayGroup {
                date,
                indices: vec![idx],
            }),
        }
    }
    groups.sort_by_key(|g| g.date);
    groups
}
