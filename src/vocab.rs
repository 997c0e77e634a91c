use crate::error::{CinesyncError, Result};

use serde::{Deserialize, Serialize};

/// A word or phrase pinned to a moment in the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabEntry {
    pub time: f64,
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub def: String,
}

impl VocabEntry {
    pub fn new(time: f64, word: impl Into<String>, def: impl Into<String>) -> Self {
        Self {
            time,
            word: word.into(),
            def: def.into(),
        }
    }
}

/// Vocabulary entries kept in ascending time order.
///
/// Equal timestamps keep their insertion order. Every edit leaves the list sorted, so
/// lookups during playback can binary search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<VocabEntry>", into = "Vec<VocabEntry>")]
pub struct VocabList {
    entries: Vec<VocabEntry>,
}

impl From<Vec<VocabEntry>> for VocabList {
    fn from(entries: Vec<VocabEntry>) -> Self {
        Self::from_entries(entries)
    }
}

impl From<VocabList> for Vec<VocabEntry> {
    fn from(list: VocabList) -> Self {
        list.entries
    }
}

impl VocabList {
    pub fn from_entries(entries: Vec<VocabEntry>) -> Self {
        let mut list = Self { entries };
        for entry in &mut list.entries {
            entry.time = clamp_time(entry.time);
        }
        list.sort();
        list
    }

    pub fn entries(&self) -> &[VocabEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&VocabEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts after any entries sharing the same time and returns the new index.
    pub fn add(&mut self, mut entry: VocabEntry) -> usize {
        entry.time = clamp_time(entry.time);
        let at = self.entries.partition_point(|e| e.time <= entry.time);
        self.entries.insert(at, entry);
        at
    }

    pub fn remove(&mut self, index: usize) -> Result<VocabEntry> {
        self.check_index(index)?;
        Ok(self.entries.remove(index))
    }

    /// Moves an entry by `delta` seconds, clamped at zero. Returns its new index.
    pub fn shift(&mut self, index: usize, delta: f64) -> Result<usize> {
        self.check_index(index)?;
        let time = self.entries[index].time + delta;
        self.set_time(index, time)
    }

    /// Retimes an entry, clamped at zero. Returns its new index.
    pub fn set_time(&mut self, index: usize, time: f64) -> Result<usize> {
        if !time.is_finite() {
            return Err(CinesyncError::InvalidTime(time.to_string()));
        }
        let mut entry = self.remove(index)?;
        entry.time = time;
        Ok(self.add(entry))
    }

    /// Appends a batch of entries, then restores time order.
    pub fn import(&mut self, entries: Vec<VocabEntry>) {
        self.entries
            .extend(entries.into_iter().map(|mut e| {
                e.time = clamp_time(e.time);
                e
            }));
        self.sort();
    }

    /// Index of the latest entry whose time is at or before `t`.
    pub fn active_at(&self, t: f64) -> Option<usize> {
        self.entries.partition_point(|e| e.time <= t).checked_sub(1)
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(CinesyncError::VocabIndex {
                index,
                len: self.entries.len(),
            })
        }
    }
}

fn clamp_time(t: f64) -> f64 {
    if t.is_finite() && t > 0.0 {
        t
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words(list: &VocabList) -> Vec<&str> {
        list.entries().iter().map(|e| e.word.as_str()).collect()
    }

    fn sample() -> VocabList {
        VocabList::from_entries(vec![
            VocabEntry::new(30.0, "c", ""),
            VocabEntry::new(10.0, "a", ""),
            VocabEntry::new(20.0, "b", ""),
        ])
    }

    #[test]
    fn sorts_on_load() {
        assert_eq!(words(&sample()), vec!["a", "b", "c"]);
    }

    #[test]
    fn deserialises_and_sorts() {
        let list: VocabList =
            serde_json::from_str(r#"[{"time":5,"word":"late","def":"x"},{"time":1.5,"word":"early"}]"#)
                .unwrap();
        assert_eq!(words(&list), vec!["early", "late"]);
        assert_eq!(list.get(0).unwrap().def, "");
    }

    #[test]
    fn add_keeps_order_and_goes_after_equal_times() {
        let mut list = sample();
        assert_eq!(list.add(VocabEntry::new(20.0, "b2", "")), 2);
        assert_eq!(list.add(VocabEntry::new(-3.0, "zero", "")), 0);
        assert_eq!(words(&list), vec!["zero", "a", "b", "b2", "c"]);
        assert_eq!(list.get(0).unwrap().time, 0.0);
    }

    #[test]
    fn shift_moves_past_neighbours_and_clamps() {
        let mut list = sample();
        assert_eq!(list.shift(0, 15.0).unwrap(), 1);
        assert_eq!(words(&list), vec!["b", "a", "c"]);
        assert_eq!(list.shift(2, -100.0).unwrap(), 0);
        assert_eq!(list.get(0).unwrap().time, 0.0);
    }

    #[test]
    fn out_of_range_edits_fail() {
        let mut list = sample();
        assert!(matches!(
            list.remove(3),
            Err(CinesyncError::VocabIndex { index: 3, len: 3 })
        ));
        assert!(list.shift(9, 1.0).is_err());
        assert!(list.set_time(0, f64::NAN).is_err());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn import_merges_and_resorts() {
        let mut list = sample();
        list.import(vec![VocabEntry::new(15.0, "ab", ""), VocabEntry::new(1.0, "first", "")]);
        assert_eq!(words(&list), vec!["first", "a", "ab", "b", "c"]);
    }

    #[test]
    fn active_at_picks_latest_started() {
        let list = sample();
        assert_eq!(list.active_at(5.0), None);
        assert_eq!(list.active_at(10.0), Some(0));
        assert_eq!(list.active_at(25.0), Some(1));
        assert_eq!(list.active_at(1e9), Some(2));
    }

    #[test]
    fn shared_timestamps_resolve_to_last() {
        let list = VocabList::from_entries(vec![
            VocabEntry::new(4.0, "x", ""),
            VocabEntry::new(4.0, "y", ""),
        ]);
        assert_eq!(list.active_at(4.0), Some(1));
    }

    proptest! {
        #[test]
        fn active_at_is_max_time_not_after_t(
            times in proptest::collection::vec(0.0f64..500.0, 0..40),
            t in 0.0f64..600.0,
        ) {
            let list = VocabList::from_entries(
                times.iter().map(|&time| VocabEntry::new(time, "", "")).collect(),
            );
            let best = times.iter().cloned().filter(|&time| time <= t).fold(None, |acc: Option<f64>, x| {
                Some(acc.map_or(x, |a| a.max(x)))
            });
            match list.active_at(t) {
                Some(i) => {
                    let e = list.get(i).unwrap();
                    prop_assert!(e.time <= t);
                    prop_assert_eq!(Some(e.time), best);
                }
                None => prop_assert!(best.is_none()),
            }
        }
    }
}
