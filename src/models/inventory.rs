use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{Day, Schedule, TimeSlot};

/// Open slots per day. Rows are `BTreeSet`s so every row stays chronologically
/// sorted no matter the order slots are taken and returned in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotInventory(BTreeMap<Day, BTreeSet<TimeSlot>>);

impl SlotInventory {
    /// A full week: every schedule time open on every office day.
    pub fn seeded(schedule: &Schedule) -> Self {
        Self(
            schedule
                .days()
                .iter()
                .map(|day| (*day, schedule.times().collect()))
                .collect(),
        )
    }

    pub fn contains(&self, day: Day, time: TimeSlot) -> bool {
        self.0.get(&day).is_some_and(|row| row.contains(&time))
    }

    /// Removes the slot, returning whether it was open.
    pub fn take(&mut self, day: Day, time: TimeSlot) -> bool {
        self.0.get_mut(&day).is_some_and(|row| row.remove(&time))
    }

    /// Reopens a slot. Returns false if it was already open.
    pub fn restore(&mut self, day: Day, time: TimeSlot) -> bool {
        self.0.entry(day).or_default().insert(time)
    }

    pub fn day(&self, day: Day) -> Vec<TimeSlot> {
        self.0
            .get(&day)
            .map(|row| row.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Day, TimeSlot)> + '_ {
        self.0
            .iter()
            .flat_map(|(day, row)| row.iter().map(move |time| (*day, *time)))
    }
}
