use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slot::{SlotDate, SlotTime, WorkingWindow};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub fees: f64,
    pub image: Option<String>,
    pub address: Option<Address>,
    pub available: bool,
    #[serde(default)]
    pub working_window: WorkingWindow,
    #[serde(default)]
    pub slots_booked: BookedSlots,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
}

impl DoctorProfile {
    /// Mean review rating rounded to one decimal; 0.0 without reviews.
    pub fn average_rating(&self) -> f64 {
        if self.reviews.is_empty() {
            return 0.0;
        }
        let total: u32 = self.reviews.iter().map(|review| u32::from(review.rating)).sum();
        let mean = f64::from(total) / self.reviews.len() as f64;
        (mean * 10.0).round() / 10.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub user_id: String,
    pub user_name: String,
    pub user_image: Option<String>,
    pub rating: u8,
    pub comment: String,
    pub date: DateTime<Utc>,
}

/// Reserved time labels per date. A date never holds the same label twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookedSlots(BTreeMap<SlotDate, BTreeSet<SlotTime>>);

impl BookedSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_booked(&self, date: SlotDate, time: SlotTime) -> bool {
        self.0.get(&date).is_some_and(|times| times.contains(&time))
    }

    /// Adds the label; returns `false` if it was already taken.
    pub fn insert(&mut self, date: SlotDate, time: SlotTime) -> bool {
        self.0.entry(date).or_default().insert(time)
    }

    /// Removes the label; returns `false` if it was not booked.
    pub fn remove(&mut self, date: SlotDate, time: SlotTime) -> bool {
        let Some(times) = self.0.get_mut(&date) else {
            return false;
        };
        let removed = times.remove(&time);
        if times.is_empty() {
            self.0.remove(&date);
        }
        removed
    }

    pub fn times_on(&self, date: SlotDate) -> impl Iterator<Item = SlotTime> + '_ {
        self.0.get(&date).into_iter().flat_map(|times| times.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
