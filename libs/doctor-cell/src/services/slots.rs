use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use shared_models::doctor::DoctorProfile;
use shared_models::slot::{SlotDate, SlotTime, WorkingWindow, SLOT_MINUTES};

use crate::models::{AvailableSlot, DaySlots};

/// Number of days, starting today, that slots are offered for.
pub const BOOKING_HORIZON_DAYS: u64 = 7;

/// First slot that can still be offered today.
///
/// The candidate is the next hour, with minutes set to 30 when the current
/// minute is past 30 and to 0 otherwise; the result is the later of that
/// candidate and the window start. Returns `None` when it is not before the
/// window end.
pub fn first_slot_start(now: NaiveTime, window: &WorkingWindow) -> Option<SlotTime> {
    let minute = if now.minute() > 30 { 30 } else { 0 };
    let candidate = (now.hour() + 1) * 60 + minute;

    let start = candidate.max(window.start().minutes_since_midnight());
    if start >= window.end().minutes_since_midnight() {
        return None;
    }
    SlotTime::from_minutes(start)
}

/// Bookable slots for the next [`BOOKING_HORIZON_DAYS`] days, one entry per
/// day starting on `reference`'s date. Read-only over `profile`.
pub fn generate_slots(profile: &DoctorProfile, reference: NaiveDateTime) -> Vec<DaySlots> {
    let window = profile.working_window;
    let today = reference.date();

    let mut days = Vec::with_capacity(BOOKING_HORIZON_DAYS as usize);
    for offset in 0..BOOKING_HORIZON_DAYS {
        let Some(date) = today.checked_add_days(Days::new(offset)) else {
            break;
        };

        let start = if offset == 0 {
            first_slot_start(reference.time(), &window)
        } else {
            Some(window.start())
        };

        let slots = match start {
            Some(start) => open_slots(profile, date, start, window.end()),
            None => Vec::new(),
        };

        days.push(DaySlots {
            date: SlotDate::new(date),
            weekday: date.format("%a").to_string().to_uppercase(),
            slots,
        });
    }
    days
}

fn open_slots(profile: &DoctorProfile, date: NaiveDate, start: SlotTime, end: SlotTime) -> Vec<AvailableSlot> {
    let slot_date = SlotDate::new(date);

    (start.minutes_since_midnight()..end.minutes_since_midnight())
        .step_by(SLOT_MINUTES as usize)
        .filter_map(SlotTime::from_minutes)
        .filter(|time| !profile.slots_booked.is_booked(slot_date, *time))
        .map(|time| AvailableSlot {
            date: slot_date,
            time,
            datetime: date.and_time(time.time()),
        })
        .collect()
}
