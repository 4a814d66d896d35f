pub mod doctor;
pub mod slots;

pub use doctor::DoctorService;
pub use slots::{first_slot_start, generate_slots, BOOKING_HORIZON_DAYS};
