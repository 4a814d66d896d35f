pub mod auth;
pub mod doctor;
pub mod error;
pub mod reservation;
pub mod slot;
