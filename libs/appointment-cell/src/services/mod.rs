pub mod booking;
pub mod lifecycle;
pub mod receipt;

pub use booking::BookingGuard;
pub use lifecycle::{sources_of, valid_transitions, validate_transition};
pub use receipt::{issue_receipt, PlainTextReceiptFormatter, Receipt, ReceiptData, ReceiptFormatter};
