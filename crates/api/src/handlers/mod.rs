pub mod appointments;
pub mod availability;
pub mod reviews;
pub mod slots;
