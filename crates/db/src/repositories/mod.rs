pub mod appointment;
pub mod availability;
pub mod blocked_slot;
pub mod expert;
pub mod review;
