pub mod appointment;
pub mod availability;
pub mod expert;
pub mod review;
pub mod slot;
