pub mod collaborators;
pub mod errors;
pub mod models;
pub mod payments;
pub mod scheduling;
