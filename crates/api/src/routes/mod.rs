pub mod appointments;
pub mod experts;
pub mod health;
pub mod webhooks;
