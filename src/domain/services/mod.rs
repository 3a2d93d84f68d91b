pub mod auth_service;
pub mod availability;
pub mod intervals;
pub mod membership;
pub mod notifier;
