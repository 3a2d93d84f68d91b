pub mod auth;
pub mod band;
