pub mod auth;
pub mod availability;
pub mod band;
pub mod equipment;
pub mod health;
pub mod notification;
pub mod realtime;
pub mod rehearsal;
pub mod setlist;
pub mod song;
pub mod venue;
