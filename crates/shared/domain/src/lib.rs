//! # Domain Models
//!
//! Pure domain types with minimal dependencies (`serde`, optionally `utoipa` schemas).
//! Keep it lean: no I/O, networking, or heavy logic, just data and simple helpers.

pub mod auth;
pub mod availability;
pub mod config;
pub mod constants;
pub mod events;
pub mod records;
