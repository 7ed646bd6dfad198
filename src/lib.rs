//! M-Pesa payment confirmation webhook that records payers and asks them for feedback.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod hashing;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod payments;
pub mod services;
