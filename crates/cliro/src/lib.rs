//! Waitlist signups and a text assistant backed by a hosted generator.

pub mod assistant;
pub mod catalog;
pub mod config;
pub mod error;
pub mod persistence;
pub mod telemetry;
pub mod validation;
pub mod waitlist;
