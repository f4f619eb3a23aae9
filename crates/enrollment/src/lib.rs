//! Course enrollment admission service.
//!
//! The [`admission`] module holds the schedule-conflict model and the decision engine;
//! [`remote`] carries the HTTP clients for the course registry and auth service.

pub mod admission;
pub mod config;
pub mod error;
pub mod remote;
pub mod telemetry;
