//! bankgen-core: synthetic bank customer and transaction generator.
//!
//! Each customer walks a small workflow (onboarding, risk assignment,
//! alternating transaction batches and periodic screenings) until it is
//! flagged or its history is long enough. Everything is written to SQLite.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod flow;
pub mod identity;
pub mod lifecycle;
pub mod rng;
pub mod sampler;
pub mod sampling;
pub mod sink;
pub mod stages;
pub mod store;
pub mod transition;
pub mod types;
