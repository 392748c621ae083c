//! Integration tests module
//!
//! Multi-step scenarios that drive the event and registration services
//! together over the in-memory store.

pub mod scenarios;
