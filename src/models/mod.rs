//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod registration;

// Re-export commonly used models
pub use event::{
    Address, CreateEventRequest, Event, EventChanges, EventDetails, EventStatus, NewAddress,
    NewEvent, Tag, UpdateEventRequest,
};
pub use registration::{
    CapacityInfo, NewRegistration, Registration, RegistrationFailure, RegistrationResult,
};
