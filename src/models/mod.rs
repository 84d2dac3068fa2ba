//! Data models for the escapadas application
//!
//! This module contains the core domain models organized by concern:
//! - Trip: validated trip parameters and the menu enums behind them
//! - Audit: quality-audit warnings grouped by day
//! - Contact: simulated contact data for detected places

pub mod audit;
pub mod contact;
pub mod trip;

// Re-export all public types for convenient access
pub use audit::{AuditReport, DayAlerts};
pub use contact::{Contact, ContactList};
pub use trip::{
    BudgetTier, Choice, IntakeParams, Season, TransportMode, TravelMode, TripDraft, TripRequest,
};
