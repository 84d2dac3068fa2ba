//! `escapadas` - AI getaway organiser
//!
//! Validates trip parameters, asks a text model for an itinerary, audit and
//! simulated contacts, scrapes the itinerary for places and key beats, and
//! asks an image model for an illustrated map and a flyer.

pub mod accounting;
pub mod api;
pub mod config;
pub mod error;
pub mod extraction;
pub mod intake;
pub mod llm;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod validation;
pub mod web;

// Re-export core types for public API
pub use accounting::{UsageLedger, UsageTotals};
pub use config::EscapadasConfig;
pub use error::{EscapadasError, ValidationError};
pub use extraction::{
    IconCategory, KeywordSet, UniqueLines, extract_alert_icon, extract_key_points, extract_places,
};
pub use models::{AuditReport, ContactList, TripDraft, TripRequest};
pub use pipeline::{PlanOutcome, StageWarning, TripPlanner};
pub use validation::{FieldError, TripForm, build_trip_request};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, EscapadasError>;
