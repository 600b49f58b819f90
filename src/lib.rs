//! NeighborFit client library
//!
//! Search for a place and list its societies, open one society's details, or
//! submit a new place (or new societies for a known place) to the remote
//! places API.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `detail`: Society detail view built from an in-memory hand-off.
//! - `errors`: Error handling types.
//! - `format`: Rupee and rating formatting.
//! - `handlers`: HTTP handlers for the view service.
//! - `models`: Places, societies and the draft form.
//! - `places_client`: Places API client.
//! - `search`: Place lookup flow.
//! - `submission`: Place submission flow.
//! - `validation`: Draft validation and numeric coercion.

pub mod config;
pub mod detail;
pub mod errors;
pub mod format;
pub mod handlers;
pub mod models;
pub mod places_client;
pub mod search;
pub mod submission;
pub mod validation;
