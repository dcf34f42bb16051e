//! Client for the conversion service endpoints.
//!
//! [`ConversionService`] is the seam the batch orchestrator drives;
//! [`ConvertClient`] implements it on top of any [`crate::transport::Transport`]
//! and also exposes the catalog and health endpoints.

mod client;
mod traits;

pub use client::ConvertClient;
pub use traits::ConversionService;
