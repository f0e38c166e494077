//! Client for the external emotion inference service.
//!
//! The service hosts the facial-emotion model, the speech transcriber and the
//! text-emotion classifier. This crate wraps its HTTP API and exposes it
//! through the `emosync-vision` provider traits, so the worker can inject it
//! wherever a facial or speech collaborator is expected.

pub mod client;
pub mod error;
pub mod provider;
pub mod types;

pub use client::{MlClient, MlClientConfig};
pub use error::{MlError, MlResult};
pub use types::{FacialEmotionResponse, HealthResponse, SpeechRequest, SpeechResponse, SpeechSegment};
