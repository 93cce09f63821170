//! Edit client trait.

use crate::error::Result;
use crate::types::{EditOutcome, SourceImage};
use async_trait::async_trait;

/// Trait for remote image editing backends.
///
/// The session owns a client as an injected dependency, so tests can swap in
/// a mock without touching the network.
#[async_trait]
pub trait EditClient: Send + Sync {
    /// Sends the image and prompt to the model and parses the response.
    ///
    /// An `Ok` outcome may still carry no image; deciding what that means is
    /// the caller's job. Transport, auth, and malformed-response problems
    /// surface as errors. No retries are attempted.
    async fn edit(&self, image: &SourceImage, prompt: &str) -> Result<EditOutcome>;
}
