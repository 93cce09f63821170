#![warn(missing_docs)]
//! Retouch - AI photo retouching via the Gemini image model.
//!
//! Upload an image, describe the change in plain language, get the edited
//! image back. The crate models one editing session as a small state
//! machine ([`Session`]) driven by an injected [`EditClient`], so the whole
//! flow is testable without a live network.
//!
//! # Quick Start
//!
//! ```no_run
//! use retouch::{GeminiClient, EditClient, Session, SourceImage};
//!
//! #[tokio::main]
//! async fn main() -> retouch::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let mut session = Session::new();
//!
//!     session.select_image(SourceImage::load("product.jpg").await?);
//!     session.set_prompt("Remove the background");
//!
//!     if let Some(req) = session.begin_edit() {
//!         let result = client.edit(&req.image, &req.prompt).await;
//!         session.apply(req.token, result);
//!     }
//!
//!     if let Some(outcome) = session.outcome() {
//!         std::fs::write("edited.png", outcome.image_bytes()?)?;
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod gemini;
mod session;
mod types;

pub use client::EditClient;
pub use error::{Result, RetouchError};
pub use gemini::{GeminiClient, GeminiClientBuilder};
pub use session::{EditRequest, Session, SessionState, SUGGESTED_PROMPTS};
pub use types::{EditOutcome, ImageFormat, SourceImage};
