//! Editing session state machine.
//!
//! One [`Session`] covers the life of a single upload-edit-result cycle:
//! Idle until an image arrives, ReadyToEdit while the user types, Processing
//! while a request is in flight, then Completed or Failed. A reset returns
//! to Idle from anywhere.
//!
//! The session itself is synchronous; the async suspension happens in the
//! caller, between [`Session::begin_edit`] and [`Session::apply`]. Each
//! in-flight request carries a monotonically increasing token, and `apply`
//! drops any resolution whose token is no longer current, so a reset or
//! resubmission can never be overwritten by a stale response.

use crate::error::Result;
use crate::types::{EditOutcome, SourceImage};

/// Quick prompts offered to the user.
pub const SUGGESTED_PROMPTS: [&str; 5] = [
    "Remove the background",
    "Place the product on a white marble table",
    "Add a soft studio lighting effect",
    "Make it look like a vintage photo",
    "Add a reflection shadow at the bottom",
];

/// Fallback message when a failure carries no usable text.
const GENERIC_FAILURE: &str = "Failed to generate image. Please try again.";

/// Message for a response that produced no image.
const NO_IMAGE: &str = "No image was returned from the model. Try a different prompt.";

/// Where the session currently is in the editing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No image uploaded yet.
    Idle,
    /// Image present, waiting for a prompt.
    ReadyToEdit,
    /// An edit request is in flight.
    Processing,
    /// The last request produced an image.
    Completed,
    /// The last request failed or produced nothing.
    Failed,
}

/// A claimed edit request: everything the caller needs to drive the client,
/// plus the token that ties the eventual resolution back to this request.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// Token to hand back to [`Session::apply`].
    pub token: u64,
    /// The image to edit.
    pub image: SourceImage,
    /// The trimmed prompt text.
    pub prompt: String,
}

/// State of one editing session.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    image: Option<SourceImage>,
    prompt: String,
    outcome: Option<EditOutcome>,
    error: Option<String>,
    request_seq: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a session in the Idle state.
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            image: None,
            prompt: String::new(),
            outcome: None,
            error: None,
            request_seq: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The uploaded image, absent in Idle.
    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    /// Current prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The live outcome, present only after a completed request.
    pub fn outcome(&self) -> Option<&EditOutcome> {
        self.outcome.as_ref()
    }

    /// The current error message, present only in Failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// An image was selected and encoded: move to ReadyToEdit.
    ///
    /// Any prior outcome or error is cleared; the prompt is kept so the user
    /// can apply the same instruction to a new upload. Ignored while a
    /// request is in flight.
    pub fn select_image(&mut self, image: SourceImage) {
        if self.state == SessionState::Processing {
            return;
        }
        self.image = Some(image);
        self.outcome = None;
        self.error = None;
        self.state = SessionState::ReadyToEdit;
    }

    /// The user edited the prompt text. Ignored while a request is in flight
    /// or before any image exists.
    pub fn set_prompt(&mut self, text: impl Into<String>) {
        match self.state {
            SessionState::ReadyToEdit | SessionState::Completed | SessionState::Failed => {
                self.prompt = text.into();
            }
            SessionState::Idle | SessionState::Processing => {}
        }
    }

    /// The user submitted. Returns the claimed request if the submission is
    /// valid, or `None` as a silent no-op when the prompt is blank, no image
    /// is present, or a request is already in flight.
    #[must_use]
    pub fn begin_edit(&mut self) -> Option<EditRequest> {
        match self.state {
            SessionState::ReadyToEdit | SessionState::Completed | SessionState::Failed => {}
            SessionState::Idle | SessionState::Processing => return None,
        }

        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return None;
        }
        let image = self.image.clone()?;

        self.request_seq += 1;
        self.error = None;
        self.state = SessionState::Processing;
        tracing::debug!(token = self.request_seq, "edit request claimed");

        Some(EditRequest {
            token: self.request_seq,
            image,
            prompt: prompt.to_string(),
        })
    }

    /// Applies the resolution of a claimed request.
    ///
    /// Only honored while the session is still Processing the request with
    /// this token; anything else is a stale resolution (the user reset or
    /// resubmitted in the meantime) and is dropped. Returns whether the
    /// resolution was applied.
    pub fn apply(&mut self, token: u64, result: Result<EditOutcome>) -> bool {
        if self.state != SessionState::Processing || token != self.request_seq {
            tracing::warn!(
                token,
                current = self.request_seq,
                "dropping stale edit resolution"
            );
            return false;
        }

        match result {
            Ok(outcome) if outcome.has_image() => {
                self.outcome = Some(outcome);
                self.state = SessionState::Completed;
            }
            Ok(_) => {
                // A note without an image is not a success
                self.error = Some(NO_IMAGE.to_string());
                self.state = SessionState::Failed;
            }
            Err(err) => {
                let msg = err.to_string();
                self.error = Some(if msg.trim().is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    msg
                });
                self.state = SessionState::Failed;
            }
        }
        true
    }

    /// Discards everything and returns to Idle.
    ///
    /// The request sequence stays monotonic across resets so a pre-reset
    /// request can never collide with a post-reset one.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.image = None;
        self.prompt.clear();
        self.outcome = None;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::EditClient;
    use crate::error::RetouchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn jpeg_image() -> SourceImage {
        // 10KB of JPEG-shaped bytes
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.resize(10 * 1024, 0xAB);
        SourceImage::from_bytes(&bytes, "image/jpeg").unwrap()
    }

    fn png_outcome() -> EditOutcome {
        EditOutcome {
            image_data_url: Some("data:image/png;base64,aVZCT1J3".into()),
            note: None,
        }
    }

    /// Scripted client that counts invocations and returns a canned result.
    struct MockClient {
        calls: AtomicUsize,
        result: fn() -> Result<EditOutcome>,
    }

    impl MockClient {
        fn new(result: fn() -> Result<EditOutcome>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result,
            }
        }
    }

    #[async_trait]
    impl EditClient for MockClient {
        async fn edit(&self, _image: &SourceImage, _prompt: &str) -> Result<EditOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    #[test]
    fn test_starts_idle() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.image().is_none());
        assert!(session.outcome().is_none());
        assert!(session.error().is_none());
        assert_eq!(session.prompt(), "");
    }

    #[test]
    fn test_select_image_moves_to_ready() {
        let mut session = Session::new();
        session.select_image(jpeg_image());

        assert_eq!(session.state(), SessionState::ReadyToEdit);
        let image = session.image().unwrap();
        assert!(image.data_url().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_select_image_clears_prior_result() {
        let mut session = Session::new();
        session.select_image(jpeg_image());
        session.set_prompt("Remove the background");
        let req = session.begin_edit().unwrap();
        session.apply(req.token, Ok(png_outcome()));
        assert_eq!(session.state(), SessionState::Completed);

        session.select_image(jpeg_image());
        assert_eq!(session.state(), SessionState::ReadyToEdit);
        assert!(session.outcome().is_none());
        assert!(session.error().is_none());
        // Prompt is retained across uploads
        assert_eq!(session.prompt(), "Remove the background");
    }

    #[test]
    fn test_select_image_ignored_while_processing() {
        let mut session = Session::new();
        session.select_image(jpeg_image());
        session.set_prompt("Remove the background");
        let req = session.begin_edit().unwrap();

        session.select_image(jpeg_image());
        assert_eq!(session.state(), SessionState::Processing);

        assert!(session.apply(req.token, Ok(png_outcome())));
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn test_prompt_ignored_while_processing() {
        let mut session = Session::new();
        session.select_image(jpeg_image());
        session.set_prompt("first");
        let _req = session.begin_edit().unwrap();

        session.set_prompt("second");
        assert_eq!(session.prompt(), "first");
    }

    #[test]
    fn test_blank_prompt_is_a_noop() {
        let mut session = Session::new();
        session.select_image(jpeg_image());

        session.set_prompt("");
        assert!(session.begin_edit().is_none());
        session.set_prompt("   \n\t ");
        assert!(session.begin_edit().is_none());
        assert_eq!(session.state(), SessionState::ReadyToEdit);
    }

    #[test]
    fn test_submit_without_image_is_a_noop() {
        let mut session = Session::new();
        session.set_prompt("Remove the background");
        assert!(session.begin_edit().is_none());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_submit_while_processing_is_a_noop() {
        let mut session = Session::new();
        session.select_image(jpeg_image());
        session.set_prompt("Remove the background");

        let first = session.begin_edit().unwrap();
        assert_eq!(session.state(), SessionState::Processing);
        assert!(session.begin_edit().is_none());

        session.apply(first.token, Ok(png_outcome()));
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn test_prompt_is_trimmed_in_request() {
        let mut session = Session::new();
        session.select_image(jpeg_image());
        session.set_prompt("  Remove the background  ");

        let req = session.begin_edit().unwrap();
        assert_eq!(req.prompt, "Remove the background");
    }

    #[tokio::test]
    async fn test_full_cycle_jpeg_to_png() {
        let client = MockClient::new(|| Ok(png_outcome()));
        let mut session = Session::new();

        session.select_image(jpeg_image());
        assert_eq!(session.state(), SessionState::ReadyToEdit);
        assert!(session
            .image()
            .unwrap()
            .data_url()
            .starts_with("data:image/jpeg;base64,"));

        session.set_prompt("Remove the background");
        let req = session.begin_edit().unwrap();
        assert_eq!(session.state(), SessionState::Processing);

        let result = client.edit(&req.image, &req.prompt).await;
        assert!(session.apply(req.token, result));

        assert_eq!(session.state(), SessionState::Completed);
        let outcome = session.outcome().unwrap();
        assert!(outcome
            .image_data_url
            .as_deref()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejection_surfaces_client_message() {
        let client = MockClient::new(|| {
            Err(RetouchError::Api {
                status: 429,
                message: "quota exceeded".into(),
            })
        });
        let mut session = Session::new();

        session.select_image(jpeg_image());
        session.set_prompt("xyz");
        let req = session.begin_edit().unwrap();
        let result = client.edit(&req.image, &req.prompt).await;
        session.apply(req.token, result);

        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.error(), Some("API error: 429 - quota exceeded"));
        assert!(session.outcome().is_none());
    }

    #[test]
    fn test_outcome_without_image_fails() {
        let mut session = Session::new();
        session.select_image(jpeg_image());
        session.set_prompt("Remove the background");
        let req = session.begin_edit().unwrap();

        let text_only = EditOutcome {
            image_data_url: None,
            note: Some("Sorry, I can only describe this image".into()),
        };
        session.apply(req.token, Ok(text_only));

        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(
            session.error(),
            Some("No image was returned from the model. Try a different prompt.")
        );
    }

    #[test]
    fn test_resubmission_after_failure() {
        let mut session = Session::new();
        session.select_image(jpeg_image());
        session.set_prompt("Remove the background");

        let req = session.begin_edit().unwrap();
        session.apply(req.token, Err(RetouchError::Auth("bad key".into())));
        assert_eq!(session.state(), SessionState::Failed);

        // Retry from Failed supersedes the error
        let retry = session.begin_edit().unwrap();
        assert_eq!(session.state(), SessionState::Processing);
        assert!(session.error().is_none());
        session.apply(retry.token, Ok(png_outcome()));
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn test_reset_returns_to_idle_from_any_state() {
        let mut session = Session::new();
        session.select_image(jpeg_image());
        session.set_prompt("Remove the background");
        let req = session.begin_edit().unwrap();
        session.apply(req.token, Ok(png_outcome()));

        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.image().is_none());
        assert_eq!(session.prompt(), "");
        assert!(session.outcome().is_none());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_stale_resolution_after_reset_is_dropped() {
        let mut session = Session::new();
        session.select_image(jpeg_image());
        session.set_prompt("Remove the background");
        let req = session.begin_edit().unwrap();

        // User resets before the in-flight call resolves
        session.reset();
        assert_eq!(session.state(), SessionState::Idle);

        let applied = session.apply(req.token, Ok(png_outcome()));
        assert!(!applied);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.outcome().is_none());
    }

    #[test]
    fn test_stale_resolution_after_resubmit_is_dropped() {
        let mut session = Session::new();
        session.select_image(jpeg_image());
        session.set_prompt("Remove the background");

        let first = session.begin_edit().unwrap();

        // Simulate failure + resubmission while the first call is in flight
        session.apply(first.token, Err(RetouchError::Auth("expired".into())));
        let second = session.begin_edit().unwrap();
        assert_ne!(first.token, second.token);

        // The first call's late resolution must not win
        assert!(!session.apply(first.token, Ok(png_outcome())));
        assert_eq!(session.state(), SessionState::Processing);

        assert!(session.apply(second.token, Ok(png_outcome())));
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn test_tokens_stay_monotonic_across_reset() {
        let mut session = Session::new();
        session.select_image(jpeg_image());
        session.set_prompt("Remove the background");
        let first = session.begin_edit().unwrap();

        session.reset();
        session.select_image(jpeg_image());
        session.set_prompt("Remove the background");
        let second = session.begin_edit().unwrap();

        assert!(second.token > first.token);
    }

    #[test]
    fn test_suggested_prompts() {
        assert_eq!(SUGGESTED_PROMPTS.len(), 5);
        assert_eq!(SUGGESTED_PROMPTS[0], "Remove the background");
    }
}
