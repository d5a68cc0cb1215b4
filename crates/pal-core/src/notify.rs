//! Outbound notification seam and public link URLs.

use crate::reports::LinkNotice;

/// Path under which evaluation links are served.
pub const EVALUATION_PATH: &str = "/evaluation";

/// Delivery failure reported by a [`LinkNotifier`].
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Something able to deliver a [`LinkNotice`] (mail relay, outbox file, ...).
///
/// Delivery is fire-and-forget from the caller's point of view: an error is
/// logged and never undoes the state change that produced the notice.
pub trait LinkNotifier: Send + Sync {
    fn deliver(&self, notice: &LinkNotice) -> Result<(), NotifyError>;
}

/// Public URL of an evaluation link. Only the token appears in it.
///
/// An empty `base_url` yields a server-relative path.
#[must_use]
pub fn link_url(base_url: &str, token: &str) -> String {
    format!("{}{EVALUATION_PATH}/{token}/", base_url.trim_end_matches('/'))
}
