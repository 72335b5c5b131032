//! Clipboard capture trigger.
//!
//! # Responsibility
//! - Turn clipboard text into a candidate todo string.
//! - Hand the candidate to the presentation surface as a `prefill-todo` push.
//!
//! # Invariants
//! - Capture never creates a todo by itself; the user confirms through the
//!   normal `add-todo` path.
//! - Candidates are trimmed and at most `MAX_CAPTURE_CHARS` characters plus
//!   the truncation marker.

use crate::notify::{NotificationTarget, TodoEvent};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MAX_CAPTURE_CHARS: usize = 1000;
pub const TRUNCATION_MARKER: &str = "...";

/// Source of clipboard text.
pub trait ClipboardSource {
    /// Returns current clipboard text; an empty clipboard is `Ok("")`.
    fn read_text(&self) -> Result<String, CaptureError>;
}

/// Capture failures. All of them degrade to a notice for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Clipboard was empty or whitespace only.
    EmptyInput,
    /// Clipboard could not be read.
    Clipboard(String),
}

/// Short user-facing notice describing a capture outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureNotice {
    pub title: &'static str,
    pub body: String,
}

impl CaptureError {
    pub fn notice(&self) -> CaptureNotice {
        match self {
            Self::EmptyInput => CaptureNotice {
                title: "Empty Clipboard",
                body: "Copy some text first, then press the hotkey".to_string(),
            },
            Self::Clipboard(message) => CaptureNotice {
                title: "Capture Failed",
                body: message.clone(),
            },
        }
    }
}

impl Display for CaptureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "clipboard has no usable text"),
            Self::Clipboard(message) => write!(f, "clipboard read failed: {message}"),
        }
    }
}

impl Error for CaptureError {}

/// Result of a successful capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedText {
    pub text: String,
    pub truncated: bool,
    /// Whether a presentation surface received the prefill push.
    pub delivered: bool,
}

/// Trims and truncates raw clipboard text.
///
/// # Errors
/// - `EmptyInput` when nothing but whitespace remains.
pub fn prepare_capture_text(raw: &str) -> Result<(String, bool), CaptureError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CaptureError::EmptyInput);
    }

    match trimmed.char_indices().nth(MAX_CAPTURE_CHARS) {
        Some((cut, _)) => {
            let mut text = trimmed[..cut].to_string();
            text.push_str(TRUNCATION_MARKER);
            Ok((text, true))
        }
        None => Ok((trimmed.to_string(), false)),
    }
}

/// Reads the clipboard and pushes the candidate text as a prefill.
///
/// Without a registered target the candidate is still returned, with
/// `delivered == false`, so the caller can present it another way.
pub fn capture_clipboard(
    clipboard: &dyn ClipboardSource,
    target: Option<&dyn NotificationTarget>,
) -> Result<CapturedText, CaptureError> {
    let raw = clipboard.read_text().map_err(|err| {
        warn!("event=capture module=capture status=error error={}", err);
        err
    })?;

    let (text, truncated) = prepare_capture_text(&raw).map_err(|err| {
        info!("event=capture module=capture status=skipped reason=empty_clipboard");
        err
    })?;

    let delivered = match target {
        Some(target) => {
            target.deliver(&TodoEvent::PrefillTodo(text.clone()));
            true
        }
        None => false,
    };

    info!(
        "event=capture module=capture status=ok chars={} truncated={} delivered={}",
        text.chars().count(),
        truncated,
        delivered
    );
    Ok(CapturedText {
        text,
        truncated,
        delivered,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        capture_clipboard, prepare_capture_text, CaptureError, ClipboardSource, MAX_CAPTURE_CHARS,
    };
    use crate::notify::{ChannelTarget, NotificationTarget, TodoEvent};

    struct FixedClipboard(Result<String, CaptureError>);

    impl ClipboardSource for FixedClipboard {
        fn read_text(&self) -> Result<String, CaptureError> {
            self.0.clone()
        }
    }

    #[test]
    fn prepare_trims_and_rejects_blank() {
        assert_eq!(
            prepare_capture_text("  hello \n").unwrap(),
            ("hello".to_string(), false)
        );
        assert_eq!(
            prepare_capture_text(" \t\n").unwrap_err(),
            CaptureError::EmptyInput
        );
    }

    #[test]
    fn prepare_truncates_on_char_boundaries() {
        let raw = "é".repeat(MAX_CAPTURE_CHARS + 5);
        let (text, truncated) = prepare_capture_text(&raw).unwrap();
        assert!(truncated);
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), MAX_CAPTURE_CHARS + 3);

        let exact = "a".repeat(MAX_CAPTURE_CHARS);
        let (text, truncated) = prepare_capture_text(&exact).unwrap();
        assert!(!truncated);
        assert_eq!(text, exact);
    }

    #[test]
    fn capture_pushes_prefill_to_target() {
        let (target, receiver) = ChannelTarget::new();
        let clipboard = FixedClipboard(Ok("  reply to Anna  ".to_string()));

        let captured =
            capture_clipboard(&clipboard, Some(&target as &dyn NotificationTarget)).unwrap();

        assert!(captured.delivered);
        assert_eq!(
            receiver.try_recv().unwrap(),
            TodoEvent::PrefillTodo("reply to Anna".to_string())
        );
    }

    #[test]
    fn capture_errors_map_to_notices() {
        let clipboard = FixedClipboard(Ok(String::new()));
        let err = capture_clipboard(&clipboard, None).unwrap_err();
        assert_eq!(err, CaptureError::EmptyInput);
        assert_eq!(err.notice().title, "Empty Clipboard");

        let clipboard = FixedClipboard(Err(CaptureError::Clipboard("locked".to_string())));
        let err = capture_clipboard(&clipboard, None).unwrap_err();
        assert_eq!(err.notice().body, "locked");
    }
}
