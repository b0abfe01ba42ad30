use copypasta::{ClipboardContext, ClipboardProvider};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(String);

pub trait ClipboardWriter {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Operating-system clipboard
pub struct SystemClipboard {
    context: ClipboardContext,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        ClipboardContext::new()
            .map(|context| Self { context })
            .map_err(|e| ClipboardError(e.to_string()))
    }
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.context
            .set_contents(text.to_owned())
            .map_err(|e| ClipboardError(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    /// The writer could not be used; the text must go through the window clipboard.
    Fallback(String),
}

pub fn copy_or_fallback<W: ClipboardWriter>(
    writer: Result<W, ClipboardError>,
    text: &str,
) -> CopyOutcome {
    match writer.and_then(|mut writer| writer.write_text(text)) {
        Ok(()) => CopyOutcome::Copied,
        Err(e) => {
            tracing::warn!(error = %e, "using window clipboard fallback");
            CopyOutcome::Fallback(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recording(Arc<Mutex<Vec<String>>>);

    impl ClipboardWriter for Recording {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct Broken;

    impl ClipboardWriter for Broken {
        fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
            Err(ClipboardError("no display".into()))
        }
    }

    const HREF: &str = "https://cdn.example/video.mp4?sig=a%2Bb";

    #[test]
    fn test_writes_exact_text() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let outcome = copy_or_fallback(Ok(Recording(log.clone())), HREF);

        assert_eq!(outcome, CopyOutcome::Copied);
        assert_eq!(*log.lock().unwrap(), vec![HREF.to_string()]);
    }

    #[test]
    fn test_failing_writer_falls_back_with_same_text() {
        assert_eq!(
            copy_or_fallback(Ok(Broken), HREF),
            CopyOutcome::Fallback(HREF.to_string())
        );
        assert_eq!(
            copy_or_fallback::<Broken>(Err(ClipboardError("missing".into())), HREF),
            CopyOutcome::Fallback(HREF.to_string())
        );
    }
}
