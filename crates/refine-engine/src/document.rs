//! Host document seam
//!
//! The editor owning the live document is an external collaborator. The
//! engine needs a narrow surface: read text, replace a range, and learn
//! about foreign edits as ordered events. [`TextBuffer`] is the in-memory
//! implementation used by tests and headless runs.
//!
//! All offsets are byte offsets into the document text and must fall on
//! character boundaries.

use std::ops::Range;

use tracing::debug;

/// Line-ending convention of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Detect the convention used by `text`
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    /// Rewrite `text` to this convention
    pub fn apply(&self, text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        match self {
            Self::Lf => normalized,
            Self::CrLf => normalized.replace('\n', "\r\n"),
        }
    }
}

/// A foreign edit applied to the live document, in host delivery order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditEvent {
    /// Byte offset where the edit starts
    pub offset: usize,
    /// Bytes removed at `offset`
    pub deleted_len: usize,
    /// Bytes inserted at `offset`
    pub inserted_len: usize,
}

/// Minimal live-document surface the engine writes through
pub trait Document: Send {
    /// Current document length in bytes
    fn len(&self) -> usize;

    /// Whether the document is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full document text
    fn text(&self) -> String;

    /// Text within `range`
    fn text_in(&self, range: Range<usize>) -> String;

    /// Replace `range` with `text`. Programmatic writes go through here
    /// and are not reported back as edit events.
    fn replace(&mut self, range: Range<usize>, text: &str);

    /// Mark a region writable only by the engine; `None` lifts the
    /// protection. Hosts that cannot enforce this may ignore it.
    fn protect(&mut self, _region: Option<Range<usize>>) {}

    /// Line-ending convention for text written into this document
    fn line_ending(&self) -> LineEnding;
}

/// In-memory document used by tests and headless runs
#[derive(Debug, Clone)]
pub struct TextBuffer {
    text: String,
    line_ending: LineEnding,
    protected: Option<Range<usize>>,
}

impl TextBuffer {
    /// Create a buffer, detecting the line-ending convention from the
    /// initial text
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_ending = LineEnding::detect(&text);
        Self {
            text,
            line_ending,
            protected: None,
        }
    }

    /// Region currently reserved for the engine, if any
    pub fn protected_region(&self) -> Option<Range<usize>> {
        self.protected.clone()
    }

    /// Apply a user edit and return the event to feed the offset tracker.
    ///
    /// Returns `None` without modifying the buffer when the edit touches
    /// the protected region; the live region is only writable by the
    /// engine outside the brief window of each programmatic write.
    pub fn apply_user_edit(
        &mut self,
        offset: usize,
        deleted_len: usize,
        inserted: &str,
    ) -> Option<EditEvent> {
        if let Some(protected) = &self.protected {
            let intersects = offset < protected.end && offset + deleted_len > protected.start;
            if intersects {
                debug!(
                    "rejecting user edit at {} into protected region {:?}",
                    offset, protected
                );
                return None;
            }
        }

        self.text.replace_range(offset..offset + deleted_len, inserted);
        Some(EditEvent {
            offset,
            deleted_len,
            inserted_len: inserted.len(),
        })
    }
}

impl Document for TextBuffer {
    fn len(&self) -> usize {
        self.text.len()
    }

    fn text(&self) -> String {
        self.text.clone()
    }

    fn text_in(&self, range: Range<usize>) -> String {
        self.text[range].to_string()
    }

    fn replace(&mut self, range: Range<usize>, text: &str) {
        self.text.replace_range(range, text);
    }

    fn protect(&mut self, region: Option<Range<usize>>) {
        self.protected = region;
    }

    fn line_ending(&self) -> LineEnding {
        self.line_ending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_line_endings() {
        assert_eq!(LineEnding::detect("a\nb"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\r\nb"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("plain"), LineEnding::Lf);
    }

    #[test]
    fn applies_conventions_without_doubling() {
        assert_eq!(LineEnding::CrLf.apply("a\nb"), "a\r\nb");
        assert_eq!(LineEnding::CrLf.apply("a\r\nb"), "a\r\nb");
        assert_eq!(LineEnding::Lf.apply("a\r\nb"), "a\nb");
    }

    #[test]
    fn user_edits_produce_events() {
        let mut buffer = TextBuffer::new("hello world");
        let event = buffer.apply_user_edit(0, 5, "goodbye").unwrap();
        assert_eq!(buffer.text(), "goodbye world");
        assert_eq!(
            event,
            EditEvent {
                offset: 0,
                deleted_len: 5,
                inserted_len: 7
            }
        );
    }

    #[test]
    fn protected_region_rejects_user_edits() {
        let mut buffer = TextBuffer::new("abcdef");
        buffer.protect(Some(2..4));

        assert!(buffer.apply_user_edit(3, 1, "x").is_none());
        assert!(buffer.apply_user_edit(1, 2, "x").is_none());
        assert_eq!(buffer.text(), "abcdef");

        // Pure insertions at the region edges stay legal.
        assert!(buffer.apply_user_edit(2, 0, "x").is_some());
        assert_eq!(buffer.text(), "abxcdef");
    }

    #[test]
    fn lifting_protection_restores_editing() {
        let mut buffer = TextBuffer::new("abcdef");
        buffer.protect(Some(2..4));
        buffer.protect(None);
        assert!(buffer.apply_user_edit(3, 1, "x").is_some());
    }
}
