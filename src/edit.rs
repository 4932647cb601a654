//! The edit primitive and the plan/apply split.
//!
//! An [`Edit`] is a byte-span replacement computed against a file's
//! *original* text, never against a post-edit state. A per-file [`EditPlan`]
//! applies all of a file's edits in one atomic in-memory pass: overlapping
//! edits are resolved first-in-match-order-wins, survivors are sorted by
//! start offset descending and spliced onto a snapshot of the original
//! text, so every not-yet-applied offset stays valid.

use std::io::Write;
use std::path::Path;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// A verified byte-span replacement. Structural removal is the same
/// primitive with empty replacement text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an Edit does nothing until planned and applied"]
pub struct Edit {
    /// Starting byte offset (inclusive), in original-text coordinates.
    pub byte_start: usize,
    /// Ending byte offset (exclusive), in original-text coordinates.
    pub byte_end: usize,
    /// New text to insert at [byte_start, byte_end).
    pub new_text: String,
    /// Verification of what we expect to find before applying.
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

impl Edit {
    /// Create a replacement edit with automatic verification generation.
    pub fn new(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: &str,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before),
        }
    }

    /// Create a removal edit: empty replacement over the span.
    pub fn removal(byte_start: usize, byte_end: usize, expected_before: &str) -> Self {
        Self::new(byte_start, byte_end, "", expected_before)
    }

    /// Two spans intersect (half-open ranges). Pure insertions at the same
    /// offset do not conflict.
    pub fn overlaps(&self, other: &Edit) -> bool {
        self.byte_start < other.byte_end && other.byte_start < self.byte_end
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("invalid byte range: [{byte_start}, {byte_end}) in text of length {text_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        text_len: usize,
    },

    #[error("edit offset {offset} is not a UTF-8 character boundary")]
    NotCharBoundary { offset: usize },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-edit outcome, aligned with the plan's match order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditStatus {
    /// Edit was spliced into the output text.
    Applied,
    /// Span already contains the new text; nothing to do.
    AlreadyApplied,
    /// Span intersects an earlier (match-order) edit; dropped, never merged.
    SkippedOverlap { winner: usize },
    /// Before-text verification failed; dropped.
    SkippedVerification { found: String },
}

impl EditStatus {
    pub fn is_conflict(&self) -> bool {
        matches!(self, EditStatus::SkippedOverlap { .. })
    }
}

/// Result of applying a plan to a text snapshot.
#[derive(Debug)]
pub struct AppliedPlan {
    /// Final text after all surviving edits.
    pub text: String,
    /// One status per input edit, in match order.
    pub statuses: Vec<EditStatus>,
}

impl AppliedPlan {
    pub fn applied_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| matches!(s, EditStatus::Applied))
            .count()
    }

    pub fn changed(&self) -> bool {
        self.applied_count() > 0
    }
}

/// All edits for one file, in match order.
#[derive(Debug, Default)]
pub struct EditPlan {
    edits: Vec<Edit>,
}

impl EditPlan {
    pub fn new(edits: Vec<Edit>) -> Self {
        Self { edits }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Apply the plan against the original text snapshot.
    ///
    /// Malformed spans (out of range, inverted, mid-character) are hard
    /// errors: they indicate a planning bug, not a content conflict.
    /// Content-level problems (overlap, verification mismatch) are itemized
    /// per edit and never abort the rest of the file.
    pub fn apply(&self, original: &str) -> Result<AppliedPlan, EditError> {
        for edit in &self.edits {
            validate_span(original, edit)?;
        }

        let mut statuses: Vec<Option<EditStatus>> = vec![None; self.edits.len()];
        // Indexes of edits that hold their span (applied or already applied).
        let mut accepted: Vec<usize> = Vec::new();
        // Indexes that will actually be spliced.
        let mut to_splice: Vec<usize> = Vec::new();

        for (i, edit) in self.edits.iter().enumerate() {
            if let Some(&winner) = accepted
                .iter()
                .find(|&&w| self.edits[w].overlaps(edit))
            {
                statuses[i] = Some(EditStatus::SkippedOverlap { winner });
                continue;
            }

            let current = &original[edit.byte_start..edit.byte_end];
            if current == edit.new_text {
                statuses[i] = Some(EditStatus::AlreadyApplied);
                accepted.push(i);
                continue;
            }

            if !edit.expected_before.matches(current) {
                statuses[i] = Some(EditStatus::SkippedVerification {
                    found: current.to_string(),
                });
                continue;
            }

            statuses[i] = Some(EditStatus::Applied);
            accepted.push(i);
            to_splice.push(i);
        }

        // Descending start offset; for equal offsets (pure insertions) the
        // later match is applied first so the earlier one ends up first in
        // the output.
        to_splice.sort_by(|&a, &b| {
            self.edits[b]
                .byte_start
                .cmp(&self.edits[a].byte_start)
                .then(b.cmp(&a))
        });

        let mut text = original.to_string();
        for &i in &to_splice {
            let edit = &self.edits[i];
            text.replace_range(edit.byte_start..edit.byte_end, &edit.new_text);
        }

        Ok(AppliedPlan {
            text,
            statuses: statuses
                .into_iter()
                .map(|s| s.expect("every edit was assigned a status"))
                .collect(),
        })
    }
}

fn validate_span(text: &str, edit: &Edit) -> Result<(), EditError> {
    if edit.byte_start > edit.byte_end || edit.byte_end > text.len() {
        return Err(EditError::InvalidByteRange {
            byte_start: edit.byte_start,
            byte_end: edit.byte_end,
            text_len: text.len(),
        });
    }
    for offset in [edit.byte_start, edit.byte_end] {
        if !text.is_char_boundary(offset) {
            return Err(EditError::NotCharBoundary { offset });
        }
    }
    Ok(())
}

/// Atomic file write: tempfile + fsync + rename, then an mtime bump so
/// downstream watchers notice the change.
pub fn write_file(path: &Path, content: &str) -> Result<(), EditError> {
    let parent = path.parent().ok_or_else(|| {
        EditError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    let now = filetime::FileTime::now();
    filetime::set_file_mtime(path, now)?;

    Ok(())
}
