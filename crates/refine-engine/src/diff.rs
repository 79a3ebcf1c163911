//! Semantic text diffing for highlight ranges
//!
//! A raw character-level diff of prose is minimal but visually noisy: a
//! rewritten sentence becomes dozens of one-character edits. The cleanup
//! pass folds short unchanged runs between edits into the surrounding
//! edit spans, trading edit count for fewer, longer, readable spans.

use std::ops::Range;

use similar::{ChangeTag, TextDiff};

/// Unchanged runs shorter than this (in characters) are folded into the
/// neighboring edits.
const MIN_EQUALITY: usize = 4;

/// Kind of one diff span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Equal,
    Delete,
    Insert,
}

/// One span of a computed diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOp {
    pub kind: ChangeKind,
    pub text: String,
}

/// Ordered edit script between two text blobs.
///
/// Concatenating the Delete and Equal spans reconstructs the original
/// input; concatenating the Insert and Equal spans reconstructs the
/// revised input. Derived on demand, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub ops: Vec<DiffOp>,
}

impl DiffResult {
    /// Reconstruct the original input
    pub fn before(&self) -> String {
        self.ops
            .iter()
            .filter(|op| op.kind != ChangeKind::Insert)
            .map(|op| op.text.as_str())
            .collect()
    }

    /// Reconstruct the revised input
    pub fn after(&self) -> String {
        self.ops
            .iter()
            .filter(|op| op.kind != ChangeKind::Delete)
            .map(|op| op.text.as_str())
            .collect()
    }

    /// Disjoint half-open byte ranges into the original covering removed
    /// text
    pub fn deleted_ranges(&self) -> Vec<Range<usize>> {
        self.ranges_of(ChangeKind::Delete, ChangeKind::Insert)
    }

    /// Disjoint half-open byte ranges into the revised text covering
    /// added text
    pub fn inserted_ranges(&self) -> Vec<Range<usize>> {
        self.ranges_of(ChangeKind::Insert, ChangeKind::Delete)
    }

    /// Ranges of `wanted` spans in the coordinate space that excludes
    /// `excluded` spans
    fn ranges_of(&self, wanted: ChangeKind, excluded: ChangeKind) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = Vec::new();
        let mut pos = 0usize;
        for op in &self.ops {
            if op.kind == excluded {
                continue;
            }
            let end = pos + op.text.len();
            if op.kind == wanted && !op.text.is_empty() {
                match ranges.last_mut() {
                    Some(last) if last.end == pos => last.end = end,
                    _ => ranges.push(pos..end),
                }
            }
            pos = end;
        }
        ranges
    }
}

/// Compute a semantic diff between two text blobs.
///
/// Always a full recompute; inputs are bounded document-sized text, so
/// incremental diffing is not worth its complexity.
pub fn semantic_diff(before: &str, after: &str) -> DiffResult {
    let diff = TextDiff::from_chars(before, after);

    // Coalesce per-character changes into runs.
    let mut ops: Vec<DiffOp> = Vec::new();
    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => ChangeKind::Equal,
            ChangeTag::Delete => ChangeKind::Delete,
            ChangeTag::Insert => ChangeKind::Insert,
        };
        match ops.last_mut() {
            Some(op) if op.kind == kind => op.text.push_str(change.value()),
            _ => ops.push(DiffOp {
                kind,
                text: change.value().to_string(),
            }),
        }
    }

    DiffResult {
        ops: normalize(fold_short_equalities(ops)),
    }
}

/// Fold interior Equal runs shorter than [`MIN_EQUALITY`] into the edits
/// around them: the text is kept once on the delete side and once on the
/// insert side, so both reconstructions still hold.
fn fold_short_equalities(ops: Vec<DiffOp>) -> Vec<DiffOp> {
    let len = ops.len();
    let mut folded: Vec<DiffOp> = Vec::with_capacity(len);
    for (i, op) in ops.into_iter().enumerate() {
        let interior = i > 0 && i + 1 < len;
        if op.kind == ChangeKind::Equal && interior && op.text.chars().count() < MIN_EQUALITY {
            folded.push(DiffOp {
                kind: ChangeKind::Delete,
                text: op.text.clone(),
            });
            folded.push(DiffOp {
                kind: ChangeKind::Insert,
                text: op.text,
            });
        } else {
            folded.push(op);
        }
    }
    folded
}

/// Canonicalize: between two Equal spans all deletions come before all
/// insertions, adjacent same-kind spans merge, empty spans disappear.
fn normalize(ops: Vec<DiffOp>) -> Vec<DiffOp> {
    let mut out: Vec<DiffOp> = Vec::new();
    let mut deleted = String::new();
    let mut inserted = String::new();

    let flush = |out: &mut Vec<DiffOp>, deleted: &mut String, inserted: &mut String| {
        if !deleted.is_empty() {
            out.push(DiffOp {
                kind: ChangeKind::Delete,
                text: std::mem::take(deleted),
            });
        }
        if !inserted.is_empty() {
            out.push(DiffOp {
                kind: ChangeKind::Insert,
                text: std::mem::take(inserted),
            });
        }
    };

    for op in ops {
        match op.kind {
            ChangeKind::Delete => deleted.push_str(&op.text),
            ChangeKind::Insert => inserted.push_str(&op.text),
            ChangeKind::Equal => {
                flush(&mut out, &mut deleted, &mut inserted);
                if op.text.is_empty() {
                    continue;
                }
                match out.last_mut() {
                    Some(last) if last.kind == ChangeKind::Equal => last.text.push_str(&op.text),
                    _ => out.push(op),
                }
            }
        }
    }
    flush(&mut out, &mut deleted, &mut inserted);
    out
}
