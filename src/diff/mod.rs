//! Unified diff hunk parsing.
//!
//! GitHub returns one patch per changed file, made of `@@`-delimited hunks.
//! [`parse_hunks`] turns that text into [`DiffHunk`] values whose lines carry
//! their old/new line numbers so comments can be anchored to a single line.
//!
//! Parsing is pure and deterministic. Empty input yields no hunks. Malformed
//! headers and bodies shorter than their header claims are reported as
//! [`DiffParseError`] values; callers converting many files isolate those
//! failures per file.

use serde::{Deserialize, Serialize};
use thiserror::Error;


/// Marker that opens a hunk header.
const HUNK_MARKER: &str = "@@";

/// Errors raised while parsing a single patch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiffParseError {
    /// A `@@` line did not contain parseable ranges.
    #[error("malformed hunk header on line {line}: {header}")]
    MalformedHeader {
        /// One-based line number within the patch.
        line: usize,
        /// The offending header text.
        header: String,
    },

    /// The hunk body ended before the counts announced in its header.
    #[error(
        "hunk {header} announces {expected_old} old / {expected_new} new lines \
         but contains {actual_old} / {actual_new}"
    )]
    LineCountMismatch {
        /// Header of the truncated hunk.
        header: String,
        /// Old-side count from the header.
        expected_old: u32,
        /// New-side count from the header.
        expected_new: u32,
        /// Context plus removed lines found.
        actual_old: u32,
        /// Context plus added lines found.
        actual_new: u32,
    },
}

/// Classification of a hunk line by its leading sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffLineKind {
    /// Unchanged line (leading space, or no sigil).
    Context,
    /// Line present only on the new side (`+`).
    Added,
    /// Line present only on the old side (`-`).
    Removed,
}

/// One line of a hunk body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    kind: DiffLineKind,
    content: String,
    old_number: Option<u32>,
    new_number: Option<u32>,
}

impl DiffLine {
    /// Line classification.
    #[must_use]
    pub const fn kind(&self) -> DiffLineKind {
        self.kind
    }

    /// Line text without its sigil.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Line number on the old side; absent for added lines.
    #[must_use]
    pub const fn old_number(&self) -> Option<u32> {
        self.old_number
    }

    /// Line number on the new side; absent for removed lines.
    #[must_use]
    pub const fn new_number(&self) -> Option<u32> {
        self.new_number
    }
}

/// A parsed hunk. Values are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    old_start: u32,
    old_lines: u32,
    new_start: u32,
    new_lines: u32,
    header: String,
    lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// First line of the hunk on the old side.
    #[must_use]
    pub const fn old_start(&self) -> u32 {
        self.old_start
    }

    /// Old-side line count announced by the header.
    #[must_use]
    pub const fn old_lines(&self) -> u32 {
        self.old_lines
    }

    /// First line of the hunk on the new side.
    #[must_use]
    pub const fn new_start(&self) -> u32 {
        self.new_start
    }

    /// New-side line count announced by the header.
    #[must_use]
    pub const fn new_lines(&self) -> u32 {
        self.new_lines
    }

    /// The full `@@ ... @@` header line, including any section heading.
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Body lines in patch order.
    #[must_use]
    pub fn lines(&self) -> &[DiffLine] {
        &self.lines
    }

    /// Number of body lines of the given kind.
    #[must_use]
    pub fn count(&self, kind: DiffLineKind) -> usize {
        self.lines.iter().filter(|line| line.kind == kind).count()
    }
}

/// Parses a single-file unified diff into hunks.
///
/// Lines before the first header (`diff --git`, `---`, `+++`, `index`) are
/// ignored, as are `\ No newline at end of file` markers. Once a hunk holds
/// every line its header announced, further non-header lines are ignored
/// until the next header.
///
/// # Errors
///
/// Returns [`DiffParseError::MalformedHeader`] when a `@@` line has no
/// parseable ranges and [`DiffParseError::LineCountMismatch`] when a hunk ends
/// before reaching its announced counts.
///
/// # Examples
///
/// ```
/// use prsync::diff::{DiffLineKind, parse_hunks};
///
/// let hunks = parse_hunks("@@ -1,2 +1,2 @@\n keep\n-old\n+new")
///     .expect("patch should parse");
/// assert_eq!(hunks.len(), 1);
/// assert_eq!(hunks[0].count(DiffLineKind::Added), 1);
/// assert!(parse_hunks("").expect("empty patch parses").is_empty());
/// ```
pub fn parse_hunks(patch: &str) -> Result<Vec<DiffHunk>, DiffParseError> {
    let mut hunks = Vec::new();
    let mut current: Option<HunkBuilder> = None;

    for (index, line) in patch.lines().enumerate() {
        if line.starts_with(HUNK_MARKER) {
            if let Some(builder) = current.take() {
                hunks.push(builder.finish()?);
            }
            current = Some(HunkBuilder::start(line, index + 1)?);
            continue;
        }

        let Some(builder) = current.as_mut() else {
            continue;
        };
        if line.starts_with('\\') || builder.is_complete() {
            continue;
        }
        builder.push(line);
    }

    if let Some(builder) = current {
        hunks.push(builder.finish()?);
    }
    Ok(hunks)
}

/// Accumulates one hunk while tracking the next old/new line numbers.
struct HunkBuilder {
    hunk: DiffHunk,
    next_old: u32,
    next_new: u32,
    seen_old: u32,
    seen_new: u32,
}

impl HunkBuilder {
    fn start(header: &str, line: usize) -> Result<Self, DiffParseError> {
        let malformed = || DiffParseError::MalformedHeader {
            line,
            header: header.to_owned(),
        };

        let ranges = header
            .strip_prefix(HUNK_MARKER)
            .and_then(|rest| rest.split_once(HUNK_MARKER))
            .map(|(ranges, _section)| ranges)
            .ok_or_else(malformed)?;

        let mut parts = ranges.split_whitespace();
        let (old_start, old_lines) = parts
            .next()
            .and_then(|range| range.strip_prefix('-'))
            .and_then(parse_range)
            .ok_or_else(malformed)?;
        let (new_start, new_lines) = parts
            .next()
            .and_then(|range| range.strip_prefix('+'))
            .and_then(parse_range)
            .ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        Ok(Self {
            hunk: DiffHunk {
                old_start,
                old_lines,
                new_start,
                new_lines,
                header: header.to_owned(),
                lines: Vec::new(),
            },
            next_old: old_start,
            next_new: new_start,
            seen_old: 0,
            seen_new: 0,
        })
    }

    const fn is_complete(&self) -> bool {
        self.seen_old >= self.hunk.old_lines && self.seen_new >= self.hunk.new_lines
    }

    fn push(&mut self, line: &str) {
        let (kind, content) = classify(line);
        let (old_number, new_number) = match kind {
            DiffLineKind::Context => (Some(self.advance_old()), Some(self.advance_new())),
            DiffLineKind::Added => (None, Some(self.advance_new())),
            DiffLineKind::Removed => (Some(self.advance_old()), None),
        };
        self.hunk.lines.push(DiffLine {
            kind,
            content: content.to_owned(),
            old_number,
            new_number,
        });
    }

    const fn advance_old(&mut self) -> u32 {
        let number = self.next_old;
        self.next_old = self.next_old.saturating_add(1);
        self.seen_old = self.seen_old.saturating_add(1);
        number
    }

    const fn advance_new(&mut self) -> u32 {
        let number = self.next_new;
        self.next_new = self.next_new.saturating_add(1);
        self.seen_new = self.seen_new.saturating_add(1);
        number
    }

    fn finish(self) -> Result<DiffHunk, DiffParseError> {
        if self.seen_old != self.hunk.old_lines || self.seen_new != self.hunk.new_lines {
            return Err(DiffParseError::LineCountMismatch {
                header: self.hunk.header,
                expected_old: self.hunk.old_lines,
                expected_new: self.hunk.new_lines,
                actual_old: self.seen_old,
                actual_new: self.seen_new,
            });
        }
        Ok(self.hunk)
    }
}

fn classify(line: &str) -> (DiffLineKind, &str) {
    if let Some(added) = line.strip_prefix('+') {
        (DiffLineKind::Added, added)
    } else if let Some(removed) = line.strip_prefix('-') {
        (DiffLineKind::Removed, removed)
    } else {
        (
            DiffLineKind::Context,
            line.strip_prefix(' ').unwrap_or(line),
        )
    }
}

/// Parses `start[,count]`; a missing count means one line.
fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}
