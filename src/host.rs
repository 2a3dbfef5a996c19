// Host document contract
// The link editor never owns the document it edits. Everything it needs from
// the host goes through the `LinkHost` trait and atomic `Transaction`s.

use std::fmt;

/// Half-open text range `[from, to)` in host document positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub from: usize,
    pub to: usize,
}

impl TextRange {
    pub fn new(from: usize, to: usize) -> Self {
        TextRange { from, to }
    }

    /// A collapsed range (cursor) at `pos`
    pub fn caret(pos: usize) -> Self {
        TextRange { from: pos, to: pos }
    }

    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.from <= pos && pos < self.to
    }

    pub fn overlaps(&self, other: &TextRange) -> bool {
        self.from < other.to && other.from < self.to
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

/// A link annotation as the host document stores it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkMark {
    pub href: String,
}

impl LinkMark {
    pub fn new(href: impl Into<String>) -> Self {
        LinkMark { href: href.into() }
    }
}

/// A link mark together with the range it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpan {
    pub range: TextRange,
    pub mark: LinkMark,
}

/// One step of a document transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Remove every link mark inside the range
    RemoveLinks(TextRange),
    /// Remove one specific mark inside the range
    RemoveMark(TextRange, LinkMark),
    /// Add a link mark over the range
    AddMark(TextRange, LinkMark),
    /// Collapse the selection to a cursor
    SetCursor(usize),
}

/// Ordered steps applied as one atomic edit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transaction {
    steps: Vec<Step>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove_links(mut self, range: TextRange) -> Self {
        self.steps.push(Step::RemoveLinks(range));
        self
    }

    pub fn remove_mark(mut self, range: TextRange, mark: LinkMark) -> Self {
        self.steps.push(Step::RemoveMark(range, mark));
        self
    }

    pub fn add_mark(mut self, range: TextRange, mark: LinkMark) -> Self {
        self.steps.push(Step::AddMark(range, mark));
        self
    }

    pub fn set_cursor(mut self, pos: usize) -> Self {
        self.steps.push(Step::SetCursor(pos));
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Errors a host reports when a transaction cannot be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    OutOfBounds { pos: usize, len: usize },
    InvertedRange { from: usize, to: usize },
    EmptyRange,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::OutOfBounds { pos, len } => {
                write!(f, "position {pos} is outside the document (length {len})")
            }
            DocumentError::InvertedRange { from, to } => {
                write!(f, "range {from}..{to} ends before it starts")
            }
            DocumentError::EmptyRange => write!(f, "a link needs a non-empty range"),
        }
    }
}

impl std::error::Error for DocumentError {}

/// What the link editor needs from the document it is embedded in.
///
/// Implementations must apply each transaction atomically: either all of its
/// steps take effect or none do.
pub trait LinkHost {
    /// Current selection (collapsed when it is just a cursor)
    fn selection(&self) -> TextRange;

    /// Plain text covered by `range`
    fn text_between(&self, range: TextRange) -> String;

    /// All link marks in document order
    fn links(&self) -> Vec<LinkSpan>;

    /// Apply a transaction
    fn dispatch(&mut self, tx: Transaction) -> Result<(), DocumentError>;

    /// Give keyboard focus back to the document
    fn focus(&mut self);

    /// The link mark covering the character at `pos` and the full range it
    /// covers. A link ending at `pos` does not count.
    fn link_at(&self, pos: usize) -> Option<LinkSpan> {
        self.links()
            .into_iter()
            .find(|span| span.range.contains(pos))
    }
}
