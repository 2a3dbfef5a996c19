// Marked Document
// A flat text document carrying link marks over character ranges.
// Used as the in-memory host for the link editor.

use crate::host::{DocumentError, LinkHost, LinkMark, LinkSpan, Step, TextRange, Transaction};

/// Plain text plus non-overlapping link spans, a selection and a focus flag.
///
/// Positions are character offsets. Link spans are kept sorted, never empty,
/// never overlapping, and adjacent spans pointing at the same href are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedDocument {
    text: String,
    char_len: usize,
    links: Vec<LinkSpan>,
    selection: TextRange,
    focused: bool,
    revision: u64,
}

impl MarkedDocument {
    /// Create a document without links; the cursor sits at the start
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        MarkedDocument {
            text,
            char_len,
            links: Vec::new(),
            selection: TextRange::caret(0),
            focused: true,
            revision: 0,
        }
    }

    /// Create a document with the given links; invalid spans are dropped
    pub fn with_links(text: impl Into<String>, links: Vec<LinkSpan>) -> Self {
        let mut doc = Self::new(text);
        for span in links {
            if validate_range(span.range, doc.char_len).is_ok() {
                add_link(&mut doc.links, span.range, span.mark);
            }
        }
        doc
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    /// Number of transactions applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Move keyboard focus away from the document (e.g. into a popover)
    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Set the selection; both ends are clamped to the document
    pub fn select(&mut self, range: TextRange) {
        let from = range.from.min(self.char_len);
        let to = range.to.min(self.char_len).max(from);
        self.selection = TextRange::new(from, to);
    }
}

impl LinkHost for MarkedDocument {
    fn selection(&self) -> TextRange {
        self.selection
    }

    fn text_between(&self, range: TextRange) -> String {
        let from = range.from.min(self.char_len);
        let to = range.to.min(self.char_len);
        if from >= to {
            return String::new();
        }
        self.text.chars().skip(from).take(to - from).collect()
    }

    fn links(&self) -> Vec<LinkSpan> {
        self.links.clone()
    }

    fn dispatch(&mut self, tx: Transaction) -> Result<(), DocumentError> {
        if tx.is_empty() {
            return Ok(());
        }

        // Work on copies so a failing step leaves the document untouched
        let mut links = self.links.clone();
        let mut selection = self.selection;
        for step in tx.steps() {
            match step {
                Step::RemoveLinks(range) => {
                    validate_range(*range, self.char_len)?;
                    remove_links(&mut links, *range, None);
                }
                Step::RemoveMark(range, mark) => {
                    validate_range(*range, self.char_len)?;
                    remove_links(&mut links, *range, Some(mark));
                }
                Step::AddMark(range, mark) => {
                    validate_range(*range, self.char_len)?;
                    add_link(&mut links, *range, mark.clone());
                }
                Step::SetCursor(pos) => {
                    if *pos > self.char_len {
                        return Err(DocumentError::OutOfBounds {
                            pos: *pos,
                            len: self.char_len,
                        });
                    }
                    selection = TextRange::caret(*pos);
                }
            }
        }

        self.links = links;
        self.selection = selection;
        self.revision += 1;
        Ok(())
    }

    fn focus(&mut self) {
        self.focused = true;
    }
}

fn validate_range(range: TextRange, len: usize) -> Result<(), DocumentError> {
    if range.from > range.to {
        return Err(DocumentError::InvertedRange {
            from: range.from,
            to: range.to,
        });
    }
    if range.to > len {
        return Err(DocumentError::OutOfBounds { pos: range.to, len });
    }
    Ok(())
}

/// Cut `range` out of every matching span, keeping the parts outside of it
fn remove_links(links: &mut Vec<LinkSpan>, range: TextRange, only: Option<&LinkMark>) {
    if range.is_empty() {
        return;
    }
    let mut kept = Vec::with_capacity(links.len() + 1);
    for span in links.drain(..) {
        let matches = only.is_none_or(|mark| *mark == span.mark);
        if !matches || !span.range.overlaps(&range) {
            kept.push(span);
            continue;
        }
        if span.range.from < range.from {
            kept.push(LinkSpan {
                range: TextRange::new(span.range.from, range.from),
                mark: span.mark.clone(),
            });
        }
        if range.to < span.range.to {
            kept.push(LinkSpan {
                range: TextRange::new(range.to, span.range.to),
                mark: span.mark,
            });
        }
    }
    *links = kept;
}

/// Links exclude each other: whatever overlaps `range` is replaced
fn add_link(links: &mut Vec<LinkSpan>, range: TextRange, mark: LinkMark) {
    if range.is_empty() {
        return;
    }
    remove_links(links, range, None);
    links.push(LinkSpan { range, mark });
    links.sort_by_key(|span| span.range.from);

    let mut merged: Vec<LinkSpan> = Vec::with_capacity(links.len());
    for span in links.drain(..) {
        if let Some(last) = merged.last_mut()
            && last.range.to == span.range.from
            && last.mark == span.mark
        {
            last.range.to = span.range.to;
            continue;
        }
        merged.push(span);
    }
    *links = merged;
}
