// Keyboard navigation over the suggestion list
//
// The list is the displayed search results followed by an optional
// "create new" row. Focus never leaves that list and never wraps.

use crate::search::SearchResult;

/// Keys the popover reacts to; everything else is left to the input field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    ArrowUp,
    ArrowDown,
    Tab,
    Other,
}

/// A key press with its Shift state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        KeyPress { key, shift: false }
    }

    pub fn shifted(key: Key) -> Self {
        KeyPress { key, shift: true }
    }
}

impl From<Key> for KeyPress {
    fn from(key: Key) -> Self {
        KeyPress::new(key)
    }
}

/// Which row of the suggestion list has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    None,
    Result(usize),
    Create,
}

/// The row a focus points at, resolved against the displayed list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Result(SearchResult),
    CreateNew(String),
    None,
}

/// Shape of the list the focus moves over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListShape {
    pub results: usize,
    pub create_row: bool,
}

impl ListShape {
    pub fn new(results: usize, create_row: bool) -> Self {
        ListShape {
            results,
            create_row,
        }
    }

    /// Last focusable row, if there is any
    fn last(&self) -> Option<Focus> {
        if self.create_row {
            Some(Focus::Create)
        } else if self.results > 0 {
            Some(Focus::Result(self.results - 1))
        } else {
            None
        }
    }
}

impl Focus {
    /// Flat index: -1 for none, result index, or the result count for the
    /// create row
    pub fn index(self, shape: ListShape) -> isize {
        match self {
            Focus::None => -1,
            Focus::Result(i) => i as isize,
            Focus::Create => shape.results as isize,
        }
    }

    /// Focus for a flat row index as used by pointer hover
    pub fn from_index(index: usize, shape: ListShape) -> Focus {
        if index < shape.results {
            Focus::Result(index)
        } else if index == shape.results && shape.create_row {
            Focus::Create
        } else {
            Focus::None
        }
    }

    /// One row down, stopping at the last row
    pub fn next(self, shape: ListShape) -> Focus {
        let Some(last) = shape.last() else {
            return Focus::None;
        };
        match self.clamp(shape) {
            Focus::None if shape.results > 0 => Focus::Result(0),
            Focus::None => last,
            Focus::Result(i) if i + 1 < shape.results => Focus::Result(i + 1),
            Focus::Result(_) | Focus::Create => last,
        }
    }

    /// One row up, ending at no focus
    pub fn prev(self, shape: ListShape) -> Focus {
        match self.clamp(shape) {
            Focus::None | Focus::Result(0) => Focus::None,
            Focus::Result(i) => Focus::Result(i - 1),
            Focus::Create if shape.results > 0 => Focus::Result(shape.results - 1),
            Focus::Create => Focus::None,
        }
    }

    /// Pull a stale focus back into the list after it changed shape
    pub fn clamp(self, shape: ListShape) -> Focus {
        match self {
            Focus::None => Focus::None,
            Focus::Result(i) if i < shape.results => self,
            Focus::Result(_) | Focus::Create => shape.last().unwrap_or(Focus::None),
        }
    }

    /// Resolve the focus to what Enter would commit
    pub fn candidate(self, results: &[SearchResult], create_title: Option<&str>) -> Candidate {
        match self {
            Focus::None => Candidate::None,
            Focus::Result(i) => results
                .get(i)
                .cloned()
                .map_or(Candidate::None, Candidate::Result),
            Focus::Create => create_title
                .map_or(Candidate::None, |title| Candidate::CreateNew(title.to_string())),
        }
    }
}
