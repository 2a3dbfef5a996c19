// Popover view model
// Everything a frontend needs to draw the link editor, derived from the
// session on demand. Nothing here feeds back into the session.

use crate::config::Dictionary;
use crate::host::LinkHost;
use crate::navigation::Focus;
use crate::session::LinkEditSession;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowIcon {
    Document,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveIcon {
    /// Deletes an existing link
    Trash,
    /// Dismisses a link that was never saved
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRow {
    pub title: String,
    pub subtitle: String,
    pub icon: RowIcon,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEditorView {
    pub value: String,
    pub placeholder: String,
    pub auto_focus: bool,
    pub open_enabled: bool,
    pub open_tooltip: String,
    pub remove_icon: RemoveIcon,
    pub remove_tooltip: String,
    /// Empty unless the suggestion list is shown
    pub rows: Vec<SuggestionRow>,
}

impl LinkEditorView {
    pub fn build(session: &LinkEditSession, host: &dyn LinkHost, dictionary: &Dictionary) -> Self {
        let show_create = session.show_create_link(host);
        let focus = session.focus(host);
        let results = session.displayed_results();

        let mut rows = Vec::new();
        if session.show_results(host) {
            rows.extend(results.iter().enumerate().map(|(i, result)| SuggestionRow {
                title: result.title.clone(),
                subtitle: result.subtitle.clone(),
                icon: RowIcon::Document,
                selected: focus == Focus::Result(i),
            }));
            if show_create {
                rows.push(SuggestionRow {
                    title: session.suggested_title(host),
                    subtitle: dictionary.create_new_doc.clone(),
                    icon: RowIcon::Plus,
                    selected: focus == Focus::Create,
                });
            }
        }

        LinkEditorView {
            value: session.value().to_string(),
            placeholder: if show_create {
                dictionary.find_or_create_doc.clone()
            } else {
                dictionary.search_or_paste_link.clone()
            },
            auto_focus: session.initial_href().is_empty(),
            open_enabled: !session.value().is_empty(),
            open_tooltip: dictionary.open_link.clone(),
            remove_icon: if session.initial_href().is_empty() {
                RemoveIcon::Close
            } else {
                RemoveIcon::Trash
            },
            remove_tooltip: dictionary.remove_link.clone(),
            rows,
        }
    }
}

/// Plain-text rendering for terminals and snapshots
impl fmt::Display for LinkEditorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = if self.value.is_empty() {
            format!("({})", self.placeholder)
        } else {
            self.value.clone()
        };
        let open = if self.open_enabled { "open" } else { "-" };
        let remove = match self.remove_icon {
            RemoveIcon::Trash => "trash",
            RemoveIcon::Close => "close",
        };
        write!(f, "[{input}] <{open}> <{remove}>")?;

        for row in &self.rows {
            let marker = if row.selected { '>' } else { ' ' };
            let icon = match row.icon {
                RowIcon::Document => '#',
                RowIcon::Plus => '+',
            };
            write!(f, "\n{marker} {icon} {}", row.title)?;
            if !row.subtitle.is_empty() {
                write!(f, " ({})", row.subtitle)?;
            }
        }
        Ok(())
    }
}
