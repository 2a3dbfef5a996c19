// Popover scripts
// A tiny command language to drive a link editor without a GUI, used by the
// command line tool and the integration tests.

use crate::editor::LinkEditor;
use crate::host::LinkHost;
use crate::navigation::{Key, KeyPress};
use std::fmt;
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayStep {
    /// Append text to the input
    Type(String),
    /// Replace the input
    Set(String),
    Backspace,
    Clear,
    Key(KeyPress),
    Hover(usize),
    Click(usize),
    Create,
    Remove,
    Open,
    /// Wait for outstanding searches and creates
    Wait,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    Unquoted,
    UnknownCommand(String),
    MissingArgument(String),
    InvalidIndex { command: String, value: String },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::Unquoted => write!(f, "Unterminated quote in script"),
            ReplayError::UnknownCommand(cmd) => write!(f, "Unknown command '{}'", cmd),
            ReplayError::MissingArgument(cmd) => write!(f, "Command '{}' needs an argument", cmd),
            ReplayError::InvalidIndex { command, value } => {
                write!(f, "Command '{}' expects a row number, got '{}'", command, value)
            }
        }
    }
}

impl std::error::Error for ReplayError {}

/// Parse a script of shell-quoted words, e.g. `type 'rust book' down enter`
pub fn parse_script(script: &str) -> Result<Vec<ReplayStep>, ReplayError> {
    let words = shlex::split(script).ok_or(ReplayError::Unquoted)?;
    let mut words = words.into_iter();
    let mut steps = Vec::new();

    while let Some(word) = words.next() {
        let step = match word.as_str() {
            "type" => ReplayStep::Type(argument(&word, words.next())?),
            "set" => ReplayStep::Set(argument(&word, words.next())?),
            "backspace" => ReplayStep::Backspace,
            "clear" => ReplayStep::Clear,
            "up" => ReplayStep::Key(Key::ArrowUp.into()),
            "down" => ReplayStep::Key(Key::ArrowDown.into()),
            "tab" => ReplayStep::Key(Key::Tab.into()),
            "shift-tab" => ReplayStep::Key(KeyPress::shifted(Key::Tab)),
            "shift-up" => ReplayStep::Key(KeyPress::shifted(Key::ArrowUp)),
            "shift-down" => ReplayStep::Key(KeyPress::shifted(Key::ArrowDown)),
            "enter" => ReplayStep::Key(Key::Enter.into()),
            "esc" => ReplayStep::Key(Key::Escape.into()),
            "hover" => ReplayStep::Hover(index(&word, words.next())?),
            "click" => ReplayStep::Click(index(&word, words.next())?),
            "create" => ReplayStep::Create,
            "remove" => ReplayStep::Remove,
            "open" => ReplayStep::Open,
            "wait" => ReplayStep::Wait,
            _ => return Err(ReplayError::UnknownCommand(word)),
        };
        steps.push(step);
    }

    Ok(steps)
}

fn argument(command: &str, word: Option<String>) -> Result<String, ReplayError> {
    word.ok_or_else(|| ReplayError::MissingArgument(command.to_string()))
}

fn index(command: &str, word: Option<String>) -> Result<usize, ReplayError> {
    let value = argument(command, word)?;
    value.parse().map_err(|_| ReplayError::InvalidIndex {
        command: command.to_string(),
        value,
    })
}

/// Remove the last grapheme cluster
pub fn backspace(text: &str) -> String {
    match text.grapheme_indices(true).next_back() {
        Some((start, _)) => text[..start].to_string(),
        None => String::new(),
    }
}

/// Play `steps` against an open editor
pub async fn replay<H: LinkHost + 'static>(editor: &LinkEditor<H>, steps: &[ReplayStep]) {
    for step in steps {
        debug!(?step, "replaying");
        let value = editor.value().unwrap_or_default();
        match step {
            ReplayStep::Type(text) => editor.input(&format!("{}{}", value, text)),
            ReplayStep::Set(text) => editor.input(text),
            ReplayStep::Backspace => editor.input(&backspace(&value)),
            ReplayStep::Clear => editor.input(""),
            ReplayStep::Key(press) => {
                if !editor.key(*press) {
                    debug!(?press, "key passed through to the input");
                }
            }
            ReplayStep::Hover(row) => editor.hover(*row),
            ReplayStep::Click(row) => {
                if !editor.click_result(*row) {
                    warn!(row, "no result row to click");
                }
            }
            ReplayStep::Create => {
                if !editor.click_create() {
                    warn!("create row is not shown");
                }
            }
            ReplayStep::Remove => editor.click_remove(),
            ReplayStep::Open => {
                if !editor.click_open() {
                    warn!("nothing to open");
                }
            }
            ReplayStep::Wait => editor.settle().await,
        }
    }
}
