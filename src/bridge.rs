// Document mutation bridge
// Turns link editor decisions into transactions on the host document.
// Every function here is one self-contained read-modify-write.

use crate::host::{DocumentError, LinkHost, LinkMark, TextRange, Transaction};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// A committed link choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSelection {
    pub href: String,
    pub title: String,
    pub range: TextRange,
}

/// Replace whatever links cover `range` with a single link to `href`
pub fn apply_link(host: &mut dyn LinkHost, href: &str, range: TextRange) -> Result<(), DocumentError> {
    host.dispatch(
        Transaction::new()
            .remove_links(range)
            .add_mark(range, LinkMark::new(href)),
    )
}

/// Apply a committed choice. The title is informational, a link mark only
/// carries its href.
pub fn select_link(host: &mut dyn LinkHost, selection: &LinkSelection) -> Result<(), DocumentError> {
    debug!(
        href = %selection.href,
        title = %selection.title,
        range = %selection.range,
        "applying link"
    );
    apply_link(host, &selection.href, selection.range)
}

/// Remove `mark` from `range` (if there is one) and hand focus back to the
/// document
pub fn remove_link(
    host: &mut dyn LinkHost,
    range: TextRange,
    mark: Option<&LinkMark>,
) -> Result<(), DocumentError> {
    let result = match mark {
        Some(mark) => {
            debug!(href = %mark.href, range = %range, "removing link");
            host.dispatch(Transaction::new().remove_mark(range, mark.clone()))
        }
        None => Ok(()),
    };
    host.focus();
    result
}

/// Collapse the selection after the edited range and focus the document
pub fn move_cursor_to_end(host: &mut dyn LinkHost, to: usize) -> Result<(), DocumentError> {
    let result = host.dispatch(Transaction::new().set_cursor(to));
    host.focus();
    result
}

/// Why creating a linked document failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateLinkError {
    Provider(String),
    Dropped,
}

impl fmt::Display for CreateLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateLinkError::Provider(msg) => write!(f, "creating the link target failed: {msg}"),
            CreateLinkError::Dropped => write!(f, "link creation was dropped before it finished"),
        }
    }
}

impl std::error::Error for CreateLinkError {}

/// Resolves to the URL of the newly created document
pub type CreateFuture = Pin<Box<dyn Future<Output = Result<String, CreateLinkError>>>>;

/// Host-side backend that creates a document for a link title
pub trait CreateLinkProvider {
    fn create(&self, title: &str) -> CreateFuture;
}

impl<F> CreateLinkProvider for F
where
    F: Fn(&str) -> CreateFuture,
{
    fn create(&self, title: &str) -> CreateFuture {
        self(title)
    }
}

/// Href of the temporary link shown while a document is being created
pub fn placeholder_href(title: &str) -> String {
    format!("creating#{title}…")
}

/// A create request whose placeholder link is already in the document
pub struct PendingCreate {
    title: String,
    placeholder: String,
    future: CreateFuture,
}

impl PendingCreate {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub async fn resolve(self) -> CreateOutcome {
        let result = self.future.await;
        CreateOutcome {
            title: self.title,
            placeholder: self.placeholder,
            result,
        }
    }
}

impl fmt::Debug for PendingCreate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCreate")
            .field("title", &self.title)
            .field("placeholder", &self.placeholder)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    pub title: String,
    pub placeholder: String,
    pub result: Result<String, CreateLinkError>,
}

/// What happened to the placeholder once the provider answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateResolution {
    /// Placeholder links were pointed at the new document
    Linked { href: String, replaced: usize },
    /// The provider failed and the placeholder links were removed
    Failed {
        error: CreateLinkError,
        removed: usize,
    },
}

/// Put a placeholder link over `range` and ask the provider for a document
pub fn start_create(
    host: &mut dyn LinkHost,
    range: TextRange,
    title: &str,
    provider: &dyn CreateLinkProvider,
) -> Result<PendingCreate, DocumentError> {
    if range.is_empty() {
        return Err(DocumentError::EmptyRange);
    }
    let placeholder = placeholder_href(title);
    apply_link(host, &placeholder, range)?;
    debug!(title, range = %range, "creating linked document");

    Ok(PendingCreate {
        title: title.to_string(),
        placeholder,
        future: provider.create(title),
    })
}

/// Swap the placeholder for the real link, or drop it when creation failed
pub fn finish_create(
    host: &mut dyn LinkHost,
    outcome: CreateOutcome,
) -> Result<CreateResolution, DocumentError> {
    match outcome.result {
        Ok(href) => {
            let replaced = replace_placeholder(host, &outcome.placeholder, Some(&href))?;
            Ok(CreateResolution::Linked { href, replaced })
        }
        Err(error) => {
            let removed = replace_placeholder(host, &outcome.placeholder, None)?;
            Ok(CreateResolution::Failed { error, removed })
        }
    }
}

/// Re-point (or with `None`, remove) every link whose href is `placeholder`.
/// Returns how many spans were touched.
fn replace_placeholder(
    host: &mut dyn LinkHost,
    placeholder: &str,
    href: Option<&str>,
) -> Result<usize, DocumentError> {
    let placeholder_mark = LinkMark::new(placeholder);
    let spans: Vec<_> = host
        .links()
        .into_iter()
        .filter(|span| span.mark == placeholder_mark)
        .collect();
    if spans.is_empty() {
        return Ok(0);
    }

    let mut tx = Transaction::new();
    for span in &spans {
        tx = tx.remove_mark(span.range, placeholder_mark.clone());
        if let Some(href) = href {
            tx = tx.add_mark(span.range, LinkMark::new(href));
        }
    }
    host.dispatch(tx)?;
    Ok(spans.len())
}
