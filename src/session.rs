// Link edit session
//
// One session per opened popover, bound to a fixed range of the host
// document. It owns the typed value, the search cache and the focused row,
// and decides what gets written back: on an explicit commit, or once when
// the session is finalized.

use crate::bridge::{self, CreateLinkProvider, LinkSelection, PendingCreate};
use crate::host::{LinkHost, LinkMark, TextRange};
use crate::navigation::{Candidate, Focus, Key, KeyPress, ListShape};
use crate::search::{PendingSearch, SearchCache, SearchOutcome, SearchProvider, SearchResult};
use crate::url::{looks_like_http_url, normalize_href};
use std::rc::Rc;
use tracing::{debug, warn};

/// Optional collaborators of a session. A missing provider turns the
/// matching feature off.
#[derive(Default)]
pub struct LinkEditOptions {
    /// Suggestion search; without it only raw URLs can be saved
    pub search: Option<Rc<dyn SearchProvider>>,
    /// Creates a document for a title; enables the "create new" row
    pub create: Option<Rc<dyn CreateLinkProvider>>,
    /// Notified after a link was removed
    pub on_remove: Option<Box<dyn FnMut()>>,
    /// Opens an href outside the editor
    pub on_open: Option<Box<dyn FnMut(&str)>>,
}

impl LinkEditOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, provider: impl SearchProvider + 'static) -> Self {
        self.search = Some(Rc::new(provider));
        self
    }

    pub fn with_create(mut self, provider: impl CreateLinkProvider + 'static) -> Self {
        self.create = Some(Rc::new(provider));
        self
    }

    pub fn on_remove(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_remove = Some(Box::new(f));
        self
    }

    pub fn on_open(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.on_open = Some(Box::new(f));
        self
    }
}

/// The range a popover edits and the link mark it was opened on, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub range: TextRange,
    pub mark: Option<LinkMark>,
}

impl LinkTarget {
    pub fn new(range: TextRange, mark: Option<LinkMark>) -> Self {
        LinkTarget { range, mark }
    }

    /// Target for the host's current selection: the whole link under the
    /// selection start, or else a non-empty selection. `None` when there is
    /// nothing to link.
    pub fn from_selection(host: &dyn LinkHost) -> Option<LinkTarget> {
        let selection = host.selection();
        if let Some(span) = host.link_at(selection.from) {
            return Some(LinkTarget {
                range: span.range,
                mark: Some(span.mark),
            });
        }
        (!selection.is_empty()).then_some(LinkTarget {
            range: selection,
            mark: None,
        })
    }
}

/// Work a session queued that must run outside the event handler
#[derive(Debug)]
pub enum Deferred {
    Search(PendingSearch),
    Create(PendingCreate),
}

/// What finalizing a session did to the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// A save, create or remove already happened during the session
    AlreadyCommitted,
    /// The value is what the session started with
    Unchanged,
    /// The value was cleared, so the link was removed
    Removed,
    /// The typed value was saved as a link
    Saved { href: String },
}

pub struct LinkEditSession {
    range: TextRange,
    mark: Option<LinkMark>,
    initial_href: String,
    value: String,
    cache: SearchCache,
    focus: Focus,
    discarded: bool,
    finalized: bool,
    options: LinkEditOptions,
    deferred: Vec<Deferred>,
}

impl LinkEditSession {
    /// Open a session; the input starts out with the href of the target's mark
    pub fn open(target: LinkTarget, options: LinkEditOptions) -> Self {
        let initial_href = target
            .mark
            .as_ref()
            .map(|mark| mark.href.clone())
            .unwrap_or_default();
        debug!(range = %target.range, href = %initial_href, "link editor opened");

        LinkEditSession {
            range: target.range,
            mark: target.mark,
            value: initial_href.clone(),
            initial_href,
            cache: SearchCache::new(),
            focus: Focus::None,
            discarded: false,
            finalized: false,
            options,
            deferred: Vec::new(),
        }
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn mark(&self) -> Option<&LinkMark> {
        self.mark.as_ref()
    }

    pub fn initial_href(&self) -> &str {
        &self.initial_href
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    /// Whether a save, create or remove has been performed
    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    pub fn has_search(&self) -> bool {
        self.options.search.is_some()
    }

    pub fn has_create(&self) -> bool {
        self.options.create.is_some()
    }

    /// Results for the current input, falling back to the last resolved query
    pub fn displayed_results(&self) -> &[SearchResult] {
        self.cache.displayed(&self.value)
    }

    /// Title for a new link: the typed text, else the selected document text
    pub fn suggested_title(&self, host: &dyn LinkHost) -> String {
        let typed = self.value.trim();
        if !typed.is_empty() {
            return typed.to_string();
        }
        host.text_between(host.selection()).trim().to_string()
    }

    pub fn show_create_link(&self, host: &dyn LinkHost) -> bool {
        if !self.has_create() || looks_like_http_url(&self.value) {
            return false;
        }
        let title = self.suggested_title(host);
        !title.is_empty() && title != self.initial_href
    }

    pub fn show_results(&self, host: &dyn LinkHost) -> bool {
        !self.suggested_title(host).is_empty()
            && (self.show_create_link(host) || !self.displayed_results().is_empty())
    }

    pub fn list_shape(&self, host: &dyn LinkHost) -> ListShape {
        ListShape::new(self.displayed_results().len(), self.show_create_link(host))
    }

    /// Focused row, pulled back into the list if results changed under it
    pub fn focus(&self, host: &dyn LinkHost) -> Focus {
        self.focus.clamp(self.list_shape(host))
    }

    /// Focus as a flat index: -1 for none, the result count for the create row
    pub fn focused_index(&self, host: &dyn LinkHost) -> isize {
        let shape = self.list_shape(host);
        self.focus.clamp(shape).index(shape)
    }

    /// Replace the typed value. Resets the focus and queues a search for the
    /// trimmed value when a search provider is configured.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.focus = Focus::None;

        let query = self.value.trim();
        if query.is_empty() {
            return;
        }
        if let Some(provider) = &self.options.search {
            debug!(query, "issuing link search");
            let future = provider.search(query);
            self.deferred
                .push(Deferred::Search(PendingSearch::new(query, future)));
        }
    }

    /// Feed a finished search back in
    pub fn complete_search(&mut self, outcome: SearchOutcome) {
        self.cache.apply(outcome);
    }

    /// Take the work queued by the last events
    pub fn take_deferred(&mut self) -> Vec<Deferred> {
        std::mem::take(&mut self.deferred)
    }

    /// Handle a key press. Returns `true` when the key was consumed and must
    /// not reach the input field.
    pub fn handle_key(&mut self, host: &mut dyn LinkHost, press: KeyPress) -> bool {
        match press.key {
            Key::Enter => {
                self.commit(host);
                true
            }
            Key::Escape => {
                if self.initial_href.is_empty() {
                    self.remove_link(host);
                } else {
                    self.value = self.initial_href.clone();
                    self.focus = Focus::None;
                    self.move_selection_to_end(host);
                }
                true
            }
            Key::ArrowUp if !press.shift => {
                self.focus = self.focus(host).prev(self.list_shape(host));
                true
            }
            Key::ArrowDown | Key::Tab if !press.shift => {
                self.focus = self.focus(host).next(self.list_shape(host));
                true
            }
            _ => false,
        }
    }

    /// Pointer moved over row `index`
    pub fn hover(&mut self, host: &dyn LinkHost, index: usize) {
        let focus = Focus::from_index(index, self.list_shape(host));
        if focus != Focus::None {
            self.focus = focus;
        }
    }

    /// Row `index` of the displayed results was clicked
    pub fn select_result(&mut self, host: &mut dyn LinkHost, index: usize) -> bool {
        let Some(result) = self.displayed_results().get(index).cloned() else {
            return false;
        };
        self.save(host, &result.url, &result.title);
        if !self.range.is_empty() {
            self.move_selection_to_end(host);
        }
        true
    }

    /// The "create new" row was clicked
    pub fn select_create(&mut self, host: &mut dyn LinkHost) -> bool {
        if !self.show_create_link(host) {
            return false;
        }
        let title = self.suggested_title(host);
        self.create(host, &title);
        if !self.range.is_empty() {
            self.move_selection_to_end(host);
        }
        true
    }

    /// Open the link outside the editor. Does nothing while the input is empty.
    pub fn open_link(&mut self) -> bool {
        if self.value.is_empty() {
            return false;
        }
        let href = if self.initial_href.is_empty() {
            normalize_href(&self.value)
        } else {
            self.initial_href.clone()
        };
        match &mut self.options.on_open {
            Some(open) => {
                open(&href);
                true
            }
            None => false,
        }
    }

    /// Remove the link this session was opened on and end the session
    pub fn remove_link(&mut self, host: &mut dyn LinkHost) {
        self.discarded = true;
        if let Err(err) = bridge::remove_link(host, self.range, self.mark.as_ref()) {
            warn!(range = %self.range, error = %err, "failed to remove link");
        }
        if let Some(notify) = &mut self.options.on_remove {
            notify();
        }
    }

    /// Reconcile unsaved edits when the popover goes away.
    ///
    /// Does nothing if the session already committed. Otherwise an unchanged
    /// value is left alone, an empty value removes the link and anything else
    /// is saved as typed.
    pub fn finalize(mut self, host: &mut dyn LinkHost) -> Reconciliation {
        self.finalized = true;
        if self.discarded {
            return Reconciliation::AlreadyCommitted;
        }
        if self.value == self.initial_href {
            return Reconciliation::Unchanged;
        }

        let href = self.value.trim().to_string();
        if href.is_empty() {
            self.remove_link(host);
            return Reconciliation::Removed;
        }
        self.save(host, &href, &href);
        Reconciliation::Saved {
            href: normalize_href(&href),
        }
    }

    fn commit(&mut self, host: &mut dyn LinkHost) {
        let shape = self.list_shape(host);
        let create_title = shape.create_row.then(|| self.suggested_title(host));
        let candidate = self
            .focus
            .clamp(shape)
            .candidate(self.displayed_results(), create_title.as_deref());

        match candidate {
            Candidate::Result(result) => self.save(host, &result.url, &result.title),
            Candidate::CreateNew(title) => self.create(host, &title),
            Candidate::None => {
                let value = self.value.clone();
                self.save(host, &value, &value);
            }
        }

        if !self.range.is_empty() {
            self.move_selection_to_end(host);
        }
    }

    fn save(&mut self, host: &mut dyn LinkHost, href: &str, title: &str) {
        let href = href.trim();
        if href.is_empty() {
            return;
        }
        self.discarded = true;

        let selection = LinkSelection {
            href: normalize_href(href),
            title: title.trim().to_string(),
            range: self.range,
        };
        if let Err(err) = bridge::select_link(host, &selection) {
            warn!(href = %selection.href, error = %err, "failed to apply link");
        }
    }

    fn create(&mut self, host: &mut dyn LinkHost, title: &str) {
        self.discarded = true;
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        let Some(provider) = self.options.create.clone() else {
            return;
        };
        match bridge::start_create(host, self.range, title, provider.as_ref()) {
            Ok(pending) => self.deferred.push(Deferred::Create(pending)),
            Err(err) => warn!(title, error = %err, "cannot create link here"),
        }
    }

    fn move_selection_to_end(&self, host: &mut dyn LinkHost) {
        if let Err(err) = bridge::move_cursor_to_end(host, self.range.to) {
            warn!(pos = self.range.to, error = %err, "failed to move cursor");
        }
    }
}

impl Drop for LinkEditSession {
    fn drop(&mut self) {
        if !self.finalized {
            warn!(range = %self.range, "link edit session dropped without being finalized");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LinkSpan;
    use crate::marked_document::MarkedDocument;
    use crate::search::{SearchError, SearchFuture};
    use std::cell::{Cell, RefCell};

    const TEXT: &str = "see the docs for details";
    const DOCS: TextRange = TextRange { from: 8, to: 12 };

    fn linked_doc(href: &str) -> MarkedDocument {
        let mut doc = MarkedDocument::with_links(
            TEXT,
            vec![LinkSpan {
                range: DOCS,
                mark: LinkMark::new(href),
            }],
        );
        doc.select(DOCS);
        doc.blur();
        doc
    }

    fn plain_doc() -> MarkedDocument {
        let mut doc = MarkedDocument::new(TEXT);
        doc.select(DOCS);
        doc.blur();
        doc
    }

    fn no_results(_query: &str) -> SearchFuture {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn no_create(_title: &str) -> crate::bridge::CreateFuture {
        Box::pin(async { Ok(String::new()) })
    }

    fn results(titles: &[&str]) -> Vec<SearchResult> {
        titles
            .iter()
            .map(|t| SearchResult::new(format!("/doc/{}", t.to_lowercase()), *t, "Docs"))
            .collect()
    }

    fn open(doc: &MarkedDocument, options: LinkEditOptions) -> LinkEditSession {
        let target = LinkTarget::from_selection(doc).unwrap();
        LinkEditSession::open(target, options)
    }

    fn type_and_resolve(session: &mut LinkEditSession, value: &str, found: Vec<SearchResult>) {
        session.set_value(value);
        for work in session.take_deferred() {
            if let Deferred::Search(pending) = work {
                let query = pending.query().to_string();
                session.complete_search(SearchOutcome {
                    query,
                    result: Ok(found.clone()),
                });
            }
        }
    }

    #[test]
    fn test_target_from_selection_prefers_link() {
        let mut doc = linked_doc("https://a.com");
        doc.select(TextRange::caret(10));
        let target = LinkTarget::from_selection(&doc).unwrap();
        assert_eq!(target.range, DOCS);
        assert_eq!(target.mark, Some(LinkMark::new("https://a.com")));

        let mut doc = plain_doc();
        doc.select(TextRange::caret(3));
        assert_eq!(LinkTarget::from_selection(&doc), None);
    }

    #[test]
    fn test_target_after_link_is_the_selection() {
        let mut doc = linked_doc("/docs");
        doc.select(TextRange::new(12, 16));
        let target = LinkTarget::from_selection(&doc).unwrap();
        assert_eq!(target, LinkTarget::new(TextRange::new(12, 16), None));

        // A caret right behind a link is not on it
        doc.select(TextRange::caret(12));
        assert_eq!(LinkTarget::from_selection(&doc), None);
    }

    #[test]
    fn test_untouched_session_does_nothing() {
        let mut doc = linked_doc("https://a.com");
        let session = open(&doc, LinkEditOptions::new());
        assert_eq!(session.value(), "https://a.com");
        assert_eq!(session.finalize(&mut doc), Reconciliation::Unchanged);
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn test_finalize_saves_typed_value() {
        let mut doc = plain_doc();
        let mut session = open(&doc, LinkEditOptions::new());
        session.set_value("acme.com");
        assert_eq!(
            session.finalize(&mut doc),
            Reconciliation::Saved {
                href: "https://acme.com".to_string()
            }
        );
        assert_eq!(doc.link_at(9).unwrap().mark.href, "https://acme.com");
        assert_eq!(doc.revision(), 1);
    }

    #[test]
    fn test_finalize_removes_cleared_link() {
        let mut doc = linked_doc("https://a.com");
        let removed = Rc::new(Cell::new(0));
        let counter = removed.clone();
        let mut session = open(
            &doc,
            LinkEditOptions::new().on_remove(move || counter.set(counter.get() + 1)),
        );
        session.set_value("   ");
        assert_eq!(session.finalize(&mut doc), Reconciliation::Removed);
        assert!(doc.links().is_empty());
        assert_eq!(removed.get(), 1);
        assert!(doc.is_focused());
    }

    #[test]
    fn test_enter_saves_raw_input() {
        let mut doc = plain_doc();
        let mut session = open(&doc, LinkEditOptions::new().with_search(no_results));
        type_and_resolve(&mut session, "docs", Vec::new());

        assert!(session.handle_key(&mut doc, Key::Enter.into()));
        assert!(session.is_discarded());
        assert_eq!(doc.link_at(9).unwrap().mark.href, "https://docs");
        // Range was non-empty, so the cursor lands behind it
        assert_eq!(doc.selection(), TextRange::caret(12));

        let revision = doc.revision();
        assert_eq!(session.finalize(&mut doc), Reconciliation::AlreadyCommitted);
        assert_eq!(doc.revision(), revision);
    }

    #[test]
    fn test_enter_saves_focused_result() {
        let mut doc = plain_doc();
        let mut session = open(&doc, LinkEditOptions::new().with_search(no_results));
        type_and_resolve(&mut session, "gui", results(&["Guide", "Guidelines"]));

        session.handle_key(&mut doc, Key::ArrowDown.into());
        session.handle_key(&mut doc, Key::Tab.into());
        assert_eq!(session.focused_index(&doc), 1);
        session.handle_key(&mut doc, Key::Enter.into());

        assert_eq!(doc.link_at(9).unwrap().mark.href, "/doc/guidelines");
        session.finalize(&mut doc);
    }

    #[test]
    fn test_enter_on_create_row_creates() {
        let mut doc = plain_doc();
        let created = Rc::new(RefCell::new(Vec::new()));
        let log = created.clone();
        let create = move |title: &str| -> crate::bridge::CreateFuture {
            log.borrow_mut().push(title.to_string());
            Box::pin(async { Ok("/new".to_string()) })
        };
        let mut session = open(
            &doc,
            LinkEditOptions::new().with_search(no_results).with_create(create),
        );
        type_and_resolve(&mut session, "  Release notes ", results(&["Release"]));

        session.handle_key(&mut doc, Key::ArrowDown.into());
        session.handle_key(&mut doc, Key::ArrowDown.into());
        session.handle_key(&mut doc, Key::ArrowDown.into());
        assert_eq!(session.focused_index(&doc), 1);
        session.handle_key(&mut doc, Key::Enter.into());

        assert_eq!(*created.borrow(), vec!["Release notes".to_string()]);
        assert_eq!(doc.link_at(9).unwrap().mark.href, "creating#Release notes…");
        let deferred = session.take_deferred();
        assert!(matches!(deferred.as_slice(), [Deferred::Create(_)]));
        assert_eq!(session.finalize(&mut doc), Reconciliation::AlreadyCommitted);
    }

    #[test]
    fn test_typing_resets_focus() {
        let mut doc = plain_doc();
        let mut session = open(&doc, LinkEditOptions::new().with_search(no_results));
        type_and_resolve(&mut session, "g", results(&["Guide", "Glossary"]));
        session.handle_key(&mut doc, Key::ArrowDown.into());
        assert_eq!(session.focused_index(&doc), 0);

        session.set_value("gu");
        assert_eq!(session.focused_index(&doc), -1);
        session.finalize(&mut doc);
    }

    #[test]
    fn test_shift_arrows_are_not_consumed() {
        let mut doc = plain_doc();
        let mut session = open(&doc, LinkEditOptions::new().with_search(no_results));
        type_and_resolve(&mut session, "g", results(&["Guide"]));

        assert!(!session.handle_key(&mut doc, KeyPress::shifted(Key::ArrowDown)));
        assert!(!session.handle_key(&mut doc, KeyPress::shifted(Key::ArrowUp)));
        assert!(!session.handle_key(&mut doc, KeyPress::shifted(Key::Tab)));
        assert!(!session.handle_key(&mut doc, Key::Other.into()));
        assert_eq!(session.focused_index(&doc), -1);
        session.finalize(&mut doc);
    }

    #[test]
    fn test_focus_stays_in_bounds() {
        let mut doc = plain_doc();
        let mut session = open(
            &doc,
            LinkEditOptions::new().with_search(no_results).with_create(no_create),
        );
        type_and_resolve(&mut session, "g", results(&["Guide", "Glossary"]));

        let keys = [
            Key::ArrowDown,
            Key::ArrowDown,
            Key::ArrowDown,
            Key::ArrowDown,
            Key::ArrowUp,
            Key::ArrowUp,
            Key::ArrowUp,
            Key::ArrowUp,
            Key::ArrowUp,
            Key::Tab,
        ];
        for key in keys {
            session.handle_key(&mut doc, key.into());
            let n = session.displayed_results().len() as isize;
            let index = session.focused_index(&doc);
            assert!((-1..=n).contains(&index));
        }
        assert_eq!(session.focused_index(&doc), 0);
        session.finalize(&mut doc);
    }

    #[test]
    fn test_escape_restores_initial_href() {
        let mut doc = linked_doc("https://a.com");
        let mut session = open(&doc, LinkEditOptions::new());
        session.set_value("something else");

        assert!(session.handle_key(&mut doc, Key::Escape.into()));
        assert_eq!(session.value(), "https://a.com");
        assert_eq!(doc.selection(), TextRange::caret(12));
        assert_eq!(doc.link_at(9).unwrap().mark.href, "https://a.com");
        assert!(!session.is_discarded());
        // Cursor move is the only transaction
        assert_eq!(doc.revision(), 1);
        assert_eq!(session.finalize(&mut doc), Reconciliation::Unchanged);
    }

    #[test]
    fn test_escape_without_link_removes() {
        let mut doc = plain_doc();
        let notified = Rc::new(Cell::new(false));
        let flag = notified.clone();
        let mut session = open(&doc, LinkEditOptions::new().on_remove(move || flag.set(true)));
        session.set_value("typed");

        session.handle_key(&mut doc, Key::Escape.into());
        assert!(session.is_discarded());
        assert!(notified.get());
        assert!(doc.links().is_empty());
        assert_eq!(doc.revision(), 0);
        assert_eq!(session.finalize(&mut doc), Reconciliation::AlreadyCommitted);
    }

    #[test]
    fn test_enter_with_empty_value_defers_to_finalize() {
        let mut doc = linked_doc("https://a.com");
        let mut session = open(&doc, LinkEditOptions::new());
        session.set_value("");
        session.handle_key(&mut doc, Key::Enter.into());
        assert!(!session.is_discarded());
        assert_eq!(session.finalize(&mut doc), Reconciliation::Removed);
        assert!(doc.links().is_empty());
    }

    #[test]
    fn test_search_race_keeps_queries_apart() {
        let doc = plain_doc();
        let mut session = open(&doc, LinkEditOptions::new().with_search(no_results));
        session.set_value("a");
        session.set_value("ab");
        let queries: Vec<String> = session
            .take_deferred()
            .into_iter()
            .filter_map(|work| match work {
                Deferred::Search(pending) => Some(pending.query().to_string()),
                Deferred::Create(_) => None,
            })
            .collect();
        assert_eq!(queries, vec!["a", "ab"]);

        // "ab" answers first, "a" afterwards
        session.complete_search(SearchOutcome {
            query: "ab".to_string(),
            result: Ok(results(&["Abacus"])),
        });
        session.complete_search(SearchOutcome {
            query: "a".to_string(),
            result: Ok(results(&["Apple", "Abacus"])),
        });

        assert_eq!(session.cache().get("a").unwrap(), results(&["Apple", "Abacus"]));
        assert_eq!(session.cache().previous_query(), "a");
        assert_eq!(session.displayed_results(), results(&["Abacus"]));
        let mut doc = doc;
        session.finalize(&mut doc);
    }

    #[test]
    fn test_failed_search_keeps_previous_results() {
        let mut doc = plain_doc();
        let mut session = open(&doc, LinkEditOptions::new().with_search(no_results));
        type_and_resolve(&mut session, "gu", results(&["Guide"]));
        session.set_value("gui");
        session.take_deferred();
        session.complete_search(SearchOutcome {
            query: "gui".to_string(),
            result: Err(SearchError::Provider("timeout".to_string())),
        });
        assert_eq!(session.displayed_results(), results(&["Guide"]));
        session.finalize(&mut doc);
    }

    #[test]
    fn test_no_search_without_provider_or_query() {
        let mut doc = plain_doc();
        let mut session = open(&doc, LinkEditOptions::new());
        session.set_value("anything");
        assert!(session.take_deferred().is_empty());

        let mut session2 = open(&doc, LinkEditOptions::new().with_search(no_results));
        session2.set_value("   ");
        assert!(session2.take_deferred().is_empty());
        session.finalize(&mut doc);
        session2.finalize(&mut doc);
    }

    #[test]
    fn test_create_row_visibility() {
        let mut doc = linked_doc("Roadmap");
        let mut session = open(&doc, LinkEditOptions::new().with_create(no_create));
        // Title equals the initial href
        assert!(!session.show_create_link(&doc));

        session.set_value("HTTPS://example.com");
        assert!(!session.show_create_link(&doc));

        session.set_value("Roadmap 2025");
        assert!(session.show_create_link(&doc));
        assert!(session.show_results(&doc));

        // Empty input falls back to the selected text
        session.set_value("");
        assert_eq!(session.suggested_title(&doc), "docs");
        assert!(session.show_create_link(&doc));

        let plain = open(&doc, LinkEditOptions::new());
        assert!(!plain.show_create_link(&doc));
        assert!(!plain.show_results(&doc));

        session.finalize(&mut doc);
        plain.finalize(&mut doc);
    }

    #[test]
    fn test_click_result_and_hover() {
        let mut doc = plain_doc();
        let mut session = open(&doc, LinkEditOptions::new().with_search(no_results));
        type_and_resolve(&mut session, "g", results(&["Guide", "Glossary"]));

        session.hover(&doc, 1);
        assert_eq!(session.focused_index(&doc), 1);
        session.hover(&doc, 7);
        assert_eq!(session.focused_index(&doc), 1);

        assert!(!session.select_result(&mut doc, 5));
        assert!(session.select_result(&mut doc, 0));
        assert_eq!(doc.link_at(9).unwrap().mark.href, "/doc/guide");
        assert_eq!(doc.selection(), TextRange::caret(12));
        session.finalize(&mut doc);
    }

    #[test]
    fn test_open_link_uses_initial_href() {
        let doc = linked_doc("https://a.com");
        let opened = Rc::new(RefCell::new(Vec::new()));
        let log = opened.clone();
        let mut session = open(
            &doc,
            LinkEditOptions::new().on_open(move |href| log.borrow_mut().push(href.to_string())),
        );
        session.set_value("edited.com");
        assert!(session.open_link());
        session.set_value("");
        assert!(!session.open_link());
        assert_eq!(*opened.borrow(), vec!["https://a.com".to_string()]);
        let mut doc = doc;
        session.finalize(&mut doc);
    }

    #[test]
    fn test_open_link_without_initial_href_uses_typed_value() {
        let mut doc = plain_doc();
        let opened = Rc::new(RefCell::new(Vec::new()));
        let log = opened.clone();
        let mut session = open(
            &doc,
            LinkEditOptions::new().on_open(move |href| log.borrow_mut().push(href.to_string())),
        );
        assert!(!session.open_link());
        session.set_value(" acme.com/docs ");
        assert!(session.open_link());
        session.set_value("/guide");
        assert!(session.open_link());
        assert_eq!(
            *opened.borrow(),
            vec!["https://acme.com/docs".to_string(), "/guide".to_string()]
        );
        session.handle_key(&mut doc, Key::Escape.into());
        session.finalize(&mut doc);
    }
}
