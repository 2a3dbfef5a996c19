// Link editor driver
// Couples a session with a shared host document and runs the session's
// deferred searches and creates on the current tokio `LocalSet`.

use crate::bridge::{self, CreateResolution, PendingCreate};
use crate::config::Dictionary;
use crate::host::LinkHost;
use crate::navigation::KeyPress;
use crate::search::PendingSearch;
use crate::session::{Deferred, LinkEditOptions, LinkEditSession, LinkTarget, Reconciliation};
use crate::view::LinkEditorView;
use std::cell::RefCell;
use std::rc::Rc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

type ToastFn = Rc<dyn Fn(&str, ToastKind)>;

/// An open link popover.
///
/// All methods that can queue work spawn it with
/// [`tokio::task::spawn_local`], so the editor must be driven from inside a
/// [`tokio::task::LocalSet`]. Dropping the editor closes it.
pub struct LinkEditor<H: LinkHost + 'static> {
    host: Rc<RefCell<H>>,
    session: Rc<RefCell<Option<LinkEditSession>>>,
    dictionary: Rc<Dictionary>,
    on_toast: Option<ToastFn>,
    tasks: RefCell<Vec<JoinHandle<()>>>,
}

impl<H: LinkHost + 'static> LinkEditor<H> {
    pub fn open(
        host: Rc<RefCell<H>>,
        target: LinkTarget,
        options: LinkEditOptions,
        dictionary: Rc<Dictionary>,
    ) -> Self {
        let session = LinkEditSession::open(target, options);
        LinkEditor {
            host,
            session: Rc::new(RefCell::new(Some(session))),
            dictionary,
            on_toast: None,
            tasks: RefCell::new(Vec::new()),
        }
    }

    /// Open on the link under the host's selection, or on the selection
    /// itself. `None` when there is nothing to link.
    pub fn open_at_selection(
        host: Rc<RefCell<H>>,
        options: LinkEditOptions,
        dictionary: Rc<Dictionary>,
    ) -> Option<Self> {
        let target = LinkTarget::from_selection(&*host.borrow())?;
        Some(Self::open(host, target, options, dictionary))
    }

    /// Install the toast handler used to report failed creates
    pub fn on_toast(mut self, f: impl Fn(&str, ToastKind) + 'static) -> Self {
        self.on_toast = Some(Rc::new(f));
        self
    }

    pub fn is_open(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// Whether the session already saved, created or removed a link; the
    /// popover should be closed then
    pub fn is_committed(&self) -> bool {
        self.session
            .borrow()
            .as_ref()
            .is_some_and(LinkEditSession::is_discarded)
    }

    pub fn value(&self) -> Option<String> {
        self.session
            .borrow()
            .as_ref()
            .map(|session| session.value().to_string())
    }

    /// Run `f` against the open session and the host document
    pub fn with_session<R>(&self, f: impl FnOnce(&LinkEditSession, &H) -> R) -> Option<R> {
        let session = self.session.borrow();
        let host = self.host.borrow();
        session.as_ref().map(|session| f(session, &*host))
    }

    /// The input field changed
    pub fn input(&self, value: &str) {
        if let Some(session) = self.session.borrow_mut().as_mut() {
            session.set_value(value);
        }
        self.run_deferred();
    }

    /// A key was pressed; returns whether the popover consumed it
    pub fn key(&self, press: impl Into<KeyPress>) -> bool {
        let handled = self.update(|session, host| session.handle_key(host, press.into()));
        self.run_deferred();
        handled.unwrap_or(false)
    }

    pub fn hover(&self, index: usize) {
        self.update(|session, host| session.hover(host, index));
    }

    pub fn click_result(&self, index: usize) -> bool {
        self.update(|session, host| session.select_result(host, index))
            .unwrap_or(false)
    }

    pub fn click_create(&self) -> bool {
        let created = self.update(|session, host| session.select_create(host));
        self.run_deferred();
        created.unwrap_or(false)
    }

    pub fn click_remove(&self) {
        self.update(|session, host| session.remove_link(host));
    }

    pub fn click_open(&self) -> bool {
        self.session
            .borrow_mut()
            .as_mut()
            .is_some_and(LinkEditSession::open_link)
    }

    pub fn view(&self) -> Option<LinkEditorView> {
        let dictionary = Rc::clone(&self.dictionary);
        self.with_session(|session, host| LinkEditorView::build(session, host, &dictionary))
    }

    /// Wait until every search and create spawned so far has finished
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.tasks.borrow_mut());
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(err) = handle.await {
                    warn!(error = %err, "link editor task failed");
                }
            }
        }
    }

    /// Close the popover, reconciling unsaved edits. Only the first call
    /// does anything.
    pub fn close(&self) -> Option<Reconciliation> {
        let session = self.session.borrow_mut().take()?;
        let reconciliation = session.finalize(&mut *self.host.borrow_mut());
        debug!(?reconciliation, "link editor closed");
        Some(reconciliation)
    }

    fn update<R>(&self, f: impl FnOnce(&mut LinkEditSession, &mut dyn LinkHost) -> R) -> Option<R> {
        let mut session = self.session.borrow_mut();
        let session = session.as_mut()?;
        let mut host = self.host.borrow_mut();
        Some(f(session, &mut *host))
    }

    fn run_deferred(&self) {
        let deferred = match self.session.borrow_mut().as_mut() {
            Some(session) => session.take_deferred(),
            None => return,
        };
        for work in deferred {
            let handle = match work {
                Deferred::Search(pending) => self.spawn_search(pending),
                Deferred::Create(pending) => self.spawn_create(pending),
            };
            self.tasks.borrow_mut().push(handle);
        }
    }

    fn spawn_search(&self, pending: PendingSearch) -> JoinHandle<()> {
        let session = Rc::clone(&self.session);
        tokio::task::spawn_local(async move {
            let outcome = pending.resolve().await;
            match session.borrow_mut().as_mut() {
                Some(session) => session.complete_search(outcome),
                // The cache went away with the session
                None => debug!(query = %outcome.query, "search finished after close"),
            }
        })
    }

    fn spawn_create(&self, pending: PendingCreate) -> JoinHandle<()> {
        let host = Rc::clone(&self.host);
        let dictionary = Rc::clone(&self.dictionary);
        let toast = self.on_toast.clone();
        tokio::task::spawn_local(async move {
            let outcome = pending.resolve().await;
            let title = outcome.title.clone();
            let resolution = bridge::finish_create(&mut *host.borrow_mut(), outcome);
            match resolution {
                Ok(CreateResolution::Linked { href, replaced }) => {
                    debug!(title = %title, href = %href, replaced, "linked newly created document");
                }
                Ok(CreateResolution::Failed { error, .. }) => {
                    warn!(title = %title, error = %error, "creating linked document failed");
                    if let Some(toast) = &toast {
                        toast(&dictionary.create_link_error, ToastKind::Error);
                    }
                }
                Err(err) => warn!(title = %title, error = %err, "failed to update placeholder link"),
            }
        })
    }
}

impl<H: LinkHost + 'static> Drop for LinkEditor<H> {
    fn drop(&mut self) {
        let Some(session) = self.session.borrow_mut().take() else {
            return;
        };
        match self.host.try_borrow_mut() {
            Ok(mut host) => {
                session.finalize(&mut *host);
            }
            Err(_) => warn!("host document busy, link editor closed without reconciling"),
        }
    }
}
