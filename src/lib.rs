// Library exports for piki-link

pub mod bridge;
pub mod config;
pub mod editor;
pub mod host;
pub mod logging;
pub mod markdown;
pub mod marked_document;
pub mod navigation;
pub mod pages;
pub mod replay;
pub mod search;
pub mod session;
pub mod url;
pub mod view;

pub use editor::{LinkEditor, ToastKind};
pub use host::{LinkHost, LinkMark, LinkSpan, TextRange, Transaction};
pub use marked_document::MarkedDocument;
pub use navigation::{Key, KeyPress};
pub use search::{SearchCache, SearchResult};
pub use session::{LinkEditOptions, LinkEditSession, LinkTarget, Reconciliation};
pub use url::normalize_href;
pub use view::LinkEditorView;
