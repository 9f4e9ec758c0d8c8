//! Navigation controller for the test case agent front end
//!
//! Three pages (input, scenario selection, results) with their state mirrored
//! into browser history so back/forward restores what was on screen. Nothing
//! here touches the DOM: the wasm crate supplies a [`PageView`] and a
//! [`HistoryBackend`], while [`HeadlessView`] and [`MemoryHistory`] let the
//! same logic run natively.

pub mod controller;
pub mod error;
pub mod export;
pub mod history;
pub mod listener;
pub mod request;
pub mod selection;
pub mod session;
pub mod state;
pub mod view;

pub use controller::PageController;
pub use error::NavigationError;
pub use export::{build_export, ExportFile, ExportScope};
pub use history::{HistoryBackend, HistoryWrite, MemoryHistory};
pub use listener::{decode_state, handle_pop_state};
pub use request::{classify_response, AnalysisFailure, RequestGuard, RequestKind, REQUEST_TIMEOUT_MS};
pub use selection::{AcceptedSet, SelectionSet};
pub use session::Session;
pub use state::{NavigationState, Page};
pub use view::{Frame, HeadlessView, PageView};
