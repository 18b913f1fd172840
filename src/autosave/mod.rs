//! Debounced autosave for the phase editor.
//!
//! `DraftState` and `StatusTracker` are plain state machines; the controller
//! wires them to a [`ContentStore`] and a [`runtime::Runtime`] (browser timers in the
//! app, a manual clock in tests).

mod controller;
mod draft;
pub(crate) mod runtime;
mod status;
mod store;

pub(crate) use controller::{AutosaveConfig, AutosaveController, SaveEvent};
pub(crate) use runtime::BrowserRuntime;
pub(crate) use status::SaveStatus;
pub(crate) use store::{ContentStore, Document, DocumentUpdate, StoreError};
