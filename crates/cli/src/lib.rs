//! Batch run orchestration for dossier.
//!
//! The [`RunController`] drives one batch: checkpoint in, pages fetched and
//! extracted one at a time, records out, checkpoint (or completion record)
//! persisted. The `dossier` binary wires it to configuration, the SQLite
//! state store and a page fetcher.

pub mod input;
pub mod run;

pub use input::{load_url_list, parse_url_list};
pub use run::{FETCH_GRACE, RunController, RunOutcome, RunSettings, RunSummary, UrlState};
