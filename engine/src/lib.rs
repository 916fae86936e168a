//! # Folio Engine
//!
//! Form state and validation for Folio forms.
//!
//! A [`FormEngine`] owns the values of one logical form, the error map shown
//! next to its inputs, and the flag that decides whether typing re-validates.
//! It has no knowledge of rendering: callers register fields, forward change
//! and submit events, and read the resulting state back.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine only transitions in-memory state
//! - **Synchronous**: every event is a complete state transition
//! - **Typed rules**: validation rules are declared with [`Rule`], not
//!   discovered from markup
//!
//! ## Lifecycle of a form
//!
//! 1. Fields are registered with [`FormEngine::register`]. Registration is
//!    idempotent and hands out a [`FieldBinding`].
//! 2. Change events update values. Until the first submit attempt nothing is
//!    validated.
//! 3. The first [`FormEngine::on_submit`] *arms* validation and checks every
//!    registered field. All invalid fields get an error at once.
//! 4. From then on each change re-validates the field that changed.
//! 5. [`FormEngine::reset`] clears errors, disarms and restores values.
//!
//! ## Quick Start
//!
//! ```rust
//! use folio_engine::{FormEngine, RuleSet, SubmitEvent, SubmitOutcome};
//!
//! let mut form = FormEngine::without_handler();
//! let title = form.register("title", RuleSet::new().required("Require"));
//!
//! // Not armed yet: no errors while typing.
//! title.on_change(&mut form, "");
//! assert!(form.errors().is_empty());
//!
//! let outcome = form.on_submit(&mut SubmitEvent::new());
//! assert!(matches!(outcome, SubmitOutcome::Rejected(_)));
//! assert_eq!(form.error("title"), Some("Require"));
//!
//! // Armed: the error clears as soon as the value becomes valid.
//! title.on_change(&mut form, "Dune");
//! assert!(form.errors().is_empty());
//! ```

pub mod error;
pub mod event;
pub mod form;
pub mod rule;
pub mod snapshot;

pub use error::{Error, FieldError};
pub use event::{ChangeEvent, SubmitEvent};
pub use form::{FieldBinding, FormEngine, SubmitHandler, SubmitOutcome, SubscriptionId};
pub use rule::{is_valid_email, Rule, RuleKind, RuleSet};
pub use snapshot::{FormSnapshot, SNAPSHOT_FORMAT_VERSION};

use std::collections::HashMap;

/// Type aliases for clarity
pub type FieldName = String;
pub type FieldValues = HashMap<FieldName, String>;
pub type ErrorMap = HashMap<FieldName, String>;
