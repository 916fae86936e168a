//! FormEngine - the per-form state container.
//!
//! The engine owns field values, the armed flag and the error map of one
//! logical form. All methods are synchronous transitions on `&mut self`;
//! subscribers get a [`FormSnapshot`] after each one.

use crate::{
    error::Result, ChangeEvent, Error, ErrorMap, FieldError, FieldName, FieldValues,
    FormSnapshot, Rule, RuleSet, SubmitEvent,
};
use std::collections::HashMap;

/// Called with the current values on a fully valid submit.
pub type SubmitHandler = Box<dyn FnMut(&FieldValues, &SubmitEvent) + Send>;

type Listener = Box<dyn FnMut(&FormSnapshot) + Send>;

/// Handle returned by [`FormEngine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Every field passed; the handler was called with these values.
    Submitted(FieldValues),
    /// At least one field failed. One entry per failing field, in
    /// registration order.
    Rejected(Vec<FieldError>),
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

/// What [`FormEngine::register`] hands out for one field.
///
/// The binding only holds the field's identifier, so it stays valid across
/// [`FormEngine::reset`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldBinding {
    id: FieldName,
}

impl FieldBinding {
    /// The field identifier, used to correlate change events with the field.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Forward a change of this field's value to the engine.
    pub fn on_change(&self, form: &mut FormEngine, value: impl Into<String>) {
        form.on_change(self.change_event(value));
    }

    /// Build the change event for a new value without applying it.
    pub fn change_event(&self, value: impl Into<String>) -> ChangeEvent {
        ChangeEvent::new(self.id.clone(), value)
    }
}

/// Form state and validation for one logical form.
pub struct FormEngine {
    /// Values given at construction, restored by `reset(None)`
    initial: Option<FieldValues>,
    values: FieldValues,
    /// Registered field names, in registration order
    fields: Vec<FieldName>,
    rules: HashMap<FieldName, RuleSet>,
    errors: ErrorMap,
    /// Set by the first submit attempt, cleared by reset
    armed: bool,
    handler: Option<SubmitHandler>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormEngine")
            .field("values", &self.values)
            .field("fields", &self.fields)
            .field("errors", &self.errors)
            .field("armed", &self.armed)
            .field("has_handler", &self.handler.is_some())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for FormEngine {
    fn default() -> Self {
        Self::without_handler()
    }
}

impl FormEngine {
    /// Create an engine that calls `handler` on every valid submit.
    pub fn new<F>(handler: F) -> Self
    where
        F: FnMut(&FieldValues, &SubmitEvent) + Send + 'static,
    {
        let mut form = Self::without_handler();
        form.handler = Some(Box::new(handler));
        form
    }

    /// Create an engine with no submit handler. Submits still arm validation
    /// and report a [`SubmitOutcome`].
    pub fn without_handler() -> Self {
        Self {
            initial: None,
            values: HashMap::new(),
            fields: Vec::new(),
            rules: HashMap::new(),
            errors: HashMap::new(),
            armed: false,
            handler: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Builder-style method to seed initial values.
    ///
    /// The map is also what `reset(None)` restores.
    pub fn with_initial_values(mut self, initial: FieldValues) -> Self {
        self.values = initial.clone();
        self.initial = Some(initial);
        self.fill_registered();
        self
    }

    /// Replace the values later resets fall back to.
    ///
    /// Current values are left alone.
    pub fn set_initial_values(&mut self, initial: FieldValues) {
        self.initial = Some(initial);
    }

    /// Replace the submit handler.
    pub fn set_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&FieldValues, &SubmitEvent) + Send + 'static,
    {
        self.handler = Some(Box::new(handler));
    }

    /// Register a field and declare its rules.
    ///
    /// The first registration creates the field's value (`""` unless the
    /// initial values supplied one). Registering again never touches the
    /// value; it only replaces the declared rules and returns the binding.
    pub fn register(&mut self, name: impl Into<FieldName>, rules: RuleSet) -> FieldBinding {
        let name = name.into();
        if name.is_empty() {
            tracing::warn!("registering a field with an empty name");
        }

        let mut changed = false;
        if !self.values.contains_key(&name) {
            self.values.insert(name.clone(), String::new());
            changed = true;
        }
        if !self.rules.contains_key(&name) {
            self.fields.push(name.clone());
            changed = true;
        }
        self.rules.insert(name.clone(), rules);

        if changed {
            tracing::trace!(field = %name, "field registered");
            self.publish();
        }

        FieldBinding { id: name }
    }

    /// Handle a change event.
    ///
    /// The value is stored first; when armed, the changed field alone is then
    /// re-validated. Other fields' errors are left as they are.
    pub fn on_change(&mut self, event: ChangeEvent) {
        let ChangeEvent { field_id, value } = event;
        self.values.insert(field_id.clone(), value);

        if self.armed {
            let valid = validate_field(&self.values, &self.rules, &mut self.errors, &field_id);
            tracing::trace!(field = %field_id, valid, "field re-validated");
        }

        self.publish();
    }

    /// Handle a submit attempt.
    ///
    /// Arms validation, then validates every registered field. Every field is
    /// checked even after one has failed, so all invalid fields carry an error
    /// afterwards. The handler runs only when all of them pass.
    pub fn on_submit(&mut self, event: &mut SubmitEvent) -> SubmitOutcome {
        event.prevent_default();
        self.armed = true;

        let mut valid = true;
        for name in &self.fields {
            valid &= validate_field(&self.values, &self.rules, &mut self.errors, name);
        }

        let outcome = if valid {
            tracing::debug!(fields = self.fields.len(), "form submitted");
            if let Some(handler) = self.handler.as_mut() {
                handler(&self.values, &*event);
            }
            SubmitOutcome::Submitted(self.values.clone())
        } else {
            let errors: Vec<FieldError> = self
                .fields
                .iter()
                .filter_map(|name| {
                    self.errors
                        .get(name)
                        .map(|message| FieldError::new(name.clone(), message.clone()))
                })
                .collect();
            tracing::debug!(
                fields = self.fields.len(),
                failing = errors.len(),
                "form submit rejected"
            );
            SubmitOutcome::Rejected(errors)
        };

        self.publish();
        outcome
    }

    /// Clear errors, disarm validation and restore values.
    ///
    /// Values become `new_initial` if given, else the construction-time
    /// initial values, else empty. Registered fields missing from that map
    /// read as `""`. Bindings stay valid.
    pub fn reset(&mut self, new_initial: Option<FieldValues>) {
        self.errors.clear();
        self.armed = false;
        self.values = new_initial
            .or_else(|| self.initial.clone())
            .unwrap_or_default();
        self.fill_registered();

        tracing::debug!(fields = self.fields.len(), "form reset");
        self.publish();
    }

    /// Replace the state with a snapshot's.
    ///
    /// Fields named by the snapshot but not registered here are registered
    /// without rules. Rules of already registered fields are kept. An armed
    /// snapshot must carry exactly the errors those rules give its values.
    pub fn import_state(&mut self, snapshot: FormSnapshot) -> Result<()> {
        snapshot.validate()?;

        if snapshot.armed {
            for name in &snapshot.fields {
                let value = snapshot.values.get(name).map(String::as_str).unwrap_or("");
                let expected = self
                    .rules
                    .get(name)
                    .and_then(|set| set.first_failure(value))
                    .map(Rule::message);
                if snapshot.errors.get(name).map(String::as_str) != expected {
                    return Err(Error::InvalidSnapshot(format!(
                        "error for {} does not match its rules",
                        name
                    )));
                }
            }
        }

        for name in &snapshot.fields {
            if !self.rules.contains_key(name) {
                self.fields.push(name.clone());
                self.rules.insert(name.clone(), RuleSet::new());
            }
        }
        self.values = snapshot.values.into_iter().collect();
        self.errors = snapshot.errors.into_iter().collect();
        self.armed = snapshot.armed;
        self.fill_registered();

        self.publish();
        Ok(())
    }

    /// Current values of all known fields.
    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Current error map.
    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    /// Whether change events currently re-validate.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether the error map is empty.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Registered fields, in registration order.
    pub fn fields(&self) -> &[FieldName] {
        &self.fields
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn rules(&self, name: &str) -> Option<&RuleSet> {
        self.rules.get(name)
    }

    pub fn initial_values(&self) -> Option<&FieldValues> {
        self.initial.as_ref()
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot::new(&self.values, &self.errors, self.armed, &self.fields)
    }

    /// Receive a snapshot after every state transition.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&FormSnapshot) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn fill_registered(&mut self) {
        for name in &self.fields {
            self.values.entry(name.clone()).or_default();
        }
    }

    fn publish(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, listener) in self.listeners.iter_mut() {
            listener(&snapshot);
        }
    }
}

/// Run one field's rules and update its error entry. Returns whether it passed.
///
/// A field without rules passes.
fn validate_field(
    values: &FieldValues,
    rules: &HashMap<FieldName, RuleSet>,
    errors: &mut ErrorMap,
    name: &str,
) -> bool {
    let value = values.get(name).map(String::as_str).unwrap_or("");
    let failure = rules
        .get(name)
        .and_then(|set| set.first_failure(value))
        .map(|rule| rule.message().to_string());

    match failure {
        Some(message) => {
            errors.insert(name.to_string(), message);
            false
        }
        None => {
            errors.remove(name);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn required() -> RuleSet {
        RuleSet::new().required("Require")
    }

    fn counting_form() -> (FormEngine, Arc<Mutex<Vec<FieldValues>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let form = FormEngine::new(move |values, _event| {
            sink.lock().unwrap().push(values.clone());
        });
        (form, calls)
    }

    #[test]
    fn register_creates_empty_value() {
        let mut form = FormEngine::without_handler();
        let binding = form.register("title", required());

        assert_eq!(binding.id(), "title");
        assert_eq!(form.value("title"), Some(""));
        assert_eq!(form.fields(), &["title".to_string()]);
    }

    #[test]
    fn register_uses_initial_value() {
        let initial = HashMap::from([("title-1".to_string(), "Book 1".to_string())]);
        let mut form = FormEngine::without_handler().with_initial_values(initial);
        form.register("title-1", required());

        assert_eq!(form.value("title-1"), Some("Book 1"));
    }

    #[test]
    fn register_is_idempotent() {
        let mut form = FormEngine::without_handler();
        let binding = form.register("title", required());
        binding.on_change(&mut form, "Dune");

        let again = form.register("title", required());
        assert_eq!(again, binding);
        assert_eq!(form.value("title"), Some("Dune"));
        assert_eq!(form.fields().len(), 1);
    }

    #[test]
    fn reregister_replaces_rules() {
        let mut form = FormEngine::without_handler();
        form.register("number", required());
        form.register("number", required().min_length(3, "Too short"));

        let rules = form.rules("number").unwrap();
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn changes_before_submit_do_not_validate() {
        let mut form = FormEngine::without_handler();
        let title = form.register("title", required());

        title.on_change(&mut form, "x");
        title.on_change(&mut form, "");

        assert!(!form.is_armed());
        assert!(form.errors().is_empty());
        assert_eq!(form.value("title"), Some(""));
    }

    #[test]
    fn submit_arms_even_when_rejected() {
        let (mut form, calls) = counting_form();
        form.register("title", required());

        let mut event = SubmitEvent::new();
        let outcome = form.on_submit(&mut event);

        assert!(event.default_prevented());
        assert!(form.is_armed());
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected(vec![FieldError::new("title", "Require")])
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn submit_evaluates_every_field() {
        let mut form = FormEngine::without_handler();
        form.register("title", required());
        form.register("number", required());
        form.register("email", RuleSet::new().email("Bad email"));

        let outcome = form.on_submit(&mut SubmitEvent::new());

        let SubmitOutcome::Rejected(errors) = outcome else {
            panic!("expected rejection");
        };
        let failing: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(failing, vec!["title", "number", "email"]);
        assert_eq!(form.errors().len(), 3);
    }

    #[test]
    fn armed_changes_revalidate_only_that_field() {
        let mut form = FormEngine::without_handler();
        let title = form.register("title", required());
        let number = form.register("number", required());
        form.on_submit(&mut SubmitEvent::new());
        assert_eq!(form.errors().len(), 2);

        title.on_change(&mut form, "Dune");
        assert_eq!(form.error("title"), None);
        assert_eq!(form.error("number"), Some("Require"));

        title.on_change(&mut form, "");
        assert_eq!(form.error("title"), Some("Require"));

        number.on_change(&mut form, "3");
        assert_eq!(form.error("number"), None);
        assert_eq!(form.error("title"), Some("Require"));
    }

    #[test]
    fn valid_submit_calls_handler_with_values() {
        let (mut form, calls) = counting_form();
        let title = form.register("title", required());
        let number = form.register("number", required());
        title.on_change(&mut form, "Dune");
        number.on_change(&mut form, "4");

        let outcome = form.on_submit(&mut SubmitEvent::new());
        assert!(outcome.is_submitted());
        assert!(form.is_valid());

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["title"], "Dune");
        assert_eq!(calls[0]["number"], "4");
    }

    #[test]
    fn handler_sees_the_submitted_event() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let mut form = FormEngine::new(move |_values, event: &SubmitEvent| {
            *sink.lock().unwrap() = Some((event.source.clone(), event.default_prevented()));
        });
        form.register("note", RuleSet::new());

        form.on_submit(&mut SubmitEvent::from_source("save"));
        assert_eq!(
            *seen.lock().unwrap(),
            Some((Some("save".to_string()), true))
        );
    }

    #[test]
    fn fields_without_rules_always_pass() {
        let (mut form, calls) = counting_form();
        form.register("note", RuleSet::new());

        assert!(form.on_submit(&mut SubmitEvent::new()).is_submitted());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn change_for_unregistered_field_stores_value() {
        let mut form = FormEngine::without_handler();
        form.register("title", required());
        form.on_submit(&mut SubmitEvent::new());

        form.on_change(ChangeEvent::new("stray", "x"));
        assert_eq!(form.value("stray"), Some("x"));
        assert_eq!(form.error("stray"), None);
        assert!(!form.is_registered("stray"));
    }

    #[test]
    fn reset_restores_initial_and_disarms() {
        let initial = HashMap::from([
            ("title-7".to_string(), "Book 7".to_string()),
            ("number-7".to_string(), "7".to_string()),
        ]);
        let mut form = FormEngine::without_handler().with_initial_values(initial.clone());
        let title = form.register("title-7", required());
        form.register("number-7", required());

        title.on_change(&mut form, "");
        form.on_submit(&mut SubmitEvent::new());
        assert_eq!(form.error("title-7"), Some("Require"));

        form.reset(None);
        assert_eq!(form.values(), &initial);
        assert!(form.errors().is_empty());
        assert!(!form.is_armed());

        // Bindings handed out before the reset keep working, unarmed.
        title.on_change(&mut form, "");
        assert!(form.errors().is_empty());
    }

    #[test]
    fn reset_with_new_values() {
        let mut form = FormEngine::without_handler();
        form.register("title", required());
        form.register("number", required());

        form.reset(Some(HashMap::from([(
            "title".to_string(),
            "Fresh".to_string(),
        )])));

        assert_eq!(form.value("title"), Some("Fresh"));
        assert_eq!(form.value("number"), Some(""));
        // The construction-time map is still what a plain reset restores.
        form.reset(None);
        assert_eq!(form.value("title"), Some(""));
    }

    #[test]
    fn reset_is_idempotent() {
        let mut form = FormEngine::without_handler();
        form.register("title", required());
        form.on_submit(&mut SubmitEvent::new());

        form.reset(None);
        let once = form.snapshot();
        form.reset(None);
        assert_eq!(form.snapshot(), once);
    }

    #[test]
    fn subscribers_receive_snapshots() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut form = FormEngine::without_handler();
        let id = form.subscribe(move |snapshot| sink.lock().unwrap().push(snapshot.clone()));

        let title = form.register("title", required());
        form.register("title", required());
        title.on_change(&mut form, "");
        form.on_submit(&mut SubmitEvent::new());

        {
            let seen = seen.lock().unwrap();
            // register, change, submit; the repeat registration is silent
            assert_eq!(seen.len(), 3);
            let last = seen.last().unwrap();
            assert!(last.armed);
            assert_eq!(last.errors.get("title").map(String::as_str), Some("Require"));
        }

        assert!(form.unsubscribe(id));
        assert!(!form.unsubscribe(id));
        form.reset(None);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn import_state_round_trips() {
        let mut form = FormEngine::without_handler();
        let title = form.register("title", required());
        form.on_submit(&mut SubmitEvent::new());
        title.on_change(&mut form, "");
        let snapshot = form.snapshot();

        let mut restored = FormEngine::without_handler();
        restored.register("title", required());
        restored.import_state(snapshot.clone()).unwrap();

        assert_eq!(restored.snapshot(), snapshot);
        assert!(restored.is_armed());

        // Still armed after import: fixing the value clears the error.
        restored.on_change(ChangeEvent::new("title", "Dune"));
        assert!(restored.is_valid());
    }

    #[test]
    fn import_state_rejects_inconsistent_snapshot() {
        let mut form = FormEngine::without_handler();
        form.register("title", required());
        form.on_submit(&mut SubmitEvent::new());

        let mut snapshot = form.snapshot();
        snapshot.armed = false;

        let mut other = FormEngine::without_handler();
        assert!(other.import_state(snapshot).is_err());
        assert!(other.fields().is_empty());
    }

    #[test]
    fn import_state_rejects_errors_the_rules_do_not_give() {
        let mut form = FormEngine::without_handler();
        form.register("title", required());
        form.register("number", required());
        form.on_submit(&mut SubmitEvent::new());
        let before = form.snapshot();

        let mut wrong_message = before.clone();
        wrong_message
            .values
            .insert("title".to_string(), "Valid Title".to_string());
        wrong_message
            .errors
            .insert("title".to_string(), "Bogus message".to_string());
        assert!(matches!(
            form.import_state(wrong_message),
            Err(Error::InvalidSnapshot(_))
        ));

        let mut missing_error = before.clone();
        missing_error.errors.remove("number");
        assert!(form.import_state(missing_error).is_err());

        let mut unruled_error = before.clone();
        unruled_error.fields.push("isbn".to_string());
        unruled_error
            .values
            .insert("isbn".to_string(), String::new());
        unruled_error
            .errors
            .insert("isbn".to_string(), "Require".to_string());
        assert!(form.import_state(unruled_error).is_err());

        assert_eq!(form.snapshot(), before);
    }

    #[test]
    fn set_initial_values_changes_reset_target_only() {
        let initial = HashMap::from([("title-2".to_string(), "Book 2".to_string())]);
        let mut form = FormEngine::without_handler().with_initial_values(initial);
        form.register("title-2", required());

        form.on_change(ChangeEvent::new("title-2", "Renamed"));
        form.set_initial_values(HashMap::from([(
            "title-2".to_string(),
            "Renamed".to_string(),
        )]));
        assert_eq!(form.value("title-2"), Some("Renamed"));

        form.on_change(ChangeEvent::new("title-2", "typo"));
        form.reset(None);
        assert_eq!(form.value("title-2"), Some("Renamed"));
    }
}
