//! Property tests for the arming and reset invariants.

use folio_engine::{ChangeEvent, FieldValues, FormEngine, RuleSet, SubmitEvent};
use proptest::prelude::*;
use std::collections::HashMap;

const FIELDS: [&str; 3] = ["title", "number", "email"];

fn rules_for(name: &str) -> RuleSet {
    match name {
        "title" => RuleSet::new().required("Require").max_length(8, "Too long"),
        "number" => RuleSet::new().required("Require").min_length(2, "Too short"),
        _ => RuleSet::new().email("Bad email"),
    }
}

fn build_form(initial: Option<FieldValues>) -> FormEngine {
    let form = FormEngine::without_handler();
    let mut form = match initial {
        Some(initial) => form.with_initial_values(initial),
        None => form,
    };
    for name in FIELDS {
        form.register(name, rules_for(name));
    }
    form
}

fn change() -> impl Strategy<Value = ChangeEvent> {
    (0..FIELDS.len(), "[a-z@. ]{0,12}")
        .prop_map(|(idx, value)| ChangeEvent::new(FIELDS[idx], value))
}

fn initial_values() -> impl Strategy<Value = FieldValues> {
    ("[a-z]{0,10}", "[0-9]{0,4}", "[a-z@.]{0,10}").prop_map(|(title, number, email)| {
        HashMap::from([
            ("title".to_string(), title),
            ("number".to_string(), number),
            ("email".to_string(), email),
        ])
    })
}

proptest! {
    #[test]
    fn unarmed_changes_never_produce_errors(changes in prop::collection::vec(change(), 0..30)) {
        let mut form = build_form(None);
        for event in changes {
            form.on_change(event);
            prop_assert!(form.errors().is_empty());
            prop_assert!(!form.is_armed());
        }
    }

    #[test]
    fn armed_change_touches_only_the_changed_field(
        before in prop::collection::vec(change(), 0..10),
        event in change(),
    ) {
        let mut form = build_form(None);
        for e in before {
            form.on_change(e);
        }
        form.on_submit(&mut SubmitEvent::new());

        let before_errors = form.errors().clone();
        let changed = event.field_id.clone();
        form.on_change(event);

        for name in FIELDS.iter().filter(|n| **n != changed) {
            prop_assert_eq!(form.error(name), before_errors.get(*name).map(String::as_str));
        }
    }

    #[test]
    fn submit_reports_every_invalid_field(changes in prop::collection::vec(change(), 0..20)) {
        let mut form = build_form(None);
        for event in changes {
            form.on_change(event);
        }
        form.on_submit(&mut SubmitEvent::new());

        for name in FIELDS {
            let value = form.value(name).unwrap_or("");
            let rules = rules_for(name);
            let expected = rules.validate(value).err();
            prop_assert_eq!(form.error(name), expected);
        }
    }

    #[test]
    fn reset_restores_construction_values(
        initial in initial_values(),
        changes in prop::collection::vec(change(), 0..20),
        submit_first in any::<bool>(),
    ) {
        let mut form = build_form(Some(initial.clone()));
        for event in changes {
            form.on_change(event);
        }
        if submit_first {
            form.on_submit(&mut SubmitEvent::new());
        }

        form.reset(None);
        prop_assert_eq!(form.values(), &initial);
        prop_assert!(form.errors().is_empty());
        prop_assert!(!form.is_armed());

        let once = form.snapshot();
        form.reset(None);
        prop_assert_eq!(form.snapshot(), once);
    }

    #[test]
    fn reregistering_keeps_entered_values(changes in prop::collection::vec(change(), 1..20)) {
        let mut form = build_form(None);
        for event in changes {
            form.on_change(event);
        }
        let values = form.values().clone();

        for name in FIELDS {
            form.register(name, rules_for(name));
        }
        prop_assert_eq!(form.values(), &values);
    }
}
