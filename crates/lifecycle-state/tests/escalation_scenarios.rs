//! # Escalation Lifecycle Scenarios
//!
//! End-to-end behavior of the escalation machine through the public API:
//! the concrete scenarios, availability queries, and the atomicity of
//! rejected transitions.

use std::sync::Arc;

use lifecycle_core::{EntityId, FixedClock, SystemClock, Timestamp};
use lifecycle_state::{
    escalation_machine, Escalation, EscalationFields, EscalationStatus, HookContext, Select, StateMachine,
    TransitionArgs, TransitionError, ANY,
};
use proptest::prelude::*;

fn fixed(at: &str) -> Arc<FixedClock> {
    Arc::new(FixedClock(Timestamp::parse(at).unwrap()))
}

/// Drive a fresh entity into `status` through the machine itself.
fn entity_in(
    machine: &StateMachine<EscalationFields>,
    status: EscalationStatus,
    args: &TransitionArgs,
) -> Escalation {
    let entity = machine.new_entity(EscalationFields::default()).unwrap();
    machine.fire(&entity, status.event(), args).unwrap()
}

#[test]
fn resolve_without_arguments_stamps_now() {
    let machine = escalation_machine(Arc::new(SystemClock)).unwrap();
    let entity = machine.new_entity(EscalationFields::default()).unwrap();
    assert_eq!(entity.escalation_status(), Some(EscalationStatus::Triggered));

    let resolved = machine.fire(&entity, "resolve", &TransitionArgs::none()).unwrap();

    assert_eq!(resolved.escalation_status(), Some(EscalationStatus::Resolved));
    let resolved_at = resolved.resolved_at().expect("resolved_at is stamped");
    assert!(resolved_at.abs_diff_secs(&Timestamp::now()) <= 2);
}

#[test]
fn ignore_after_resolve_clears_resolved_at() {
    let machine = escalation_machine(fixed("2026-07-04T10:00:00Z")).unwrap();
    let t = Timestamp::parse("2026-07-03T18:45:00Z").unwrap();
    let resolved = entity_in(&machine, EscalationStatus::Resolved, &TransitionArgs::none().with(t));
    assert_eq!(resolved.resolved_at(), Some(t));

    let ignored = machine.fire(&resolved, "ignore", &TransitionArgs::none()).unwrap();

    assert_eq!(ignored.escalation_status(), Some(EscalationStatus::Ignored));
    assert_eq!(ignored.resolved_at(), None);
}

#[test]
fn undefined_event_leaves_entity_unchanged() {
    let machine = escalation_machine(fixed("2026-07-04T10:00:00Z")).unwrap();
    let entity = entity_in(&machine, EscalationStatus::Acknowledged, &TransitionArgs::none());
    let before = entity.clone();

    let err = machine.fire(&entity, "close", &TransitionArgs::none()).unwrap_err();

    assert!(matches!(
        err,
        TransitionError::NoSuchTransition { ref event, ref status }
            if event == "close" && status == "acknowledged"
    ));
    assert_eq!(entity, before);
}

#[test]
fn buggy_hook_is_caught_by_guard() {
    let mut machine = escalation_machine(fixed("2026-07-04T10:00:00Z")).unwrap();
    // Runs after the standard stamp hook and undoes it.
    machine
        .before_transition("resolved", |fields: &mut EscalationFields, _: &HookContext<'_>| {
            fields.resolved_at = None;
        })
        .unwrap();

    let entity = entity_in(&machine, EscalationStatus::Acknowledged, &TransitionArgs::none());
    let before = entity.clone();
    let err = machine.fire(&entity, "resolve", &TransitionArgs::none()).unwrap_err();

    let errors = err.validation_errors().expect("validation failure");
    assert_eq!(errors.messages(), vec!["resolved_at must be present"]);
    assert_eq!(errors.iter().next().unwrap().status, "resolved");
    assert_eq!(entity.escalation_status(), Some(EscalationStatus::Acknowledged));
    assert_eq!(entity, before);
}

#[test]
fn every_event_available_from_triggered() {
    let machine = escalation_machine(fixed("2026-07-04T10:00:00Z")).unwrap();
    let triggered = machine.status_by_name("triggered").unwrap();
    let events: Vec<String> = machine
        .events_available_from(triggered)
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(events, vec!["acknowledge", "ignore", "resolve", "trigger"]);
}

#[test]
fn any_sourced_events_reach_their_target_from_every_status() {
    let machine = escalation_machine(fixed("2026-07-04T10:00:00Z")).unwrap();
    for from in EscalationStatus::ALL {
        for to in EscalationStatus::ALL {
            let entity = entity_in(&machine, from, &TransitionArgs::none());
            let next = machine.fire(&entity, to.event(), &TransitionArgs::none()).unwrap();
            assert_eq!(next.escalation_status(), Some(to), "{from} --{}--> {to}", to.event());
            assert_eq!(next.resolved_at().is_some(), to == EscalationStatus::Resolved);
        }
    }
}

#[test]
fn name_ordinal_roundtrip_for_every_status() {
    let machine = escalation_machine(Arc::new(SystemClock)).unwrap();
    for status in machine.all_statuses() {
        let by_name = machine.status_by_name(status.name().as_str()).unwrap();
        let back = machine.status_by_ordinal(by_name.ordinal()).unwrap();
        assert_eq!(back.name(), status.name());
    }
}

/// Escalation variant where `resolve` has no self-transition.
fn strict_machine() -> StateMachine<EscalationFields> {
    let mut m = StateMachine::with_clock("strict_escalation", fixed("2026-07-04T10:00:00Z"));
    for status in EscalationStatus::ALL {
        m.register_status(status.name(), status.ordinal()).unwrap();
    }
    m.set_initial_status("triggered").unwrap();
    m.define_transition("trigger", ANY, "triggered").unwrap();
    m.define_transition("acknowledge", ["triggered"], "acknowledged").unwrap();
    m.define_transition("resolve", Select::except(["resolved"]), "resolved").unwrap();
    m.define_transition("ignore", ["triggered", "acknowledged"], "ignored").unwrap();
    m.before_transition("resolved", |f: &mut EscalationFields, ctx: &HookContext<'_>| {
        f.resolved_at = Some(ctx.timestamp_arg_or_now());
    })
    .unwrap();
    m.before_transition(Select::except(["resolved"]), |f: &mut EscalationFields, _: &HookContext<'_>| {
        f.resolved_at = None;
    })
    .unwrap();
    m.register_invariant("resolved", |f: &EscalationFields| f.resolved_at.is_some(), "resolved_at must be present")
        .unwrap();
    m
}

#[test]
fn second_resolve_is_rejected_without_partial_effects() {
    let machine = strict_machine();
    let first_at = Timestamp::parse("2026-07-01T00:00:00Z").unwrap();
    let entity = machine.new_entity(EscalationFields::default()).unwrap();
    let resolved = machine
        .fire(&entity, "resolve", &TransitionArgs::none().with(first_at))
        .unwrap();

    let later = Timestamp::parse("2026-07-02T00:00:00Z").unwrap();
    let err = machine
        .fire(&resolved, "resolve", &TransitionArgs::none().with(later))
        .unwrap_err();

    assert!(matches!(err, TransitionError::NoSuchTransition { .. }));
    assert_eq!(resolved.resolved_at(), Some(first_at));
    assert_eq!(resolved.transition_count(), 1);
}

proptest! {
    #[test]
    fn unmatched_events_never_mutate(
        from in prop::sample::select(EscalationStatus::ALL.to_vec()),
        event in prop_oneof![
            prop::sample::select(vec!["trigger", "acknowledge", "resolve", "ignore"]).prop_map(String::from),
            "[a-z][a-z_]{0,11}",
        ],
    ) {
        let machine = strict_machine();
        let entity = machine
            .restore_entity(
                EntityId::new(),
                from.ordinal(),
                EscalationFields {
                    resolved_at: (from == EscalationStatus::Resolved).then(Timestamp::now),
                },
                Timestamp::now(),
            )
            .unwrap();
        if machine.resolve(&event, entity.status()).is_ok() {
            return Ok(());
        }

        let before = entity.clone();
        let err = machine.fire(&entity, &event, &TransitionArgs::none()).unwrap_err();
        let is_no_such_transition = matches!(err, TransitionError::NoSuchTransition { .. });
        prop_assert!(is_no_such_transition);
        prop_assert_eq!(entity, before);
    }
}

#[test]
fn deserialized_entity_with_foreign_status_cannot_fire() {
    let machine = escalation_machine(fixed("2026-07-04T10:00:00Z")).unwrap();
    let entity = machine.new_entity(EscalationFields::default()).unwrap();
    let mut json = serde_json::to_value(&entity).unwrap();
    json["status"] = serde_json::json!({ "name": "closed", "ordinal": 99 });
    let foreign: Escalation = serde_json::from_value(json).unwrap();
    let before = foreign.clone();

    let err = machine.fire(&foreign, "resolve", &TransitionArgs::none()).unwrap_err();

    assert!(matches!(
        err,
        TransitionError::NoSuchTransition { ref status, .. } if status == "closed"
    ));
    assert_eq!(foreign, before);
    assert!(machine.events_available_from(foreign.status()).is_empty());
    assert!(machine.check_entity(&foreign).is_err());
}

#[test]
fn strict_machine_event_for() {
    let machine = strict_machine();
    assert_eq!(
        machine
            .status_event_for(EscalationStatus::Triggered, EscalationStatus::Ignored)
            .map(|e| e.as_str()),
        Some("ignore")
    );
    assert!(machine
        .status_event_for(EscalationStatus::Resolved, EscalationStatus::Ignored)
        .is_none());
}
