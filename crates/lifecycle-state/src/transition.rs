//! # Transition Table
//!
//! Answers "is this event valid from the current status, and where does it
//! lead?". Rules are plain data, kept in definition order.
//!
//! ## Conflict detection
//!
//! Rules sharing an event must have disjoint sources. Overlap is rejected
//! when the rule is defined, never resolved at fire time: an `any`-sourced
//! rule conflicts with every other rule for the same event, in either
//! definition order.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use lifecycle_core::EventName;

use crate::error::{ConfigError, TransitionError};
use crate::status::StatusValue;

/// The statuses a rule may fire from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Every registered status.
    Any,
    /// An explicit, non-empty set.
    Only(BTreeSet<StatusValue>),
}

impl Source {
    /// Whether a status is covered.
    pub fn covers(&self, status: &StatusValue) -> bool {
        match self {
            Self::Any => true,
            Self::Only(set) => set.contains(status),
        }
    }

    /// Whether two sources share at least one status.
    pub fn overlaps(&self, other: &Source) -> bool {
        match (self, other) {
            (Self::Any, _) | (_, Self::Any) => true,
            (Self::Only(a), Self::Only(b)) => !a.is_disjoint(b),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Only(set) => {
                let names: Vec<&str> = set.iter().map(|s| s.name().as_str()).collect();
                write!(f, "[{}]", names.join(", "))
            }
        }
    }
}

/// `(event, from, to)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    /// The event that fires this rule.
    pub event: EventName,
    /// Statuses the rule applies from.
    pub from: Source,
    /// The resulting status.
    pub to: StatusValue,
}

/// All transition rules of a machine.
#[derive(Debug, Clone, Default)]
pub struct TransitionTable {
    rules: Vec<TransitionRule>,
}

impl TransitionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptySource`] for an empty explicit source set, and
    /// [`ConfigError::ConflictingTransition`] if a rule for the same event
    /// already covers any of the requested sources.
    pub fn define_transition(
        &mut self,
        event: EventName,
        from: Source,
        to: StatusValue,
    ) -> Result<&TransitionRule, ConfigError> {
        if matches!(&from, Source::Only(set) if set.is_empty()) {
            return Err(ConfigError::EmptySource { event });
        }
        if let Some(existing) = self
            .rules
            .iter()
            .find(|rule| rule.event == event && rule.from.overlaps(&from))
        {
            return Err(ConfigError::ConflictingTransition {
                event,
                existing: existing.from.clone(),
                requested: from,
            });
        }

        self.rules.push(TransitionRule { event, from, to });
        let idx = self.rules.len() - 1;
        Ok(&self.rules[idx])
    }

    /// The rule that fires `event` from `current`, if any.
    pub fn rule_for(&self, event: &str, current: &StatusValue) -> Option<&TransitionRule> {
        self.rules
            .iter()
            .find(|rule| rule.event == event && rule.from.covers(current))
    }

    /// The status `event` leads to from `current`.
    ///
    /// # Errors
    ///
    /// [`TransitionError::NoSuchTransition`] if no rule matches.
    pub fn resolve(&self, event: &str, current: &StatusValue) -> Result<&StatusValue, TransitionError> {
        self.rule_for(event, current)
            .map(|rule| &rule.to)
            .ok_or_else(|| TransitionError::NoSuchTransition {
                event: event.to_string(),
                status: current.name().clone(),
            })
    }

    /// Every event with a rule covering `current`.
    pub fn events_available_from(&self, current: &StatusValue) -> BTreeSet<EventName> {
        self.rules
            .iter()
            .filter(|rule| rule.from.covers(current))
            .map(|rule| rule.event.clone())
            .collect()
    }

    /// The first event, in definition order, that moves `current` to `target`
    /// in one hop.
    pub fn event_for(&self, current: &StatusValue, target: &StatusValue) -> Option<&EventName> {
        self.rules
            .iter()
            .find(|rule| rule.to == *target && rule.from.covers(current))
            .map(|rule| &rule.event)
    }

    /// Statuses reachable from `current` in one hop, in definition order.
    pub fn targets_from(&self, current: &StatusValue) -> Vec<&StatusValue> {
        let mut targets: Vec<&StatusValue> = Vec::new();
        for rule in self.rules.iter().filter(|rule| rule.from.covers(current)) {
            if !targets.contains(&&rule.to) {
                targets.push(&rule.to);
            }
        }
        targets
    }

    /// Distinct event names, in order of first definition.
    pub fn events(&self) -> Vec<&EventName> {
        let mut events: Vec<&EventName> = Vec::new();
        for rule in &self.rules {
            if !events.contains(&&rule.event) {
                events.push(&rule.event);
            }
        }
        events
    }

    /// All rules, in definition order.
    pub fn rules(&self) -> std::slice::Iter<'_, TransitionRule> {
        self.rules.iter()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecycle_core::StatusName;

    fn status(name: &str, ordinal: i32) -> StatusValue {
        StatusValue::new(StatusName::new(name).unwrap(), ordinal)
    }

    fn event(name: &str) -> EventName {
        EventName::new(name).unwrap()
    }

    fn only(statuses: &[&StatusValue]) -> Source {
        Source::Only(statuses.iter().map(|s| (*s).clone()).collect())
    }

    struct Fixture {
        triggered: StatusValue,
        acknowledged: StatusValue,
        resolved: StatusValue,
        ignored: StatusValue,
    }

    fn fixture() -> Fixture {
        Fixture {
            triggered: status("triggered", 0),
            acknowledged: status("acknowledged", 1),
            resolved: status("resolved", 2),
            ignored: status("ignored", 3),
        }
    }

    fn any_table(f: &Fixture) -> TransitionTable {
        let mut table = TransitionTable::new();
        table.define_transition(event("trigger"), Source::Any, f.triggered.clone()).unwrap();
        table.define_transition(event("acknowledge"), Source::Any, f.acknowledged.clone()).unwrap();
        table.define_transition(event("resolve"), Source::Any, f.resolved.clone()).unwrap();
        table.define_transition(event("ignore"), Source::Any, f.ignored.clone()).unwrap();
        table
    }

    #[test]
    fn resolve_any_sourced_rules() {
        let f = fixture();
        let table = any_table(&f);
        for from in [&f.triggered, &f.acknowledged, &f.resolved, &f.ignored] {
            assert_eq!(table.resolve("resolve", from).unwrap(), &f.resolved);
            assert_eq!(table.resolve("trigger", from).unwrap(), &f.triggered);
        }
    }

    #[test]
    fn resolve_unknown_event_fails() {
        let f = fixture();
        let table = any_table(&f);
        let err = table.resolve("close", &f.triggered).unwrap_err();
        assert_eq!(
            err,
            TransitionError::NoSuchTransition {
                event: "close".to_string(),
                status: f.triggered.name().clone(),
            }
        );
    }

    #[test]
    fn resolve_respects_explicit_sources() {
        let f = fixture();
        let mut table = TransitionTable::new();
        table
            .define_transition(event("acknowledge"), only(&[&f.triggered]), f.acknowledged.clone())
            .unwrap();
        assert!(table.resolve("acknowledge", &f.triggered).is_ok());
        assert!(table.resolve("acknowledge", &f.resolved).is_err());
    }

    #[test]
    fn events_available_from_includes_self_transition() {
        let f = fixture();
        let table = any_table(&f);
        let events: Vec<String> = table
            .events_available_from(&f.triggered)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(events, vec!["acknowledge", "ignore", "resolve", "trigger"]);
    }

    #[test]
    fn same_event_disjoint_sources_allowed() {
        let f = fixture();
        let mut table = TransitionTable::new();
        table
            .define_transition(event("advance"), only(&[&f.triggered]), f.acknowledged.clone())
            .unwrap();
        table
            .define_transition(event("advance"), only(&[&f.acknowledged]), f.resolved.clone())
            .unwrap();
        assert_eq!(table.resolve("advance", &f.triggered).unwrap(), &f.acknowledged);
        assert_eq!(table.resolve("advance", &f.acknowledged).unwrap(), &f.resolved);
        assert_eq!(table.len(), 2);
        assert_eq!(table.events().len(), 1);
    }

    #[test]
    fn overlapping_explicit_sources_conflict() {
        let f = fixture();
        let mut table = TransitionTable::new();
        table
            .define_transition(event("advance"), only(&[&f.triggered, &f.ignored]), f.acknowledged.clone())
            .unwrap();
        let err = table
            .define_transition(event("advance"), only(&[&f.ignored]), f.resolved.clone())
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingTransition { .. }));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn any_after_narrow_conflicts() {
        let f = fixture();
        let mut table = TransitionTable::new();
        table
            .define_transition(event("resolve"), only(&[&f.triggered]), f.resolved.clone())
            .unwrap();
        let err = table
            .define_transition(event("resolve"), Source::Any, f.resolved.clone())
            .unwrap_err();
        match err {
            ConfigError::ConflictingTransition { existing, requested, .. } => {
                assert_eq!(existing, only(&[&f.triggered]));
                assert_eq!(requested, Source::Any);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn narrow_after_any_conflicts() {
        let f = fixture();
        let mut table = any_table(&f);
        let err = table
            .define_transition(event("ignore"), only(&[&f.resolved]), f.triggered.clone())
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingTransition { .. }));
    }

    #[test]
    fn empty_source_rejected() {
        let f = fixture();
        let mut table = TransitionTable::new();
        let err = table
            .define_transition(event("noop"), Source::Only(BTreeSet::new()), f.triggered.clone())
            .unwrap_err();
        assert_eq!(err, ConfigError::EmptySource { event: event("noop") });
    }

    #[test]
    fn event_for_uses_definition_order() {
        let f = fixture();
        let mut table = TransitionTable::new();
        table
            .define_transition(event("dismiss"), only(&[&f.triggered]), f.ignored.clone())
            .unwrap();
        table.define_transition(event("ignore"), Source::Any, f.ignored.clone()).unwrap();

        assert_eq!(table.event_for(&f.triggered, &f.ignored).unwrap(), "dismiss");
        assert_eq!(table.event_for(&f.resolved, &f.ignored).unwrap(), "ignore");
        assert!(table.event_for(&f.triggered, &f.resolved).is_none());
    }

    #[test]
    fn targets_from_deduplicates() {
        let f = fixture();
        let mut table = any_table(&f);
        table
            .define_transition(event("dismiss"), only(&[&f.triggered]), f.ignored.clone())
            .unwrap();
        let targets = table.targets_from(&f.triggered);
        assert_eq!(targets.len(), 4);
        assert_eq!(table.targets_from(&f.resolved).len(), 4);
    }

    #[test]
    fn source_display() {
        let f = fixture();
        assert_eq!(Source::Any.to_string(), "any");
        assert_eq!(only(&[&f.triggered, &f.acknowledged]).to_string(), "[acknowledged, triggered]");
    }
}
