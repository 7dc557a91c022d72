//! # Side-Effect Hooks
//!
//! Hooks adjust auxiliary fields as part of a transition, before the guard
//! layer validates them. They receive a working copy of the fields and a
//! read-only [`HookContext`]; they perform no I/O and cannot fail, so a
//! transition can always be aborted by discarding the copy.
//!
//! Hooks whose target sets overlap run in registration order.

use std::collections::BTreeSet;
use std::fmt;

use lifecycle_core::{Clock, EventName, Timestamp};

use crate::attributes::TransitionArgs;
use crate::status::StatusValue;

/// The target statuses a hook runs for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    /// Every target status.
    Any,
    /// Only these targets.
    Only(BTreeSet<StatusValue>),
    /// Every target except these.
    Except(BTreeSet<StatusValue>),
}

impl Targets {
    /// Whether a hook with these targets runs for `target`.
    pub fn matches(&self, target: &StatusValue) -> bool {
        match self {
            Self::Any => true,
            Self::Only(set) => set.contains(target),
            Self::Except(set) => !set.contains(target),
        }
    }
}

/// What a hook can see about the transition in progress.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    /// The fired event.
    pub event: &'a EventName,
    /// Status before the transition.
    pub from: &'a StatusValue,
    /// Status after the transition.
    pub to: &'a StatusValue,
    /// Arguments passed to `fire()`.
    pub args: &'a TransitionArgs,
    /// The machine's clock.
    pub clock: &'a dyn Clock,
}

impl HookContext<'_> {
    /// The first argument if it is a timestamp, otherwise the clock's now.
    pub fn timestamp_arg_or_now(&self) -> Timestamp {
        self.args
            .first_timestamp()
            .unwrap_or_else(|| self.clock.now())
    }
}

type HookFn<F> = Box<dyn Fn(&mut F, &HookContext<'_>) + Send + Sync>;

/// A registered before-transition hook.
pub struct Hook<F> {
    targets: Targets,
    action: HookFn<F>,
}

impl<F> Hook<F> {
    /// The targets this hook runs for.
    pub fn targets(&self) -> &Targets {
        &self.targets
    }
}

impl<F> fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}

/// Hooks in registration order.
pub struct HookSet<F> {
    hooks: Vec<Hook<F>>,
}

impl<F> Default for HookSet<F> {
    fn default() -> Self {
        Self { hooks: Vec::new() }
    }
}

impl<F> fmt::Debug for HookSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.hooks).finish()
    }
}

impl<F> HookSet<F> {
    /// No hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook for `targets`.
    pub fn before_transition<H>(&mut self, targets: Targets, hook: H)
    where
        H: Fn(&mut F, &HookContext<'_>) + Send + Sync + 'static,
    {
        self.hooks.push(Hook {
            targets,
            action: Box::new(hook),
        });
    }

    /// Run every hook matching `ctx.to` against `fields`. Returns how many ran.
    pub fn run(&self, fields: &mut F, ctx: &HookContext<'_>) -> usize {
        let mut ran = 0;
        for hook in self.hooks.iter().filter(|hook| hook.targets.matches(ctx.to)) {
            (hook.action)(fields, ctx);
            ran += 1;
        }
        ran
    }

    /// Registered hooks, in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Hook<F>> {
        self.hooks.iter()
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
