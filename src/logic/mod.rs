// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Logic gates decide whether the Sources reachable from a Modifier should be
//! attacked or released.
//!
//! A gate is a small state machine. Each logical event (a click on the block,
//! a switch flipped in the options panel) invokes
//! [LogicGate::perform_logic()] exactly once, which transitions the gate and
//! returns a [Decision] that matches the *new* state. The gate doesn't guard
//! against being invoked twice for the same event; that's the caller's job,
//! because the gate's state has to reflect exactly one transition per event.
//!
//! New kinds of gate implement [LogicGate] and register with a
//! [GateFactory]. Nothing downstream of the decision needs to know which kind
//! of gate made it.

pub use momentary::Momentary;
pub use toggle::Toggle;

mod momentary;
mod toggle;

use crate::{control::ControlValue, error::BlocksError, options::OptionsForm};
use derive_more::Display;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// What a gate wants done to the Sources it reaches.
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    /// Start every reachable Source.
    Attack,
    /// Stop every reachable Source that the user isn't holding.
    ReleaseAll,
}
impl Decision {
    /// The decision that corresponds to a gate being on (`true`) or off.
    pub fn for_logic(logic: bool) -> Self {
        if logic {
            Self::Attack
        } else {
            Self::ReleaseAll
        }
    }
}

/// The behavior shared by all logic gates.
pub trait LogicGate: std::fmt::Debug {
    /// The key that the [GateFactory] knows this kind of gate by.
    fn key(&self) -> GateKey;

    /// A human-readable name for this kind of gate.
    fn name(&self) -> &'static str;

    /// Whether the gate is currently on.
    fn logic(&self) -> bool;

    /// Transitions the gate once and returns the decision for its new state.
    fn perform_logic(&mut self) -> Decision;

    /// The decision that reconciles reachable Sources with the gate's current
    /// state after connectivity changed. Doesn't transition the gate.
    fn update_connections(&self) -> Decision {
        Decision::for_logic(self.logic())
    }

    /// The names accepted by [LogicGate::param()] and
    /// [LogicGate::set_param()].
    fn control_names(&self) -> &'static [&'static str];

    /// The current value of the named parameter, if the gate has one.
    fn param(&self, name: &str) -> Option<ControlValue>;

    /// Sets the named parameter. If that amounts to a logical event, the gate
    /// performs its logic and returns the resulting decision, which the caller
    /// must propagate.
    fn set_param(
        &mut self,
        name: &str,
        value: ControlValue,
    ) -> Result<Option<Decision>, BlocksError>;

    /// Describes the gate's option panel.
    fn options_form(&self) -> OptionsForm;
}

/// Identifies a kind of [LogicGate], such as a toggle.
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GateKey(String);
impl From<&str> for GateKey {
    fn from(value: &str) -> Self {
        GateKey(value.to_string())
    }
}
impl From<String> for GateKey {
    fn from(value: String) -> Self {
        GateKey(value)
    }
}

type GateFactoryFn = fn() -> Box<dyn LogicGate>;

/// [GateFactory] accepts [GateKey]s and creates logic gates.
#[derive(Debug, Default)]
pub struct GateFactory {
    gates: FxHashMap<GateKey, GateFactoryFn>,
    sorted_keys: Vec<GateKey>,
}
impl GateFactory {
    /// A factory that knows every gate in this crate.
    pub fn with_built_ins() -> Self {
        let mut r = Self::default();
        r.register_gate(GateKey::from(Toggle::KEY), || Box::<Toggle>::default());
        r.register_gate(GateKey::from(Momentary::KEY), || {
            Box::<Momentary>::default()
        });
        r
    }

    /// Registers a new kind of gate. Registering the same key twice is a
    /// programming error.
    pub fn register_gate(&mut self, key: GateKey, f: GateFactoryFn) {
        if self.gates.insert(key.clone(), f).is_some() {
            panic!("register_gate({key}): duplicate key");
        }
        self.sorted_keys.push(key);
        self.sorted_keys.sort();
    }

    /// Creates a new gate of the kind registered under `key`.
    pub fn new_gate(&self, key: &GateKey) -> Result<Box<dyn LogicGate>, BlocksError> {
        self.gates
            .get(key)
            .map(|f| f())
            .ok_or_else(|| BlocksError::UnknownGate(key.clone()))
    }

    /// All registered keys, in sorted order for consistent display.
    pub fn keys(&self) -> &[GateKey] {
        &self.sorted_keys
    }
}
