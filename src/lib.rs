// Copyright (c) 2024 Mike Tsao. All rights reserved.

#![warn(missing_docs)]

//! The `blocks_engine` crate decides which sounds play on a canvas of blocks.
//!
//! Sources make sound. Modifiers sit near Sources and, when their logic gate
//! changes state, start or stop every Source they reach. A Modifier reaches a
//! Source when the Source is inside its catchment area, and also reaches every
//! Source chained to that one.
//!
//! The [Scene](scene::Scene) owns all of it. Drive it with placements, moves,
//! and triggers, and read what happened from its event channel.

pub mod block;
pub mod chain;
pub mod control;
pub mod error;
pub mod events;
pub mod geometry;
pub mod graph;
pub mod logic;
pub mod modifier;
pub mod options;
pub mod propagation;
pub mod rng;
pub mod scene;
pub mod settings;
pub mod source;
pub mod spatial;
pub mod traits;
pub mod uid;

/// A collection of imports that are useful to users of this crate. `use
/// blocks_engine::prelude::*;` for easier onboarding.
pub mod prelude {
    pub use super::{
        block::BlockKind,
        chain::{ChainResolver, ChainStore, TopologyIssue},
        control::ControlValue,
        error::BlocksError,
        events::BlocksEvent,
        geometry::Point,
        graph::{ConnectivityGraph, Edge},
        logic::{Decision, GateFactory, GateKey, LogicGate, Momentary, Toggle},
        modifier::Modifier,
        options::OptionsForm,
        propagation::{PropagationReport, TriggerPropagator},
        scene::{BlockSnapshot, Scene},
        settings::{SceneSettings, SceneSettingsBuilder},
        source::{Source, SourceState},
        spatial::SpatialIndex,
        traits::prelude::*,
        uid::{ChainUid, Uid},
    };
}
