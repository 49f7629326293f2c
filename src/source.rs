// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Blocks that make sound.

use crate::{
    block::{BlockCore, BlockKind},
    geometry::Point,
    traits::{Block, Modifiable, Triggerable},
    uid::{ChainUid, Uid},
};
use delegate::delegate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum_macros::Display;

/// Where a [Source] is in its attack/release cycle. There's no terminal state;
/// a Source cycles for as long as it exists.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceState {
    /// Silent.
    #[default]
    Idle,
    /// Received an attack and no release since.
    Pressed,
}

/// A block that makes sound. The engine doesn't produce the sound; it decides
/// when a Source is attacked or released, and the audio layer hears about it
/// through [BlocksEvent](crate::events::BlocksEvent)s.
#[derive(Debug, Default)]
pub struct Source {
    core: BlockCore,
    state: SourceState,
    is_held: bool,

    // The chain this Source belongs to, if any. The ChainStore owns the
    // membership; this is the back-reference.
    chain: Option<ChainUid>,

    // Maintained by the connectivity graph through the Modifiable hooks.
    modifiers: BTreeSet<Uid>,
}
impl Source {
    #[allow(missing_docs)]
    pub fn new_with(uid: Uid, position: Point) -> Self {
        Self {
            core: BlockCore::new_with(uid, position),
            ..Default::default()
        }
    }

    /// The current [SourceState].
    pub fn state(&self) -> SourceState {
        self.state
    }

    /// The chain this Source currently belongs to.
    pub fn chain(&self) -> Option<ChainUid> {
        self.chain
    }

    pub(crate) fn set_chain(&mut self, chain: Option<ChainUid>) {
        self.chain = chain;
    }

    /// Marks whether the user is pressing this Source directly.
    pub fn set_held(&mut self, is_held: bool) {
        self.is_held = is_held;
    }
}
impl Block for Source {
    delegate! {
        to self.core {
            fn uid(&self) -> Uid;
            fn position(&self) -> Point;
            fn set_position(&mut self, position: Point);
            fn is_selected(&self) -> bool;
            fn set_selected(&mut self, is_selected: bool);
        }
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Source
    }
}
impl Modifiable for Source {
    fn modifiers(&self) -> &BTreeSet<Uid> {
        &self.modifiers
    }

    fn add_modifier(&mut self, modifier_uid: Uid) -> bool {
        self.modifiers.insert(modifier_uid)
    }

    fn remove_modifier(&mut self, modifier_uid: Uid) -> bool {
        self.modifiers.remove(&modifier_uid)
    }
}
impl Triggerable for Source {
    fn trigger_attack(&mut self) -> bool {
        match self.state {
            SourceState::Idle => {
                self.state = SourceState::Pressed;
                true
            }
            SourceState::Pressed => false,
        }
    }

    fn trigger_release(&mut self) -> bool {
        match self.state {
            SourceState::Idle => false,
            SourceState::Pressed => {
                self.state = SourceState::Idle;
                true
            }
        }
    }

    fn is_pressed(&self) -> bool {
        self.state == SourceState::Pressed
    }

    fn is_held(&self) -> bool {
        self.is_held
    }
}
