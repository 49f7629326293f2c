// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Notifications a [Scene](crate::scene::Scene) publishes to the audio and
//! rendering layers.

use crate::{block::BlockKind, uid::Uid};
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;

/// Everything a [Scene](crate::scene::Scene) tells the outside world. The
/// audio layer cares about [BlocksEvent::Attack] and [BlocksEvent::Release];
/// renderers care about the rest.
#[derive(Clone, Debug, PartialEq, Serialize, strum_macros::Display)]
#[serde(rename_all = "kebab-case")]
pub enum BlocksEvent {
    /// A block was placed.
    BlockAdded(Uid, BlockKind),
    /// A block was deleted.
    BlockRemoved(Uid, BlockKind),
    /// A block became the current selection.
    Selected(Uid),
    /// A Source should start sounding.
    Attack(Uid),
    /// A Source should stop sounding.
    Release(Uid),
    /// A Modifier's gate changed state. An open options panel should refresh.
    LogicChanged {
        #[allow(missing_docs)]
        modifier: Uid,
        #[allow(missing_docs)]
        logic: bool,
    },
    /// Edges appeared or disappeared, or a gate changed what its edges mean.
    /// Renderers should redraw connections.
    ConnectionsChanged,
    /// Chain membership changed.
    ChainsChanged,
}

/// A convenience struct to bundle both halves of a [crossbeam_channel]
/// together.
#[derive(Debug)]
pub struct ChannelPair<T> {
    #[allow(missing_docs)]
    pub sender: Sender<T>,
    #[allow(missing_docs)]
    pub receiver: Receiver<T>,
}
impl<T> Default for ChannelPair<T> {
    fn default() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }
}
