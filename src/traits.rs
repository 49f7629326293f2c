// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Contains the traits that define the relationships among blocks. The
//! [ConnectivityGraph](crate::graph::ConnectivityGraph) and the
//! [TriggerPropagator](crate::propagation::TriggerPropagator) talk to blocks
//! only through these.

use crate::{block::BlockKind, geometry::Point, uid::Uid};
use std::collections::BTreeSet;

/// Quick import of all important traits.
pub mod prelude {
    pub use super::{Block, HasConnections, Modifiable, Triggerable};
}

/// Something placed on the canvas.
pub trait Block: std::fmt::Debug {
    /// The block's identifier.
    fn uid(&self) -> Uid;

    /// Whether this is a Source or a Modifier.
    fn kind(&self) -> BlockKind;

    /// Where the block currently is.
    fn position(&self) -> Point;

    /// Moves the block. The caller is responsible for rechecking proximity.
    fn set_position(&mut self, position: Point);

    /// Whether the block is the current selection.
    fn is_selected(&self) -> bool;

    #[allow(missing_docs)]
    fn set_selected(&mut self, is_selected: bool);

    /// Distance from this block to the given point.
    fn distance_from(&self, point: Point) -> f64 {
        self.position().distance_to(point)
    }
}

/// Something [Modifiable] can be affected by the Modifiers that are near it.
/// The connectivity graph calls these hooks when an edge appears or
/// disappears.
pub trait Modifiable: Block {
    /// The [Uid]s of the Modifiers currently connected to this block.
    fn modifiers(&self) -> &BTreeSet<Uid>;

    /// Records a new adjacent Modifier. Returns false if it was already known.
    fn add_modifier(&mut self, modifier_uid: Uid) -> bool;

    /// Forgets an adjacent Modifier. Returns false if it wasn't known.
    fn remove_modifier(&mut self, modifier_uid: Uid) -> bool;
}

/// The Modifier side of a connection.
pub trait HasConnections: Block {
    /// Sources within this distance are connected to the block.
    fn catchment_area(&self) -> f64;

    /// The [Uid]s of the directly connected Sources.
    fn connections(&self) -> &BTreeSet<Uid>;

    /// Records a new connection. Returns false if it already existed.
    fn add_connection(&mut self, source_uid: Uid) -> bool;

    /// Drops a connection. Returns false if it didn't exist.
    fn remove_connection(&mut self, source_uid: Uid) -> bool;
}

/// Something that starts and stops sounding in response to attack and release
/// signals.
pub trait Triggerable {
    /// Starts the sound. Returns true if this changed anything, and false if
    /// the block was already pressed.
    fn trigger_attack(&mut self) -> bool;

    /// Stops the sound. Returns true if this changed anything, and false if
    /// the block was already idle.
    fn trigger_release(&mut self) -> bool;

    /// Whether the block received an attack without a matching release.
    fn is_pressed(&self) -> bool;

    /// Whether the user is holding the block down right now. Chain-wide
    /// releases leave held blocks alone.
    fn is_held(&self) -> bool;
}
