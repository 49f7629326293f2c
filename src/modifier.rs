// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Blocks that gate the Sources around them.

use crate::{
    block::{BlockCore, BlockKind},
    geometry::Point,
    logic::LogicGate,
    traits::{Block, HasConnections},
    uid::Uid,
};
use delegate::delegate;
use std::collections::BTreeSet;

/// A block that gates the Sources near it. Any Source within its catchment
/// area is connected to it, and its [LogicGate] decides what happens to those
/// Sources and to everything chained to them.
#[derive(Debug)]
pub struct Modifier {
    core: BlockCore,
    catchment_area: f64,
    gate: Box<dyn LogicGate>,

    // Maintained by the connectivity graph through the HasConnections hooks.
    connections: BTreeSet<Uid>,
}
impl Modifier {
    #[allow(missing_docs)]
    pub fn new_with(
        uid: Uid,
        position: Point,
        catchment_area: f64,
        gate: Box<dyn LogicGate>,
    ) -> Self {
        Self {
            core: BlockCore::new_with(uid, position),
            catchment_area,
            gate,
            connections: Default::default(),
        }
    }

    /// Changes the connection radius. The caller is responsible for
    /// rechecking proximity.
    pub fn set_catchment_area(&mut self, catchment_area: f64) {
        self.catchment_area = catchment_area;
    }

    #[allow(missing_docs)]
    pub fn gate(&self) -> &dyn LogicGate {
        self.gate.as_ref()
    }

    #[allow(missing_docs)]
    pub fn gate_mut(&mut self) -> &mut dyn LogicGate {
        self.gate.as_mut()
    }
}
impl Block for Modifier {
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
        BlockKind::Modifier
    }
}
impl HasConnections for Modifier {
    fn catchment_area(&self) -> f64 {
        self.catchment_area
    }

    fn connections(&self) -> &BTreeSet<Uid> {
        &self.connections
    }

    fn add_connection(&mut self, source_uid: Uid) -> bool {
        self.connections.insert(source_uid)
    }

    fn remove_connection(&mut self, source_uid: Uid) -> bool {
        self.connections.remove(&source_uid)
    }
}
