// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Errors returned by the engine.

use crate::{
    block::BlockKind,
    logic::GateKey,
    uid::{ChainUid, Uid},
};
use thiserror::Error;

/// Things that can go wrong when asking a [Scene](crate::scene::Scene) to do
/// something. Topology inconsistencies aren't here, because the scene repairs
/// them rather than reporting them; see
/// [TopologyIssue](crate::chain::TopologyIssue).
#[derive(Debug, Error, PartialEq)]
pub enum BlocksError {
    /// No block has this [Uid], or it was deleted.
    #[error("no block with uid {0}")]
    UnknownBlock(Uid),

    /// The block exists, but it's the wrong kind for the operation.
    #[error("block {uid} is a {actual}, not a {expected}")]
    WrongKind {
        #[allow(missing_docs)]
        uid: Uid,
        #[allow(missing_docs)]
        expected: BlockKind,
        #[allow(missing_docs)]
        actual: BlockKind,
    },

    /// No chain has this [ChainUid].
    #[error("no chain with uid {0}")]
    UnknownChain(ChainUid),

    /// The gate doesn't expose a parameter with this name.
    #[error("{gate} has no parameter named \"{name}\"")]
    UnknownParam {
        #[allow(missing_docs)]
        gate: &'static str,
        #[allow(missing_docs)]
        name: String,
    },

    /// The [GateFactory](crate::logic::GateFactory) doesn't know this key.
    #[error("no logic gate registered as \"{0}\"")]
    UnknownGate(GateKey),

    /// A chain was requested with no members.
    #[error("a chain needs at least one source")]
    EmptyChain,

    /// Chains are being derived from source proximity, so they can't be
    /// edited by hand.
    #[error("chains follow source proximity (radius {0}) and can't be edited directly")]
    DerivedChains(f64),
}
