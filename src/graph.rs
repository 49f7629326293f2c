// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Which Modifiers are close enough to which Sources.

use crate::{
    spatial::SpatialIndex,
    traits::{HasConnections, Modifiable},
    uid::Uid,
};
use derive_more::Display;
use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A connection between a Modifier and a Source.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
#[display(fmt = "{} -> {}", modifier, source)]
pub struct Edge {
    #[allow(missing_docs)]
    pub modifier: Uid,
    #[allow(missing_docs)]
    pub source: Uid,
}
impl Edge {
    #[allow(missing_docs)]
    pub fn new(modifier: Uid, source: Uid) -> Self {
        Self { modifier, source }
    }
}

/// The edges that one call to [ConnectivityGraph::recompute()] created and
/// removed.
#[derive(Debug, Default, PartialEq)]
pub struct ConnectivityDelta {
    #[allow(missing_docs)]
    pub added: Vec<Edge>,
    #[allow(missing_docs)]
    pub removed: Vec<Edge>,
}
impl ConnectivityDelta {
    /// True if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Owns the Modifier↔Source adjacency.
///
/// Edges are derived from positions, not authoritative: after every
/// [ConnectivityGraph::recompute()], an edge exists exactly when the Source is
/// within the Modifier's catchment area. The graph keeps the blocks' own
/// connection sets in step by calling their [Modifiable] and [HasConnections]
/// hooks whenever an edge appears or disappears.
#[derive(Debug, Default)]
pub struct ConnectivityGraph {
    modifier_to_sources: FxHashMap<Uid, FxHashSet<Uid>>,
    source_to_modifiers: FxHashMap<Uid, FxHashSet<Uid>>,
}
impl ConnectivityGraph {
    /// Re-evaluates proximity for every (Modifier, Source) pair and updates
    /// the edge set to match. Edges to blocks that no longer exist are dropped.
    /// Running this twice with unchanged positions changes nothing the second
    /// time.
    pub fn recompute<M: HasConnections, S: Modifiable>(
        &mut self,
        modifiers: &mut BTreeMap<Uid, M>,
        sources: &mut BTreeMap<Uid, S>,
    ) -> ConnectivityDelta {
        let mut delta = ConnectivityDelta::default();

        for edge in self.edges() {
            if modifiers.contains_key(&edge.modifier) && sources.contains_key(&edge.source) {
                continue;
            }
            self.unlink(edge);
            if let Some(modifier) = modifiers.get_mut(&edge.modifier) {
                Self::check_hook(
                    modifier.remove_connection(edge.source),
                    "remove_connection",
                    edge,
                );
            }
            if let Some(source) = sources.get_mut(&edge.source) {
                Self::check_hook(source.remove_modifier(edge.modifier), "remove_modifier", edge);
            }
            delta.removed.push(edge);
        }

        for (modifier_uid, modifier) in modifiers.iter_mut() {
            let in_range: FxHashSet<Uid> = SpatialIndex::neighbors(
                modifier.position(),
                modifier.catchment_area(),
                sources.values(),
            )
            .into_iter()
            .collect();
            for (source_uid, source) in sources.iter_mut() {
                let edge = Edge::new(*modifier_uid, *source_uid);
                match (in_range.contains(source_uid), self.has_edge(edge)) {
                    (true, false) => {
                        self.link(edge);
                        Self::check_hook(
                            modifier.add_connection(edge.source),
                            "add_connection",
                            edge,
                        );
                        Self::check_hook(source.add_modifier(edge.modifier), "add_modifier", edge);
                        delta.added.push(edge);
                    }
                    (false, true) => {
                        self.unlink(edge);
                        Self::check_hook(
                            modifier.remove_connection(edge.source),
                            "remove_connection",
                            edge,
                        );
                        Self::check_hook(
                            source.remove_modifier(edge.modifier),
                            "remove_modifier",
                            edge,
                        );
                        delta.removed.push(edge);
                    }
                    _ => {}
                }
            }
        }

        if !delta.is_empty() {
            trace!(
                "connectivity: +{:?} -{:?}",
                delta.added,
                delta.removed
            );
        }
        delta
    }

    /// Whether the edge currently exists.
    pub fn has_edge(&self, edge: Edge) -> bool {
        self.modifier_to_sources
            .get(&edge.modifier)
            .is_some_and(|sources| sources.contains(&edge.source))
    }

    /// All edges, sorted.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .modifier_to_sources
            .iter()
            .flat_map(|(modifier, sources)| {
                sources
                    .iter()
                    .map(|source| Edge::new(*modifier, *source))
            })
            .collect();
        edges.sort();
        edges
    }

    /// The number of edges.
    pub fn len(&self) -> usize {
        self.modifier_to_sources.values().map(|s| s.len()).sum()
    }

    /// True if there are no edges.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The Sources connected to the given Modifier, sorted.
    pub fn sources_of(&self, modifier_uid: Uid) -> Vec<Uid> {
        Self::sorted(self.modifier_to_sources.get(&modifier_uid))
    }

    /// The Modifiers connected to the given Source, sorted.
    pub fn modifiers_of(&self, source_uid: Uid) -> Vec<Uid> {
        Self::sorted(self.source_to_modifiers.get(&source_uid))
    }

    /// Forgets every edge without calling any hooks. The caller must also
    /// clear the blocks' own connection sets.
    pub fn clear(&mut self) {
        self.modifier_to_sources.clear();
        self.source_to_modifiers.clear();
    }

    fn sorted(uids: Option<&FxHashSet<Uid>>) -> Vec<Uid> {
        let mut r: Vec<Uid> = uids.map(|u| u.iter().copied().collect()).unwrap_or_default();
        r.sort();
        r
    }

    fn link(&mut self, edge: Edge) {
        self.modifier_to_sources
            .entry(edge.modifier)
            .or_default()
            .insert(edge.source);
        self.source_to_modifiers
            .entry(edge.source)
            .or_default()
            .insert(edge.modifier);
    }

    fn unlink(&mut self, edge: Edge) {
        if let Some(sources) = self.modifier_to_sources.get_mut(&edge.modifier) {
            sources.remove(&edge.source);
            if sources.is_empty() {
                self.modifier_to_sources.remove(&edge.modifier);
            }
        }
        if let Some(modifiers) = self.source_to_modifiers.get_mut(&edge.source) {
            modifiers.remove(&edge.modifier);
            if modifiers.is_empty() {
                self.source_to_modifiers.remove(&edge.source);
            }
        }
    }

    // A block that already had (or lacked) the relation means someone other
    // than the graph edited its connection set. That breaks the contract
    // between the graph and the blocks, and there's no sensible recovery.
    fn check_hook(accepted: bool, hook: &str, edge: Edge) {
        if !accepted {
            panic!("{hook}() disagreed with the connectivity graph about edge {edge}");
        }
    }
}
