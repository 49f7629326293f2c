// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! The [Scene] owns every block on the canvas and keeps their relations
//! current.
//!
//! Every operation runs to completion before returning: proximity is
//! rechecked, chains are resolved, and any resulting attack or release is
//! propagated, in that order. There is no partial state for anyone to observe
//! between steps, and no locking, because a [Scene] has exactly one owner.

use crate::{
    block::BlockKind,
    chain::{ChainResolver, ChainStore, TopologyIssue},
    control::ControlValue,
    error::BlocksError,
    events::{BlocksEvent, ChannelPair},
    geometry::Point,
    graph::{ConnectivityGraph, Edge},
    logic::{Decision, GateFactory, GateKey, LogicGate},
    modifier::Modifier,
    options::OptionsForm,
    propagation::{PropagationReport, TriggerPropagator},
    rng::Rng,
    settings::SceneSettings,
    source::Source,
    spatial::SpatialIndex,
    traits::{Block, HasConnections, Modifiable, Triggerable},
    uid::{ChainUid, Uid, UidFactory},
};
use crossbeam_channel::Receiver;
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// What a renderer needs to know about one block.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BlockSnapshot {
    #[allow(missing_docs)]
    pub uid: Uid,
    #[allow(missing_docs)]
    pub kind: BlockKind,
    #[allow(missing_docs)]
    pub position: Point,
    #[allow(missing_docs)]
    pub is_selected: bool,
    /// For a Source, whether it's sounding. For a Modifier, whether its gate
    /// is on.
    pub is_on: bool,
    /// Whether the user is holding this Source down.
    pub is_held: bool,
    /// The Source's chain.
    pub chain: Option<ChainUid>,
    /// For a Modifier, the Sources it's connected to. For a Source, the
    /// Modifiers it's connected to.
    pub connections: Vec<Uid>,
    /// The name of a Modifier's gate.
    pub gate: Option<&'static str>,
}

/// The block registry and the engine that keeps it consistent.
#[derive(Debug)]
pub struct Scene {
    settings: SceneSettings,
    uid_factory: UidFactory<Uid>,
    gate_factory: GateFactory,
    rng: Rng,

    sources: BTreeMap<Uid, Source>,
    modifiers: BTreeMap<Uid, Modifier>,
    graph: ConnectivityGraph,
    chains: ChainStore,

    selected: Option<Uid>,

    // Sources that are sounding because a gate attacked them. When no gate
    // that's on reaches them anymore, they're released.
    driven: BTreeSet<Uid>,

    events: ChannelPair<BlocksEvent>,
}
impl Default for Scene {
    fn default() -> Self {
        Self::new_with(SceneSettings::default())
    }
}
impl Scene {
    #[allow(missing_docs)]
    pub fn new_with(settings: SceneSettings) -> Self {
        let rng = settings
            .rng_seed()
            .map(Rng::new_with_seed)
            .unwrap_or_default();
        Self {
            uid_factory: UidFactory::new(settings.first_uid()),
            gate_factory: GateFactory::with_built_ins(),
            rng,
            sources: Default::default(),
            modifiers: Default::default(),
            graph: Default::default(),
            chains: Default::default(),
            selected: None,
            driven: Default::default(),
            events: Default::default(),
            settings,
        }
    }

    #[allow(missing_docs)]
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// The factory used by [Scene::create_modifier()]. Register new kinds of
    /// gate here.
    pub fn gate_factory_mut(&mut self) -> &mut GateFactory {
        &mut self.gate_factory
    }

    /// Places a new Source. Without a position, it lands somewhere random on
    /// the canvas.
    pub fn create_source(&mut self, position: Option<Point>) -> Uid {
        let uid = self.uid_factory.mint_next();
        let position = position.unwrap_or_else(|| self.random_position());
        self.sources.insert(uid, Source::new_with(uid, position));
        debug!("created source {uid} at {position}");
        self.publish(BlocksEvent::BlockAdded(uid, BlockKind::Source));
        self.check_proximity();
        uid
    }

    /// Places a new Modifier whose gate is the kind registered under `key`.
    pub fn create_modifier(
        &mut self,
        key: &GateKey,
        position: Option<Point>,
    ) -> anyhow::Result<Uid> {
        let gate = self.gate_factory.new_gate(key)?;
        Ok(self.add_modifier_with_gate(gate, position, None))
    }

    /// Places a new Modifier with the given gate. Without a catchment area,
    /// the configured default applies.
    pub fn add_modifier_with_gate(
        &mut self,
        gate: Box<dyn LogicGate>,
        position: Option<Point>,
        catchment_area: Option<f64>,
    ) -> Uid {
        let uid = self.uid_factory.mint_next();
        let position = position.unwrap_or_else(|| self.random_position());
        let catchment_area =
            catchment_area.unwrap_or_else(|| self.settings.default_catchment_area());
        debug!(
            "created modifier {uid} ({}) at {position}, catchment area {catchment_area}",
            gate.name()
        );
        self.modifiers
            .insert(uid, Modifier::new_with(uid, position, catchment_area, gate));
        self.publish(BlocksEvent::BlockAdded(uid, BlockKind::Modifier));
        self.check_proximity();
        uid
    }

    /// Deletes a block. A deleted Source leaves its chain and every Modifier's
    /// connections, and stops sounding. A deleted Modifier takes its edges
    /// with it but leaves chains alone.
    pub fn delete_block(&mut self, uid: Uid) -> anyhow::Result<BlockKind> {
        let kind = if let Some(source) = self.sources.remove(&uid) {
            self.chains.remove_source(&source);
            self.driven.remove(&uid);
            if source.is_pressed() {
                self.publish(BlocksEvent::Release(uid));
            }
            if source.chain().is_some() {
                self.publish(BlocksEvent::ChainsChanged);
            }
            BlockKind::Source
        } else if self.modifiers.remove(&uid).is_some() {
            BlockKind::Modifier
        } else {
            return Err(BlocksError::UnknownBlock(uid).into());
        };
        if self.selected == Some(uid) {
            self.selected = None;
        }
        debug!("deleted {kind} {uid}");
        self.publish(BlocksEvent::BlockRemoved(uid, kind));
        self.check_proximity();
        Ok(kind)
    }

    /// Deletes whatever is selected, if anything.
    pub fn delete_selected_block(&mut self) -> anyhow::Result<Option<BlockKind>> {
        match self.selected {
            Some(uid) => self.delete_block(uid).map(Some),
            None => Ok(None),
        }
    }

    /// Makes the given block the selection.
    pub fn select_block(&mut self, uid: Uid) -> anyhow::Result<()> {
        self.block_mut(uid)?.set_selected(true);
        if let Some(previous) = self.selected.replace(uid) {
            if previous != uid {
                if let Ok(block) = self.block_mut(previous) {
                    block.set_selected(false);
                }
            }
        }
        self.publish(BlocksEvent::Selected(uid));
        Ok(())
    }

    /// The current selection.
    pub fn selected(&self) -> Option<Uid> {
        self.selected
    }

    /// Moves a block and rechecks proximity.
    pub fn move_block(&mut self, uid: Uid, position: Point) -> anyhow::Result<()> {
        self.block_mut(uid)?.set_position(position);
        self.check_proximity();
        Ok(())
    }

    /// The pointer went down on a block. It becomes the selection, and a
    /// Source starts sounding for as long as it's held.
    pub fn pointer_down(&mut self, uid: Uid) -> anyhow::Result<()> {
        self.select_block(uid)?;
        if self.sources.contains_key(&uid) {
            self.press_source(uid)?;
        }
        Ok(())
    }

    /// The pointer came up. Lets go of a held selection and rechecks
    /// proximity in case a drag skipped any updates.
    pub fn pointer_up(&mut self) -> anyhow::Result<()> {
        if let Some(uid) = self.selected {
            if self.sources.get(&uid).is_some_and(|s| s.is_held()) {
                self.release_source(uid)?;
            }
        }
        self.check_proximity();
        Ok(())
    }

    /// The user pressed a Source directly. It's held until
    /// [Scene::release_source()], and chain-wide releases won't touch it.
    pub fn press_source(&mut self, uid: Uid) -> anyhow::Result<PropagationReport> {
        self.source_mut(uid)?.set_held(true);
        Ok(self.propagate(&[uid], Decision::Attack))
    }

    /// The user let go of a Source. It stops sounding unless a gate that's on
    /// still reaches it.
    pub fn release_source(&mut self, uid: Uid) -> anyhow::Result<PropagationReport> {
        self.source_mut(uid)?.set_held(false);
        if self.reach_of_gates_that_are_on().contains(&uid) {
            self.driven.insert(uid);
            return Ok(PropagationReport::default());
        }
        Ok(self.propagate(&[uid], Decision::ReleaseAll))
    }

    /// One logical event on a Modifier: its gate transitions once, and the
    /// decision goes out to every Source the Modifier reaches. A release
    /// spares Sources that some other gate that's on still reaches. Callers
    /// must invoke this exactly once per event.
    pub fn trigger(&mut self, modifier_uid: Uid) -> anyhow::Result<Decision> {
        let decision = self.modifier_mut(modifier_uid)?.gate_mut().perform_logic();
        self.apply_decision(modifier_uid, decision);
        Ok(decision)
    }

    /// Sets a gate parameter from the options panel. If the gate treats the
    /// write as a logical event, the decision is propagated just like
    /// [Scene::trigger()] would.
    pub fn set_param(
        &mut self,
        modifier_uid: Uid,
        name: &str,
        value: ControlValue,
    ) -> anyhow::Result<Option<Decision>> {
        let decision = self
            .modifier_mut(modifier_uid)?
            .gate_mut()
            .set_param(name, value)?;
        if let Some(decision) = decision {
            self.apply_decision(modifier_uid, decision);
        }
        Ok(decision)
    }

    /// Reads a gate parameter.
    pub fn param(&self, modifier_uid: Uid, name: &str) -> anyhow::Result<Option<ControlValue>> {
        Ok(self.modifier(modifier_uid)?.gate().param(name))
    }

    /// Describes a Modifier's option panel.
    pub fn options_form(&self, modifier_uid: Uid) -> anyhow::Result<OptionsForm> {
        Ok(self.modifier(modifier_uid)?.gate().options_form())
    }

    /// Changes a Modifier's catchment area and rechecks proximity.
    pub fn set_catchment_area(
        &mut self,
        modifier_uid: Uid,
        catchment_area: f64,
    ) -> anyhow::Result<()> {
        self.modifier_mut(modifier_uid)?.set_catchment_area(catchment_area);
        self.check_proximity();
        Ok(())
    }

    /// Every Source the Modifier reaches through its connections and their
    /// chains. Changes nothing. If the topology is inconsistent, the answer is
    /// a best effort, and the next operation that changes anything repairs it.
    pub fn resolve_chain(&self, modifier_uid: Uid) -> anyhow::Result<Vec<Uid>> {
        let resolution =
            ChainResolver::new(&self.sources, &self.chains).resolve(self.modifier(modifier_uid)?);
        for issue in resolution.issues.iter() {
            warn!("resolve_chain({modifier_uid}): {issue}");
        }
        Ok(resolution.sources)
    }

    /// Puts the given Sources in a new chain.
    pub fn chain_sources(&mut self, members: &[Uid]) -> anyhow::Result<ChainUid> {
        self.check_chains_are_editable()?;
        for uid in members {
            self.expect_kind(*uid, BlockKind::Source)?;
        }
        let chain_uid = self.chains.create(members, &mut self.sources)?;
        debug!("chained {members:?} as {chain_uid}");
        self.chains_changed();
        Ok(chain_uid)
    }

    /// Adds a Source to an existing chain, taking it out of any other.
    pub fn add_to_chain(&mut self, chain_uid: ChainUid, source_uid: Uid) -> anyhow::Result<()> {
        self.check_chains_are_editable()?;
        self.expect_kind(source_uid, BlockKind::Source)?;
        self.chains.join(chain_uid, source_uid, &mut self.sources)?;
        self.chains_changed();
        Ok(())
    }

    /// Takes a Source out of its chain.
    pub fn unchain_source(&mut self, source_uid: Uid) -> anyhow::Result<Option<ChainUid>> {
        self.check_chains_are_editable()?;
        self.expect_kind(source_uid, BlockKind::Source)?;
        let previous = self.chains.leave(source_uid, &mut self.sources)?;
        if previous.is_some() {
            self.chains_changed();
        }
        Ok(previous)
    }

    /// Looks for relations that disagree with each other or with the current
    /// positions.
    pub fn check_topology(&self) -> Vec<TopologyIssue> {
        let mut issues = self.chains.check(&self.sources);
        for modifier in self.modifiers.values() {
            for source_uid in modifier.connections() {
                if !self.sources.contains_key(source_uid) {
                    issues.push(TopologyIssue::DanglingConnection {
                        modifier: modifier.uid(),
                        source: *source_uid,
                    });
                }
            }
            for source in self.sources.values() {
                let edge = Edge::new(modifier.uid(), source.uid());
                let in_range = SpatialIndex::within(
                    modifier.position(),
                    source.position(),
                    modifier.catchment_area(),
                );
                let connected = modifier.connections().contains(&source.uid())
                    && source.modifiers().contains(&modifier.uid());
                if in_range != self.graph.has_edge(edge) || in_range != connected {
                    issues.push(TopologyIssue::StaleEdge {
                        modifier: modifier.uid(),
                        source: source.uid(),
                    });
                }
            }
        }
        issues.sort();
        issues.dedup();
        issues
    }

    /// Rebuilds every derived relation from scratch, then brings Sources back
    /// in line with their gates.
    pub fn repair_topology(&mut self) {
        self.repair_relations();
        self.reconcile();
    }

    /// A read model of every block, ordered by [Uid].
    pub fn snapshot(&self) -> Vec<BlockSnapshot> {
        let sources = self.sources.values().map(|s| BlockSnapshot {
            uid: s.uid(),
            kind: BlockKind::Source,
            position: s.position(),
            is_selected: s.is_selected(),
            is_on: s.is_pressed(),
            is_held: s.is_held(),
            chain: s.chain(),
            connections: s.modifiers().iter().copied().collect(),
            gate: None,
        });
        let modifiers = self.modifiers.values().map(|m| BlockSnapshot {
            uid: m.uid(),
            kind: BlockKind::Modifier,
            position: m.position(),
            is_selected: m.is_selected(),
            is_on: m.gate().logic(),
            is_held: false,
            chain: None,
            connections: m.connections().iter().copied().collect(),
            gate: Some(m.gate().name()),
        });
        let mut r: Vec<BlockSnapshot> = sources.chain(modifiers).collect();
        r.sort_by_key(|b| b.uid);
        r
    }

    #[allow(missing_docs)]
    pub fn source(&self, uid: Uid) -> Option<&Source> {
        self.sources.get(&uid)
    }

    #[allow(missing_docs)]
    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.values()
    }

    #[allow(missing_docs)]
    pub fn modifiers(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.values()
    }

    /// Looks up a Modifier, complaining if the uid names something else.
    pub fn modifier(&self, uid: Uid) -> Result<&Modifier, BlocksError> {
        self.expect_kind(uid, BlockKind::Modifier)?;
        self.modifiers
            .get(&uid)
            .ok_or(BlocksError::UnknownBlock(uid))
    }

    /// Every Modifier↔Source edge, sorted.
    pub fn edges(&self) -> Vec<Edge> {
        self.graph.edges()
    }

    #[allow(missing_docs)]
    pub fn chains(&self) -> &ChainStore {
        &self.chains
    }

    /// The receiving end of the event channel. The channel is unbounded and
    /// the [Scene] holds this end itself, so events pile up until someone
    /// reads them here or calls [Scene::drain_events()].
    pub fn events(&self) -> &Receiver<BlocksEvent> {
        &self.events.receiver
    }

    /// Everything published since the last drain.
    pub fn drain_events(&self) -> Vec<BlocksEvent> {
        self.events.receiver.try_iter().collect()
    }

    fn kind_of(&self, uid: Uid) -> Option<BlockKind> {
        if self.sources.contains_key(&uid) {
            Some(BlockKind::Source)
        } else if self.modifiers.contains_key(&uid) {
            Some(BlockKind::Modifier)
        } else {
            None
        }
    }

    fn expect_kind(&self, uid: Uid, expected: BlockKind) -> Result<(), BlocksError> {
        match self.kind_of(uid) {
            None => Err(BlocksError::UnknownBlock(uid)),
            Some(actual) if actual != expected => Err(BlocksError::WrongKind {
                uid,
                expected,
                actual,
            }),
            Some(_) => Ok(()),
        }
    }

    fn block_mut(&mut self, uid: Uid) -> Result<&mut dyn Block, BlocksError> {
        match self.kind_of(uid) {
            Some(BlockKind::Source) => self.sources.get_mut(&uid).map(|s| s as &mut dyn Block),
            Some(BlockKind::Modifier) => self.modifiers.get_mut(&uid).map(|m| m as &mut dyn Block),
            None => None,
        }
        .ok_or(BlocksError::UnknownBlock(uid))
    }

    fn source_mut(&mut self, uid: Uid) -> Result<&mut Source, BlocksError> {
        self.expect_kind(uid, BlockKind::Source)?;
        self.sources
            .get_mut(&uid)
            .ok_or(BlocksError::UnknownBlock(uid))
    }

    fn modifier_mut(&mut self, uid: Uid) -> Result<&mut Modifier, BlocksError> {
        self.expect_kind(uid, BlockKind::Modifier)?;
        self.modifiers
            .get_mut(&uid)
            .ok_or(BlocksError::UnknownBlock(uid))
    }

    fn check_chains_are_editable(&self) -> Result<(), BlocksError> {
        match self.settings.chain_radius() {
            Some(radius) => Err(BlocksError::DerivedChains(radius)),
            None => Ok(()),
        }
    }

    fn random_position(&mut self) -> Point {
        self.rng
            .rand_point(self.settings.canvas_width(), self.settings.canvas_height())
    }

    fn publish(&self, event: BlocksEvent) {
        if let Err(e) = self.events.sender.try_send(event) {
            warn!("While sending: {e:?}");
        }
    }

    fn propagate(&mut self, targets: &[Uid], decision: Decision) -> PropagationReport {
        TriggerPropagator::new(&self.events.sender).propagate(&mut self.sources, targets, decision)
    }

    fn apply_decision(&mut self, modifier_uid: Uid, decision: Decision) {
        let mut targets = self.resolve_or_repair(modifier_uid);
        if decision == Decision::ReleaseAll {
            // Another gate that's on still wants these.
            let still_on = self.reach_of_gates_that_are_on();
            targets.retain(|uid| !still_on.contains(uid));
        }
        let report = self.propagate(&targets, decision);
        match decision {
            Decision::Attack => self.driven.extend(targets.iter().copied()),
            Decision::ReleaseAll => {
                for uid in targets.iter() {
                    if !report.skipped_held.contains(uid) {
                        self.driven.remove(uid);
                    }
                }
            }
        }
        let logic = self
            .modifiers
            .get(&modifier_uid)
            .is_some_and(|m| m.gate().logic());
        debug!(
            "{modifier_uid} decided {decision} for {targets:?}: {} attacked, {} released, {} held",
            report.attacked.len(),
            report.released.len(),
            report.skipped_held.len()
        );
        self.publish(BlocksEvent::LogicChanged {
            modifier: modifier_uid,
            logic,
        });
        self.publish(BlocksEvent::ConnectionsChanged);
    }

    fn chains_changed(&mut self) {
        self.publish(BlocksEvent::ChainsChanged);
        self.reconcile();
    }

    // Runs after anything that can change which blocks are connected:
    // creation, deletion, movement, and the end of a gesture.
    fn check_proximity(&mut self) {
        let delta = self.graph.recompute(&mut self.modifiers, &mut self.sources);
        let chains_changed = match self.settings.chain_radius() {
            Some(radius) => self.chains.derive_from_proximity(radius, &mut self.sources),
            None => false,
        };
        if !delta.is_empty() {
            self.publish(BlocksEvent::ConnectionsChanged);
        }
        if chains_changed {
            self.publish(BlocksEvent::ChainsChanged);
        }
        if !delta.is_empty() || chains_changed {
            self.reconcile();
        }
    }

    // Brings every reachable Source in line with the gates that reach it. A
    // Source reached by any gate that's on is attacked; one reached only by
    // gates that are off is released unless held. Sources that were sounding
    // because of a gate, and that no gate that's on reaches anymore, are
    // released too.
    fn reconcile(&mut self) {
        let mut attack: BTreeSet<Uid> = BTreeSet::default();
        let mut release: BTreeSet<Uid> = BTreeSet::default();
        let modifier_uids: Vec<Uid> = self.modifiers.keys().copied().collect();
        for uid in modifier_uids {
            let Some(decision) = self
                .modifiers
                .get(&uid)
                .map(|m| m.gate().update_connections())
            else {
                continue;
            };
            let reach = self.resolve_or_repair(uid);
            match decision {
                Decision::Attack => attack.extend(reach),
                Decision::ReleaseAll => release.extend(reach),
            }
        }
        release.extend(self.driven.difference(&attack).copied());
        release.retain(|uid| !attack.contains(uid));

        let attack: Vec<Uid> = attack.into_iter().collect();
        let release: Vec<Uid> = release.into_iter().collect();
        self.propagate(&attack, Decision::Attack);
        self.propagate(&release, Decision::ReleaseAll);
        self.driven = attack.into_iter().collect();
    }

    fn reach_of_gates_that_are_on(&self) -> BTreeSet<Uid> {
        let resolver = ChainResolver::new(&self.sources, &self.chains);
        self.modifiers
            .values()
            .filter(|m| m.gate().logic())
            .flat_map(|m| resolver.resolve(m).sources)
            .collect()
    }

    fn resolve_or_repair(&mut self, modifier_uid: Uid) -> Vec<Uid> {
        let Some(modifier) = self.modifiers.get(&modifier_uid) else {
            return Vec::default();
        };
        let resolution = ChainResolver::new(&self.sources, &self.chains).resolve(modifier);
        if resolution.issues.is_empty() {
            return resolution.sources;
        }
        for issue in resolution.issues.iter() {
            warn!("{issue}; rebuilding topology");
        }
        self.repair_relations();
        match self.modifiers.get(&modifier_uid) {
            Some(modifier) => {
                ChainResolver::new(&self.sources, &self.chains)
                    .resolve(modifier)
                    .sources
            }
            None => Vec::default(),
        }
    }

    // Rebuilds chains' back-references and every edge without touching any
    // Source's sounding state.
    fn repair_relations(&mut self) {
        self.chains.repair(&mut self.sources);
        self.graph.clear();
        for modifier in self.modifiers.values_mut() {
            let connections: Vec<Uid> = modifier.connections().iter().copied().collect();
            for uid in connections {
                modifier.remove_connection(uid);
            }
        }
        for source in self.sources.values_mut() {
            let modifiers: Vec<Uid> = source.modifiers().iter().copied().collect();
            for uid in modifiers {
                source.remove_modifier(uid);
            }
        }
        self.graph.recompute(&mut self.modifiers, &mut self.sources);
        if let Some(radius) = self.settings.chain_radius() {
            self.chains.derive_from_proximity(radius, &mut self.sources);
        }
        self.publish(BlocksEvent::ConnectionsChanged);
        self.publish(BlocksEvent::ChainsChanged);
    }
}
