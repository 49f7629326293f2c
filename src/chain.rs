// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Chains group Sources that trigger together.
//!
//! Chain membership and Modifier adjacency are separate relations. A Modifier
//! is *adjacent* to the Sources inside its catchment area, but it *reaches*
//! every member of those Sources' chains. That two-hop expansion is what lets
//! one Modifier drive a whole cluster even though only one member of the
//! cluster is close to it. A Source that isn't in any chain reaches only
//! itself.

use crate::{
    error::BlocksError,
    source::Source,
    spatial::SpatialIndex,
    traits::{Block, HasConnections},
    uid::{ChainUid, Uid, UidFactory},
};
use derive_more::Display;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// A group of Sources that trigger together.
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    uid: ChainUid,
    sources: BTreeSet<Uid>,
}
impl Chain {
    #[allow(missing_docs)]
    pub fn uid(&self) -> ChainUid {
        self.uid
    }

    /// The members of this chain.
    pub fn sources(&self) -> &BTreeSet<Uid> {
        &self.sources
    }
}

/// Something about the relations between blocks that shouldn't be possible.
/// These are never returned as errors. Whoever finds one logs it and repairs
/// the topology.
#[derive(Clone, Copy, Debug, Display, Eq, Ord, PartialEq, PartialOrd)]
pub enum TopologyIssue {
    /// A Source points to a chain that doesn't exist or doesn't list it.
    #[display(fmt = "source {} claims {}, which doesn't list it", source, chain)]
    DanglingChain {
        #[allow(missing_docs)]
        source: Uid,
        #[allow(missing_docs)]
        chain: ChainUid,
    },
    /// A chain lists a Source that's missing or that belongs elsewhere.
    #[display(fmt = "{} lists source {}, which isn't its member", chain, source)]
    StrayMember {
        #[allow(missing_docs)]
        chain: ChainUid,
        #[allow(missing_docs)]
        source: Uid,
    },
    /// A Modifier is connected to a Source that doesn't exist.
    #[display(fmt = "modifier {} is connected to missing source {}", modifier, source)]
    DanglingConnection {
        #[allow(missing_docs)]
        modifier: Uid,
        #[allow(missing_docs)]
        source: Uid,
    },
    /// An edge disagrees with the current positions.
    #[display(fmt = "edge {} -> {} disagrees with proximity", modifier, source)]
    StaleEdge {
        #[allow(missing_docs)]
        modifier: Uid,
        #[allow(missing_docs)]
        source: Uid,
    },
}

/// Owns chain membership. Each Source belongs to at most one chain, and the
/// Source's back-reference always names the chain that lists it.
#[derive(Debug, Default)]
pub struct ChainStore {
    uid_factory: UidFactory<ChainUid>,
    chains: FxHashMap<ChainUid, Chain>,
}
impl ChainStore {
    /// Creates a new chain containing `members`. Members leave whatever chain
    /// they were in before, and chains left empty by that go away.
    pub fn create(
        &mut self,
        members: &[Uid],
        sources: &mut BTreeMap<Uid, Source>,
    ) -> Result<ChainUid, BlocksError> {
        if members.is_empty() {
            return Err(BlocksError::EmptyChain);
        }
        if let Some(missing) = members.iter().find(|uid| !sources.contains_key(uid)) {
            return Err(BlocksError::UnknownBlock(*missing));
        }
        let chain_uid = self.uid_factory.mint_next();
        self.chains.insert(
            chain_uid,
            Chain {
                uid: chain_uid,
                sources: Default::default(),
            },
        );
        for member in members {
            self.join(chain_uid, *member, sources)?;
        }
        Ok(chain_uid)
    }

    /// Moves a Source into an existing chain.
    pub fn join(
        &mut self,
        chain_uid: ChainUid,
        source_uid: Uid,
        sources: &mut BTreeMap<Uid, Source>,
    ) -> Result<(), BlocksError> {
        if !self.chains.contains_key(&chain_uid) {
            return Err(BlocksError::UnknownChain(chain_uid));
        }
        let source = sources
            .get_mut(&source_uid)
            .ok_or(BlocksError::UnknownBlock(source_uid))?;
        match source.chain() {
            Some(current) if current == chain_uid => return Ok(()),
            Some(current) => self.detach(current, source_uid),
            None => {}
        }
        if let Some(chain) = self.chains.get_mut(&chain_uid) {
            chain.sources.insert(source_uid);
        }
        source.set_chain(Some(chain_uid));
        Ok(())
    }

    /// Takes a Source out of its chain. Returns the chain it left, if any.
    pub fn leave(
        &mut self,
        source_uid: Uid,
        sources: &mut BTreeMap<Uid, Source>,
    ) -> Result<Option<ChainUid>, BlocksError> {
        let source = sources
            .get_mut(&source_uid)
            .ok_or(BlocksError::UnknownBlock(source_uid))?;
        let previous = source.chain();
        source.set_chain(None);
        if let Some(chain_uid) = previous {
            self.detach(chain_uid, source_uid);
        }
        Ok(previous)
    }

    /// Cleans up after a Source that has been deleted.
    pub fn remove_source(&mut self, source: &Source) {
        let uid = source.uid();
        let listing: Vec<ChainUid> = self
            .chains
            .values()
            .filter(|chain| chain.sources.contains(&uid))
            .map(|chain| chain.uid)
            .collect();
        for chain_uid in listing.into_iter().chain(source.chain()) {
            self.detach(chain_uid, uid);
        }
    }

    /// Replaces all chains with groups of Sources that are within `radius` of
    /// each other, directly or through other members. Lone Sources don't get a
    /// chain. Returns true if membership changed. When it didn't, existing
    /// [ChainUid]s are kept.
    pub fn derive_from_proximity(
        &mut self,
        radius: f64,
        sources: &mut BTreeMap<Uid, Source>,
    ) -> bool {
        let uids: Vec<Uid> = sources.keys().copied().collect();
        let positions: Vec<_> = sources.values().map(|s| s.position()).collect();
        let mut parents: Vec<usize> = (0..uids.len()).collect();
        fn find(parents: &mut [usize], mut i: usize) -> usize {
            while parents[i] != i {
                parents[i] = parents[parents[i]];
                i = parents[i];
            }
            i
        }
        for i in 0..uids.len() {
            for j in (i + 1)..uids.len() {
                if SpatialIndex::within(positions[i], positions[j], radius) {
                    let (a, b) = (find(&mut parents, i), find(&mut parents, j));
                    if a != b {
                        parents[b.max(a)] = a.min(b);
                    }
                }
            }
        }
        let mut groups: BTreeMap<usize, BTreeSet<Uid>> = BTreeMap::default();
        for (i, uid) in uids.iter().enumerate() {
            let root = find(&mut parents, i);
            groups.entry(root).or_default().insert(*uid);
        }
        let derived: BTreeSet<BTreeSet<Uid>> =
            groups.into_values().filter(|g| g.len() > 1).collect();
        let current: BTreeSet<BTreeSet<Uid>> =
            self.chains.values().map(|c| c.sources.clone()).collect();
        if derived == current {
            return false;
        }

        self.chains.clear();
        sources.values_mut().for_each(|s| s.set_chain(None));
        for members in derived {
            let chain_uid = self.uid_factory.mint_next();
            for member in members.iter() {
                if let Some(source) = sources.get_mut(member) {
                    source.set_chain(Some(chain_uid));
                }
            }
            self.chains.insert(
                chain_uid,
                Chain {
                    uid: chain_uid,
                    sources: members,
                },
            );
        }
        true
    }

    #[allow(missing_docs)]
    pub fn chain(&self, chain_uid: ChainUid) -> Option<&Chain> {
        self.chains.get(&chain_uid)
    }

    /// The members of the given chain.
    pub fn members(&self, chain_uid: ChainUid) -> Option<&BTreeSet<Uid>> {
        self.chains.get(&chain_uid).map(|c| &c.sources)
    }

    /// All chains, ordered by [ChainUid].
    pub fn chains(&self) -> Vec<&Chain> {
        let mut r: Vec<&Chain> = self.chains.values().collect();
        r.sort_by_key(|c| c.uid);
        r
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Finds every disagreement between chains and Sources' back-references.
    pub fn check(&self, sources: &BTreeMap<Uid, Source>) -> Vec<TopologyIssue> {
        let mut issues = Vec::default();
        for source in sources.values() {
            if let Some(chain_uid) = source.chain() {
                if !self
                    .members(chain_uid)
                    .is_some_and(|m| m.contains(&source.uid()))
                {
                    issues.push(TopologyIssue::DanglingChain {
                        source: source.uid(),
                        chain: chain_uid,
                    });
                }
            }
        }
        for chain in self.chains.values() {
            for member in chain.sources.iter() {
                if sources.get(member).and_then(|s| s.chain()) != Some(chain.uid) {
                    issues.push(TopologyIssue::StrayMember {
                        chain: chain.uid,
                        source: *member,
                    });
                }
            }
        }
        issues.sort();
        issues
    }

    /// Drops every membership that [ChainStore::check()] would complain about.
    pub fn repair(&mut self, sources: &mut BTreeMap<Uid, Source>) {
        for issue in self.check(sources) {
            match issue {
                TopologyIssue::DanglingChain { source, .. } => {
                    if let Some(s) = sources.get_mut(&source) {
                        s.set_chain(None);
                    }
                }
                TopologyIssue::StrayMember { chain, source } => self.detach(chain, source),
                _ => {}
            }
        }
    }

    fn detach(&mut self, chain_uid: ChainUid, source_uid: Uid) {
        if let Some(chain) = self.chains.get_mut(&chain_uid) {
            chain.sources.remove(&source_uid);
            if chain.sources.is_empty() {
                self.chains.remove(&chain_uid);
            }
        }
    }
}

/// The Sources a Modifier reaches, plus anything odd found along the way.
#[derive(Debug, Default, PartialEq)]
pub struct Resolution {
    /// Reachable Sources, each once, sorted.
    pub sources: Vec<Uid>,
    /// Inconsistencies noticed during resolution.
    pub issues: Vec<TopologyIssue>,
}

/// Expands a Modifier's direct connections through chain membership.
#[derive(Debug)]
pub struct ChainResolver<'a> {
    sources: &'a BTreeMap<Uid, Source>,
    chains: &'a ChainStore,
}
impl<'a> ChainResolver<'a> {
    #[allow(missing_docs)]
    pub fn new(sources: &'a BTreeMap<Uid, Source>, chains: &'a ChainStore) -> Self {
        Self { sources, chains }
    }

    /// Every Source reachable from `entry`: each directly connected Source,
    /// and every member of its chain. Doesn't modify anything.
    pub fn resolve<M: HasConnections>(&self, entry: &M) -> Resolution {
        let mut reachable = BTreeSet::default();
        let mut issues = Vec::default();
        for source_uid in entry.connections() {
            let Some(source) = self.sources.get(source_uid) else {
                issues.push(TopologyIssue::DanglingConnection {
                    modifier: entry.uid(),
                    source: *source_uid,
                });
                continue;
            };
            let Some(chain_uid) = source.chain() else {
                reachable.insert(*source_uid);
                continue;
            };
            match self.chains.members(chain_uid) {
                Some(members) if members.contains(source_uid) => {
                    for member in members {
                        if self.sources.contains_key(member) {
                            reachable.insert(*member);
                        } else {
                            issues.push(TopologyIssue::StrayMember {
                                chain: chain_uid,
                                source: *member,
                            });
                        }
                    }
                }
                _ => {
                    issues.push(TopologyIssue::DanglingChain {
                        source: *source_uid,
                        chain: chain_uid,
                    });
                    reachable.insert(*source_uid);
                }
            }
        }
        issues.sort();
        issues.dedup();
        Resolution {
            sources: reachable.into_iter().collect(),
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geometry::Point, logic::Toggle, modifier::Modifier};

    fn sources_at(points: &[(f64, f64)]) -> BTreeMap<Uid, Source> {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| (Uid(i), Source::new_with(Uid(i), Point::from(*p))))
            .collect()
    }

    fn modifier_connected_to(uids: &[usize]) -> Modifier {
        let mut m = Modifier::new_with(Uid(100), Point::ORIGIN, 5.0, Box::<Toggle>::default());
        for uid in uids {
            m.add_connection(Uid(*uid));
        }
        m
    }

    #[test]
    fn chain_crud() {
        let mut sources = sources_at(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let mut store = ChainStore::default();
        assert!(store.is_empty());

        let a = store.create(&[Uid(0), Uid(1)], &mut sources).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(sources[&Uid(0)].chain(), Some(a));
        assert_eq!(
            store.members(a).unwrap().iter().copied().collect::<Vec<_>>(),
            vec![Uid(0), Uid(1)]
        );

        // Joining a second chain leaves the first.
        let b = store.create(&[Uid(1), Uid(2)], &mut sources).unwrap();
        assert_eq!(sources[&Uid(1)].chain(), Some(b));
        assert!(!store.members(a).unwrap().contains(&Uid(1)));
        assert!(store.check(&sources).is_empty());

        // Leaving the last member of a chain removes the chain.
        assert_eq!(store.leave(Uid(0), &mut sources), Ok(Some(a)));
        assert!(store.chain(a).is_none());
        assert_eq!(store.leave(Uid(0), &mut sources), Ok(None));
        assert_eq!(store.chains().len(), 1);

        assert_eq!(
            store.create(&[], &mut sources),
            Err(BlocksError::EmptyChain)
        );
        assert_eq!(
            store.create(&[Uid(42)], &mut sources),
            Err(BlocksError::UnknownBlock(Uid(42)))
        );
        assert_eq!(
            store.join(ChainUid(99), Uid(0), &mut sources),
            Err(BlocksError::UnknownChain(ChainUid(99)))
        );
    }

    #[test]
    fn removing_a_source_cleans_up_its_chain() {
        let mut sources = sources_at(&[(0.0, 0.0), (1.0, 0.0)]);
        let mut store = ChainStore::default();
        let chain = store.create(&[Uid(0), Uid(1)], &mut sources).unwrap();

        let removed = sources.remove(&Uid(0)).unwrap();
        store.remove_source(&removed);
        assert_eq!(
            store.members(chain).unwrap().iter().copied().collect::<Vec<_>>(),
            vec![Uid(1)]
        );
        let removed = sources.remove(&Uid(1)).unwrap();
        store.remove_source(&removed);
        assert!(store.is_empty());
    }

    #[test]
    fn resolution_fans_out_through_chains() {
        let mut sources = sources_at(&[(3.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)]);
        let mut store = ChainStore::default();
        store.create(&[Uid(0), Uid(1)], &mut sources).unwrap();

        let resolver = ChainResolver::new(&sources, &store);
        let r = resolver.resolve(&modifier_connected_to(&[0]));
        assert_eq!(r.sources, vec![Uid(0), Uid(1)]);
        assert!(r.issues.is_empty());

        // Two direct connections into the same chain don't duplicate members,
        // and an unchained Source reaches only itself.
        let r = resolver.resolve(&modifier_connected_to(&[0, 1, 3]));
        assert_eq!(r.sources, vec![Uid(0), Uid(1), Uid(3)]);

        assert!(resolver.resolve(&modifier_connected_to(&[])).sources.is_empty());
    }

    #[test]
    fn resolution_reports_inconsistencies() {
        let mut sources = sources_at(&[(0.0, 0.0), (1.0, 0.0)]);
        let mut store = ChainStore::default();
        sources.get_mut(&Uid(1)).unwrap().set_chain(Some(ChainUid(77)));

        let resolver = ChainResolver::new(&sources, &store);
        let r = resolver.resolve(&modifier_connected_to(&[1, 5]));
        assert_eq!(r.sources, vec![Uid(1)]);
        assert_eq!(
            r.issues,
            vec![
                TopologyIssue::DanglingChain {
                    source: Uid(1),
                    chain: ChainUid(77)
                },
                TopologyIssue::DanglingConnection {
                    modifier: Uid(100),
                    source: Uid(5)
                },
            ]
        );

        assert_eq!(store.check(&sources).len(), 1);
        store.repair(&mut sources);
        assert!(store.check(&sources).is_empty());
        assert_eq!(sources[&Uid(1)].chain(), None);
    }

    #[test]
    fn proximity_chains() {
        let mut sources = sources_at(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (4.0, 0.0),
            (20.0, 0.0),
            (21.0, 0.0),
        ]);
        let mut store = ChainStore::default();
        assert!(store.derive_from_proximity(2.5, &mut sources));
        assert_eq!(store.len(), 2);

        let first = sources[&Uid(0)].chain().unwrap();
        assert_eq!(
            sources[&Uid(2)].chain(),
            Some(first),
            "membership is transitive"
        );
        assert_ne!(sources[&Uid(3)].chain(), Some(first));
        assert_eq!(sources[&Uid(3)].chain(), sources[&Uid(4)].chain());

        assert!(
            !store.derive_from_proximity(2.5, &mut sources),
            "nothing moved, so nothing should change"
        );
        assert_eq!(sources[&Uid(0)].chain(), Some(first));

        sources
            .get_mut(&Uid(4))
            .unwrap()
            .set_position(Point::new(50.0, 0.0));
        assert!(store.derive_from_proximity(2.5, &mut sources));
        assert_eq!(store.len(), 1);
        assert_eq!(sources[&Uid(3)].chain(), None);
        assert!(store.check(&sources).is_empty());
    }
}
