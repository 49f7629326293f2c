// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Identifiers for blocks and chains.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{
    hash::Hash,
    marker::PhantomData,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Common behavior of the identifier newtypes that a [UidFactory] mints.
pub trait IsUid: Eq + Hash + Ord + Clone + Copy + From<usize> {
    /// The raw value of this identifier.
    fn as_usize(&self) -> usize;
}

/// A [Uid] identifies a block (a Source or a Modifier) and is unique within a
/// [Scene](crate::scene::Scene). Uids are never reused, even after the block
/// they named has been deleted.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[display(fmt = "#{}", _0)]
pub struct Uid(pub usize);
impl IsUid for Uid {
    fn as_usize(&self) -> usize {
        self.0
    }
}
impl From<usize> for Uid {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// A [ChainUid] identifies a [Chain](crate::chain::Chain). Chains come and go
/// much more often than blocks, so they get their own namespace.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[display(fmt = "chain-{}", _0)]
pub struct ChainUid(pub usize);
impl IsUid for ChainUid {
    fn as_usize(&self) -> usize {
        self.0
    }
}
impl From<usize> for ChainUid {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// Generates unique, monotonically increasing identifiers.
#[derive(Debug)]
pub struct UidFactory<U: IsUid> {
    next_uid_value: AtomicUsize,
    _phantom: PhantomData<U>,
}
impl<U: IsUid> Default for UidFactory<U> {
    fn default() -> Self {
        Self::new(0)
    }
}
impl<U: IsUid> UidFactory<U> {
    /// Creates a new [UidFactory] whose first minted value is `first_uid`.
    pub fn new(first_uid: usize) -> Self {
        Self {
            next_uid_value: AtomicUsize::new(first_uid),
            _phantom: Default::default(),
        }
    }

    /// Generates the next unique identifier.
    pub fn mint_next(&self) -> U {
        U::from(self.next_uid_value.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uids_are_monotonic_and_never_reused() {
        let factory = UidFactory::<Uid>::default();
        let a = factory.mint_next();
        let b = factory.mint_next();
        assert_eq!(a, Uid(0));
        assert_eq!(b, Uid(1));
        assert!((0..100).map(|_| factory.mint_next()).all(|uid| uid > b));
    }

    #[test]
    fn factories_start_where_told() {
        let factory = UidFactory::<ChainUid>::new(1024);
        assert_eq!(factory.mint_next(), ChainUid(1024));
        assert_eq!(format!("{}", ChainUid(7)), "chain-7");
        assert_eq!(format!("{}", Uid(7)), "#7");
    }
}
