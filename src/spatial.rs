// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Distance queries over blocks.

use crate::{geometry::Point, traits::Block, uid::Uid};

/// Answers proximity questions. Block counts are small, so this is a linear
/// scan over the candidates rather than a partitioned index. Every proximity
/// decision in the crate goes through [SpatialIndex::within()] so that they
/// all agree on the boundary.
#[derive(Debug, Default)]
pub struct SpatialIndex;
impl SpatialIndex {
    /// Whether `b` is within `radius` of `a`. The boundary counts as inside. A
    /// negative or NaN radius contains nothing.
    pub fn within(a: Point, b: Point, radius: f64) -> bool {
        a.distance_to(b) <= radius
    }

    /// Returns the [Uid]s of every candidate within `radius` of `center`, in
    /// candidate order.
    pub fn neighbors<'a, B: Block + 'a>(
        center: Point,
        radius: f64,
        candidates: impl IntoIterator<Item = &'a B>,
    ) -> Vec<Uid> {
        candidates
            .into_iter()
            .filter(|candidate| Self::within(center, candidate.position(), radius))
            .map(|candidate| candidate.uid())
            .collect()
    }
}
