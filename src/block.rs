// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! What Sources and Modifiers have in common.

use crate::{geometry::Point, uid::Uid};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// The two kinds of block that can be placed on the canvas.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BlockKind {
    /// Makes sound when attacked.
    Source,
    /// Gates or alters nearby Sources.
    Modifier,
}

/// The state that every block carries regardless of its kind. [Source] and
/// [Modifier] embed one and delegate their [Block](crate::traits::Block)
/// methods to it.
///
/// [Source]: crate::source::Source
/// [Modifier]: crate::modifier::Modifier
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockCore {
    uid: Uid,
    position: Point,
    is_selected: bool,
}
impl BlockCore {
    #[allow(missing_docs)]
    pub fn new_with(uid: Uid, position: Point) -> Self {
        Self {
            uid,
            position,
            is_selected: false,
        }
    }

    #[allow(missing_docs)]
    pub fn uid(&self) -> Uid {
        self.uid
    }

    #[allow(missing_docs)]
    pub fn position(&self) -> Point {
        self.position
    }

    #[allow(missing_docs)]
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    #[allow(missing_docs)]
    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    #[allow(missing_docs)]
    pub fn set_selected(&mut self, is_selected: bool) {
        self.is_selected = is_selected;
    }
}
