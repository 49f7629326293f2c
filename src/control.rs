// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Values that pass between the options panel and a block's parameters.

use serde::{Deserialize, Serialize};

/// A standardized value for named block parameters. Switches map false/true to
/// 0.0/1.0, and anything nonzero reads back as true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlValue(pub f64);
#[allow(missing_docs)]
impl ControlValue {
    pub const MIN: Self = Self(0.0);
    pub const MAX: Self = Self(1.0);
}
impl From<bool> for ControlValue {
    fn from(value: bool) -> Self {
        if value {
            Self::MAX
        } else {
            Self::MIN
        }
    }
}
impl From<ControlValue> for bool {
    fn from(value: ControlValue) -> Self {
        value.0 != 0.0
    }
}
impl From<f64> for ControlValue {
    fn from(value: f64) -> Self {
        Self(value)
    }
}
impl From<ControlValue> for f64 {
    fn from(value: ControlValue) -> Self {
        value.0
    }
}
