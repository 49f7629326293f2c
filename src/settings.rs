// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Configuration for a [Scene](crate::scene::Scene). Intended to be
//! serialized; any field missing from a settings file takes its default.

use anyhow::Context;
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunes how a [Scene](crate::scene::Scene) connects and places blocks.
#[derive(Builder, Clone, Debug, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[serde(rename_all = "kebab-case", default)]
pub struct SceneSettings {
    /// The catchment area given to new Modifiers.
    #[derivative(Default(value = "6.0"))]
    default_catchment_area: f64,

    /// If set, Sources within this distance of each other are chained
    /// automatically, and chains can't be edited by hand.
    #[builder(setter(strip_option))]
    chain_radius: Option<f64>,

    /// Blocks created without a position land somewhere in
    /// (0..canvas_width, 0..canvas_height).
    #[derivative(Default(value = "800.0"))]
    canvas_width: f64,
    #[allow(missing_docs)]
    #[derivative(Default(value = "600.0"))]
    canvas_height: f64,

    /// The first block [Uid](crate::uid::Uid) to hand out.
    first_uid: usize,

    /// Seeds random placement. Unset means a different layout every run.
    #[builder(setter(strip_option))]
    rng_seed: Option<u64>,
}
impl SceneSettings {
    /// Parses settings from JSON.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("parsing scene settings")
    }

    /// Reads settings from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&json)
    }

    #[allow(missing_docs)]
    pub fn default_catchment_area(&self) -> f64 {
        self.default_catchment_area
    }

    #[allow(missing_docs)]
    pub fn chain_radius(&self) -> Option<f64> {
        self.chain_radius
    }

    #[allow(missing_docs)]
    pub fn canvas_width(&self) -> f64 {
        self.canvas_width
    }

    #[allow(missing_docs)]
    pub fn canvas_height(&self) -> f64 {
        self.canvas_height
    }

    #[allow(missing_docs)]
    pub fn first_uid(&self) -> usize {
        self.first_uid
    }

    #[allow(missing_docs)]
    pub fn rng_seed(&self) -> Option<u64> {
        self.rng_seed
    }
}
