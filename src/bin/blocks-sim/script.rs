// Copyright (c) 2024 Mike Tsao. All rights reserved.

use anyhow::anyhow;
use blocks_engine::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One step of a scripted session. Scripts name blocks as they create them,
/// and later steps refer to blocks by those names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum SceneCommand {
    CreateSource {
        name: String,
        at: Option<(f64, f64)>,
    },
    #[serde(rename_all = "kebab-case")]
    CreateModifier {
        name: String,
        gate: String,
        at: Option<(f64, f64)>,
        catchment_area: Option<f64>,
    },
    Move {
        name: String,
        to: (f64, f64),
    },
    Trigger {
        name: String,
    },
    SetParam {
        name: String,
        param: String,
        value: f64,
    },
    Press {
        name: String,
    },
    Release {
        name: String,
    },
    Chain {
        names: Vec<String>,
    },
    Unchain {
        name: String,
    },
    Select {
        name: String,
    },
    Delete {
        name: String,
    },
}

/// Plays [SceneCommand]s against a [Scene].
#[derive(Debug)]
pub struct ScriptRunner {
    scene: Scene,
    names: FxHashMap<String, Uid>,
}
impl ScriptRunner {
    pub fn new_with(scene: Scene) -> Self {
        Self {
            scene,
            names: Default::default(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn run(&mut self, command: &SceneCommand) -> anyhow::Result<()> {
        match command {
            SceneCommand::CreateSource { name, at } => {
                let uid = self.scene.create_source(at.map(Point::from));
                self.names.insert(name.clone(), uid);
            }
            SceneCommand::CreateModifier {
                name,
                gate,
                at,
                catchment_area,
            } => {
                let uid = self
                    .scene
                    .create_modifier(&GateKey::from(gate.as_str()), at.map(Point::from))?;
                if let Some(catchment_area) = catchment_area {
                    self.scene.set_catchment_area(uid, *catchment_area)?;
                }
                self.names.insert(name.clone(), uid);
            }
            SceneCommand::Move { name, to } => {
                let uid = self.uid(name)?;
                self.scene.move_block(uid, Point::from(*to))?;
            }
            SceneCommand::Trigger { name } => {
                let uid = self.uid(name)?;
                self.scene.trigger(uid)?;
            }
            SceneCommand::SetParam { name, param, value } => {
                let uid = self.uid(name)?;
                self.scene.set_param(uid, param, ControlValue(*value))?;
            }
            SceneCommand::Press { name } => {
                let uid = self.uid(name)?;
                self.scene.press_source(uid)?;
            }
            SceneCommand::Release { name } => {
                let uid = self.uid(name)?;
                self.scene.release_source(uid)?;
            }
            SceneCommand::Chain { names } => {
                let uids = names
                    .iter()
                    .map(|name| self.uid(name))
                    .collect::<anyhow::Result<Vec<Uid>>>()?;
                self.scene.chain_sources(&uids)?;
            }
            SceneCommand::Unchain { name } => {
                let uid = self.uid(name)?;
                self.scene.unchain_source(uid)?;
            }
            SceneCommand::Select { name } => {
                let uid = self.uid(name)?;
                self.scene.select_block(uid)?;
            }
            SceneCommand::Delete { name } => {
                let uid = self.uid(name)?;
                self.scene.delete_block(uid)?;
                self.names.remove(name);
            }
        }
        Ok(())
    }

    fn uid(&self, name: &str) -> anyhow::Result<Uid> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("no block named {name}"))
    }
}
