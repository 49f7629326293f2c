// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! `blocks-sim` plays a scripted session against a scene and prints what
//! happened as JSON.

use blocks_engine::prelude::*;
use clap::Parser;
use script::{SceneCommand, ScriptRunner};
use serde::Serialize;
use std::path::PathBuf;

mod script;

#[derive(Parser, Debug, Default)]
#[clap(author, about, version, long_about = None)]
struct Args {
    /// A JSON array of commands to play.
    script: PathBuf,

    /// Scene settings (JSON). Defaults apply if omitted.
    #[clap(short = 's', long, value_parser)]
    settings: Option<PathBuf>,

    /// Keep going when a command fails
    #[clap(short = 'k', long, value_parser)]
    keep_going: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct Step<'a> {
    command: &'a SceneCommand,
    events: Vec<BlocksEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = match args.settings {
        Some(path) => SceneSettings::load(&path)?,
        None => SceneSettings::default(),
    };
    let json = std::fs::read_to_string(&args.script)?;
    let commands: Vec<SceneCommand> = serde_json::from_str(&json)?;

    let mut runner = ScriptRunner::new_with(Scene::new_with(settings));
    for command in commands.iter() {
        let result = runner.run(command);
        let step = Step {
            command,
            events: runner.scene().drain_events(),
            error: result.as_ref().err().map(|e| format!("{e:#}")),
        };
        println!("{}", serde_json::to_string(&step)?);
        if !args.keep_going {
            result?;
        }
    }
    println!("{}", serde_json::to_string_pretty(&runner.scene().snapshot())?);
    Ok(())
}
