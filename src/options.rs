// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Descriptions of a block's option panel. The UI layer renders these; the
//! engine only says which settings exist and what their values are.

use serde::Serialize;

/// Everything the options panel needs to draw a block's settings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptionsForm {
    /// The panel title.
    pub name: String,
    #[allow(missing_docs)]
    pub parameters: Vec<OptionsParameter>,
}

/// One group of controls on the panel.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OptionsParameter {
    /// A row of on/off switches.
    Switches {
        #[allow(missing_docs)]
        name: String,
        #[allow(missing_docs)]
        setting: String,
        #[allow(missing_docs)]
        switches: Vec<Switch>,
    },
}

/// A single switch. `setting` is the parameter name to pass back through
/// [LogicGate::set_param()](crate::logic::LogicGate::set_param).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Switch {
    #[allow(missing_docs)]
    pub name: String,
    #[allow(missing_docs)]
    pub setting: String,
    #[allow(missing_docs)]
    pub value: bool,
    /// Whether the switch lights up when on.
    pub lit: bool,
    #[allow(missing_docs)]
    pub mode: SwitchMode,
}

/// How a [Switch] behaves when clicked.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SwitchMode {
    /// Each click flips the switch.
    OffOn,
    /// On while the pointer is down, off when it's released.
    Momentary,
}
