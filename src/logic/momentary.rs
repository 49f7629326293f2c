// Copyright (c) 2024 Mike Tsao. All rights reserved.

use super::{Decision, GateKey, LogicGate};
use crate::{
    control::ControlValue,
    error::BlocksError,
    options::{OptionsForm, OptionsParameter, Switch, SwitchMode},
};
use serde::{Deserialize, Serialize};
use strum::VariantNames;
use strum_macros::{EnumString, VariantNames};

#[derive(Debug, EnumString, VariantNames)]
#[strum(serialize_all = "kebab-case")]
enum MomentaryParam {
    Pressed,
}

/// A power button that's on only while it's pressed. It transitions the same
/// way a [Toggle](super::Toggle) does, but the options panel drives it with
/// levels rather than clicks, so writing the level it's already at is not an
/// event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Momentary {
    logic: bool,
}
impl Momentary {
    #[allow(missing_docs)]
    pub const KEY: &'static str = "momentary";
    #[allow(missing_docs)]
    pub const NAME: &'static str = "Momentary Power";
}
impl LogicGate for Momentary {
    fn key(&self) -> GateKey {
        GateKey::from(Self::KEY)
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn logic(&self) -> bool {
        self.logic
    }

    fn perform_logic(&mut self) -> Decision {
        self.logic = !self.logic;
        Decision::for_logic(self.logic)
    }

    fn control_names(&self) -> &'static [&'static str] {
        MomentaryParam::VARIANTS
    }

    fn param(&self, name: &str) -> Option<ControlValue> {
        match name.parse::<MomentaryParam>().ok()? {
            MomentaryParam::Pressed => Some(self.logic.into()),
        }
    }

    fn set_param(
        &mut self,
        name: &str,
        value: ControlValue,
    ) -> Result<Option<Decision>, BlocksError> {
        match name.parse::<MomentaryParam>() {
            Ok(MomentaryParam::Pressed) => {
                if bool::from(value) == self.logic {
                    Ok(None)
                } else {
                    Ok(Some(self.perform_logic()))
                }
            }
            Err(_) => Err(BlocksError::UnknownParam {
                gate: Self::NAME,
                name: name.to_string(),
            }),
        }
    }

    fn options_form(&self) -> OptionsForm {
        OptionsForm {
            name: Self::NAME.to_string(),
            parameters: vec![OptionsParameter::Switches {
                name: "Power".to_string(),
                setting: String::default(),
                switches: vec![Switch {
                    name: "Hold".to_string(),
                    setting: "pressed".to_string(),
                    value: self.logic,
                    lit: true,
                    mode: SwitchMode::Momentary,
                }],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_edges_are_events() {
        let mut gate = Momentary::default();
        assert_eq!(gate.set_param("pressed", false.into()), Ok(None));
        assert!(!gate.logic());

        assert_eq!(
            gate.set_param("pressed", true.into()),
            Ok(Some(Decision::Attack))
        );
        assert_eq!(
            gate.set_param("pressed", true.into()),
            Ok(None),
            "holding the button down isn't a second press"
        );
        assert_eq!(
            gate.set_param("pressed", false.into()),
            Ok(Some(Decision::ReleaseAll))
        );
        assert_eq!(gate.param("pressed"), Some(ControlValue::MIN));
    }

    #[test]
    fn direct_triggers_alternate() {
        let mut gate = Momentary::default();
        assert_eq!(gate.perform_logic(), Decision::Attack);
        assert_eq!(gate.perform_logic(), Decision::ReleaseAll);
        assert_eq!(gate.perform_logic(), Decision::Attack);
        assert_eq!(gate.update_connections(), Decision::Attack);
    }

    #[test]
    fn rejects_foreign_params() {
        let mut gate = Momentary::default();
        assert_eq!(gate.control_names(), &["pressed"]);
        assert_eq!(
            gate.set_param("logic", true.into()),
            Err(BlocksError::UnknownParam {
                gate: Momentary::NAME,
                name: "logic".to_string()
            })
        );
    }
}
