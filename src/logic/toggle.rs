// Copyright (c) 2024 Mike Tsao. All rights reserved.

use super::{Decision, GateKey, LogicGate};
use crate::{
    control::ControlValue,
    error::BlocksError,
    options::{OptionsForm, OptionsParameter, Switch, SwitchMode},
};
use log::debug;
use serde::{Deserialize, Serialize};
use strum::VariantNames;
use strum_macros::{EnumString, VariantNames};

#[derive(Debug, EnumString, VariantNames)]
#[strum(serialize_all = "kebab-case")]
enum ToggleParam {
    Logic,
}

/// A power switch. Each logical event flips it: off→on attacks the reachable
/// Sources, and on→off releases them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Toggle {
    logic: bool,
}
impl Toggle {
    #[allow(missing_docs)]
    pub const KEY: &'static str = "toggle";
    #[allow(missing_docs)]
    pub const NAME: &'static str = "Toggle Power";
}
impl LogicGate for Toggle {
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
        ToggleParam::VARIANTS
    }

    fn param(&self, name: &str) -> Option<ControlValue> {
        match name.parse::<ToggleParam>().ok()? {
            ToggleParam::Logic => Some(self.logic.into()),
        }
    }

    // Writing the switch is a logical event whatever the written value is, so
    // the state always flips exactly once.
    fn set_param(
        &mut self,
        name: &str,
        value: ControlValue,
    ) -> Result<Option<Decision>, BlocksError> {
        match name.parse::<ToggleParam>() {
            Ok(ToggleParam::Logic) => {
                let decision = self.perform_logic();
                if bool::from(value) != self.logic {
                    debug!(
                        "{}: switch wrote {:?} but the gate is now {}",
                        Self::NAME,
                        value,
                        self.logic
                    );
                }
                Ok(Some(decision))
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
                    name: "Off/On".to_string(),
                    setting: "logic".to_string(),
                    value: self.logic,
                    lit: true,
                    mode: SwitchMode::OffOn,
                }],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternates_starting_with_attack() {
        let mut toggle = Toggle::default();
        assert!(!toggle.logic());
        for n in 1..=10 {
            let decision = toggle.perform_logic();
            if n % 2 == 1 {
                assert_eq!(decision, Decision::Attack, "call {n} should attack");
                assert!(toggle.logic());
            } else {
                assert_eq!(decision, Decision::ReleaseAll, "call {n} should release");
                assert!(!toggle.logic());
            }
        }
    }

    #[test]
    fn reconciliation_does_not_transition() {
        let mut toggle = Toggle::default();
        assert_eq!(toggle.update_connections(), Decision::ReleaseAll);
        assert_eq!(toggle.update_connections(), Decision::ReleaseAll);
        assert!(!toggle.logic());

        toggle.perform_logic();
        assert_eq!(toggle.update_connections(), Decision::Attack);
        assert!(toggle.logic());
    }

    #[test]
    fn setting_logic_performs_logic() {
        let mut toggle = Toggle::default();
        assert_eq!(toggle.control_names(), &["logic"]);
        assert_eq!(
            toggle.set_param("logic", true.into()),
            Ok(Some(Decision::Attack))
        );
        assert_eq!(toggle.param("logic"), Some(ControlValue::MAX));
        assert_eq!(
            toggle.set_param("logic", false.into()),
            Ok(Some(Decision::ReleaseAll))
        );
        assert_eq!(toggle.param("logic"), Some(ControlValue::MIN));

        // The written value doesn't matter; it's still one event.
        assert_eq!(
            toggle.set_param("logic", false.into()),
            Ok(Some(Decision::Attack))
        );
    }

    #[test]
    fn unknown_params_are_rejected() {
        let mut toggle = Toggle::default();
        assert!(toggle.param("volume").is_none());
        assert!(matches!(
            toggle.set_param("volume", 0.5.into()),
            Err(BlocksError::UnknownParam { .. })
        ));
        assert!(!toggle.logic(), "a rejected write shouldn't transition");
    }

    #[test]
    fn options_form_reflects_state() {
        let mut toggle = Toggle::default();
        toggle.perform_logic();
        let form = toggle.options_form();
        assert_eq!(form.name, "Toggle Power");
        let OptionsParameter::Switches { switches, .. } = &form.parameters[0];
        assert_eq!(switches[0].setting, "logic");
        assert!(switches[0].value);

        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["parameters"][0]["type"], "switches");
        assert_eq!(json["parameters"][0]["switches"][0]["mode"], "offOn");
    }
}
