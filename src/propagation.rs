// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Turning a gate's decision into attacks and releases.

use crate::{events::BlocksEvent, logic::Decision, traits::Triggerable, uid::Uid};
use crossbeam_channel::Sender;
use log::warn;
use std::collections::BTreeMap;

/// What a call to [TriggerPropagator::propagate()] actually did.
#[derive(Debug, Default, PartialEq)]
pub struct PropagationReport {
    /// Sources that went from idle to pressed.
    pub attacked: Vec<Uid>,
    /// Sources that went from pressed to idle.
    pub released: Vec<Uid>,
    /// Sources left alone because the user is holding them.
    pub skipped_held: Vec<Uid>,
    /// Targets that weren't in the registry.
    pub missing: Vec<Uid>,
}

/// Fans a [Decision] out across a set of Sources.
///
/// An attack goes to every target, and each Source decides for itself whether
/// that changes anything. A release goes to every target *except* the ones the
/// user is holding down, so that a chain-wide release doesn't cut off a note
/// someone is still playing. Every actual transition is published as a
/// [BlocksEvent]; delivery is fire-and-forget.
#[derive(Debug)]
pub struct TriggerPropagator<'a> {
    sender: &'a Sender<BlocksEvent>,
}
impl<'a> TriggerPropagator<'a> {
    #[allow(missing_docs)]
    pub fn new(sender: &'a Sender<BlocksEvent>) -> Self {
        Self { sender }
    }

    /// Applies `decision` to each of `targets`, in order.
    pub fn propagate<S: Triggerable>(
        &self,
        sources: &mut BTreeMap<Uid, S>,
        targets: &[Uid],
        decision: Decision,
    ) -> PropagationReport {
        let mut report = PropagationReport::default();
        for uid in targets {
            let Some(source) = sources.get_mut(uid) else {
                warn!("propagate({decision}): no source {uid}");
                report.missing.push(*uid);
                continue;
            };
            match decision {
                Decision::Attack => {
                    if source.trigger_attack() {
                        report.attacked.push(*uid);
                        self.publish(BlocksEvent::Attack(*uid));
                    }
                }
                Decision::ReleaseAll => {
                    if source.is_held() {
                        report.skipped_held.push(*uid);
                    } else if source.trigger_release() {
                        report.released.push(*uid);
                        self.publish(BlocksEvent::Release(*uid));
                    }
                }
            }
        }
        report
    }

    fn publish(&self, event: BlocksEvent) {
        if let Err(e) = self.sender.try_send(event) {
            warn!("While sending: {e:?}");
        }
    }
}
