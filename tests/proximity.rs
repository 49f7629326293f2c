// Copyright (c) 2024 Mike Tsao. All rights reserved.

use blocks_engine::prelude::*;
use more_asserts::{assert_gt, assert_le};

fn is_pressed(scene: &Scene, uid: Uid) -> bool {
    scene.source(uid).is_some_and(|s| s.is_pressed())
}

#[test]
fn edges_follow_catchment_areas() {
    let settings = SceneSettingsBuilder::default()
        .default_catchment_area(5.0)
        .build()
        .unwrap();
    let mut scene = Scene::new_with(settings);
    let a = scene
        .create_modifier(&GateKey::from(Toggle::KEY), Some(Point::new(0.0, 0.0)))
        .unwrap();
    let b = scene
        .create_modifier(&GateKey::from(Toggle::KEY), Some(Point::new(12.0, 0.0)))
        .unwrap();
    for x in 0..=12 {
        for y in 0..=6 {
            scene.create_source(Some(Point::new(x as f64, y as f64)));
        }
    }

    let edges = scene.edges();
    for modifier_uid in [a, b] {
        let modifier = scene.modifier(modifier_uid).unwrap();
        for source in scene.sources() {
            let edge = Edge::new(modifier_uid, source.uid());
            let distance = modifier.distance_from(source.position());
            if edges.contains(&edge) {
                assert_le!(distance, modifier.catchment_area());
                assert!(modifier.connections().contains(&source.uid()));
                assert!(source.modifiers().contains(&modifier_uid));
            } else {
                assert_gt!(distance, modifier.catchment_area());
            }
        }
    }

    // The boundary is inclusive.
    let on_the_line = scene.create_source(Some(Point::new(0.0, 5.0)));
    assert!(scene.edges().contains(&Edge::new(a, on_the_line)));
    assert!(scene.check_topology().is_empty());
}

#[test]
fn repeated_checks_change_nothing() {
    let mut scene = Scene::default();
    let m = scene
        .create_modifier(&GateKey::from(Toggle::KEY), Some(Point::ORIGIN))
        .unwrap();
    let s = scene.create_source(Some(Point::new(2.0, 2.0)));
    let before = scene.edges();
    let _ = scene.drain_events();

    scene.move_block(s, Point::new(2.0, 2.0)).unwrap();
    scene.pointer_up().unwrap();
    scene.repair_topology();
    assert_eq!(scene.edges(), before);
    assert_eq!(scene.edges(), vec![Edge::new(m, s)]);
    assert!(
        !scene
            .drain_events()
            .iter()
            .any(|e| matches!(e, BlocksEvent::Attack(_) | BlocksEvent::Release(_))),
        "nothing should have sounded or stopped"
    );
}

#[test]
fn deleting_blocks_cleans_up() {
    let mut scene = Scene::default();
    let m = scene
        .add_modifier_with_gate(Box::<Toggle>::default(), Some(Point::ORIGIN), Some(5.0));
    let s1 = scene.create_source(Some(Point::new(3.0, 0.0)));
    let s2 = scene.create_source(Some(Point::new(10.0, 0.0)));
    scene.chain_sources(&[s1, s2]).unwrap();
    scene.trigger(m).unwrap();
    let _ = scene.drain_events();

    assert_eq!(scene.delete_block(s1).unwrap(), BlockKind::Source);
    let events = scene.drain_events();
    assert!(events.contains(&BlocksEvent::Release(s1)));
    assert!(events.contains(&BlocksEvent::BlockRemoved(s1, BlockKind::Source)));
    assert!(scene.edges().is_empty());
    assert!(scene.modifier(m).unwrap().connections().is_empty());
    assert_eq!(scene.resolve_chain(m).unwrap(), Vec::<Uid>::default());
    assert!(
        !is_pressed(&scene, s2),
        "no gate that's on reaches s2 anymore"
    );
    assert!(scene.check_topology().is_empty());

    let s3 = scene.create_source(Some(Point::new(1.0, 0.0)));
    assert_eq!(scene.delete_block(m).unwrap(), BlockKind::Modifier);
    assert!(scene.edges().is_empty());
    assert!(scene.source(s3).unwrap().modifiers().is_empty());
    assert!(scene.delete_block(m).is_err());
}

#[test]
fn moving_sources_reconciles_with_the_gate() {
    let mut scene = Scene::default();
    let m = scene
        .add_modifier_with_gate(Box::<Toggle>::default(), Some(Point::ORIGIN), Some(5.0));
    let s = scene.create_source(Some(Point::new(3.0, 0.0)));
    scene.trigger(m).unwrap();
    assert!(is_pressed(&scene, s));

    scene.move_block(s, Point::new(50.0, 0.0)).unwrap();
    assert!(!is_pressed(&scene, s), "out of reach of an on gate");

    scene.move_block(s, Point::new(0.0, 4.0)).unwrap();
    assert!(is_pressed(&scene, s), "back in reach of an on gate");

    let late = scene.create_source(Some(Point::new(-1.0, 0.0)));
    assert!(is_pressed(&scene, late), "dropped next to an on gate");
}

#[test]
fn the_on_gate_wins_when_gates_disagree() {
    let mut scene = Scene::default();
    let on = scene
        .add_modifier_with_gate(Box::<Toggle>::default(), Some(Point::ORIGIN), Some(5.0));
    let s = scene.create_source(Some(Point::new(3.0, 0.0)));
    scene.trigger(on).unwrap();

    let off = scene
        .add_modifier_with_gate(Box::<Toggle>::default(), Some(Point::new(6.0, 0.0)), Some(5.0));
    assert_eq!(scene.edges(), vec![Edge::new(on, s), Edge::new(off, s)]);
    assert!(is_pressed(&scene, s));
}

#[test]
fn turning_one_gate_off_spares_what_another_keeps_on() {
    let mut scene = Scene::default();
    let x = scene
        .add_modifier_with_gate(Box::<Toggle>::default(), Some(Point::ORIGIN), Some(5.0));
    let y = scene
        .add_modifier_with_gate(Box::<Toggle>::default(), Some(Point::new(6.0, 0.0)), Some(5.0));
    let s = scene.create_source(Some(Point::new(3.0, 0.0)));

    scene.trigger(x).unwrap();
    scene.trigger(y).unwrap();
    let _ = scene.drain_events();

    assert_eq!(scene.trigger(x).unwrap(), Decision::ReleaseAll);
    assert!(is_pressed(&scene, s), "y is still on");
    assert!(!scene.drain_events().contains(&BlocksEvent::Release(s)));

    // An unrelated edit shouldn't change anything for s.
    let other = scene.create_source(Some(Point::new(10.0, 0.0)));
    assert!(is_pressed(&scene, s));
    assert!(!scene
        .drain_events()
        .iter()
        .any(|e| *e == BlocksEvent::Attack(s) || *e == BlocksEvent::Release(s)));

    assert_eq!(scene.trigger(y).unwrap(), Decision::ReleaseAll);
    assert!(!is_pressed(&scene, s));
    assert!(!is_pressed(&scene, other));
}

#[test]
fn deleting_a_modifier_leaves_chains_alone() {
    let mut scene = Scene::default();
    let m = scene
        .add_modifier_with_gate(Box::<Toggle>::default(), Some(Point::ORIGIN), Some(5.0));
    let s1 = scene.create_source(Some(Point::new(3.0, 0.0)));
    let s2 = scene.create_source(Some(Point::new(10.0, 0.0)));
    let chain = scene.chain_sources(&[s1, s2]).unwrap();
    let members = scene.chains().members(chain).cloned();
    assert_eq!(members.as_ref().map(|m| m.len()), Some(2));

    assert_eq!(scene.delete_block(m).unwrap(), BlockKind::Modifier);
    assert!(scene.edges().is_empty());
    assert!(scene.source(s1).unwrap().modifiers().is_empty());
    assert_eq!(scene.chains().members(chain).cloned(), members);
    assert_eq!(scene.source(s1).unwrap().chain(), Some(chain));
    assert_eq!(scene.source(s2).unwrap().chain(), Some(chain));
    assert!(scene.check_topology().is_empty());
}

#[test]
fn chains_can_follow_proximity() {
    let settings = SceneSettingsBuilder::default()
        .chain_radius(3.0)
        .build()
        .unwrap();
    let mut scene = Scene::new_with(settings);
    let m = scene
        .add_modifier_with_gate(Box::<Toggle>::default(), Some(Point::ORIGIN), Some(4.0));
    let s1 = scene.create_source(Some(Point::new(3.0, 0.0)));
    let s2 = scene.create_source(Some(Point::new(6.0, 0.0)));
    let s3 = scene.create_source(Some(Point::new(8.5, 0.0)));
    let loner = scene.create_source(Some(Point::new(30.0, 30.0)));

    assert_eq!(scene.resolve_chain(m).unwrap(), vec![s1, s2, s3]);
    assert_eq!(scene.source(loner).unwrap().chain(), None);
    assert_eq!(
        scene
            .chain_sources(&[s1, loner])
            .unwrap_err()
            .downcast_ref::<BlocksError>(),
        Some(&BlocksError::DerivedChains(3.0))
    );

    scene.trigger(m).unwrap();
    assert!(is_pressed(&scene, s3));

    // Breaking the chain apart releases what the gate no longer reaches.
    scene.move_block(s2, Point::new(0.0, -30.0)).unwrap();
    assert_eq!(scene.resolve_chain(m).unwrap(), vec![s1]);
    assert!(is_pressed(&scene, s1));
    assert!(!is_pressed(&scene, s3));
    assert!(scene.check_topology().is_empty());
}

#[test]
fn snapshot_describes_every_block() {
    let mut scene = Scene::default();
    let m = scene
        .create_modifier(&GateKey::from(Toggle::KEY), Some(Point::ORIGIN))
        .unwrap();
    let s = scene.create_source(Some(Point::new(1.0, 0.0)));
    scene.select_block(s).unwrap();
    scene.trigger(m).unwrap();

    let snapshot = scene.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].uid, m);
    assert_eq!(snapshot[0].gate, Some("Toggle Power"));
    assert!(snapshot[0].is_on);
    assert_eq!(snapshot[0].connections, vec![s]);
    assert_eq!(snapshot[1].kind, BlockKind::Source);
    assert!(snapshot[1].is_selected);
    assert!(snapshot[1].is_on);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json[1]["is-selected"], true);
}
