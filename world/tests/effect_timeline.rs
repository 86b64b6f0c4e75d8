use std::time::Duration;

use ar_summon_core::{Command, EntityId, EntityKind, Event, Phase};
use ar_summon_world::{self as world, config::WorldConfig, query, World};
use glam::Vec2;

fn advance_to(world: &mut World, target_ms: u64, log: &mut Vec<Event>) {
    let now = query::now(world);
    let dt = Duration::from_millis(target_ms).saturating_sub(now);
    world::apply(world, Command::Tick { dt }, log);
}

fn completions(events: &[Event], id: EntityId) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::EffectCompleted { id: completed, .. } if *completed == id))
        .count()
}

#[test]
fn effect_walks_expand_sustain_fade_and_completes_once() {
    let mut world = World::new(&WorldConfig::default()).expect("default config");
    let mut log = Vec::new();
    world::apply(
        &mut world,
        Command::SpawnEffect {
            position: Vec2::new(12.0, -8.0),
        },
        &mut log,
    );
    let id = query::effects(&world).ids()[0];

    advance_to(&mut world, 400, &mut log);
    let snapshot = query::snapshot(&world, id).expect("effect alive");
    assert_eq!(snapshot.phase, Phase::Spawning);
    assert!(snapshot.transform.opacity > 0.0 && snapshot.transform.opacity < 1.0);

    advance_to(&mut world, 2_000, &mut log);
    assert_eq!(query::snapshot(&world, id).map(|s| s.phase), Some(Phase::Active));

    advance_to(&mut world, 2_900, &mut log);
    assert_eq!(query::snapshot(&world, id).map(|s| s.phase), Some(Phase::Fading));
    assert_eq!(completions(&log, id), 0);

    advance_to(&mut world, 3_001, &mut log);
    assert_eq!(completions(&log, id), 1);
    assert!(log.contains(&Event::PhaseChanged {
        id,
        from: Phase::Fading,
        to: Phase::Expired
    }));
    assert!(log.contains(&Event::EffectCompleted {
        id,
        position: Vec2::new(12.0, -8.0)
    }));
    assert!(query::snapshot(&world, id).is_none());

    for target in [3_100, 4_000, 10_000] {
        advance_to(&mut world, target, &mut log);
    }
    assert_eq!(completions(&log, id), 1);
}

#[test]
fn phases_observed_by_events_never_regress() {
    let mut world = World::new(&WorldConfig::default()).expect("default config");
    let mut log = Vec::new();
    world::apply(&mut world, Command::SpawnEffect { position: Vec2::ZERO }, &mut log);
    world::apply(&mut world, Command::SpawnEgg { position: Vec2::new(80.0, 0.0) }, &mut log);
    world::apply(
        &mut world,
        Command::SpawnCreature {
            position: Vec2::new(-80.0, 0.0),
            first_jump_after: None,
        },
        &mut log,
    );
    for _ in 0..1_100 {
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut log,
        );
    }

    for kind in EntityKind::ALL {
        let mut last = Phase::Spawning;
        for event in &log {
            if let Event::PhaseChanged { id, from, to } = event {
                if id.kind() == kind {
                    assert!(*from >= last, "{kind:?} regressed to {from:?}");
                    assert!(to > from);
                    last = *to;
                }
            }
        }
        assert_eq!(last, Phase::Expired, "{kind:?} never expired");
    }
}

#[test]
fn evicted_effects_never_complete() {
    let mut world = World::new(&WorldConfig::default()).expect("default config");
    let mut log = Vec::new();
    for index in 0..4 {
        world::apply(
            &mut world,
            Command::SpawnEffect {
                position: Vec2::new(index as f32 * 10.0, 0.0),
            },
            &mut log,
        );
    }
    let evicted = EntityId::new(EntityKind::Effect, 0);
    assert!(log.contains(&Event::EntityEvicted { id: evicted }));

    advance_to(&mut world, 3_500, &mut log);
    assert_eq!(completions(&log, evicted), 0);
    let completed: usize = (1..4)
        .map(|serial| completions(&log, EntityId::new(EntityKind::Effect, serial)))
        .sum();
    assert_eq!(completed, 3);
}
