use std::time::Duration;

use ar_summon_core::{Command, QualityLevel};
use ar_summon_system_performance::{PerformanceConfig, PerformanceGovernor};
use ar_summon_world::{self as world, config::WorldConfig, query, World};

#[test]
fn sustained_low_rate_steps_down_then_recovers_at_once() {
    let mut governor = PerformanceGovernor::new(PerformanceConfig::default());
    let levels: Vec<Option<QualityLevel>> =
        [15, 15, 15, 40].into_iter().map(|fps| governor.observe(fps)).collect();
    assert_eq!(
        levels,
        vec![
            Some(QualityLevel::Low),
            Some(QualityLevel::Potato),
            None,
            Some(QualityLevel::Normal),
        ]
    );
}

#[test]
fn slow_ticks_degrade_world_quality() {
    let mut world = World::new(&WorldConfig::default()).expect("valid config");
    let mut governor = PerformanceGovernor::new(PerformanceConfig::default());
    let mut events = Vec::new();
    let mut commands = Vec::new();

    // 100 ms ticks sample at 10 fps.
    for _ in 0..25 {
        events.clear();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        );
        commands.clear();
        governor.handle(&events, &mut commands);
        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut events);
        }
    }

    assert_eq!(query::quality_level(&world), QualityLevel::Potato);
    assert_eq!(governor.level(), QualityLevel::Potato);
    assert_eq!(governor.last_fps(), Some(10));
}

#[test]
fn fast_ticks_keep_full_quality() {
    let mut world = World::new(&WorldConfig::default()).expect("valid config");
    let mut governor = PerformanceGovernor::new(PerformanceConfig::default());
    let mut events = Vec::new();
    let mut commands = Vec::new();

    for _ in 0..130 {
        events.clear();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
        governor.handle(&events, &mut commands);
    }

    assert!(commands.is_empty());
    assert_eq!(query::quality_level(&world), QualityLevel::Normal);
    assert!(governor.last_fps().is_some_and(|fps| fps > 35));
}

#[test]
fn cycling_round_trips_through_the_world() {
    let mut world = World::new(&WorldConfig::default()).expect("valid config");
    let mut governor = PerformanceGovernor::new(PerformanceConfig::default());
    let mut commands = Vec::new();
    let mut events = Vec::new();

    for expected in [QualityLevel::Low, QualityLevel::Potato, QualityLevel::Normal] {
        assert_eq!(governor.cycle(&mut commands), expected);
        assert_eq!(query::quality_level(&world), governor.level());

        events.clear();
        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut events);
        }
        governor.handle(&events, &mut commands);

        assert!(commands.is_empty());
        assert_eq!(query::quality_level(&world), expected);
        assert_eq!(governor.level(), expected);
    }
    assert!(!governor.should_skip(3));
}
