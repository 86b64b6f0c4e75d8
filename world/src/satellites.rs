//! Decorative points orbiting an entity.
//!
//! Satellites have no lifecycle of their own: every sample is derived from the
//! owner's elapsed time, pulse phase and opacity.

use std::{f32::consts::TAU, ops::Range, time::Duration};

use glam::Vec2;
use rand::Rng;

/// How satellite opacity is derived from the owner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SatelliteOpacity {
    /// Satellites share the owner's opacity.
    FollowOwner,
    /// Satellites shimmer around `0.5` with the provided amplitude.
    Shimmer(f32),
}

/// Parameters shared by every satellite of an entity kind.
#[derive(Clone, Debug, PartialEq)]
pub struct SatelliteStyle {
    /// Number of satellites.
    pub count: usize,
    /// Orbit radius as a fraction of the owner's size.
    pub radius_factor: f32,
    /// Range of angular speeds in radians per second.
    pub angular_speed: Range<f32>,
    /// Range of satellite sizes in world units.
    pub size: Range<f32>,
    /// Relative radius change driven by the owner's pulse.
    pub pulse_amplitude: f32,
    /// Opacity rule.
    pub opacity: SatelliteOpacity,
}

impl SatelliteStyle {
    /// Ring carried by summoning circles.
    #[must_use]
    pub fn effect_ring(count: usize) -> Self {
        Self {
            count,
            radius_factor: 0.6,
            angular_speed: 1.2..3.0,
            size: 2.0..4.0,
            pulse_amplitude: 0.1,
            opacity: SatelliteOpacity::FollowOwner,
        }
    }

    /// Ambient ring carried by eggs.
    #[must_use]
    pub fn egg_ambient() -> Self {
        Self {
            count: 8,
            radius_factor: 0.8,
            angular_speed: 0.6..1.8,
            size: 1.0..3.0,
            pulse_amplitude: 0.2,
            opacity: SatelliteOpacity::Shimmer(0.3),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Satellite {
    base_angle: f32,
    angular_speed: f32,
    size: f32,
    pulse_offset: f32,
}

/// Sampled satellite relative to its owner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SatellitePoint {
    /// Offset from the owner's position.
    pub offset: Vec2,
    /// Size in world units.
    pub size: f32,
    /// Opacity in `0.0..=1.0`.
    pub opacity: f32,
}

/// Fixed set of satellites evenly spaced around an owner.
#[derive(Clone, Debug, PartialEq)]
pub struct SatelliteParticleSet {
    base_radius: f32,
    pulse_amplitude: f32,
    opacity: SatelliteOpacity,
    satellites: Vec<Satellite>,
}

impl SatelliteParticleSet {
    /// Creates satellites for an owner of the provided size.
    pub fn new<R: Rng + ?Sized>(style: &SatelliteStyle, owner_size: f32, rng: &mut R) -> Self {
        let satellites = (0..style.count)
            .map(|index| Satellite {
                base_angle: TAU * index as f32 / style.count as f32,
                angular_speed: sample_range(rng, &style.angular_speed),
                size: sample_range(rng, &style.size),
                pulse_offset: rng.gen_range(0.0..TAU),
            })
            .collect();
        Self {
            base_radius: owner_size * style.radius_factor,
            pulse_amplitude: style.pulse_amplitude,
            opacity: style.opacity,
            satellites,
        }
    }

    /// Number of satellites in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    /// Reports whether the set has no satellites.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }

    /// Samples every satellite for the owner's current state.
    #[must_use]
    pub fn sample(
        &self,
        elapsed: Duration,
        pulse_phase: f32,
        owner_opacity: f32,
    ) -> Vec<SatellitePoint> {
        let seconds = elapsed.as_secs_f32();
        self.satellites
            .iter()
            .map(|satellite| {
                let angle = satellite.base_angle + satellite.angular_speed * seconds;
                let wave = (pulse_phase + satellite.pulse_offset).sin();
                let radius = self.base_radius * (1.0 + wave * self.pulse_amplitude);
                let opacity = match self.opacity {
                    SatelliteOpacity::FollowOwner => owner_opacity,
                    SatelliteOpacity::Shimmer(amplitude) => 0.5 + wave * amplitude,
                };
                SatellitePoint {
                    offset: Vec2::from_angle(angle) * radius,
                    size: satellite.size,
                    opacity: opacity.clamp(0.0, 1.0),
                }
            })
            .collect()
    }
}

pub(crate) fn sample_range<R: Rng + ?Sized>(rng: &mut R, range: &Range<f32>) -> f32 {
    if range.start < range.end {
        rng.gen_range(range.clone())
    } else {
        range.start
    }
}
