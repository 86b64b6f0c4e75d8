#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for AR Summon adapters.
//!
//! The simulation never talks to a scene graph directly. [`SceneSync`] reads
//! world events and queries after every tick and forwards the difference to a
//! [`RenderingBackend`], choosing between the live camera frame and a
//! placeholder background depending on the [`VideoSource`].

use std::collections::BTreeSet;

use anyhow::{Context, Result as AnyResult};
use ar_summon_core::{EntityId, EntityKind, Event};
use ar_summon_world::{query, Transform, World};
use tracing::{debug, info, warn};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Linear blend towards `other`; `amount` is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn mix(self, other: Self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let channel = |from: f32, to: f32| from + (to - from) * amount;
        Self {
            red: channel(self.red, other.red),
            green: channel(self.green, other.green),
            blue: channel(self.blue, other.blue),
            alpha: channel(self.alpha, other.alpha),
        }
    }

    /// Same color with its alpha multiplied by `opacity`.
    #[must_use]
    pub fn faded(self, opacity: f32) -> Self {
        Self {
            alpha: self.alpha * opacity.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Appearance of one entity kind handed to the backend when an entity appears.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Visual {
    /// Kind being drawn.
    pub kind: EntityKind,
    /// Nominal diameter in world units; transforms scale relative to it.
    pub size: f32,
    /// Base color.
    pub color: Color,
    /// Color reached when the transform's blend factor is one.
    pub accent: Color,
}

impl Visual {
    /// Color for the provided transform.
    #[must_use]
    pub fn shade(&self, transform: &Transform) -> Color {
        self.color
            .mix(self.accent, transform.color_blend)
            .faded(transform.opacity)
    }
}

/// Visuals for every entity kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualStyle {
    /// Summoning circle.
    pub effect: Visual,
    /// Creature.
    pub creature: Visual,
    /// Egg.
    pub egg: Visual,
}

impl VisualStyle {
    /// Visual registered for a kind.
    #[must_use]
    pub const fn visual(&self, kind: EntityKind) -> Visual {
        match kind {
            EntityKind::Effect => self.effect,
            EntityKind::Creature => self.creature,
            EntityKind::Egg => self.egg,
        }
    }
}

impl Default for VisualStyle {
    fn default() -> Self {
        Self {
            effect: Visual {
                kind: EntityKind::Effect,
                size: 160.0,
                color: Color::from_rgb_u8(0x8a, 0x2b, 0xe2),
                accent: Color::from_rgb_u8(0xff, 0xd7, 0x00),
            },
            creature: Visual {
                kind: EntityKind::Creature,
                size: 30.0,
                color: Color::from_rgb_u8(0x32, 0xcd, 0x32),
                accent: Color::from_rgb_u8(0x22, 0x8b, 0x22),
            },
            egg: Visual {
                kind: EntityKind::Egg,
                size: 40.0,
                color: Color::from_rgb_u8(0xf5, 0xf5, 0xdc),
                accent: Color::from_rgb_u8(0xff, 0xb6, 0xc1),
            },
        }
    }
}

/// Opaque handle of a decoded camera frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    /// Creates a handle from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Live camera feed drawn behind the entities.
pub trait VideoSource {
    /// Reports whether frames can be read.
    fn is_ready(&self) -> bool;

    /// Latest frame, if one is available.
    fn frame(&mut self) -> Option<FrameHandle>;
}

/// Video source used when no camera is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoVideo;

impl VideoSource for NoVideo {
    fn is_ready(&self) -> bool {
        false
    }

    fn frame(&mut self) -> Option<FrameHandle> {
        None
    }
}

/// Background drawn behind the entities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Background {
    /// Live camera frame.
    Video(FrameHandle),
    /// Flat color shown while no video is available.
    Placeholder(Color),
}

/// Scene graph collaborator that draws entities.
pub trait RenderingBackend {
    /// Adds a drawable for a newly spawned entity.
    fn add(&mut self, id: EntityId, visual: Visual) -> AnyResult<()>;

    /// Moves, scales and fades an existing drawable.
    fn update_transform(&mut self, id: EntityId, transform: &Transform, color: Color)
        -> AnyResult<()>;

    /// Removes the drawable of an entity that left the world.
    fn remove(&mut self, id: EntityId) -> AnyResult<()>;

    /// Replaces the background.
    fn set_background(&mut self, background: Background) -> AnyResult<()>;
}

/// Keeps a rendering backend in step with the world.
#[derive(Clone, Debug)]
pub struct SceneSync {
    style: VisualStyle,
    placeholder: Color,
    tracked: BTreeSet<EntityId>,
    background: Option<Background>,
}

impl SceneSync {
    /// Creates a synchroniser using the provided style and fallback background.
    #[must_use]
    pub fn new(style: VisualStyle, placeholder: Color) -> Self {
        Self {
            style,
            placeholder,
            tracked: BTreeSet::new(),
            background: None,
        }
    }

    /// Number of drawables the backend currently holds.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.tracked.len()
    }

    /// Background most recently sent to the backend.
    #[must_use]
    pub const fn background(&self) -> Option<Background> {
        self.background
    }

    /// Applies world events and refreshes every live transform.
    pub fn sync<R, V>(
        &mut self,
        world: &World,
        events: &[Event],
        backend: &mut R,
        video: &mut V,
    ) -> AnyResult<()>
    where
        R: RenderingBackend,
        V: VideoSource,
    {
        self.refresh_background(backend, video)?;

        for event in events {
            match event {
                Event::EntitySpawned { id, .. } => {
                    if self.tracked.insert(*id) {
                        backend
                            .add(*id, self.style.visual(id.kind()))
                            .with_context(|| format!("failed to add drawable for {id:?}"))?;
                    }
                }
                Event::EntityEvicted { id } | Event::EntityExpired { id } => {
                    self.untrack(*id, backend)?;
                }
                Event::Cleared => {
                    let ids: Vec<EntityId> = self.tracked.iter().copied().collect();
                    for id in ids {
                        self.untrack(id, backend)?;
                    }
                }
                _ => {}
            }
        }

        for snapshot in query::snapshots(world) {
            if !self.tracked.contains(&snapshot.id) {
                continue;
            }
            let color = self
                .style
                .visual(snapshot.id.kind())
                .shade(&snapshot.transform);
            backend
                .update_transform(snapshot.id, &snapshot.transform, color)
                .with_context(|| format!("failed to update drawable for {:?}", snapshot.id))?;
        }
        Ok(())
    }

    fn untrack<R: RenderingBackend>(&mut self, id: EntityId, backend: &mut R) -> AnyResult<()> {
        if self.tracked.remove(&id) {
            backend
                .remove(id)
                .with_context(|| format!("failed to remove drawable for {id:?}"))?;
        }
        Ok(())
    }

    fn refresh_background<R, V>(&mut self, backend: &mut R, video: &mut V) -> AnyResult<()>
    where
        R: RenderingBackend,
        V: VideoSource,
    {
        let next = match video.is_ready().then(|| video.frame()).flatten() {
            Some(frame) => Background::Video(frame),
            None => Background::Placeholder(self.placeholder),
        };
        if self.background == Some(next) {
            return Ok(());
        }
        match (self.background, next) {
            (Some(Background::Video(_)) | None, Background::Placeholder(_)) => {
                warn!("video_unavailable_using_placeholder");
            }
            (Some(Background::Placeholder(_)) | None, Background::Video(_)) => {
                info!("video_ready");
            }
            _ => debug!("video_frame_advanced"),
        }
        backend
            .set_background(next)
            .context("failed to replace background")?;
        self.background = Some(next);
        Ok(())
    }
}
