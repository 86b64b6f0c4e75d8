#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Screen-to-world projection onto the placement plane.
//!
//! Screen points are unprojected through a perspective camera and the
//! resulting ray is intersected with the `z = 0` plane on which every entity
//! is placed.

use ar_summon_core::Bounds;
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors raised when the camera or viewport cannot produce a projection.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ProjectionError {
    /// Viewport dimensions must be positive and finite.
    #[error("viewport {width}x{height} is degenerate")]
    InvalidViewport {
        /// Requested width in pixels.
        width: f32,
        /// Requested height in pixels.
        height: f32,
    },
    /// Field of view must lie strictly between zero and 180 degrees.
    #[error("field of view {degrees} degrees is out of range")]
    InvalidFieldOfView {
        /// Requested vertical field of view.
        degrees: f32,
    },
    /// Clip planes must satisfy `0 < near < far`.
    #[error("clip planes near={near} far={far} are invalid")]
    InvalidClipPlanes {
        /// Near plane distance.
        near: f32,
        /// Far plane distance.
        far: f32,
    },
    /// The camera must sit in front of the placement plane.
    #[error("camera distance {distance} must be positive")]
    InvalidDistance {
        /// Distance from the camera to the placement plane.
        distance: f32,
    },
}

/// Perspective camera settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
    /// Camera height above the placement plane along `+z`.
    pub distance: f32,
    /// Viewport width in pixels.
    pub viewport_width: f32,
    /// Viewport height in pixels.
    pub viewport_height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1_000.0,
            distance: 300.0,
            viewport_width: 1_280.0,
            viewport_height: 720.0,
        }
    }
}

/// Maps screen coordinates to points on the placement plane.
#[derive(Clone, Debug)]
pub struct CoordinateProjector {
    config: CameraConfig,
    eye: Vec3,
    inverse_view_projection: Mat4,
}

impl CoordinateProjector {
    /// Creates a projector for the provided camera.
    pub fn new(config: CameraConfig) -> Result<Self, ProjectionError> {
        validate_camera(&config)?;
        validate_viewport(config.viewport_width, config.viewport_height)?;
        let eye = Vec3::new(0.0, 0.0, config.distance);
        Ok(Self {
            config,
            eye,
            inverse_view_projection: inverse_view_projection(&config, eye),
        })
    }

    /// Camera settings in use.
    #[must_use]
    pub const fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Viewport size in pixels.
    #[must_use]
    pub fn viewport(&self) -> Vec2 {
        Vec2::new(self.config.viewport_width, self.config.viewport_height)
    }

    /// Resizes the viewport, updating the camera aspect ratio.
    pub fn set_viewport(&mut self, width: f32, height: f32) -> Result<(), ProjectionError> {
        validate_viewport(width, height)?;
        self.config.viewport_width = width;
        self.config.viewport_height = height;
        self.inverse_view_projection = inverse_view_projection(&self.config, self.eye);
        debug!(width, height, "viewport_resized");
        Ok(())
    }

    /// Projects a screen point (pixels, origin top-left) onto the placement plane.
    #[must_use]
    pub fn project(&self, screen: Vec2) -> Vec3 {
        let ndc = Vec3::new(
            screen.x / self.config.viewport_width * 2.0 - 1.0,
            -(screen.y / self.config.viewport_height) * 2.0 + 1.0,
            0.5,
        );
        let point = self.inverse_view_projection.project_point3(ndc);
        let direction = (point - self.eye).normalize();
        let distance = -self.eye.z / direction.z;
        self.eye + direction * distance
    }

    /// World-space rectangle covered by the viewport on the placement plane.
    #[must_use]
    pub fn visible_bounds(&self) -> Bounds {
        let top_left = self.project(Vec2::ZERO).truncate();
        let bottom_right = self.project(self.viewport()).truncate();
        Bounds::from_corners(top_left, bottom_right)
    }
}

fn inverse_view_projection(config: &CameraConfig, eye: Vec3) -> Mat4 {
    let projection = Mat4::perspective_rh_gl(
        config.fov_degrees.to_radians(),
        config.viewport_width / config.viewport_height,
        config.near,
        config.far,
    );
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
    (projection * view).inverse()
}

fn validate_camera(config: &CameraConfig) -> Result<(), ProjectionError> {
    if !(config.fov_degrees > 0.0 && config.fov_degrees < 180.0) {
        return Err(ProjectionError::InvalidFieldOfView {
            degrees: config.fov_degrees,
        });
    }
    if !(config.near > 0.0 && config.near < config.far && config.far.is_finite()) {
        return Err(ProjectionError::InvalidClipPlanes {
            near: config.near,
            far: config.far,
        });
    }
    if !(config.distance > 0.0 && config.distance.is_finite()) {
        return Err(ProjectionError::InvalidDistance {
            distance: config.distance,
        });
    }
    Ok(())
}

fn validate_viewport(width: f32, height: f32) -> Result<(), ProjectionError> {
    let valid = |value: f32| value > 0.0 && value.is_finite();
    if valid(width) && valid(height) {
        Ok(())
    } else {
        Err(ProjectionError::InvalidViewport { width, height })
    }
}
