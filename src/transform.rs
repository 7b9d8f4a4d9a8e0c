use std::f32::consts::TAU;
use std::time::Duration;

use glam::{Mat4, Vec3};
use log::warn;

use crate::context::{GraphicsContext, UniformLocation};
use crate::shader::ShaderProgram;

/// Seconds for one full turn around the Y axis.
pub const ROTATION_PERIOD_SECS: f32 = 6.0;
/// The X axis turns this many times slower than the Y axis.
pub const TILT_DIVISOR: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, -5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// The three matrices fed to the cube program. Only `world` changes after
/// setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub world: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl TransformState {
    pub fn new(camera: &CameraConfig, aspect: f32) -> Self {
        Self {
            world: Mat4::IDENTITY,
            view: Mat4::look_at_rh(camera.eye, camera.target, camera.up),
            projection: Mat4::perspective_rh_gl(
                camera.fov_y_degrees.to_radians(),
                aspect,
                camera.near,
                camera.far,
            ),
        }
    }

    /// Recomputes `world` for the time elapsed since the loop started.
    pub fn advance(&mut self, elapsed: Duration) {
        self.world = world_at(elapsed.as_secs_f32());
    }
}

/// World matrix at `seconds`: a turn about +Y every [`ROTATION_PERIOD_SECS`],
/// composed with a slower turn about +X.
pub fn world_at(seconds: f32) -> Mat4 {
    let angle = seconds / ROTATION_PERIOD_SECS * TAU;
    let y_rotation = Mat4::from_axis_angle(Vec3::Y, angle);
    let x_rotation = Mat4::from_axis_angle(Vec3::X, angle / TILT_DIVISOR);
    y_rotation * x_rotation
}

/// Uniform slots of the transform matrices in one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformUniforms {
    pub world: Option<UniformLocation>,
    pub view: Option<UniformLocation>,
    pub projection: Option<UniformLocation>,
}

impl TransformUniforms {
    pub fn resolve(program: &ShaderProgram) -> Self {
        Self {
            world: program.uniform("mWorld"),
            view: program.uniform("mView"),
            projection: program.uniform("mProj"),
        }
    }

    /// Pushes all three matrices. Called once during setup.
    pub fn upload_all(&self, ctx: &mut dyn GraphicsContext, state: &TransformState) {
        upload(ctx, "mWorld", self.world, &state.world);
        upload(ctx, "mView", self.view, &state.view);
        upload(ctx, "mProj", self.projection, &state.projection);
    }

    pub fn upload_world(&self, ctx: &mut dyn GraphicsContext, state: &TransformState) {
        upload(ctx, "mWorld", self.world, &state.world);
    }
}

fn upload(
    ctx: &mut dyn GraphicsContext,
    name: &str,
    location: Option<UniformLocation>,
    matrix: &Mat4,
) {
    match location {
        Some(location) => ctx.uniform_matrix4(location, false, &matrix.to_cols_array()),
        None => warn!("uniform `{name}` is not active; skipping upload"),
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;

    #[test]
    fn world_starts_at_identity() {
        assert_eq!(world_at(0.0), Mat4::IDENTITY);
        let state = TransformState::new(&CameraConfig::default(), 4.0 / 3.0);
        assert_eq!(state.world, Mat4::IDENTITY);
    }

    #[test]
    fn half_period_is_half_turn_with_eighth_tilt() {
        let expected = Mat4::from_rotation_y(PI) * Mat4::from_rotation_x(PI / 4.0);
        assert!(world_at(3.0).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn advance_only_touches_world() {
        let mut state = TransformState::new(&CameraConfig::default(), 800.0 / 600.0);
        let before = state;
        state.advance(Duration::from_millis(1500));
        assert_eq!(state.view, before.view);
        assert_eq!(state.projection, before.projection);
        // A quarter turn about Y with a sixteenth turn about X.
        let expected = Mat4::from_rotation_y(PI / 2.0) * Mat4::from_rotation_x(PI / 8.0);
        assert!(state.world.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn angle_grows_linearly_with_time() {
        for i in 0..200 {
            let t = i as f32 * 0.137;
            let angle = t / 6.0 * 2.0 * PI;
            let expected = Mat4::from_axis_angle(Vec3::Y, angle)
                * Mat4::from_axis_angle(Vec3::X, angle / 4.0);
            assert!(
                world_at(t).abs_diff_eq(expected, 1e-4),
                "world_at({t}) diverges"
            );
        }
    }

    #[test]
    fn full_y_turn_leaves_quarter_x_tilt() {
        let expected = Mat4::from_rotation_x(PI / 2.0);
        assert!(world_at(ROTATION_PERIOD_SECS).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn pose_repeats_after_four_y_turns() {
        let cycle = ROTATION_PERIOD_SECS * TILT_DIVISOR;
        assert!(world_at(cycle).abs_diff_eq(Mat4::IDENTITY, 1e-4));
        for t in [0.5, 2.25, 7.0] {
            assert!(world_at(t + cycle).abs_diff_eq(world_at(t), 1e-4));
        }
    }

    #[test]
    fn camera_looks_at_origin_from_negative_z() {
        let state = TransformState::new(&CameraConfig::default(), 1.0);
        let origin = state.view.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-6));
    }

    #[test]
    fn projection_uses_gl_depth_range() {
        let camera = CameraConfig::default();
        let state = TransformState::new(&camera, 1.0);
        let near = state.projection.project_point3(Vec3::new(0.0, 0.0, -camera.near));
        assert!((near.z + 1.0).abs() < 1e-4);
    }
}
