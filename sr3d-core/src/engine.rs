/// Engine state and the per-frame step: input, transform, rasterize, clear
use std::time::Duration;
use thiserror::Error;

use crate::camera::Camera;
use crate::geometry::{Mesh, Rgb};
use crate::input::{Key, KeyState};
use crate::math::{Quaternion, Vector3D};
use crate::pipeline::{CullMode, FrameTransform, Outcome};
use crate::raster::{DepthBuffer, PixelMask, RasterTarget};
use crate::surface::Surface;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("viewport must be non-empty, got {width}x{height}")]
    EmptyViewport { width: usize, height: usize },
    #[error("field of view must be within (0, 180) degrees, got {0}")]
    FieldOfView(f32),
    #[error("clip planes must satisfy 0 < near < far, got near={near} far={far}")]
    ClipPlanes { near: f32, far: f32 },
    #[error("{name} must be finite and non-negative, got {value}")]
    Speed { name: &'static str, value: f32 },
    #[error("surface is {actual:?} but the engine renders {expected:?}")]
    SurfaceSize {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// How look keys turn the camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationStep {
    /// Fixed angle per frame; turn speed follows the frame rate.
    PerTick(f32),
    /// Radians per second, scaled by the frame time.
    PerSecond(f32),
}

impl RotationStep {
    fn angle(self, dt: f32) -> f32 {
        match self {
            RotationStep::PerTick(angle) => angle,
            RotationStep::PerSecond(rate) => rate * dt,
        }
    }

    fn magnitude(self) -> f32 {
        match self {
            RotationStep::PerTick(v) | RotationStep::PerSecond(v) => v,
        }
    }
}

/// Construction-time engine settings
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub width: usize,
    pub height: usize,
    /// Degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// World units per second
    pub move_speed: f32,
    pub rotation_step: RotationStep,
    pub cull: CullMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 900,
            fov: 90.0,
            near: 0.1,
            far: 1000.0,
            move_speed: 80.0,
            rotation_step: RotationStep::PerTick(0.001),
            cull: CullMode::Reference,
        }
    }
}

impl EngineConfig {
    pub fn with_viewport(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    pub fn with_rotation_step(mut self, step: RotationStep) -> Self {
        self.rotation_step = step;
        self
    }

    pub fn with_cull(mut self, cull: CullMode) -> Self {
        self.cull = cull;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::EmptyViewport {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(EngineError::FieldOfView(self.fov));
        }
        if !(self.near > 0.0 && self.near < self.far && self.far.is_finite()) {
            return Err(EngineError::ClipPlanes {
                near: self.near,
                far: self.far,
            });
        }
        for (name, value) in [
            ("move speed", self.move_speed),
            ("rotation step", self.rotation_step.magnitude()),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::Speed { name, value });
            }
        }
        Ok(())
    }
}

/// Counters for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub submitted: usize,
    pub culled: usize,
    pub degenerate: usize,
    pub rasterized: usize,
    pub pixels_written: usize,
    pub pixels_cleared: usize,
}

/// Mesh, camera and the buffers carried from one frame to the next
pub struct Engine {
    config: EngineConfig,
    mesh: Mesh,
    camera: Camera,
    depth: DepthBuffer,
    touched: PixelMask,
    previous: PixelMask,
}

impl Engine {
    pub fn new(config: EngineConfig, mesh: Mesh) -> Result<Self, EngineError> {
        config.validate()?;
        let camera = Camera::new(
            Vector3D::ZERO,
            Quaternion::IDENTITY,
            config.width,
            config.height,
            config.fov,
            config.near,
            config.far,
        );
        log::info!(
            "engine ready: {} triangles, {}x{} viewport, {} deg fov",
            mesh.len(),
            config.width,
            config.height,
            config.fov
        );
        Ok(Self {
            depth: DepthBuffer::new(config.width, config.height),
            touched: PixelMask::new(config.width, config.height),
            previous: PixelMask::new(config.width, config.height),
            config,
            mesh,
            camera,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    pub fn set_mesh(&mut self, mesh: Mesh) {
        log::info!("mesh replaced: {} triangles", mesh.len());
        self.mesh = mesh;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth
    }

    /// Pixels written by the most recent frame.
    pub fn touched(&self) -> &PixelMask {
        &self.previous
    }

    /// Change the viewport. Buffers are reallocated, so the caller's surface
    /// must be resized and blacked out too.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), EngineError> {
        let config = self.config.clone().with_viewport(width, height);
        config.validate()?;
        log::debug!("viewport resized to {}x{}", width, height);
        self.config = config;
        self.camera.resize(width, height);
        self.depth = DepthBuffer::new(width, height);
        self.touched = PixelMask::new(width, height);
        self.previous = PixelMask::new(width, height);
        Ok(())
    }

    /// Move and turn the camera from the held keys.
    ///
    /// Translation is along the camera's local axes at `move_speed * dt`;
    /// turns compose a small rotation on the left of the orientation.
    pub fn apply_input(&mut self, keys: &impl KeyState, dt: f32) {
        let step = self.config.move_speed * dt;
        let moves = [
            (Key::Forward, Vector3D::new(0.0, 0.0, -step)),
            (Key::Back, Vector3D::new(0.0, 0.0, step)),
            (Key::Left, Vector3D::new(-step, 0.0, 0.0)),
            (Key::Right, Vector3D::new(step, 0.0, 0.0)),
        ];
        for (key, offset) in moves {
            if keys.is_held(key) {
                self.camera.translate_local(offset);
            }
        }

        let angle = self.config.rotation_step.angle(dt);
        let x_axis = Vector3D::new(1.0, 0.0, 0.0);
        let y_axis = Vector3D::new(0.0, 1.0, 0.0);
        let turns = [
            (Key::LookUp, x_axis, angle),
            (Key::LookDown, x_axis, -angle),
            (Key::LookLeft, y_axis, angle),
            (Key::LookRight, y_axis, -angle),
        ];
        for (key, axis, angle) in turns {
            if keys.is_held(key) {
                self.camera.turn(axis, angle);
            }
        }
    }

    /// Draw the mesh into `surface` and black out pixels left over from the
    /// previous frame.
    pub fn render<S: Surface>(&mut self, surface: &mut S) -> Result<FrameStats, EngineError> {
        let expected = (self.config.width, self.config.height);
        let actual = (surface.width(), surface.height());
        if expected != actual {
            return Err(EngineError::SurfaceSize { expected, actual });
        }

        self.camera.update_projection_matrix();
        self.depth.clear();
        self.touched.clear();

        let mut stats = FrameStats {
            submitted: self.mesh.len(),
            ..FrameStats::default()
        };
        let transform = FrameTransform::new(&self.camera, self.config.cull);
        let mut target = RasterTarget::new(surface, &mut self.depth, &mut self.touched);

        for triangle in &self.mesh.triangles {
            match transform.process(&self.mesh, triangle) {
                Outcome::Visible(screen) => {
                    stats.rasterized += 1;
                    stats.pixels_written += target.fill_triangle(&screen);
                }
                Outcome::Culled => stats.culled += 1,
                Outcome::Degenerate => stats.degenerate += 1,
            }
        }

        // Only pixels drawn last frame and not redrawn now need clearing
        for (x, y) in self.previous.difference(&self.touched) {
            surface.set_pixel(x, y, Rgb::BLACK);
            stats.pixels_cleared += 1;
        }
        std::mem::swap(&mut self.previous, &mut self.touched);

        Ok(stats)
    }

    /// One tick of the frame loop.
    pub fn advance<S: Surface>(
        &mut self,
        dt: f32,
        keys: &impl KeyState,
        surface: &mut S,
    ) -> Result<FrameStats, EngineError> {
        self.apply_input(keys, dt);
        self.render(surface)
    }
}

/// Frames-per-second counter refreshed once per second of frame time
///
/// Fed frame durations rather than clock readings so callers without a
/// monotonic clock (wasm) can use it.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    window: Duration,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a frame that took `frame_time`. Returns the new rate when a
    /// second has accumulated.
    pub fn tick(&mut self, frame_time: Duration) -> Option<f32> {
        self.frames += 1;
        self.window += frame_time;
        if self.window >= Duration::from_secs(1) {
            self.fps = self.frames as f32 / self.window.as_secs_f32();
            self.frames = 0;
            self.window = Duration::ZERO;
            log::debug!("{:.1} fps", self.fps);
            Some(self.fps)
        } else {
            None
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use crate::input::{KeySet, NoInput};
    use crate::surface::PixelBuffer;
    use approx::assert_relative_eq;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Vector3D::new(0.0, 0.0, -1.0),
            Vector3D::new(1.0, 1.0, -1.0),
            Vector3D::new(0.0, 1.0, -1.0),
        )
    }

    fn small_engine(mesh: Mesh) -> Engine {
        Engine::new(EngineConfig::default().with_viewport(800, 600), mesh).unwrap()
    }

    fn filled_bounds(surface: &PixelBuffer) -> Option<(usize, usize, usize, usize)> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for y in 0..surface.height() {
            for x in 0..surface.width() {
                if surface.get(x, y) != Some(Rgb::BLACK) {
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                    });
                }
            }
        }
        bounds
    }

    #[test]
    fn test_unit_triangle_projection() {
        let mut engine = small_engine(Mesh::from_triangles(vec![unit_triangle()], [0, 0, 0]));
        let mut surface = PixelBuffer::new(800, 600);
        let stats = engine.render(&mut surface).unwrap();
        assert_eq!(stats.rasterized, 1);

        // Analytic corners: (400, 300), (700, 600), (400, 600); y = 600 is
        // off-surface so the last row is 599.
        let (x0, y0, x1, y1) = filled_bounds(&surface).unwrap();
        assert!(x0.abs_diff(400) <= 1, "min x {}", x0);
        assert!(y0.abs_diff(300) <= 1, "min y {}", y0);
        assert!(x1.abs_diff(700) <= 1, "max x {}", x1);
        assert!(y1.abs_diff(599) <= 1, "max y {}", y1);

        // Frontal to the light: one uniform shade
        let lit: Vec<_> = surface.pixels().iter().filter(|&&p| p != Rgb::BLACK).collect();
        assert_eq!(lit.len(), stats.pixels_written);
        assert!(lit.iter().all(|&&p| p == Rgb::gray(255)));
    }

    #[test]
    fn test_stale_pixels_are_blacked_out() {
        let mut engine = small_engine(Mesh::from_triangles(vec![unit_triangle()], [0, 0, 0]));
        let mut surface = PixelBuffer::new(800, 600);
        engine.render(&mut surface).unwrap();
        assert_eq!(surface.get(450, 500), Some(Rgb::gray(255)));
        assert_eq!(surface.get(402, 310), Some(Rgb::gray(255)));

        // Shift right: the left edge of the old footprint is no longer covered
        engine.mesh_mut().position = Vector3D::new(0.2, 0.0, 0.0);
        let stats = engine.render(&mut surface).unwrap();
        assert!(stats.pixels_cleared > 0);
        assert_eq!(surface.get(402, 310), Some(Rgb::BLACK));
        assert_ne!(surface.get(500, 500), Some(Rgb::BLACK));
        assert_eq!(engine.touched().count(), stats.pixels_written);
    }

    #[test]
    fn test_overlapping_pixel_takes_new_shade() {
        // Large camera-facing triangle; its shade follows the light from v0
        let wide = Triangle::new(
            Vector3D::new(-2.0, -2.0, -1.0),
            Vector3D::new(2.0, -2.0, -1.0),
            Vector3D::new(-2.0, 2.0, -1.0),
        );
        let (x, y) = (380, 280);

        let mut engine = small_engine(Mesh::from_triangles(vec![wide], [0, 0, 0]));
        let mut surface = PixelBuffer::new(800, 600);
        engine.render(&mut surface).unwrap();
        let before = surface.get(x, y).unwrap();
        assert_ne!(before, Rgb::BLACK);

        // v0 moves closer to the view axis, so the face is lit more
        engine.mesh_mut().position = Vector3D::new(1.0, 1.0, 0.0);
        engine.render(&mut surface).unwrap();
        let after = surface.get(x, y).unwrap();

        let mut fresh = small_engine(Mesh::from_triangles(vec![wide], [1, 1, 0]));
        let mut expected = PixelBuffer::new(800, 600);
        fresh.render(&mut expected).unwrap();

        assert_ne!(after, before);
        assert!(after.r > before.r);
        assert_eq!(Some(after), expected.get(x, y));
    }

    #[test]
    fn test_nothing_visible_clears_everything() {
        let mut engine = small_engine(Mesh::from_triangles(vec![unit_triangle()], [0, 0, 0]));
        let mut surface = PixelBuffer::new(800, 600);
        let first = engine.render(&mut surface).unwrap();

        engine.mesh_mut().triangles.clear();
        let second = engine.render(&mut surface).unwrap();
        assert_eq!(second.pixels_cleared, first.pixels_written);
        assert!(surface.pixels().iter().all(|&p| p == Rgb::BLACK));
    }

    #[test]
    fn test_nearer_mesh_triangle_wins() {
        let near = unit_triangle();
        let far = unit_triangle().map(|v| Vector3D::new(v.x * 2.0, v.y * 2.0, -2.0));
        for triangles in [vec![near, far], vec![far, near]] {
            let mut engine = small_engine(Mesh::from_triangles(triangles, [0, 0, 0]));
            let mut surface = PixelBuffer::new(800, 600);
            engine.render(&mut surface).unwrap();
            // Both triangles project to the same footprint; the nearer one
            // is lit head-on and has the smaller depth.
            let depth = engine.depth_buffer().get(450, 500);
            let expected = Vector3D::new(0.0, 0.0, -1.0)
                .transform(engine.camera().projection_matrix())
                .perspective_divide()
                .z;
            assert_relative_eq!(depth, expected, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_forward_key_moves_along_view() {
        let mut engine = small_engine(Mesh::new());
        let keys = KeySet::new();
        keys.press(Key::Forward);
        engine.apply_input(&keys, 0.5);
        assert_relative_eq!(engine.camera().position.z, -40.0, epsilon = 1e-4);

        keys.release(Key::Forward);
        keys.press(Key::Right);
        engine.apply_input(&keys, 0.25);
        assert_relative_eq!(engine.camera().position.x, 20.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rotation_step_modes() {
        let keys = KeySet::new();
        keys.press(Key::LookLeft);

        let mut per_tick = small_engine(Mesh::new());
        per_tick.apply_input(&keys, 10.0);
        let expected = Quaternion::from_axis_angle(Vector3D::new(0.0, 1.0, 0.0), 0.001);
        assert_eq!(per_tick.camera().rotation, expected);

        let config = EngineConfig::default()
            .with_viewport(800, 600)
            .with_rotation_step(RotationStep::PerSecond(2.0));
        let mut per_second = Engine::new(config, Mesh::new()).unwrap();
        per_second.apply_input(&keys, 0.25);
        let expected = Quaternion::from_axis_angle(Vector3D::new(0.0, 1.0, 0.0), 0.5);
        assert_relative_eq!(per_second.camera().rotation.y, expected.y, epsilon = 1e-6);
    }

    #[test]
    fn test_advance_without_input() {
        let mut engine = small_engine(Mesh::from_triangles(vec![unit_triangle()], [0, 0, 0]));
        let mut surface = PixelBuffer::new(800, 600);
        let stats = engine.advance(0.016, &NoInput, &mut surface).unwrap();
        assert_eq!(engine.camera().position, Vector3D::ZERO);
        assert_eq!(stats.rasterized, 1);
    }

    #[test]
    fn test_surface_size_mismatch() {
        let mut engine = small_engine(Mesh::new());
        let mut surface = PixelBuffer::new(10, 10);
        assert_eq!(
            engine.render(&mut surface),
            Err(EngineError::SurfaceSize {
                expected: (800, 600),
                actual: (10, 10)
            })
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(matches!(
            EngineConfig::default().with_viewport(0, 10).validate(),
            Err(EngineError::EmptyViewport { .. })
        ));
        assert!(matches!(
            EngineConfig::default().with_fov(180.0).validate(),
            Err(EngineError::FieldOfView(_))
        ));
        assert!(matches!(
            EngineConfig::default().with_clip_planes(10.0, 1.0).validate(),
            Err(EngineError::ClipPlanes { .. })
        ));
        assert!(matches!(
            EngineConfig::default().with_move_speed(f32::NAN).validate(),
            Err(EngineError::Speed { .. })
        ));
    }

    #[test]
    fn test_resize() {
        let mut engine = small_engine(Mesh::new());
        engine.resize(320, 200).unwrap();
        assert_eq!(engine.camera().width, 320);
        assert_eq!(engine.depth_buffer().height(), 200);
        assert!(engine.resize(0, 200).is_err());
        assert_eq!(engine.config().width, 320);
    }

    #[test]
    fn test_cube_culls_half_its_faces() {
        let mut mesh = Mesh::cube(2.0);
        mesh.position = Vector3D::new(0.0, 0.0, -10.0);
        let mut engine = small_engine(mesh);
        let mut surface = PixelBuffer::new(800, 600);
        let stats = engine.render(&mut surface).unwrap();
        // Only the front face (two triangles) faces a camera on the axis
        assert_eq!(stats.rasterized, 2);
        assert_eq!(stats.culled, 10);
    }

    #[test]
    fn test_fps_counter() {
        let mut fps = FpsCounter::new();
        for _ in 1..50 {
            assert_eq!(fps.tick(Duration::from_millis(20)), None);
        }
        let rate = fps.tick(Duration::from_millis(20)).unwrap();
        assert_relative_eq!(rate, 50.0, epsilon = 1e-3);
        assert_eq!(fps.fps(), rate);
        assert_eq!(fps.tick(Duration::from_millis(20)), None);
    }
}
