/// Camera state and projection utilities
use crate::geometry::Triangle;
use crate::math::{Mat4, Quaternion, Vector3D};

/// Camera configuration for 3D rendering
///
/// Looks down -z in its own frame. `fov` is the field of view in degrees;
/// `fov_rad`, `f` and `aspect_ratio` are derived from it and the viewport.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vector3D,
    pub rotation: Quaternion,
    pub width: usize,
    pub height: usize,
    pub fov: f32,
    pub fov_rad: f32,
    pub f: f32,
    pub near: f32,
    pub far: f32,
    pub aspect_ratio: f32,
    projection: Mat4,
}

impl Camera {
    pub fn new(
        position: Vector3D,
        rotation: Quaternion,
        width: usize,
        height: usize,
        fov: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let fov_rad = fov.to_radians();
        let mut camera = Self {
            position,
            rotation,
            width,
            height,
            fov,
            fov_rad,
            f: 1.0 / (fov_rad / 2.0).tan(),
            near,
            far,
            aspect_ratio: height as f32 / width as f32,
            projection: Mat4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Change the viewport size and refresh the projection.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.aspect_ratio = height as f32 / width as f32;
        self.update_projection_matrix();
    }

    /// World-to-view rotation derived from the orientation quaternion.
    pub fn rotation_matrix(&self) -> Mat4 {
        self.rotation.rotation_matrix()
    }

    /// Translation by the camera position, stored in the last column.
    ///
    /// The pipeline subtracts the position directly instead of using this.
    pub fn translation_matrix(&self) -> Mat4 {
        let p = self.position;
        Mat4::from_rows([
            [1.0, 0.0, 0.0, p.x],
            [0.0, 1.0, 0.0, p.y],
            [0.0, 0.0, 1.0, p.z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    /// Rebuild the perspective projection from `fov`, `near`, `far` and the
    /// aspect ratio.
    ///
    /// Maps a view-space row vector to `(aspect*f*x, f*y, z*q - near*q, -z)`
    /// with `q = far / (far - near)`.
    pub fn update_projection_matrix(&mut self) {
        self.fov_rad = self.fov.to_radians();
        self.f = 1.0 / (self.fov_rad / 2.0).tan();
        let q = self.far / (self.far - self.near);
        self.projection = Mat4::from_rows([
            [self.aspect_ratio * self.f, 0.0, 0.0, 0.0],
            [0.0, self.f, 0.0, 0.0],
            [0.0, 0.0, q, -1.0],
            [0.0, 0.0, -self.near * q, 0.0],
        ]);
    }

    /// NDC to pixel coordinates; `z` passes through.
    pub fn to_screen(&self, v: &Vector3D) -> Vector3D {
        Vector3D::new(
            (v.x + 1.0) * self.width as f32 / 2.0,
            (v.y + 1.0) * self.height as f32 / 2.0,
            v.z,
        )
    }

    pub fn to_screen_triangle(&self, triangle: &Triangle) -> Triangle {
        triangle.map(|v| self.to_screen(v))
    }

    /// Move along the camera's local axes.
    pub fn translate_local(&mut self, offset: Vector3D) {
        self.position = self.position + offset.rotate(&self.rotation);
    }

    /// Compose a rotation on the left of the current orientation.
    pub fn turn(&mut self, axis: Vector3D, angle: f32) {
        self.rotation = Quaternion::from_axis_angle(axis, angle) * self.rotation;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Vector3D::ZERO,
            Quaternion::IDENTITY,
            1600,
            900,
            90.0,
            0.1,
            1000.0,
        )
    }
}
