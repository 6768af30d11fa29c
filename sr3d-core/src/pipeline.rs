/// Per-triangle transform pipeline: world placement, culling, lighting and
/// projection to screen space
use crate::camera::Camera;
use crate::geometry::{Mesh, Rgb, Triangle};
use crate::math::Mat4;

/// Floor applied to the diffuse term
pub const AMBIENT: f32 = 0.1;

/// Back-face test used to discard triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    /// `dot(normal, viewV0 - cameraPosition)`: a world-space normal against a
    /// view-space vertex offset by the world-space camera position. Only
    /// exact while the camera sits at the origin with identity orientation.
    #[default]
    Reference,
    /// `dot(normal, worldV0 - cameraPosition)`, entirely in world space.
    WorldSpace,
}

/// What the pipeline made of one triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Screen-space triangle ready for the rasterizer, carrying its shade.
    Visible(Triangle),
    /// Faces away from the camera.
    Culled,
    /// Zero-area triangle; it has no normal.
    Degenerate,
}

/// Matrices and policy shared by every triangle of one frame
pub struct FrameTransform<'a> {
    camera: &'a Camera,
    rotation: Mat4,
    cull: CullMode,
}

impl<'a> FrameTransform<'a> {
    pub fn new(camera: &'a Camera, cull: CullMode) -> Self {
        Self {
            camera,
            rotation: camera.rotation_matrix(),
            cull,
        }
    }

    /// Run one object-space triangle of `mesh` through the pipeline.
    pub fn process(&self, mesh: &Mesh, triangle: &Triangle) -> Outcome {
        let camera = self.camera;
        let world = mesh.place(triangle);

        let Some(normal) = world.normal() else {
            return Outcome::Degenerate;
        };

        let view = world.subtract(camera.position).transform(&self.rotation);

        let facing = match self.cull {
            CullMode::Reference => normal.dot(&(view.vertices[0] - camera.position)),
            CullMode::WorldSpace => normal.dot(&(world.vertices[0] - camera.position)),
        };
        // NaN counts as facing away
        if !(facing < 0.0) {
            return Outcome::Culled;
        }

        // Single directional light at the camera
        let light = (camera.position - view.vertices[0]).normalize();
        let intensity = normal.dot(&light).max(AMBIENT);
        let shade = Rgb::gray((255.0 * intensity) as u8);

        let projection = camera.projection_matrix();
        let ndc = view.map(|v| v.transform(projection).perspective_divide());

        let mut screen = camera.to_screen_triangle(&ndc);
        screen.color = shade;
        Outcome::Visible(screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Quaternion, Vector3D};
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        Camera::new(Vector3D::ZERO, Quaternion::IDENTITY, 800, 600, 90.0, 0.1, 1000.0)
    }

    fn facing_camera() -> Triangle {
        Triangle::new(
            Vector3D::new(0.0, 0.0, -1.0),
            Vector3D::new(1.0, 1.0, -1.0),
            Vector3D::new(0.0, 1.0, -1.0),
        )
    }

    #[test]
    fn test_front_face_kept_and_lit() {
        let camera = camera();
        let transform = FrameTransform::new(&camera, CullMode::Reference);
        let Outcome::Visible(tri) = transform.process(&Mesh::new(), &facing_camera()) else {
            panic!("front face was dropped");
        };
        assert_eq!(tri.color, Rgb::gray(255));

        // (0,0,-1) lands in the middle of the screen
        assert_relative_eq!(tri.vertices[0].x, 400.0, epsilon = 1e-3);
        assert_relative_eq!(tri.vertices[0].y, 300.0, epsilon = 1e-3);
        // (1,1,-1): x = (0.75 + 1) * 400, y = (1 + 1) * 300
        assert_relative_eq!(tri.vertices[1].x, 700.0, epsilon = 1e-3);
        assert_relative_eq!(tri.vertices[1].y, 600.0, epsilon = 1e-3);
    }

    #[test]
    fn test_back_face_culled_in_both_modes() {
        let camera = camera();
        let [a, b, c] = facing_camera().vertices;
        let away = Triangle::new(a, c, b);
        for mode in [CullMode::Reference, CullMode::WorldSpace] {
            let transform = FrameTransform::new(&camera, mode);
            assert_eq!(transform.process(&Mesh::new(), &away), Outcome::Culled);
            assert!(matches!(
                transform.process(&Mesh::new(), &facing_camera()),
                Outcome::Visible(_)
            ));
        }
    }

    #[test]
    fn test_degenerate_triangle() {
        let camera = camera();
        let transform = FrameTransform::new(&camera, CullMode::Reference);
        let v = Vector3D::new(0.0, 0.0, -1.0);
        let tri = Triangle::new(v, v, Vector3D::new(1.0, 0.0, -1.0));
        assert_eq!(transform.process(&Mesh::new(), &tri), Outcome::Degenerate);
    }

    #[test]
    fn test_oblique_face_gets_dimmer() {
        let camera = camera();
        let transform = FrameTransform::new(&camera, CullMode::Reference);
        // Tilted 60 degrees away from the view axis
        let tilt = Quaternion::from_axis_angle(Vector3D::new(1.0, 0.0, 0.0), -1.0472);
        let mut mesh = Mesh::from_triangles(Vec::new(), [0, 0, -5]);
        mesh.rotation = tilt;
        let tri = Triangle::new(
            Vector3D::new(-1.0, -1.0, 0.0),
            Vector3D::new(1.0, -1.0, 0.0),
            Vector3D::new(0.0, 1.0, 0.0),
        );
        let Outcome::Visible(lit) = transform.process(&mesh, &tri) else {
            panic!("tilted face was dropped");
        };
        assert!(lit.color.r < 255);
        assert!(lit.color.r > (255.0 * AMBIENT) as u8);
    }

    #[test]
    fn test_world_space_cull_follows_moved_camera() {
        // Camera moved behind a face that points toward the origin
        let mut camera = camera();
        camera.position = Vector3D::new(0.0, 0.0, -10.0);
        camera.turn(Vector3D::new(0.0, 1.0, 0.0), std::f32::consts::PI);
        let tri = facing_camera();
        let transform = FrameTransform::new(&camera, CullMode::WorldSpace);
        assert_eq!(transform.process(&Mesh::new(), &tri), Outcome::Culled);
    }
}
