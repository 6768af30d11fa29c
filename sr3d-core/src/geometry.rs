/// Geometry primitives for 3D rendering
use crate::math::{Mat4, Quaternion, Vector3D};

/// 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }

    /// Packed as `0x00RRGGBB`.
    pub fn to_u32(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A triangle face defined by three vertices and a flat color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Vector3D; 3],
    pub color: Rgb,
}

impl Triangle {
    pub fn new(v0: Vector3D, v1: Vector3D, v2: Vector3D) -> Self {
        Self::with_color(v0, v1, v2, Rgb::default())
    }

    pub fn with_color(v0: Vector3D, v1: Vector3D, v2: Vector3D, color: Rgb) -> Self {
        Self {
            vertices: [v0, v1, v2],
            color,
        }
    }

    /// Applies `f` to every vertex, keeping the color.
    pub fn map(&self, f: impl Fn(&Vector3D) -> Vector3D) -> Self {
        let [v0, v1, v2] = &self.vertices;
        Self::with_color(f(v0), f(v1), f(v2), self.color)
    }

    pub fn translate(&self, offset: Vector3D) -> Self {
        self.map(|v| *v + offset)
    }

    pub fn subtract(&self, offset: Vector3D) -> Self {
        self.map(|v| *v - offset)
    }

    pub fn transform(&self, m: &Mat4) -> Self {
        self.map(|v| v.transform(m))
    }

    pub fn rotate(&self, q: &Quaternion) -> Self {
        self.map(|v| v.rotate(q))
    }

    pub fn divide(&self, s: f32) -> Self {
        self.map(|v| *v / s)
    }

    /// Unnormalized face normal `(v1 - v0) x (v2 - v0)`.
    pub fn cross_normal(&self) -> Vector3D {
        let [v0, v1, v2] = self.vertices;
        (v1 - v0).cross(&(v2 - v0))
    }

    /// Unit face normal, or `None` for a zero-area triangle.
    pub fn normal(&self) -> Option<Vector3D> {
        self.cross_normal().try_normalize()
    }
}

/// A 3D mesh composed of triangles, placed in the world by a position and
/// orientation
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    pub position: Vector3D,
    pub rotation: Quaternion,
}

impl Mesh {
    pub fn new() -> Self {
        Self::from_triangles(Vec::new(), Vector3D::ZERO)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_triangles(Vec::with_capacity(capacity), Vector3D::ZERO)
    }

    pub fn from_triangles(triangles: Vec<Triangle>, position: impl Into<Vector3D>) -> Self {
        Self {
            triangles,
            position: position.into(),
            rotation: Quaternion::IDENTITY,
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Sets every face to `color`.
    pub fn paint(&mut self, color: Rgb) {
        for triangle in &mut self.triangles {
            triangle.color = color;
        }
    }

    /// Object space to world space: orientation about the mesh origin, then
    /// the position offset.
    pub fn place(&self, triangle: &Triangle) -> Triangle {
        if self.rotation == Quaternion::IDENTITY {
            triangle.translate(self.position)
        } else {
            triangle.rotate(&self.rotation).translate(self.position)
        }
    }

    /// Create a cube centered on the mesh origin, wound so that face normals
    /// point outward
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let v = Vector3D::new;
        let mut mesh = Self::with_capacity(12);

        let faces = [
            // Front
            [v(-h, -h, h), v(h, -h, h), v(h, h, h), v(-h, h, h)],
            // Back
            [v(h, -h, -h), v(-h, -h, -h), v(-h, h, -h), v(h, h, -h)],
            // Top
            [v(-h, h, h), v(h, h, h), v(h, h, -h), v(-h, h, -h)],
            // Bottom
            [v(-h, -h, -h), v(h, -h, -h), v(h, -h, h), v(-h, -h, h)],
            // Right
            [v(h, -h, h), v(h, -h, -h), v(h, h, -h), v(h, h, h)],
            // Left
            [v(-h, -h, -h), v(-h, -h, h), v(-h, h, h), v(-h, h, -h)],
        ];

        for [a, b, c, d] in faces {
            mesh.add_triangle(Triangle::new(a, b, c));
            mesh.add_triangle(Triangle::new(a, c, d));
        }

        mesh
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
