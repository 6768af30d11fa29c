/// Linear algebra kernel: homogeneous vectors, quaternions and 4x4 matrices
use nalgebra::{Matrix4, Vector3, Vector4};
use std::ops::{Add, Div, Index, Mul, Neg, Sub};

/// Homogeneous 3D point or direction. `w` is 1 for points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vector3D {
    pub const ZERO: Vector3D = Vector3D::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 1.0 }
    }

    pub const fn with_w(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// The spatial part as an nalgebra vector, dropping `w`.
    pub fn xyz(&self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn to_homogeneous(&self) -> Vector4<f32> {
        Vector4::new(self.x, self.y, self.z, self.w)
    }

    pub fn dot(&self, other: &Vector3D) -> f32 {
        self.xyz().dot(&other.xyz())
    }

    pub fn cross(&self, other: &Vector3D) -> Vector3D {
        self.xyz().cross(&other.xyz()).into()
    }

    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Divides by the length. A zero vector yields NaN components; use
    /// [`Vector3D::try_normalize`] when the input may be degenerate.
    pub fn normalize(&self) -> Vector3D {
        *self / self.length()
    }

    /// Returns `None` when the vector has zero (or non-finite) length.
    pub fn try_normalize(&self) -> Option<Vector3D> {
        let length = self.length();
        if length > 0.0 && length.is_finite() {
            Some(*self / length)
        } else {
            None
        }
    }

    /// Row vector times matrix, using all four homogeneous components.
    pub fn transform(&self, m: &Mat4) -> Vector3D {
        let r = self.to_homogeneous().transpose() * m.0;
        Vector3D::with_w(r[0], r[1], r[2], r[3])
    }

    /// Divides all four components by `w`.
    pub fn perspective_divide(&self) -> Vector3D {
        Vector3D::with_w(self.x / self.w, self.y / self.w, self.z / self.w, 1.0)
    }

    /// Sandwich rotation `q * (0, v) * conj(q)`.
    pub fn rotate(&self, q: &Quaternion) -> Vector3D {
        let rotated = *q * Quaternion::pure(*self) * q.conjugate();
        Vector3D::new(rotated.x, rotated.y, rotated.z)
    }
}

impl Default for Vector3D {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<Vector3<f32>> for Vector3D {
    fn from(v: Vector3<f32>) -> Self {
        Vector3D::new(v.x, v.y, v.z)
    }
}

impl From<[f32; 3]> for Vector3D {
    fn from(p: [f32; 3]) -> Self {
        Vector3D::new(p[0], p[1], p[2])
    }
}

impl From<[i32; 3]> for Vector3D {
    fn from(p: [i32; 3]) -> Self {
        Vector3D::new(p[0] as f32, p[1] as f32, p[2] as f32)
    }
}

impl Add for Vector3D {
    type Output = Vector3D;

    fn add(self, rhs: Vector3D) -> Vector3D {
        (self.xyz() + rhs.xyz()).into()
    }
}

impl Sub for Vector3D {
    type Output = Vector3D;

    fn sub(self, rhs: Vector3D) -> Vector3D {
        (self.xyz() - rhs.xyz()).into()
    }
}

impl Mul<f32> for Vector3D {
    type Output = Vector3D;

    fn mul(self, s: f32) -> Vector3D {
        (self.xyz() * s).into()
    }
}

impl Div<f32> for Vector3D {
    type Output = Vector3D;

    fn div(self, s: f32) -> Vector3D {
        (self.xyz() / s).into()
    }
}

impl Neg for Vector3D {
    type Output = Vector3D;

    fn neg(self) -> Vector3D {
        (-self.xyz()).into()
    }
}

/// Rotation quaternion `(w, x, y, z)`.
///
/// Expected to be close to unit length. Products are not renormalized, so a
/// long chain of small rotations slowly drifts away from unit magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Quaternion with zero scalar part, used to rotate a point.
    pub fn pure(v: Vector3D) -> Self {
        Self::new(0.0, v.x, v.y, v.z)
    }

    /// Rotation of `angle` radians about `axis` (expected unit length).
    pub fn from_axis_angle(axis: Vector3D, angle: f32) -> Self {
        let (sin_half, cos_half) = (angle / 2.0).sin_cos();
        let v = axis * sin_half;
        Self::new(cos_half, v.x, v.y, v.z)
    }

    /// Reinterprets a homogeneous vector, taking `w` as the scalar part.
    pub fn from_vector(v: Vector3D) -> Self {
        Self::new(v.w, v.x, v.y, v.z)
    }

    /// The components as a homogeneous vector with the scalar part in `w`.
    pub fn as_vector(&self) -> Vector3D {
        Vector3D::with_w(self.x, self.y, self.z, self.w)
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn magnitude(&self) -> f32 {
        nalgebra::Quaternion::from(*self).norm()
    }

    /// Standard rotation matrix of this quaternion.
    pub fn rotation_matrix(&self) -> Mat4 {
        let Quaternion { w, x, y, z } = *self;
        Mat4::from_rows([
            [
                2.0 * (w * w + x * x) - 1.0,
                2.0 * (x * y - w * z),
                2.0 * (x * z + w * y),
                0.0,
            ],
            [
                2.0 * (x * y + w * z),
                2.0 * (w * w + y * y) - 1.0,
                2.0 * (y * z - w * x),
                0.0,
            ],
            [
                2.0 * (x * z - w * y),
                2.0 * (y * z + w * x),
                2.0 * (w * w + z * z) - 1.0,
                0.0,
            ],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Quaternion> for nalgebra::Quaternion<f32> {
    fn from(q: Quaternion) -> Self {
        nalgebra::Quaternion::new(q.w, q.x, q.y, q.z)
    }
}

impl From<nalgebra::Quaternion<f32>> for Quaternion {
    fn from(q: nalgebra::Quaternion<f32>) -> Self {
        Quaternion::new(q.w, q.i, q.j, q.k)
    }
}

/// Hamilton product.
impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Quaternion) -> Quaternion {
        let product = nalgebra::Quaternion::from(self) * nalgebra::Quaternion::from(rhs);
        product.into()
    }
}

/// Row-major 4x4 matrix. Points are row vectors: `p * M1 * M2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4(pub Matrix4<f32>);

impl Mat4 {
    pub fn identity() -> Self {
        Mat4(Matrix4::identity())
    }

    pub fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        let [r0, r1, r2, r3] = rows;
        Mat4(Matrix4::new(
            r0[0], r0[1], r0[2], r0[3],
            r1[0], r1[1], r1[2], r1[3],
            r2[0], r2[1], r2[2], r2[3],
            r3[0], r3[1], r3[2], r3[3],
        ))
    }

    pub fn multiply(&self, other: &Mat4) -> Mat4 {
        Mat4(self.0 * other.0)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        self.multiply(&rhs)
    }
}

impl Index<(usize, usize)> for Mat4 {
    type Output = f32;

    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        &self.0[(row, col)]
    }
}
