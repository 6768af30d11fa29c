/// Depth-tested triangle rasterizer
use crate::geometry::{Rgb, Triangle};
use crate::surface::Surface;

/// Nearest depth written so far at each pixel
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    width: usize,
    height: usize,
    depth: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            depth: vec![f32::INFINITY; width * height],
        }
    }

    pub fn clear(&mut self) {
        self.depth.fill(f32::INFINITY);
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.depth[y * self.width + x]
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

/// One flag per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct PixelMask {
    width: usize,
    bits: Vec<bool>,
}

impl PixelMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            bits: vec![false; width * height],
        }
    }

    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    pub fn set(&mut self, x: usize, y: usize) {
        self.bits[y * self.width + x] = true;
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Pixels set here but not in `other`.
    pub fn difference<'a>(&'a self, other: &'a PixelMask) -> impl Iterator<Item = (usize, usize)> + 'a {
        let width = self.width;
        self.bits
            .iter()
            .zip(other.bits.iter())
            .enumerate()
            .filter(|&(_, (&mine, &theirs))| mine && !theirs)
            .map(move |(i, _)| (i % width, i / width))
    }
}

/// Depth buffer and touched-pixel mask for one frame
pub struct RasterTarget<'a, S: Surface> {
    pub surface: &'a mut S,
    pub depth: &'a mut DepthBuffer,
    pub touched: &'a mut PixelMask,
}

impl<'a, S: Surface> RasterTarget<'a, S> {
    pub fn new(surface: &'a mut S, depth: &'a mut DepthBuffer, touched: &'a mut PixelMask) -> Self {
        debug_assert_eq!(surface.width(), depth.width, "depth buffer width mismatch");
        debug_assert_eq!(surface.height(), depth.height, "depth buffer height mismatch");
        Self {
            surface,
            depth,
            touched,
        }
    }

    /// Fill a screen-space triangle in its flat color.
    ///
    /// Samples integer pixel coordinates inside the clamped bounding box. A
    /// pixel is covered when all three barycentric weights are `>= 0`, and
    /// written when its interpolated depth is nearer than the buffer's.
    /// Returns the number of pixels written.
    pub fn fill_triangle(&mut self, triangle: &Triangle) -> usize {
        let [v0, v1, v2] = triangle.vertices;
        let width = self.depth.width as f32;
        let height = self.depth.height as f32;

        // Bounding box, clamped to the surface
        let min_x = v0.x.min(v1.x).min(v2.x).clamp(0.0, width);
        let max_x = v0.x.max(v1.x).max(v2.x).clamp(0.0, width);
        let min_y = v0.y.min(v1.y).min(v2.y).clamp(0.0, height);
        let max_y = v0.y.max(v1.y).max(v2.y).clamp(0.0, height);

        let mut written = 0;
        let mut y = min_y as usize;
        while (y as f32) < max_y {
            let mut x = min_x as usize;
            while (x as f32) < max_x {
                if let Some((w0, w1, w2)) = barycentric(
                    (v0.x, v0.y),
                    (v1.x, v1.y),
                    (v2.x, v2.y),
                    (x as f32, y as f32),
                ) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.z + w1 * v1.z + w2 * v2.z;
                        if self.plot(x, y, depth, triangle.color) {
                            written += 1;
                        }
                    }
                }
                x += 1;
            }
            y += 1;
        }
        written
    }

    fn plot(&mut self, x: usize, y: usize, depth: f32, color: Rgb) -> bool {
        let idx = y * self.depth.width + x;
        if depth < self.depth.depth[idx] {
            self.depth.depth[idx] = depth;
            self.surface.set_pixel(x, y, color);
            self.touched.set(x, y);
            true
        } else {
            false
        }
    }
}

/// Calculate barycentric coordinates for a point in a triangle
///
/// `None` when the triangle has zero area.
pub fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3D;
    use crate::surface::PixelBuffer;

    fn flat(points: [(f32, f32); 3], z: f32, color: Rgb) -> Triangle {
        let [a, b, c] = points.map(|(x, y)| Vector3D::new(x, y, z));
        Triangle::with_color(a, b, c, color)
    }

    struct Fixture {
        surface: PixelBuffer,
        depth: DepthBuffer,
        touched: PixelMask,
    }

    impl Fixture {
        fn new(width: usize, height: usize) -> Self {
            Self {
                surface: PixelBuffer::new(width, height),
                depth: DepthBuffer::new(width, height),
                touched: PixelMask::new(width, height),
            }
        }

        fn fill(&mut self, triangle: &Triangle) -> usize {
            RasterTarget::new(&mut self.surface, &mut self.depth, &mut self.touched)
                .fill_triangle(triangle)
        }
    }

    #[test]
    fn test_barycentric_at_vertices() {
        let (a, b, c) = ((0.0, 0.0), (10.0, 0.0), (0.0, 10.0));
        assert_eq!(barycentric(a, b, c, a), Some((1.0, 0.0, 0.0)));
        let (w0, w1, w2) = barycentric(a, b, c, (2.0, 3.0)).unwrap();
        assert!((w0 - 0.5).abs() < 1e-6 && (w1 - 0.2).abs() < 1e-6 && (w2 - 0.3).abs() < 1e-6);
        assert!(barycentric(a, a, c, (1.0, 1.0)).is_none());
    }

    #[test]
    fn test_fill_marks_touched_and_depth() {
        let mut fx = Fixture::new(20, 20);
        let red = Rgb::new(255, 0, 0);
        let written = fx.fill(&flat([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)], 0.5, red));
        assert!(written > 0);
        assert_eq!(written, fx.touched.count());
        assert_eq!(fx.surface.get(2, 2), Some(red));
        assert!((fx.depth.get(2, 2) - 0.5).abs() < 1e-6);
        assert!(!fx.touched.contains(9, 9));
        assert_eq!(fx.depth.get(9, 9), f32::INFINITY);
    }

    #[test]
    fn test_nearer_wins_in_either_order() {
        let near = flat([(0.0, 0.0), (16.0, 0.0), (0.0, 16.0)], 0.2, Rgb::new(200, 0, 0));
        let far = flat([(0.0, 0.0), (16.0, 0.0), (16.0, 16.0)], 0.8, Rgb::new(0, 0, 200));

        for order in [[near, far], [far, near]] {
            let mut fx = Fixture::new(16, 16);
            for tri in &order {
                fx.fill(tri);
            }
            // (6, 2) lies inside both
            assert_eq!(fx.surface.get(6, 2), Some(near.color));
            // (12, 8) only inside the far one
            assert_eq!(fx.surface.get(12, 8), Some(far.color));
        }
    }

    #[test]
    fn test_bounding_box_clamped() {
        let mut fx = Fixture::new(8, 8);
        let huge = flat([(-100.0, -100.0), (300.0, -100.0), (-100.0, 300.0)], 0.0, Rgb::WHITE);
        let written = fx.fill(&huge);
        assert_eq!(written, 64);
    }

    #[test]
    fn test_degenerate_and_nan_triangles_skipped() {
        let mut fx = Fixture::new(8, 8);
        assert_eq!(fx.fill(&flat([(1.0, 1.0), (4.0, 4.0), (6.0, 6.0)], 0.0, Rgb::WHITE)), 0);
        assert_eq!(fx.fill(&flat([(f32::NAN, 1.0), (4.0, 4.0), (1.0, 6.0)], 0.0, Rgb::WHITE)), 0);
        assert_eq!(fx.touched.count(), 0);
    }

    #[test]
    fn test_mask_difference() {
        let mut previous = PixelMask::new(3, 2);
        let mut current = PixelMask::new(3, 2);
        previous.set(0, 0);
        previous.set(2, 1);
        current.set(2, 1);
        current.set(1, 0);
        let stale: Vec<_> = previous.difference(&current).collect();
        assert_eq!(stale, vec![(0, 0)]);
    }
}
