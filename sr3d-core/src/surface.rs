/// Pixel surfaces the rasterizer draws into
use crate::geometry::Rgb;

/// A fixed-size grid of 24-bit pixels addressed by integer coordinates
pub trait Surface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb);
}

/// In-memory surface, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb::BLACK; width * height],
        }
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            Some(self.pixels[self.index(x, y)])
        } else {
            None
        }
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    /// Resize, blacking out the whole buffer.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, Rgb::BLACK);
    }

    /// Opaque RGBA bytes, the layout canvas image data expects.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| [p.r, p.g, p.b, 255])
            .collect()
    }
}

impl Surface for PixelBuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.pixels[idx] = color;
        }
    }
}

/// Flips rows so that screen `y = 0` is the bottom of the wrapped surface
#[derive(Debug, Clone)]
pub struct BottomUp<S>(pub S);

impl<S> BottomUp<S> {
    pub fn inner(&self) -> &S {
        &self.0
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.0
    }
}

impl<S: Surface> Surface for BottomUp<S> {
    fn width(&self) -> usize {
        self.0.width()
    }

    fn height(&self) -> usize {
        self.0.height()
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        let height = self.0.height();
        if y < height {
            self.0.set_pixel(x, height - 1 - y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut buffer = PixelBuffer::new(4, 3);
        buffer.set_pixel(3, 2, Rgb::WHITE);
        buffer.set_pixel(4, 0, Rgb::WHITE);
        assert_eq!(buffer.get(3, 2), Some(Rgb::WHITE));
        assert_eq!(buffer.get(0, 0), Some(Rgb::BLACK));
        assert_eq!(buffer.get(4, 0), None);
    }

    #[test]
    fn test_rgba_layout() {
        let mut buffer = PixelBuffer::new(2, 1);
        buffer.set_pixel(1, 0, Rgb::new(1, 2, 3));
        assert_eq!(buffer.to_rgba(), vec![0, 0, 0, 255, 1, 2, 3, 255]);
    }

    #[test]
    fn test_bottom_up_flips_rows() {
        let mut flipped = BottomUp(PixelBuffer::new(2, 3));
        flipped.set_pixel(1, 0, Rgb::WHITE);
        flipped.set_pixel(0, 3, Rgb::WHITE);
        assert_eq!(flipped.inner().get(1, 2), Some(Rgb::WHITE));
        assert_eq!(flipped.inner().pixels().iter().filter(|&&p| p == Rgb::WHITE).count(), 1);
    }
}
