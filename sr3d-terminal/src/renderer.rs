/// Half-block presenter for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use sr3d_core::{BottomUp, PixelBuffer, Rgb, Surface};
use std::io::Write;

/// Upper half block: foreground paints the top pixel, background the bottom
const HALF_BLOCK: char = '\u{2580}';

/// Pixel surface backed by terminal cells, two pixels per cell
///
/// Row 0 of the engine's screen space is the bottom of the terminal.
pub struct TerminalSurface {
    cols: usize,
    rows: usize,
    pixels: BottomUp<PixelBuffer>,
    shown: Vec<Option<(Rgb, Rgb)>>,
}

impl TerminalSurface {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            pixels: BottomUp(PixelBuffer::new(cols, rows * 2)),
            shown: vec![None; cols * rows],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Resize to a new cell grid; everything is redrawn on the next frame.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.cols = cols;
        self.rows = rows;
        self.pixels.inner_mut().resize(cols, rows * 2);
        self.shown = vec![None; cols * rows];
    }

    /// Forget what is on screen in `row` so it is redrawn next time.
    pub fn invalidate_row(&mut self, row: usize) {
        if row < self.rows {
            let start = row * self.cols;
            self.shown[start..start + self.cols].fill(None);
        }
    }

    /// Queue the cells that changed since the previous draw.
    pub fn draw<W: Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        let buffer = self.pixels.inner();
        let mut cursor_at = None;

        for row in 0..self.rows {
            for col in 0..self.cols {
                let top = buffer.get(col, row * 2).unwrap_or(Rgb::BLACK);
                let bottom = buffer.get(col, row * 2 + 1).unwrap_or(Rgb::BLACK);
                let idx = row * self.cols + col;
                if self.shown[idx] == Some((top, bottom)) {
                    continue;
                }
                self.shown[idx] = Some((top, bottom));

                if cursor_at != Some((col, row)) {
                    writer.queue(cursor::MoveTo(col as u16, row as u16))?;
                }
                writer.queue(SetForegroundColor(to_color(top)))?;
                writer.queue(SetBackgroundColor(to_color(bottom)))?;
                writer.queue(Print(HALF_BLOCK))?;
                cursor_at = Some((col + 1, row));
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Surface for TerminalSurface {
    fn width(&self) -> usize {
        self.pixels.width()
    }

    fn height(&self) -> usize {
        self.pixels.height()
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        self.pixels.set_pixel(x, y, color);
    }
}

fn to_color(c: Rgb) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}
