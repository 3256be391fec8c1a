//! Transparent RGBA raster that strokes are painted onto.

use crate::error::{SketchError, SketchResult};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(Debug, Clone, PartialEq)]
pub struct RasterSurface {
    image: RgbaImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Replaces the surface with a blank one of the given size. Like a
    /// canvas, this erases content even when the size is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
    }

    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p[3] == 0)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.width() && y < self.height() {
            Some(*self.image.get_pixel(x, y))
        } else {
            None
        }
    }

    /// Paints a segment with round caps. Consecutive segments sharing an end
    /// point join round as well, since every end is a full disc.
    pub fn stroke_segment(&mut self, from: Point, to: Point, color: Rgba<u8>, width: f64) {
        let radius = (width.max(1.0) / 2.0).max(0.6);
        // Discs further than one radius outside the surface paint nothing, so
        // only the visible part of the segment is stepped.
        let Some((from, to)) = self.clip_segment(from, to, radius) else {
            return;
        };
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let distance = (dx * dx + dy * dy).sqrt();
        let steps = distance.max(1.0).ceil() as i32;
        for step in 0..=steps {
            let t = f64::from(step) / f64::from(steps);
            self.fill_disc(from.x + dx * t, from.y + dy * t, radius, color);
        }
    }

    /// Liang-Barsky clip against the surface grown by `margin` on each side.
    /// `None` when the segment misses it or has a non-finite end.
    fn clip_segment(&self, from: Point, to: Point, margin: f64) -> Option<(Point, Point)> {
        if ![from.x, from.y, to.x, to.y].iter().all(|v| v.is_finite()) {
            return None;
        }
        let (min_x, min_y) = (-margin, -margin);
        let max_x = f64::from(self.width()) + margin;
        let max_y = f64::from(self.height()) + margin;
        let dx = to.x - from.x;
        let dy = to.y - from.y;

        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        for (p, q) in [
            (-dx, from.x - min_x),
            (dx, max_x - from.x),
            (-dy, from.y - min_y),
            (dy, max_y - from.y),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    t0 = t0.max(r);
                } else {
                    t1 = t1.min(r);
                }
            }
        }
        if t0 > t1 {
            return None;
        }
        Some((
            Point::new(from.x + dx * t0, from.y + dy * t0),
            Point::new(from.x + dx * t1, from.y + dy * t1),
        ))
    }

    fn fill_disc(&mut self, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
        let (w, h) = (self.width() as i32, self.height() as i32);
        if w == 0 || h == 0 {
            return;
        }
        let min_x = ((cx - radius).floor() as i32).clamp(0, w - 1);
        let max_x = ((cx + radius).ceil() as i32).clamp(0, w - 1);
        let min_y = ((cy - radius).floor() as i32).clamp(0, h - 1);
        let max_y = ((cy + radius).ceil() as i32).clamp(0, h - 1);
        let r2 = radius * radius;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = f64::from(x) + 0.5 - cx;
                let py = f64::from(y) + 0.5 - cy;
                if px * px + py * py <= r2 {
                    self.image.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    /// Encodes the surface as PNG.
    pub fn encode_png(&self) -> SketchResult<Vec<u8>> {
        if self.width() == 0 || self.height() == 0 {
            return Err(SketchError::EmptySurface {
                width: self.width(),
                height: self.height(),
            });
        }
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(self.image.clone()).write_to(&mut bytes, ImageFormat::Png)?;
        Ok(bytes.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn new_surface_is_blank() {
        let surface = RasterSurface::new(10, 5);
        assert!(surface.is_blank());
        assert_eq!(surface.pixel(9, 4), Some(TRANSPARENT));
        assert_eq!(surface.pixel(10, 0), None);
    }

    #[test]
    fn segment_paints_along_line() {
        let mut surface = RasterSurface::new(40, 40);
        surface.stroke_segment(Point::new(5.0, 20.0), Point::new(35.0, 20.0), RED, 3.0);
        assert_eq!(surface.pixel(20, 20), Some(RED));
        assert_eq!(surface.pixel(5, 20), Some(RED));
        assert_eq!(surface.pixel(20, 30), Some(TRANSPARENT));
    }

    #[test]
    fn strokes_outside_are_clipped() {
        let mut surface = RasterSurface::new(10, 10);
        surface.stroke_segment(Point::new(-20.0, -20.0), Point::new(-5.0, -5.0), RED, 4.0);
        assert!(surface.is_blank());
        surface.stroke_segment(Point::new(-5.0, 5.0), Point::new(15.0, 5.0), RED, 2.0);
        assert_eq!(surface.pixel(0, 5), Some(RED));
        assert_eq!(surface.pixel(9, 5), Some(RED));
    }

    #[test]
    fn far_away_and_infinite_points_are_cheap() {
        let mut surface = RasterSurface::new(10, 10);
        surface.stroke_segment(Point::new(5.0, 5.0), Point::new(1.0e12, 5.0), RED, 2.0);
        assert_eq!(surface.pixel(9, 5), Some(RED));
        assert_eq!(surface.pixel(5, 0), Some(TRANSPARENT));

        let mut untouched = RasterSurface::new(10, 10);
        untouched.stroke_segment(Point::new(5.0, 5.0), Point::new(f64::INFINITY, 5.0), RED, 2.0);
        untouched.stroke_segment(Point::new(f64::NAN, 0.0), Point::new(5.0, 5.0), RED, 2.0);
        untouched.stroke_segment(Point::new(-1.0e15, -1.0e15), Point::new(-1.0e15, 1.0e15), RED, 2.0);
        assert!(untouched.is_blank());
    }

    #[test]
    fn resize_blanks_even_at_same_size() {
        let mut surface = RasterSurface::new(10, 10);
        surface.stroke_segment(Point::new(1.0, 1.0), Point::new(8.0, 8.0), RED, 2.0);
        surface.resize(10, 10);
        assert!(surface.is_blank());
        surface.resize(3, 4);
        assert_eq!((surface.width(), surface.height()), (3, 4));
    }

    #[test]
    fn zero_sized_surface_cannot_be_encoded() {
        let mut surface = RasterSurface::new(0, 0);
        surface.stroke_segment(Point::new(0.0, 0.0), Point::new(1.0, 1.0), RED, 3.0);
        assert!(matches!(
            surface.encode_png(),
            Err(SketchError::EmptySurface { width: 0, height: 0 })
        ));
    }

    #[test]
    fn encodes_png_signature() {
        let png = RasterSurface::new(4, 4).encode_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
