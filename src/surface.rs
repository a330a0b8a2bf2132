use anyhow::Context;
use bytemuck::NoUninit;

use crate::{math::Vec2i, raster::Clip};

#[derive(Debug, Clone, Copy, PartialEq, Eq, NoUninit)]
#[repr(transparent)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const BLACK: Self = Self([0, 0, 0, 0xff]);
    pub const WHITE: Self = Self([0xff, 0xff, 0xff, 0xff]);
}

/// Color the surface is cleared to.
pub const BACKGROUND: Rgba = Rgba::BLACK;
/// Color every stroke is painted with.
pub const FOREGROUND: Rgba = Rgba::WHITE;

/// Persistent off-screen raster holding everything committed so far.
pub struct DrawingSurface {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl DrawingSurface {
    /// Allocates a surface cleared to [`BACKGROUND`].
    ///
    /// Both dimensions must be non-zero; the caller filters out degenerate viewport sizes.
    pub fn new(width: u32, height: u32) -> anyhow::Result<Self> {
        debug_assert!(width > 0 && height > 0, "{width}x{height} surface");
        Ok(Self {
            width,
            height,
            pixels: alloc_cleared(width, height)?,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixel rectangle commands are rasterized into.
    pub fn clip(&self) -> Clip {
        Clip::new(self.width, self.height)
    }

    fn index(&self, p: Vec2i) -> Option<usize> {
        let (x, y) = (u32::try_from(p.x()).ok()?, u32::try_from(p.y()).ok()?);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn pixel(&self, p: Vec2i) -> Option<Rgba> {
        self.index(p).map(|i| self.pixels[i])
    }

    /// Paints `pixels` with `color` at full opacity. Pixels outside the surface are dropped.
    pub fn commit(&mut self, pixels: &[Vec2i], color: Rgba) {
        for &p in pixels {
            if let Some(i) = self.index(p) {
                self.pixels[i] = color;
            }
        }
    }

    pub fn clear_to_background(&mut self) {
        self.pixels.fill(BACKGROUND);
    }

    /// Reallocates the surface at a new size, keeping the overlapping top-left region.
    ///
    /// Anything outside the overlap is lost; newly exposed area is background.
    pub fn resize(&mut self, width: u32, height: u32) -> anyhow::Result<()> {
        debug_assert!(width > 0 && height > 0, "{width}x{height} surface");
        if (width, height) == (self.width, self.height) {
            return Ok(());
        }

        let mut pixels = alloc_cleared(width, height)?;
        let copy_w = self.width.min(width) as usize;
        for y in 0..self.height.min(height) as usize {
            let src = y * self.width as usize;
            let dst = y * width as usize;
            pixels[dst..dst + copy_w].copy_from_slice(&self.pixels[src..src + copy_w]);
        }

        log::debug!(
            "resized surface {}x{} -> {}x{}",
            self.width,
            self.height,
            width,
            height
        );
        self.pixels = pixels;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Row-major pixel data, for handing to the presentation step.
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }
}

fn alloc_cleared(width: u32, height: u32) -> anyhow::Result<Vec<Rgba>> {
    let len = width as usize * height as usize;
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .with_context(|| format!("failed to allocate {width}x{height} drawing surface"))?;
    pixels.resize(len, BACKGROUND);
    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use crate::math::vec2;

    use super::*;

    fn lit(surface: &DrawingSurface) -> usize {
        surface.pixels().iter().filter(|&&p| p == FOREGROUND).count()
    }

    #[test]
    fn commit_and_clear() {
        let mut s = DrawingSurface::new(10, 8).unwrap();
        assert_eq!(lit(&s), 0);

        s.commit(&[vec2(0, 0), vec2(9, 7), vec2(3, 3), vec2(3, 3)], FOREGROUND);
        assert_eq!(lit(&s), 3);
        assert_eq!(s.pixel(vec2(9, 7)), Some(FOREGROUND));
        assert_eq!(s.pixel(vec2(1, 0)), Some(BACKGROUND));

        s.clear_to_background();
        assert_eq!(lit(&s), 0);
    }

    #[test]
    fn out_of_range_pixels_are_dropped() {
        let mut s = DrawingSurface::new(4, 4).unwrap();
        s.commit(
            &[vec2(-1, 0), vec2(0, -1), vec2(4, 0), vec2(0, 4), vec2(i32::MAX, i32::MIN)],
            FOREGROUND,
        );
        assert_eq!(lit(&s), 0);
        assert_eq!(s.pixel(vec2(4, 0)), None);
    }

    #[test]
    fn resize_keeps_overlap() {
        let mut s = DrawingSurface::new(10, 10).unwrap();
        s.commit(&[vec2(2, 2), vec2(8, 8)], FOREGROUND);

        s.resize(20, 5).unwrap();
        assert_eq!((s.width(), s.height()), (20, 5));
        assert_eq!(s.pixels().len(), 100);
        assert_eq!(s.pixel(vec2(2, 2)), Some(FOREGROUND));
        assert_eq!(lit(&s), 1);

        // (8, 8) was cut off by the shrink and does not come back.
        s.resize(10, 10).unwrap();
        assert_eq!(s.pixel(vec2(2, 2)), Some(FOREGROUND));
        assert_eq!(s.pixel(vec2(8, 8)), Some(BACKGROUND));
    }

    #[test]
    fn grow_then_shrink_loses_grown_region() {
        let mut s = DrawingSurface::new(10, 10).unwrap();
        s.commit(&[vec2(5, 5)], FOREGROUND);

        s.resize(30, 30).unwrap();
        s.commit(&[vec2(25, 25), vec2(9, 9)], FOREGROUND);
        s.resize(12, 12).unwrap();
        assert_eq!(s.pixel(vec2(5, 5)), Some(FOREGROUND));
        assert_eq!(s.pixel(vec2(9, 9)), Some(FOREGROUND));

        s.resize(30, 30).unwrap();
        assert_eq!(s.pixel(vec2(25, 25)), Some(BACKGROUND));
        assert_eq!(lit(&s), 2);
    }
}
