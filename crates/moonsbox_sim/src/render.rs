//! Frame export for front ends.

use moonsbox_core::{Grid, MaterialData, Point, Rgba};

/// Which cell property a frame shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Material colors.
    #[default]
    Normal,
    /// Dimmed grayscale tinted red, then yellow, with temperature.
    Thermal,
}

impl RenderMode {
    /// The mode after this one, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Normal => Self::Thermal,
            Self::Thermal => Self::Normal,
        }
    }
}

/// Thermal view color of one cell.
///
/// Starts from half the cell's grayscale; red rises up to 500 K, green
/// joins above it.
#[must_use]
pub fn thermal_color(cell: &MaterialData) -> Rgba {
    let c = cell.color;
    let dark = ((u32::from(c.r) + u32::from(c.g) + u32::from(c.b)) / 6) as f32;
    let factor = cell.temp / 500.0;

    let red = (dark + factor * 191.0).clamp(0.0, 255.0);
    let green = (dark + (factor - 1.0) * 63.0).clamp(0.0, 255.0);
    Rgba::rgb(red as u8, green as u8, dark as u8)
}

/// A tightly packed RGBA8 frame, top row first.
#[must_use]
pub fn frame(grid: &Grid, mode: RenderMode) -> Vec<u8> {
    match mode {
        RenderMode::Normal => grid.rgba_image(),
        RenderMode::Thermal => {
            let size = grid.size();
            let mut pixels = Vec::with_capacity(size.area() * 4);
            for y in (0..size.height).rev() {
                for x in 0..size.width {
                    let color = grid.get(Point::new(x, y)).map_or(Rgba::TRANSPARENT, thermal_color);
                    pixels.extend_from_slice(&[color.r, color.g, color.b, color.a]);
                }
            }
            pixels
        }
    }
}
