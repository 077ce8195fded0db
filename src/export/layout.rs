//! Natural (scale 1) pixel geometry of a rendered tree.

use crate::render::TreeLine;

pub const FONT_PX: f32 = 14.0;
pub const ROW_HEIGHT: f32 = 24.0;
pub const INDENT: f32 = 24.0;
pub const ICON_SIZE: f32 = 12.0;
pub const ICON_GAP: f32 = 6.0;
pub const PADDING: f32 = 20.0;

/// Measures text for layout. Implemented by every rasterizer so the layout
/// matches what will actually be drawn.
pub trait TextMeasure {
    fn text_width(&self, text: &str, px: f32) -> f32;
}

/// Placement of one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRow {
    pub line: TreeLine,
    pub top: f32,
    pub icon_x: f32,
    pub text_x: f32,
    pub text_width: f32,
}

impl LayoutRow {
    pub fn middle(&self) -> f32 {
        self.top + ROW_HEIGHT / 2.0
    }

    /// X of the vertical guide belonging to nodes at `depth` (depth >= 1),
    /// centred under their parent's icon.
    pub fn guide_x(depth: usize) -> f32 {
        PADDING + (depth - 1) as f32 * INDENT + ICON_SIZE / 2.0
    }
}

/// Horizontal slice of a canvas, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub source_y: u32,
    pub height: u32,
}

impl Band {
    /// First canvas row below the band.
    pub fn end(&self) -> u32 {
        self.source_y + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeLayout {
    pub rows: Vec<LayoutRow>,
    pub width: f32,
    pub height: f32,
}

impl TreeLayout {
    pub fn measure(lines: &[TreeLine], measure: &dyn TextMeasure) -> Self {
        let mut width: f32 = 0.0;
        let rows: Vec<LayoutRow> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let icon_x = PADDING + line.depth as f32 * INDENT;
                let text_x = icon_x + ICON_SIZE + ICON_GAP;
                let text_width = measure.text_width(&line.name, FONT_PX);
                width = width.max(text_x + text_width);
                LayoutRow {
                    line: line.clone(),
                    top: PADDING + i as f32 * ROW_HEIGHT,
                    icon_x,
                    text_x,
                    text_width,
                }
            })
            .collect();

        Self {
            width: width.max(PADDING) + PADDING,
            height: rows.len() as f32 * ROW_HEIGHT + 2.0 * PADDING,
            rows,
        }
    }

    /// The whole canvas at `scale` as a single band.
    pub fn full_band(&self, scale: f32) -> Band {
        Band {
            source_y: 0,
            height: self.canvas_size(scale).1,
        }
    }

    /// Pixel size of a canvas for this layout at `scale`.
    pub fn canvas_size(&self, scale: f32) -> (u32, u32) {
        (
            (self.width * scale).ceil().max(1.0) as u32,
            (self.height * scale).ceil().max(1.0) as u32,
        )
    }
}
