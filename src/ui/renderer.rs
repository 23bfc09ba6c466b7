//! Radial menu and panel rendering
//!
//! Layout calculation is kept apart from rasterisation so the geometry can
//! be checked without a window. Everything here is portable; the overlay
//! windows only copy the finished pixmap to the screen.

use std::f32::consts::TAU;

use tiny_skia::{Color, FillRule, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use crate::domain::radial::{MenuShape, MenuStyle, RadialGeometry, SECTOR_COUNT, SectorIndex};

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Failed to create pixmap for rendering")]
    PixmapCreationFailed,

    #[error("Invalid canvas dimensions: {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
}

/// Transparent border around the artwork, in unscaled pixels
const CANVAS_MARGIN: f32 = 4.0;

/// Arc segments per sector for round styles
const ARC_STEPS: usize = 12;

fn sector_fill() -> Color {
    Color::from_rgba8(30, 30, 30, 170)
}

fn highlight_fill() -> Color {
    Color::from_rgba8(0x00, 0x7A, 0xFF, 210)
}

fn outline() -> Color {
    Color::from_rgba8(0xC0, 0xC0, 0xC0, 255)
}

fn card_fill() -> Color {
    Color::from_rgba8(24, 24, 28, 225)
}

/// Single line segment
#[derive(Debug, Clone)]
pub struct Line {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub width: f32,
}

/// Outline of one selectable sector, as a closed polygon
#[derive(Debug, Clone)]
pub struct Wedge {
    pub sector: SectorIndex,
    pub points: Vec<(f32, f32)>,
}

/// Pre-calculated geometry for one menu shape
#[derive(Debug, Clone)]
pub struct RadialLayout {
    pub style: MenuStyle,
    pub wedges: Vec<Wedge>,
    /// Decorations drawn over the wedges
    pub lines: Vec<Line>,
    /// Side of the square canvas
    pub canvas_size: u32,
    /// Canvas coordinate of the menu centre, on both axes
    pub center: f32,
    pub stroke_width: f32,
}

impl RadialLayout {
    /// Lays out `shape` for a monitor with the given DPI scale
    pub fn from_shape(shape: &MenuShape, dpi_scale: f32) -> Self {
        let scale = dpi_scale.max(0.5);
        let geometry = shape.geometry();
        let outer = shape.draw_radius() as f32 * scale;
        let inner = geometry.inner_radius as f32 * scale;
        let margin = CANVAS_MARGIN * scale;

        let canvas_size = ((outer + margin) * 2.0).ceil().max(1.0) as u32;
        let center = canvas_size as f32 / 2.0;
        let stroke_width = (1.5 * scale).max(1.0);

        // Straight-edged styles approximate their rim with one chord per sector
        let steps = match shape.style {
            MenuStyle::SpiderWeb | MenuStyle::Bagua => 1,
            MenuStyle::BasicRadial | MenuStyle::CsHeadshot => ARC_STEPS,
        };

        let span = TAU / SECTOR_COUNT as f32;
        let wedges = SectorIndex::all()
            .map(|sector| {
                let start = geometry.sector_start_angle(sector) as f32;
                Wedge {
                    sector,
                    points: wedge_points(center, inner, outer, start, span, steps),
                }
            })
            .collect();

        let mut layout = Self {
            style: shape.style,
            wedges,
            lines: Vec::new(),
            canvas_size,
            center,
            stroke_width,
        };
        layout.add_decorations(outer, &geometry, span);
        layout
    }

    fn add_decorations(&mut self, outer: f32, geometry: &RadialGeometry, span: f32) {
        let c = self.center;
        let width = self.stroke_width;

        match self.style {
            MenuStyle::BasicRadial => {}
            MenuStyle::CsHeadshot => {
                // Crosshair through the centre with a gap around the aim point
                let gap = outer * 0.15;
                for (dx, dy) in [(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)] {
                    self.lines.push(Line {
                        x1: c + dx * gap,
                        y1: c + dy * gap,
                        x2: c + dx * outer,
                        y2: c + dy * outer,
                        width,
                    });
                }
            }
            MenuStyle::SpiderWeb => {
                // Web threads at a third and two thirds of the radius
                for fraction in [1.0 / 3.0, 2.0 / 3.0] {
                    let r = outer * fraction;
                    for sector in SectorIndex::all() {
                        let a0 = geometry.sector_start_angle(sector) as f32;
                        let (x1, y1) = polar(c, r, a0);
                        let (x2, y2) = polar(c, r, a0 + span);
                        self.lines.push(Line {
                            x1,
                            y1,
                            x2,
                            y2,
                            width: width * 0.75,
                        });
                    }
                }
            }
            MenuStyle::Bagua => {
                // Trigram bars across the middle of each sector
                for sector in SectorIndex::all() {
                    let mid = geometry.sector_start_angle(sector) as f32 + span * 0.5;
                    for bar in 0..3 {
                        let r = outer * (0.62 + 0.1 * bar as f32);
                        let half = r * (span * 0.3).tan();
                        let (mx, my) = polar(c, r, mid);
                        let (tx, ty) = (-mid.sin(), mid.cos());
                        self.lines.push(Line {
                            x1: mx - tx * half,
                            y1: my - ty * half,
                            x2: mx + tx * half,
                            y2: my + ty * half,
                            width: width * 2.0,
                        });
                    }
                }
            }
        }
    }
}

fn polar(center: f32, radius: f32, angle: f32) -> (f32, f32) {
    (center + radius * angle.cos(), center + radius * angle.sin())
}

/// Outer rim clockwise, then the inner rim (or the centre) back
fn wedge_points(
    center: f32,
    inner: f32,
    outer: f32,
    start: f32,
    span: f32,
    steps: usize,
) -> Vec<(f32, f32)> {
    let mut points = Vec::with_capacity(2 * (steps + 1));
    for i in 0..=steps {
        points.push(polar(center, outer, start + span * i as f32 / steps as f32));
    }
    if inner > 0.0 {
        for i in (0..=steps).rev() {
            points.push(polar(center, inner, start + span * i as f32 / steps as f32));
        }
    } else {
        points.push((center, center));
    }
    points
}

fn polygon(points: &[(f32, f32)]) -> Option<Path> {
    let (&(x0, y0), rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(x0, y0);
    for &(x, y) in rest {
        pb.line_to(x, y);
    }
    pb.close();
    pb.finish()
}

fn rounded_rect(x: f32, y: f32, w: f32, h: f32, r: f32) -> Option<Path> {
    let r = r.min(w / 2.0).min(h / 2.0);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

/// Rasterises radial layouts and the panel card
#[derive(Debug, Default)]
pub struct RadialRenderer;

impl RadialRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Renders the menu with `highlight` filled in the accent colour
    pub fn render(
        &self,
        layout: &RadialLayout,
        highlight: Option<SectorIndex>,
    ) -> Result<Pixmap, RendererError> {
        let mut pixmap = Pixmap::new(layout.canvas_size, layout.canvas_size)
            .ok_or(RendererError::PixmapCreationFailed)?;
        pixmap.fill(Color::TRANSPARENT);

        self.draw_wedges(&mut pixmap, layout, highlight, Transform::identity());
        Ok(pixmap)
    }

    /// Renders the informational panel card
    ///
    /// The card carries a miniature of the configured menu so the sector
    /// layout can be read while the panel is open.
    pub fn render_panel(
        &self,
        width: u32,
        height: u32,
        legend: &RadialLayout,
    ) -> Result<Pixmap, RendererError> {
        if width == 0 || height == 0 {
            return Err(RendererError::InvalidCanvas { width, height });
        }
        let mut pixmap = Pixmap::new(width, height).ok_or(RendererError::PixmapCreationFailed)?;
        pixmap.fill(Color::TRANSPARENT);

        let (w, h) = (width as f32, height as f32);
        if let Some(card) = rounded_rect(0.5, 0.5, w - 1.0, h - 1.0, 12.0) {
            pixmap.fill_path(
                &card,
                &paint(card_fill()),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
            let stroke = Stroke {
                width: 1.0,
                ..Stroke::default()
            };
            pixmap.stroke_path(&card, &paint(outline()), &stroke, Transform::identity(), None);
        }

        // Legend scaled to fit the card width, anchored near the top
        let size = legend.canvas_size as f32;
        let fit = ((w * 0.8) / size).min(1.0);
        let dx = (w - size * fit) / 2.0;
        let dy = (h * 0.1).min(24.0);
        let transform = Transform::from_row(fit, 0.0, 0.0, fit, dx, dy);
        self.draw_wedges(&mut pixmap, legend, None, transform);

        Ok(pixmap)
    }

    fn draw_wedges(
        &self,
        pixmap: &mut Pixmap,
        layout: &RadialLayout,
        highlight: Option<SectorIndex>,
        transform: Transform,
    ) {
        let stroke = Stroke {
            width: layout.stroke_width,
            ..Stroke::default()
        };
        let rim = paint(outline());

        for wedge in &layout.wedges {
            let Some(path) = polygon(&wedge.points) else {
                continue;
            };
            let fill = if Some(wedge.sector) == highlight {
                highlight_fill()
            } else {
                sector_fill()
            };
            pixmap.fill_path(&path, &paint(fill), FillRule::Winding, transform, None);
            pixmap.stroke_path(&path, &rim, &stroke, transform, None);
        }

        for line in &layout.lines {
            let mut pb = PathBuilder::new();
            pb.move_to(line.x1, line.y1);
            pb.line_to(line.x2, line.y2);
            if let Some(path) = pb.finish() {
                let stroke = Stroke {
                    width: line.width,
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &rim, &stroke, transform, None);
            }
        }
    }
}

/// Premultiplied BGRA bytes as expected by a 32-bit top-down DIB
pub fn to_bgra(pixmap: &Pixmap) -> Vec<u8> {
    let mut data = pixmap.data().to_vec();
    for px in data.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(style: MenuStyle) -> MenuShape {
        MenuShape {
            style,
            outer_radius: 50.0,
            inner_radius: 28.0,
        }
    }

    fn pixel(pixmap: &Pixmap, x: f32, y: f32) -> tiny_skia::PremultipliedColorU8 {
        pixmap
            .pixel(x.round() as u32, y.round() as u32)
            .expect("inside canvas")
    }

    #[test]
    fn layout_has_one_wedge_per_sector() {
        for style in MenuStyle::ALL {
            let layout = RadialLayout::from_shape(&shape(style), 1.0);
            assert_eq!(layout.wedges.len(), SECTOR_COUNT);
            assert!(layout.wedges.iter().all(|w| w.points.len() >= 3));
        }
    }

    #[test]
    fn canvas_fits_draw_radius() {
        let basic = RadialLayout::from_shape(&shape(MenuStyle::BasicRadial), 1.0);
        assert_eq!(basic.canvas_size, 108);

        // Bagua draws beyond its configured radius
        let bagua = RadialLayout::from_shape(&shape(MenuStyle::Bagua), 1.0);
        assert_eq!(bagua.canvas_size, 128);

        let scaled = RadialLayout::from_shape(&shape(MenuStyle::BasicRadial), 2.0);
        assert_eq!(scaled.canvas_size, 216);
    }

    #[test]
    fn style_decorations() {
        let count = |style| RadialLayout::from_shape(&shape(style), 1.0).lines.len();
        assert_eq!(count(MenuStyle::BasicRadial), 0);
        assert_eq!(count(MenuStyle::CsHeadshot), 4);
        assert_eq!(count(MenuStyle::SpiderWeb), 2 * SECTOR_COUNT);
        assert_eq!(count(MenuStyle::Bagua), 3 * SECTOR_COUNT);
    }

    #[test]
    fn highlight_fills_sector_in_accent_colour() {
        let layout = RadialLayout::from_shape(&shape(MenuStyle::BasicRadial), 1.0);
        let renderer = RadialRenderer::new();
        let top = SectorIndex::new(0).expect("in range");

        let plain = renderer.render(&layout, None).expect("renders");
        let lit = renderer.render(&layout, Some(top)).expect("renders");

        // Middle of the ring, straight up
        let (x, y) = (layout.center, layout.center - 39.0);
        let before = pixel(&plain, x, y);
        let after = pixel(&lit, x, y);
        assert!(after.blue() > after.red());
        assert!(after.blue() > before.blue());

        // Opposite sector is untouched
        let below = layout.center + 39.0;
        assert_eq!(pixel(&plain, x, below), pixel(&lit, x, below));
    }

    #[test]
    fn dead_zone_is_transparent() {
        let layout = RadialLayout::from_shape(&shape(MenuStyle::BasicRadial), 1.0);
        let pixmap = RadialRenderer::new().render(&layout, None).expect("renders");
        assert_eq!(pixel(&pixmap, layout.center, layout.center).alpha(), 0);
    }

    #[test]
    fn panel_card_is_opaque_inside() {
        let legend = RadialLayout::from_shape(&shape(MenuStyle::SpiderWeb), 1.0);
        let pixmap = RadialRenderer::new()
            .render_panel(240, 320, &legend)
            .expect("renders");
        assert_eq!((pixmap.width(), pixmap.height()), (240, 320));
        assert!(pixel(&pixmap, 120.0, 300.0).alpha() > 200);
        assert!(matches!(
            RadialRenderer::new().render_panel(0, 10, &legend),
            Err(RendererError::InvalidCanvas { .. })
        ));
    }

    #[test]
    fn bgra_swaps_red_and_blue() {
        let mut pixmap = Pixmap::new(1, 1).expect("1x1");
        pixmap.fill(Color::from_rgba8(255, 0, 0, 255));
        assert_eq!(to_bgra(&pixmap), vec![0, 0, 255, 255]);
    }
}
