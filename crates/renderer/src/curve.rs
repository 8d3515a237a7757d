//! The animated rosette curve and its glow strokes.

use tiny_skia::{LineCap, LineJoin, Paint, Path, PathBuilder, Stroke};

use crate::color::Rgb;
use crate::error::{RenderError, RenderResult};
use crate::gradient::LookupTable;
use crate::raster::RasterBuffer;

/// Polar placement of one Bézier point relative to the curve origin.
///
/// Angles are radians, radii are logical surface units. Both are affine in the
/// segment index and the animation phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointTerms {
    pub angle_per_segment: f64,
    pub angle_per_phase: f64,
    pub radius_base: f64,
    pub radius_per_segment: f64,
    pub radius_per_phase: f64,
}

impl PointTerms {
    pub fn angle(&self, segment: usize, phase: f64) -> f64 {
        segment as f64 * self.angle_per_segment + phase * self.angle_per_phase
    }

    pub fn radius(&self, segment: usize, phase: f64) -> f64 {
        self.radius_base + segment as f64 * self.radius_per_segment + phase * self.radius_per_phase
    }

    pub fn locate(&self, origin: (f64, f64), segment: usize, phase: f64) -> (f64, f64) {
        let angle = self.angle(segment, phase);
        let radius = self.radius(segment, phase);
        (origin.0 + angle.cos() * radius, origin.1 + angle.sin() * radius)
    }
}

/// Coefficients of the single parametric curve family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveParams {
    pub segments: usize,
    pub ctrl1: PointTerms,
    pub ctrl2: PointTerms,
    pub end: PointTerms,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            segments: 5,
            // angle i*20 + phase + i*50, radius 100 + i*10 + phase
            ctrl1: PointTerms {
                angle_per_segment: 70.0,
                angle_per_phase: 1.0,
                radius_base: 100.0,
                radius_per_segment: 10.0,
                radius_per_phase: 1.0,
            },
            // angle i*30 + phase*2, radius 200 + i*40 + i
            ctrl2: PointTerms {
                angle_per_segment: 30.0,
                angle_per_phase: 2.0,
                radius_base: 200.0,
                radius_per_segment: 41.0,
                radius_per_phase: 0.0,
            },
            // angle i*10, radius 300 + i*10
            end: PointTerms {
                angle_per_segment: 10.0,
                angle_per_phase: 0.0,
                radius_base: 300.0,
                radius_per_segment: 10.0,
                radius_per_phase: 0.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    pub ctrl1: (f64, f64),
    pub ctrl2: (f64, f64),
    pub end: (f64, f64),
}

impl CurveParams {
    pub fn segments(&self, origin: (f64, f64), phase: f64) -> Vec<CubicSegment> {
        (0..self.segments)
            .map(|segment| CubicSegment {
                ctrl1: self.ctrl1.locate(origin, segment, phase),
                ctrl2: self.ctrl2.locate(origin, segment, phase),
                end: self.end.locate(origin, segment, phase),
            })
            .collect()
    }

    /// Open path starting at `origin`. `None` when the geometry is not finite.
    pub fn build_path(&self, origin: (f64, f64), phase: f64) -> Option<Path> {
        let mut builder = PathBuilder::new();
        builder.move_to(origin.0 as f32, origin.1 as f32);
        for segment in self.segments(origin, phase) {
            builder.cubic_to(
                segment.ctrl1.0 as f32,
                segment.ctrl1.1 as f32,
                segment.ctrl2.0 as f32,
                segment.ctrl2.1 as f32,
                segment.end.0 as f32,
                segment.end.1 as f32,
            );
        }
        builder.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokePass {
    pub radius: usize,
    pub width: f32,
    pub color: Rgb,
}

/// One pass per radius from `table.len()` down to 1, widest first.
pub fn stroke_passes(table: &LookupTable) -> Vec<StrokePass> {
    (1..=table.len())
        .rev()
        .map(|radius| StrokePass {
            radius,
            width: radius as f32 * 2.0,
            color: table.rgb(radius),
        })
        .collect()
}

/// Strokes the curve into a raster layer.
#[derive(Debug, Clone, Default)]
pub struct CurveLayerRenderer {
    params: CurveParams,
}

impl CurveLayerRenderer {
    pub fn new(params: CurveParams) -> Self {
        Self { params }
    }

    /// Clears `surface` and redraws the curve for `phase` anchored at the
    /// surface's horizontal centre and `center_y`.
    pub fn render(
        &self,
        surface: &mut RasterBuffer,
        table: &LookupTable,
        phase: f64,
        center_y: f32,
    ) -> RenderResult<()> {
        surface.clear();

        let origin = (f64::from(surface.logical_width() / 2.0), f64::from(center_y));
        let path = self
            .params
            .build_path(origin, phase)
            .ok_or(RenderError::CurveGeometry { phase })?;

        let transform = surface.transform();
        let mut paint = Paint::default();
        paint.anti_alias = true;
        let mut stroke = Stroke {
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        let pixmap = surface.pixmap_mut();
        for pass in stroke_passes(table) {
            stroke.width = pass.width;
            paint.set_color_rgba8(pass.color.r, pass.color.g, pass.color.b, 255);
            pixmap.stroke_path(&path, &paint, &stroke, transform, None);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distinct_table(length: usize) -> LookupTable {
        let samples = (0..length)
            .map(|index| {
                let step = (index * 97 % 256) as u8;
                [step, 255 - step, (index * 10) as u8, 255]
            })
            .collect();
        LookupTable::from_samples(samples)
    }

    fn nearest_entry(table: &LookupTable, pixel: [u8; 4]) -> usize {
        (0..table.len())
            .min_by_key(|&index| {
                let sample = table.get(index);
                (0..3)
                    .map(|channel| u32::from(sample[channel].abs_diff(pixel[channel])).pow(2))
                    .sum::<u32>()
            })
            .unwrap_or(0)
    }

    fn straight_line() -> CurveParams {
        let terms = |radius_base| PointTerms {
            angle_per_segment: 0.0,
            angle_per_phase: 0.0,
            radius_base,
            radius_per_segment: 0.0,
            radius_per_phase: 0.0,
        };
        CurveParams {
            segments: 1,
            ctrl1: terms(100.0),
            ctrl2: terms(200.0),
            end: terms(300.0),
        }
    }

    #[test]
    fn default_params_follow_rosette_formula() {
        let params = CurveParams::default();
        let origin = (400.0, 300.0);
        for phase in [0.0, 0.5, 3.25, 120.0] {
            let segments = params.segments(origin, phase);
            assert_eq!(segments.len(), 5);
            for (i, segment) in segments.iter().enumerate() {
                let i = i as f64;
                let polar = |angle: f64, radius: f64| {
                    (origin.0 + angle.cos() * radius, origin.1 + angle.sin() * radius)
                };
                let ctrl1 = polar(i * 20.0 + phase + i * 50.0, 100.0 + i * 10.0 + phase);
                let ctrl2 = polar(i * 30.0 + phase * 2.0, 200.0 + i * 40.0 + i);
                let end = polar(i * 10.0, 300.0 + i * 10.0);
                for (actual, expected) in [
                    (segment.ctrl1, ctrl1),
                    (segment.ctrl2, ctrl2),
                    (segment.end, end),
                ] {
                    assert!((actual.0 - expected.0).abs() < 1e-6);
                    assert!((actual.1 - expected.1).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn geometry_depends_only_on_phase() {
        let params = CurveParams::default();
        let a = params.segments((0.0, 0.0), 2.5);
        let b = params.segments((0.0, 0.0), 2.5);
        let c = params.segments((0.0, 0.0), 2.6);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a[3].end, c[3].end);
    }

    #[test]
    fn stroke_passes_descend_from_table_length() {
        let table = distinct_table(25);
        let passes = stroke_passes(&table);
        assert_eq!(passes.len(), 25);
        assert_eq!(passes[0].radius, 25);
        assert_eq!(passes[24].radius, 1);
        assert!(passes.windows(2).all(|pair| pair[0].radius > pair[1].radius));
        for pass in &passes {
            assert!((pass.width - pass.radius as f32 * 2.0).abs() < f32::EPSILON);
            assert_eq!(pass.color, table.rgb(pass.radius));
        }
        assert_eq!(passes[0].color, table.rgb(24));
    }

    #[test]
    fn rendering_is_deterministic() {
        let table = distinct_table(25);
        let renderer = CurveLayerRenderer::default();
        let mut first = RasterBuffer::new(320.0, 240.0, 1.0).unwrap();
        let mut second = RasterBuffer::new(320.0, 240.0, 1.0).unwrap();
        second.fill(Rgb::new(9, 9, 9), 255);

        renderer.render(&mut first, &table, 1.75, 120.0).unwrap();
        renderer.render(&mut second, &table, 1.75, 120.0).unwrap();
        assert_eq!(first.to_straight_rgba(), second.to_straight_rgba());
    }

    #[test]
    fn non_finite_phase_is_an_error() {
        let table = distinct_table(4);
        let renderer = CurveLayerRenderer::default();
        let mut surface = RasterBuffer::new(64.0, 64.0, 1.0).unwrap();

        let err = renderer
            .render(&mut surface, &table, f64::NAN, 32.0)
            .unwrap_err();
        assert!(matches!(err, RenderError::CurveGeometry { .. }));
    }

    #[test]
    fn rendering_clears_previous_contents() {
        let table = distinct_table(25);
        let renderer = CurveLayerRenderer::default();
        let mut surface = RasterBuffer::new(1000.0, 1000.0, 1.0).unwrap();
        surface.fill(Rgb::new(255, 255, 255), 255);

        renderer.render(&mut surface, &table, 0.0, 500.0).unwrap();
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(500, 500).map(|pixel| pixel[3]), Some(255));
    }

    #[test]
    fn thinner_passes_paint_over_wider_ones() {
        let table = distinct_table(25);
        let renderer = CurveLayerRenderer::new(straight_line());
        let mut surface = RasterBuffer::new(1000.0, 1000.0, 1.0).unwrap();
        renderer.render(&mut surface, &table, 0.0, 500.0).unwrap();

        // Pixel row `y` sits 499.5 - y units above the line.
        let sample = |y: u32| surface.pixel(650, y).unwrap();
        assert_eq!(nearest_entry(&table, sample(475)), table.len() - 1);
        assert_eq!(nearest_entry(&table, sample(490)), 10);
        assert_eq!(nearest_entry(&table, sample(480)), 20);
        assert_eq!(sample(470)[3], 0);
    }

    #[test]
    fn scale_factor_scales_the_stroke() {
        let table = distinct_table(25);
        let renderer = CurveLayerRenderer::new(straight_line());
        let mut surface = RasterBuffer::new(500.0, 500.0, 2.0).unwrap();
        renderer.render(&mut surface, &table, 0.0, 250.0).unwrap();

        // Device row 451 is 24.25 logical units above the line, row 440 is 29.75.
        assert_eq!(surface.pixel(700, 451).map(|pixel| pixel[3]), Some(255));
        assert_eq!(surface.pixel(700, 440).map(|pixel| pixel[3]), Some(0));
    }
}
