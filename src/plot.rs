// plot.rs
//
// PNG capture of a rendered scene.

use std::error::Error;
use std::path::Path;

use geo::MultiPolygon;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::debug;

use crate::error::{MapError, Result};
use crate::legend::{BUILDING_ROW_LABEL, Legend};
use crate::render::Scene;
use crate::state::DisplayMode;

pub const BACKGROUND: RGBColor = RGBColor(0x1a, 0x1a, 0x2e);

/// Something that can turn the current map into an image file.
pub trait Capture {
    fn capture(&mut self, scene: Option<&Scene>, legend: &Legend, path: &Path) -> Result<()>;
}

/// Draws scenes with the plotters bitmap backend.
#[derive(Debug, Clone)]
pub struct PngCapture {
    pub width: u32,
    pub height: u32,
}

impl Default for PngCapture {
    fn default() -> Self {
        // Twice the 800x600 on-screen map, for print-quality exports.
        PngCapture {
            width: 1600,
            height: 1200,
        }
    }
}

impl Capture for PngCapture {
    fn capture(&mut self, scene: Option<&Scene>, legend: &Legend, path: &Path) -> Result<()> {
        draw_png(path, (self.width, self.height), scene, legend).map_err(MapError::draw)?;
        debug!(path = %path.display(), "captured map image");
        Ok(())
    }
}

fn draw_png(
    path: &Path,
    size: (u32, u32),
    scene: Option<&Scene>,
    legend: &Legend,
) -> std::result::Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&BACKGROUND)?;

    let caption = match scene {
        Some(s) if s.view.mode == DisplayMode::OutlineOnly => {
            format!("Gewogs of {}: building footprints", s.region)
        }
        Some(s) => format!("Gewogs of {}: {}", s.region, s.view.attribute.label),
        None => String::from("No dzongkhag selected"),
    };

    let (x_range, y_range) = match scene.and_then(|s| s.viewport) {
        Some(v) => (v.x_range(), v.y_range()),
        None => (-180.0f64..180.0f64, -90.0f64..90.0f64),
    };

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(&caption, ("sans-serif", 36).into_font().color(&WHITE))
        .build_cartesian_2d(x_range, y_range)?;

    if let Some(scene) = scene {
        for gewog in scene.gewogs() {
            let Some(geometry) = &gewog.feature.geometry else {
                continue;
            };
            let style = gewog.style;
            chart.draw_series(
                exterior_rings(geometry)
                    .map(|ring| Polygon::new(ring, style.fill.mix(style.fill_opacity).filled())),
            )?;
            let stroke = style
                .stroke
                .stroke_width(style.stroke_width.round().max(1.0) as u32);
            chart.draw_series(
                exterior_rings(geometry).map(|ring| PathElement::new(ring, stroke)),
            )?;
        }

        if let Some(buildings) = scene.buildings() {
            let fill = buildings.style.fill.mix(buildings.style.fill_opacity).filled();
            let stroke = buildings.style.stroke.stroke_width(buildings.style.stroke_width);
            for footprint in &buildings.footprints {
                chart.draw_series(exterior_rings(footprint).map(|ring| Polygon::new(ring, fill)))?;
                chart.draw_series(
                    exterior_rings(footprint).map(|ring| PathElement::new(ring, stroke)),
                )?;
            }
        }

        let label_style = ("sans-serif", 18)
            .into_font()
            .color(&WHITE)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(scene.labels().iter().map(|l| {
            Text::new(
                l.text.clone(),
                (l.position.x, l.position.y),
                label_style.clone(),
            )
        }))?;
    }

    if legend.visible {
        draw_legend(&root, legend, size)?;
    }

    root.present()?;
    Ok(())
}

fn draw_legend<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    legend: &Legend,
    size: (u32, u32),
) -> std::result::Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let row_height = 28;
    let rows = legend.items.len() as i32 + if legend.show_buildings { 1 } else { 0 };
    let box_width = 420;
    let box_height = 50 + rows * row_height;
    let x0 = 20;
    let y0 = size.1 as i32 - box_height - 20;

    root.draw(&Rectangle::new(
        [(x0, y0), (x0 + box_width, y0 + box_height)],
        BACKGROUND.mix(0.85).filled(),
    ))?;
    root.draw(&Text::new(
        legend.title.clone(),
        (x0 + 12, y0 + 10),
        ("sans-serif", 18).into_font().color(&WHITE),
    ))?;

    let text_style = ("sans-serif", 16).into_font().color(&WHITE);
    let mut y = y0 + 42;
    for item in &legend.items {
        root.draw(&Rectangle::new(
            [(x0 + 12, y), (x0 + 32, y + 18)],
            item.color.filled(),
        ))?;
        root.draw(&Text::new(item.label.clone(), (x0 + 42, y + 1), text_style.clone()))?;
        y += row_height;
    }
    if legend.show_buildings {
        root.draw(&Rectangle::new(
            [(x0 + 12, y), (x0 + 32, y + 18)],
            RGBColor(0x3b, 0x82, 0xf6).filled(),
        ))?;
        root.draw(&Text::new(BUILDING_ROW_LABEL, (x0 + 42, y + 1), text_style))?;
    }
    Ok(())
}

/// Exterior rings as plot coordinates. Holes are not cut out.
fn exterior_rings(geometry: &MultiPolygon<f64>) -> impl Iterator<Item = Vec<(f64, f64)>> + '_ {
    geometry
        .0
        .iter()
        .map(|polygon| polygon.exterior().0.iter().map(|c| (c.x, c.y)).collect())
}
