//! Weight and body fat chart rendering
//!
//! The history handler only depends on [`ChartRenderer`]; the default
//! implementation draws with `plotters` into an RGB buffer and encodes it
//! as PNG.

use anyhow::{anyhow, Result};
use fitbot_shared::Sample;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

/// Turns two time series into an encoded image
pub trait ChartRenderer: Send + Sync {
    /// Render weight over time above body fat over time. Returns PNG bytes.
    fn render(&self, weight: &[Sample], body_fat: &[Sample]) -> Result<Vec<u8>>;
}

/// `plotters` renderer producing a two-panel PNG
#[derive(Debug, Clone, Copy)]
pub struct PlottersChartRenderer {
    width: u32,
    height: u32,
}

impl Default for PlottersChartRenderer {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

impl ChartRenderer for PlottersChartRenderer {
    fn render(&self, weight: &[Sample], body_fat: &[Sample]) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; (self.width * self.height * 3) as usize];

        {
            let root =
                BitMapBackend::with_buffer(&mut buffer, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(|e| anyhow!("chart fill failed: {}", e))?;

            let panels = root.split_evenly((2, 1));
            draw_panel(&panels[0], "Weight History", "weight (kg)", weight)?;
            draw_panel(&panels[1], "Body Fat History", "body fat (%)", body_fat)?;

            root.present().map_err(|e| anyhow!("chart present failed: {}", e))?;
        }

        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(&buffer, self.width, self.height, ColorType::Rgb8)?;
        Ok(png)
    }
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    y_desc: &str,
    samples: &[Sample],
) -> Result<()> {
    let x_range = 0..samples.len().saturating_sub(1).max(1);
    let y_range = value_range(samples);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(8)
        .x_label_area_size(36)
        .y_label_area_size(48)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| anyhow!("{}: {}", title, e))?;

    let label_at = |index: &usize| {
        samples
            .get(*index)
            .map(|s| s.label.clone())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .x_desc("time")
        .y_desc(y_desc)
        .x_labels(samples.len().clamp(1, 4))
        .x_label_formatter(&label_at)
        .draw()
        .map_err(|e| anyhow!("{}: {}", title, e))?;

    chart
        .draw_series(LineSeries::new(
            samples.iter().enumerate().map(|(i, s)| (i, s.value)),
            &BLUE,
        ))
        .map_err(|e| anyhow!("{}: {}", title, e))?;

    Ok(())
}

/// Y axis bounds with a little headroom; a flat or empty series still gets
/// a non-empty range
fn value_range(samples: &[Sample]) -> Range<f64> {
    let min = samples.iter().map(|s| s.value).fold(f64::INFINITY, f64::min);
    let max = samples
        .iter()
        .map(|s| s.value)
        .fold(f64::NEG_INFINITY, f64::max);

    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }

    let padding = ((max - min) * 0.1).max(1.0);
    (min - padding)..(max + padding)
}
