//! Text and image renderings of analysis results.
//!
//! Board grids follow the printed-diagram convention: rank 8 at the top,
//! file A on the left.

use chess::{Square, ALL_FILES, ALL_RANKS};

use crate::census::AttackCensus;
use crate::control::ControlMap;
use crate::coordination::CoordinationSample;

const FILE_LABELS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

fn render_grid<F>(cell_width: usize, mut cell: F) -> String
where
    F: FnMut(Square) -> String,
{
    let mut out = String::new();
    out.push_str("  ");
    for label in FILE_LABELS {
        out.push_str(&format!(" {:>width$}", label, width = cell_width));
    }
    out.push('\n');

    for rank in ALL_RANKS.iter().rev() {
        out.push_str(&format!("{} ", rank.to_index() + 1));
        for file in ALL_FILES {
            let square = Square::make_square(*rank, file);
            out.push_str(&format!(" {:>width$}", cell(square), width = cell_width));
        }
        out.push('\n');
    }
    out
}

/// Control scores as a signed two-decimal grid.
pub fn render_heatmap(map: &ControlMap) -> String {
    render_grid(5, |square| format!("{:+.2}", map.get(square)))
}

/// Raw attacker counts as `white/black` pairs.
pub fn render_census(census: &AttackCensus) -> String {
    render_grid(5, |square| {
        let count = census.get(square);
        format!("{}/{}", count.white, count.black)
    })
}

pub fn render_trace(samples: &[CoordinationSample], white: &str, black: &str) -> String {
    let mut out = format!("{:>4}  {:>12}  {:>12}\n", "ply", truncate(white), truncate(black));
    for (ply, sample) in samples.iter().enumerate() {
        out.push_str(&format!("{:>4}  {:>12.2}  {:>12.2}\n", ply, sample.white, sample.black));
    }
    out
}

fn truncate(name: &str) -> String {
    name.chars().take(12).collect()
}

/// File and rank of a square as grid coordinates, a1 = (0, 0).
#[cfg(feature = "plots")]
fn grid_coordinates(square: Square) -> (i32, i32) {
    (
        square.get_file().to_index() as i32,
        square.get_rank().to_index() as i32,
    )
}

#[cfg(feature = "plots")]
pub fn plot_heatmap_png<P: AsRef<std::path::Path>>(
    path: P,
    map: &ControlMap,
) -> crate::error::Result<()> {
    draw_heatmap(path.as_ref(), map).map_err(|e| crate::error::AnalysisError::Plot(e.to_string()))
}

#[cfg(feature = "plots")]
fn draw_heatmap(path: &std::path::Path, map: &ControlMap) -> Result<(), Box<dyn std::error::Error>> {
    use plotters::prelude::*;

    let root = BitMapBackend::new(path, (640, 640)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("Square control", ("sans-serif", 22))
        .x_label_area_size(30)
        .y_label_area_size(30)
        .build_cartesian_2d(0i32..8i32, 0i32..8i32)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(8)
        .y_labels(8)
        .x_label_formatter(&|x| {
            FILE_LABELS
                .get(*x as usize)
                .map(|c| c.to_string())
                .unwrap_or_default()
        })
        .y_label_formatter(&|y| (y + 1).to_string())
        .draw()?;

    chart.draw_series(map.iter().map(|(square, score)| {
        let (x, y) = grid_coordinates(square);
        // -1 is full red, +1 full blue.
        let t = (score + 1.0) / 2.0;
        let color = RGBColor((255.0 * (1.0 - t)) as u8, 64, (255.0 * t) as u8);
        Rectangle::new([(x, y), (x + 1, y + 1)], color.filled())
    }))?;
    root.present()?;
    Ok(())
}

#[cfg(feature = "plots")]
pub fn plot_trace_png<P: AsRef<std::path::Path>>(
    path: P,
    samples: &[CoordinationSample],
    white: &str,
    black: &str,
) -> crate::error::Result<()> {
    draw_trace(path.as_ref(), samples, white, black)
        .map_err(|e| crate::error::AnalysisError::Plot(e.to_string()))
}

#[cfg(feature = "plots")]
fn draw_trace(
    path: &std::path::Path,
    samples: &[CoordinationSample],
    white: &str,
    black: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    use plotters::prelude::*;

    let (low, high) = samples
        .iter()
        .flat_map(|s| [s.white, s.black])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let (low, high) = if low.is_finite() { (low - 1.0, high + 1.0) } else { (0.0, 1.0) };
    let plies = samples.len().max(2) as f64 - 1.0;

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("Piece coordination", ("sans-serif", 22))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0f64..plies, low..high)?;
    chart.configure_mesh().x_desc("Ply").y_desc("Coordination").draw()?;

    let white_series: Vec<(f64, f64)> =
        samples.iter().enumerate().map(|(i, s)| (i as f64, s.white)).collect();
    let black_series: Vec<(f64, f64)> =
        samples.iter().enumerate().map(|(i, s)| (i as f64, s.black)).collect();
    chart
        .draw_series(LineSeries::new(white_series, &BLUE))?
        .label(format!("{}'s coordination", white))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.filled()));
    chart
        .draw_series(LineSeries::new(black_series, &GREEN))?
        .label(format!("{}'s coordination", black))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN.filled()));
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

#[cfg(not(feature = "plots"))]
pub fn plot_heatmap_png<P: AsRef<std::path::Path>>(
    _path: P,
    _map: &ControlMap,
) -> crate::error::Result<()> {
    Err(crate::error::AnalysisError::Plot(
        "plots feature is not enabled".to_string(),
    ))
}

#[cfg(not(feature = "plots"))]
pub fn plot_trace_png<P: AsRef<std::path::Path>>(
    _path: P,
    _samples: &[CoordinationSample],
    _white: &str,
    _black: &str,
) -> crate::error::Result<()> {
    Err(crate::error::AnalysisError::Plot(
        "plots feature is not enabled".to_string(),
    ))
}
