//! Rendering of trajectories with `plotters`.
//!
//! Two [`Renderer`]s are provided:
//!
//! - [`StaticChart`]: a line chart of the three compartments, written as PNG or SVG.
//! - [`Animation`]: a looping GIF that draws the curves progressively, one frame every
//!   `frame_skip` steps, with a marker at the current position of each curve.
//!
//! Output is drawn through [`write_atomically`](crate::output::write_atomically), so a failed
//! render never leaves a partial file behind.
//!
//! Text (title, axis labels, legend) needs a TrueType font. One is looked up from
//! [`ChartOptions::font_path`] and a list of common system locations. Without a font the chart
//! is still drawn, just without any text.
mod animation;
mod chart;

pub use animation::{frame_indices, Animation, AnimationOptions};
pub use chart::StaticChart;

use log::{debug, trace, warn};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::SirError;
use crate::integrator::PopulationState;
use crate::parameters::Parameters;
use crate::trajectory::Trajectory;

/// Produces an artifact at `path` from a trajectory.
pub trait Renderer {
    /// Renders `trajectory`, titled with `parameters` when given.
    ///
    /// # Errors
    ///
    /// Returns `SirError::RenderError` for unsupported output formats or drawing failures and
    /// `SirError::IoError` when the destination cannot be written.
    fn render(
        &self,
        trajectory: &Trajectory,
        parameters: Option<&Parameters>,
        path: &Path,
    ) -> Result<(), SirError>;
}

/// Appearance shared by both renderers.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// TrueType font used for all text.
    pub font_path: Option<PathBuf>,
    /// Where `sir` writes its static chart. No chart is written when unset.
    pub output_file: Option<PathBuf>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            width: 1000,
            height: 600,
            title: "SIR Simulation".to_string(),
            font_path: None,
            output_file: None,
        }
    }
}

impl ChartOptions {
    pub(crate) fn validate(&self) -> Result<(), SirError> {
        if self.width == 0 || self.height == 0 {
            return Err(SirError::RenderError(format!(
                "chart size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

const FONT_FAMILY: &str = "sans-serif";

const FONT_CANDIDATES: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT_REGISTERED: Mutex<bool> = Mutex::new(false);

/// Registers a font for [`FONT_FAMILY`] unless one already is. Returns whether text can be drawn.
fn ensure_font(configured: Option<&Path>) -> bool {
    let mut registered = FONT_REGISTERED
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if *registered {
        return true;
    }

    let candidates = configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from));
    for candidate in candidates {
        let Ok(bytes) = fs::read(&candidate) else {
            trace!("no font at {}", candidate.display());
            continue;
        };
        // plotters keeps registered fonts for the life of the process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                debug!("using font {}", candidate.display());
                *registered = true;
                return true;
            }
            Err(_) => warn!("ignoring unreadable font {}", candidate.display()),
        }
    }
    warn!("no TrueType font found; charts are drawn without text");
    false
}

fn render_error<E: Display>(error: E) -> SirError {
    SirError::RenderError(error.to_string())
}

/// Returns the lower-cased extension of `path` if it is one of `allowed`.
fn output_extension(path: &Path, allowed: &[&str]) -> Result<String, SirError> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    match extension {
        Some(extension) if allowed.contains(&extension.as_str()) => Ok(extension),
        _ => Err(SirError::RenderError(format!(
            "unsupported output file {}: expected one of {}",
            path.display(),
            allowed.join(", ")
        ))),
    }
}

const SUSCEPTIBLE_COLOR: RGBColor = RGBColor(0, 0, 255);
const INFECTED_COLOR: RGBColor = RGBColor(255, 0, 0);
const RECOVERED_COLOR: RGBColor = RGBColor(0, 128, 0);

fn susceptible(state: &PopulationState) -> f64 {
    state.susceptible
}

fn infected(state: &PopulationState) -> f64 {
    state.infected
}

fn recovered(state: &PopulationState) -> f64 {
    state.recovered
}

type Compartment = (&'static str, RGBColor, fn(&PopulationState) -> f64);

const COMPARTMENTS: [Compartment; 3] = [
    ("Susceptible (S)", SUSCEPTIBLE_COLOR, susceptible),
    ("Infected (I)", INFECTED_COLOR, infected),
    ("Recovered (R)", RECOVERED_COLOR, recovered),
];

/// Axis ranges and caption computed once from the whole trajectory, so every animation frame
/// shares the same axes.
struct ChartLayout {
    caption: String,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    text: bool,
}

impl ChartLayout {
    fn new(trajectory: &Trajectory, parameters: Option<&Parameters>, options: &ChartOptions) -> Self {
        let caption = match parameters {
            Some(parameters) => format!(
                "{} (beta={}, gamma={}, R0={:.1})",
                options.title,
                parameters.beta(),
                parameters.gamma(),
                parameters.basic_reproduction_number()
            ),
            None => options.title.clone(),
        };

        let x_max = trajectory.time_horizon();
        let x_max = if x_max > 0.0 { x_max } else { 1.0 };

        let peak_infected = trajectory.infected().fold(f64::NEG_INFINITY, f64::max);
        let peak_infected = if peak_infected > 0.0 {
            peak_infected
        } else {
            100.0
        };
        let y_max = trajectory
            .initial()
            .susceptible
            .max(peak_infected)
            .max(trajectory.last().recovered)
            * 1.1;
        let y_max = if y_max.is_finite() && y_max > 0.0 {
            y_max
        } else {
            1.0
        };
        // Only an unstable, unclamped run dips below zero.
        let lowest = trajectory
            .states()
            .iter()
            .flat_map(|state| [state.susceptible, state.infected, state.recovered])
            .fold(0.0, f64::min);
        let y_min = if lowest.is_finite() { lowest * 1.1 } else { 0.0 };

        ChartLayout {
            caption,
            x_max,
            y_min,
            y_max,
            text: ensure_font(options.font_path.as_deref()),
        }
    }

    /// Draws the curves up to and including `upto`, optionally marking the state at `upto`.
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        trajectory: &Trajectory,
        upto: usize,
        markers: bool,
    ) -> Result<(), SirError> {
        root.fill(&WHITE).map_err(render_error)?;

        let mut builder = ChartBuilder::on(root);
        builder
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60);
        if self.text {
            builder.caption(&self.caption, (FONT_FAMILY, 22));
        }
        let mut chart = builder
            .build_cartesian_2d(0.0..self.x_max, self.y_min..self.y_max)
            .map_err(render_error)?;

        {
            let mut mesh = chart.configure_mesh();
            mesh.light_line_style(BLACK.mix(0.05))
                .bold_line_style(BLACK.mix(0.15));
            if self.text {
                mesh.x_desc("Time").y_desc("People");
            } else {
                mesh.x_labels(0).y_labels(0);
            }
            mesh.draw().map_err(render_error)?;
        }

        let visible = &trajectory.states()[..=upto];
        for (label, color, value) in COMPARTMENTS {
            let style = color.stroke_width(3);
            let points = visible
                .iter()
                .enumerate()
                .map(|(step, state)| (trajectory.time_at(step), value(state)));
            chart
                .draw_series(LineSeries::new(points, style))
                .map_err(render_error)?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));

            if markers {
                let marker = (trajectory.time_at(upto), value(&visible[upto]));
                chart
                    .draw_series(std::iter::once(Circle::new(marker, 6, color.filled())))
                    .map_err(render_error)?;
            }
        }

        if self.text {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(render_error)?;
        }
        Ok(())
    }
}
