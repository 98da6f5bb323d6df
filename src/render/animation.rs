use log::info;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{output_extension, render_error, ChartLayout, ChartOptions, Renderer};
use crate::error::SirError;
use crate::output::write_atomically;
use crate::parameters::Parameters;
use crate::trajectory::Trajectory;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AnimationOptions {
    pub fps: u32,
    /// Render every nth step.
    pub frame_skip: usize,
    pub output_file: PathBuf,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        AnimationOptions {
            fps: 20,
            frame_skip: 3,
            output_file: PathBuf::from("sir.gif"),
        }
    }
}

/// Steps shown by an animation of a trajectory with `len` states: every `frame_skip`th step,
/// always ending on the final state.
#[must_use]
pub fn frame_indices(len: usize, frame_skip: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let mut frames: Vec<usize> = (0..len).step_by(frame_skip.max(1)).collect();
    if frames.last() != Some(&(len - 1)) {
        frames.push(len - 1);
    }
    frames
}

/// Looping GIF that reveals the curves step by step.
#[derive(Clone, Debug)]
pub struct Animation {
    options: AnimationOptions,
    chart: ChartOptions,
}

impl Animation {
    /// # Errors
    ///
    /// Returns `SirError::InvalidParameter` if `fps` or `frame_skip` is zero.
    pub fn new(options: AnimationOptions, chart: ChartOptions) -> Result<Self, SirError> {
        if options.fps == 0 {
            return Err(SirError::InvalidParameter(
                "animation fps must be positive".to_string(),
            ));
        }
        if options.frame_skip == 0 {
            return Err(SirError::InvalidParameter(
                "animation frame_skip must be positive".to_string(),
            ));
        }
        Ok(Animation { options, chart })
    }

    #[must_use]
    pub fn options(&self) -> &AnimationOptions {
        &self.options
    }

    /// Delay between frames in milliseconds.
    #[must_use]
    pub fn frame_delay_ms(&self) -> u32 {
        (1000 / self.options.fps).max(1)
    }
}

impl Renderer for Animation {
    fn render(
        &self,
        trajectory: &Trajectory,
        parameters: Option<&Parameters>,
        path: &Path,
    ) -> Result<(), SirError> {
        self.chart.validate()?;
        output_extension(path, &["gif"])?;
        let frames = frame_indices(trajectory.len(), self.options.frame_skip);
        info!("creating animation with {} frames", frames.len());
        let layout = ChartLayout::new(trajectory, parameters, &self.chart);
        let size = (self.chart.width, self.chart.height);

        write_atomically(path, |temp_path| {
            let root = BitMapBackend::gif(temp_path, size, self.frame_delay_ms())
                .map_err(render_error)?
                .into_drawing_area();
            for &frame in &frames {
                layout.draw(&root, trajectory, frame, true)?;
                root.present().map_err(render_error)?;
            }
            Ok(())
        })?;
        info!("wrote animation to {}", path.display());
        Ok(())
    }
}
