use log::info;
use plotters::prelude::*;
use std::path::Path;

use super::{output_extension, render_error, ChartLayout, ChartOptions, Renderer};
use crate::error::SirError;
use crate::output::write_atomically;
use crate::parameters::Parameters;
use crate::trajectory::Trajectory;

/// Line chart of S, I and R over the whole run. Writes `.png` or `.svg`.
#[derive(Clone, Debug, Default)]
pub struct StaticChart {
    options: ChartOptions,
}

impl StaticChart {
    #[must_use]
    pub fn new(options: ChartOptions) -> Self {
        StaticChart { options }
    }
}

impl Renderer for StaticChart {
    fn render(
        &self,
        trajectory: &Trajectory,
        parameters: Option<&Parameters>,
        path: &Path,
    ) -> Result<(), SirError> {
        self.options.validate()?;
        let extension = output_extension(path, &["png", "svg"])?;
        let layout = ChartLayout::new(trajectory, parameters, &self.options);
        let size = (self.options.width, self.options.height);
        let last = trajectory.len() - 1;

        write_atomically(path, |temp_path| {
            if extension == "svg" {
                let root = SVGBackend::new(temp_path, size).into_drawing_area();
                layout.draw(&root, trajectory, last, false)?;
                root.present().map_err(render_error)
            } else {
                let root = BitMapBackend::new(temp_path, size).into_drawing_area();
                layout.draw(&root, trajectory, last, false)?;
                root.present().map_err(render_error)
            }
        })?;
        info!("wrote chart to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::integrate;
    use crate::parameters::ParametersValuesBuilder;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn run() -> (Parameters, Trajectory) {
        let parameters = Parameters::try_from(
            ParametersValuesBuilder::default()
                .dt(1.0)
                .steps(60)
                .build()
                .unwrap(),
        )
        .unwrap();
        let trajectory = integrate(&parameters).unwrap();
        (parameters, trajectory)
    }

    #[test]
    fn writes_png() {
        let (parameters, trajectory) = run();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("sir.png");
        StaticChart::default()
            .render(&trajectory, Some(&parameters), &path)
            .unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn writes_svg() {
        let (_, trajectory) = run();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("sir.svg");
        let options = ChartOptions {
            width: 400,
            height: 300,
            ..ChartOptions::default()
        };
        StaticChart::new(options)
            .render(&trajectory, None, &path)
            .unwrap();
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("width=\"400\""));
    }

    #[test]
    fn unsupported_extension_writes_nothing() {
        let (parameters, trajectory) = run();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("sir.bmp");
        let result = StaticChart::default().render(&trajectory, Some(&parameters), &path);
        assert!(matches!(result, Err(SirError::RenderError(_))));
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unwritable_destination_reported() {
        let (parameters, trajectory) = run();
        let temp_dir = tempdir().unwrap();
        let blocker = temp_dir.path().join("blocker");
        File::create(&blocker).unwrap();
        let result =
            StaticChart::default().render(&trajectory, Some(&parameters), &blocker.join("sir.png"));
        assert!(matches!(result, Err(SirError::IoError(_))));
    }
}
