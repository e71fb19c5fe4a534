use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{AppError, OperationResult};
use crate::mover::{FileMover, RenameMover};
use crate::preview::{Bounds, Preview, render_preview};
use crate::report::{Action, NotificationIntent, report};
use crate::transform::{Grayscale, ImageTransform, transform_file, write_png};
use crate::validate::require_existing;

/// What a finished action hands back to the shell.
#[derive(Debug)]
pub struct ActionOutcome {
    pub notification: NotificationIntent,
    pub result: OperationResult,
    /// Refreshed preview of the new image, when there is one to show.
    pub preview: Option<Preview>,
}

/// Per-shell context: the chosen transform and mover, the preview box,
/// and a guard allowing one action at a time.
pub struct Session {
    transform: Box<dyn ImageTransform>,
    mover: Box<dyn FileMover>,
    bounds: Bounds,
    busy: AtomicBool,
}

/// Holds the busy flag; released on drop.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Box::new(Grayscale), Box::new(RenameMover), Bounds::default())
    }
}

impl Session {
    pub fn new(
        transform: Box<dyn ImageTransform>,
        mover: Box<dyn FileMover>,
        bounds: Bounds,
    ) -> Self {
        Self {
            transform,
            mover,
            bounds,
            busy: AtomicBool::new(false),
        }
    }

    fn try_begin(&self) -> Result<BusyGuard<'_>, AppError> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| AppError::Busy)
    }

    /// Validates `input`, runs the transform, and on success refreshes
    /// the preview from the written file.
    pub fn convert(&self, input: &str) -> ActionOutcome {
        let action = Action::Convert {
            label: self.transform.label(),
        };
        let _guard = match self.try_begin() {
            Ok(guard) => guard,
            Err(err) => return Self::finish(action, Err(err), None),
        };

        let result = require_existing(input)
            .and_then(|source| transform_file(self.transform.as_ref(), &source));

        let preview = result.as_ref().ok().and_then(|output| {
            render_preview(output, self.bounds)
                .inspect_err(|err| log::warn!("Preview refresh failed: {err}"))
                .ok()
        });

        Self::finish(action, result, preview)
    }

    /// Validates `input` and moves it into `destination_dir`.
    pub fn move_to(&self, input: &str, destination_dir: &str) -> ActionOutcome {
        let _guard = match self.try_begin() {
            Ok(guard) => guard,
            Err(err) => return Self::finish(Action::Move, Err(err), None),
        };

        let result = require_existing(input).and_then(|source| {
            self.mover.move_file(&source, Path::new(destination_dir))
        });

        Self::finish(Action::Move, result, None)
    }

    /// Renders a preview of an existing image and saves it as PNG at
    /// `output`. The source is not changed.
    pub fn save_preview(&self, input: &str, output: &Path) -> ActionOutcome {
        let _guard = match self.try_begin() {
            Ok(guard) => guard,
            Err(err) => return Self::finish(Action::Preview, Err(err), None),
        };

        let rendered = require_existing(input)
            .and_then(|source| render_preview(&source, self.bounds));

        match rendered {
            Ok(preview) => {
                log::info!("Saving preview: {}", output.display());
                let result = write_png(&preview.image, output)
                    .map(|()| output.to_path_buf());
                Self::finish(Action::Preview, result, Some(preview))
            }
            Err(err) => Self::finish(Action::Preview, Err(err), None),
        }
    }

    fn finish(
        action: Action<'_>,
        result: OperationResult,
        preview: Option<Preview>,
    ) -> ActionOutcome {
        match &result {
            Ok(path) => log::info!("{action:?} finished: {}", path.display()),
            Err(err) if err.is_precondition() => {
                log::warn!("{action:?} not started: {err}");
            }
            Err(err) => log::error!("{action:?} failed: {err}"),
        }

        ActionOutcome {
            notification: report(action, &result),
            result,
            preview,
        }
    }
}
