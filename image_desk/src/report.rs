use std::fmt;

use crate::error::OperationResult;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// The action could not start (bad input, busy).
    Warning,
    /// The action succeeded.
    Info,
    /// The action started and failed.
    Error,
}

/// User action whose outcome is being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    /// A transform ran; `label` names its result ("Grayscale image").
    Convert { label: &'a str },
    Move,
    Preview,
}

/// What the shell should show the user. Rendering is up to the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    pub level: Level,
    pub title: &'static str,
    pub message: String,
}

impl fmt::Display for NotificationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Maps an operation outcome to a notification.
pub fn report(action: Action<'_>, result: &OperationResult) -> NotificationIntent {
    match result {
        Ok(path) => {
            let message = match action {
                Action::Convert { label } => {
                    format!("{label} saved as {}", path.display())
                }
                Action::Move => format!("Image moved to {}", path.display()),
                Action::Preview => {
                    format!("Preview saved as {}", path.display())
                }
            };
            NotificationIntent {
                level: Level::Info,
                title: "Success",
                message,
            }
        }
        Err(err) if err.is_precondition() => NotificationIntent {
            level: Level::Warning,
            title: "Warning",
            message: if matches!(err, crate::AppError::Busy) {
                "Please wait for the current operation to finish.".to_owned()
            } else {
                "Please select a valid image file.".to_owned()
            },
        },
        Err(err) => {
            let message = match action {
                Action::Convert { .. } => format!("Failed to convert image: {err}"),
                Action::Move => format!("Could not move image: {err}"),
                Action::Preview => format!("Could not render preview: {err}"),
            };
            NotificationIntent {
                level: Level::Error,
                title: "Error",
                message,
            }
        }
    }
}
