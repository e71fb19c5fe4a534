use std::path::PathBuf;

/// Errors produced by image actions.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("'{path}' is not an existing file")]
    InvalidPath { path: PathBuf },

    #[error("failed to decode image '{path}': {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to encode image '{path}': {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("I/O error for '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("destination '{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("target '{path}' already exists")]
    TargetExists { path: PathBuf },

    #[error("failed to move '{from}' to '{to}': {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("preview bounds must be non-zero, got {width}x{height}")]
    InvalidBounds { width: u32, height: u32 },

    #[error("failed to load plugin '{path}': {source}")]
    PluginLoad {
        path: PathBuf,
        source: libloading::Error,
    },

    #[error(
        "failed to find symbol 'process_image' \
         in plugin: {0}"
    )]
    SymbolLoad(libloading::Error),

    #[error("plugin returned error code {code}")]
    PluginExec { code: std::ffi::c_int },

    #[error("plugin parameters contain an interior NUL byte")]
    Params,

    #[error("another operation is still in progress")]
    Busy,
}

impl AppError {
    /// Whether the error was raised before any operation touched the
    /// filesystem, so the user should be warned rather than alerted.
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidPath { .. } | Self::Busy)
    }
}

/// Outcome of a convert or move: the resulting path, or why it failed.
pub type OperationResult = Result<PathBuf, AppError>;
