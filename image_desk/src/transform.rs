use std::ffi::OsStr;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView as _, ImageFormat, ImageReader};
use tempfile::NamedTempFile;

use crate::error::{AppError, OperationResult};

/// Extension of every file written by a transform.
pub const OUTPUT_EXTENSION: &str = "png";

/// Suffix appended to the source stem by [`Grayscale`].
pub const GRAYSCALE_SUFFIX: &str = "_grayscale";

/// A whole-image operation whose result is saved next to its source.
pub trait ImageTransform {
    /// Appended to the source file stem to name the output.
    fn suffix(&self) -> &str;

    /// Names the result in notifications, e.g. "Grayscale image".
    fn label(&self) -> &str {
        "Image"
    }

    /// Produces the transformed image.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform cannot be applied.
    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, AppError>;
}

/// Reduces an image to a single luminance channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grayscale;

impl ImageTransform for Grayscale {
    fn suffix(&self) -> &str {
        GRAYSCALE_SUFFIX
    }

    fn label(&self) -> &str {
        "Grayscale image"
    }

    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, AppError> {
        Ok(DynamicImage::ImageLuma8(image.to_luma8()))
    }
}

/// Decodes the image at `path`, sniffing the format from its content.
///
/// # Errors
///
/// Returns `AppError::Io` if the file cannot be read and
/// `AppError::Decode` if its content is not a supported image.
pub fn decode(path: &Path) -> Result<DynamicImage, AppError> {
    let reader = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    reader.decode().map_err(|source| AppError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Builds `<dir>/<stem><suffix>.png` for `source`.
pub fn output_path(source: &Path, suffix: &str) -> PathBuf {
    let mut name = source
        .file_stem()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    name.push(suffix);
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    source.with_file_name(name)
}

/// Directory that holds `path`, with `.` standing in for a bare
/// file name.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Encodes `image` as PNG into a temporary file beside `target`, then
/// renames it over `target`. On failure the temporary file is removed
/// and `target` is left as it was.
///
/// # Errors
///
/// Returns `AppError::Encode` if encoding fails and `AppError::Io` if
/// the temporary file cannot be created, flushed, or renamed.
pub fn write_png(image: &DynamicImage, target: &Path) -> Result<(), AppError> {
    let dir = parent_dir(target);
    let mut tmp = NamedTempFile::new_in(dir).map_err(|source| AppError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    log::debug!("Encoding into {}", tmp.path().display());

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        image
            .write_to(&mut writer, ImageFormat::Png)
            .map_err(|source| AppError::Encode {
                path: target.to_path_buf(),
                source,
            })?;
        writer.flush().map_err(|source| AppError::Io {
            path: target.to_path_buf(),
            source,
        })?;
    }

    tmp.persist(target).map_err(|err| AppError::Io {
        path: target.to_path_buf(),
        source: err.error,
    })?;
    Ok(())
}

/// Decodes `source`, applies `transform`, and writes the result as a
/// PNG sibling named after the transform's suffix, overwriting any
/// previous output. The source file is never modified.
///
/// # Errors
///
/// Propagates decode, transform, and write failures.
pub fn transform_file(
    transform: &dyn ImageTransform,
    source: &Path,
) -> OperationResult {
    log::info!("Loading image: {}", source.display());

    let image = decode(source)?;
    let (width, height) = image.dimensions();
    log::info!("Image size: {width}x{height}");

    let result = transform.apply(image)?;
    let output = output_path(source, transform.suffix());

    log::info!("Saving result: {}", output.display());
    write_png(&result, &output)?;

    Ok(output)
}

/// Converts the image at `source` to grayscale.
///
/// # Errors
///
/// See [`transform_file`].
pub fn convert(source: &Path) -> OperationResult {
    transform_file(&Grayscale, source)
}
