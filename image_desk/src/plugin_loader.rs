use std::ffi::{CString, c_char, c_int};
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView as _};
use libloading::{Library, Symbol};

use crate::error::AppError;
use crate::transform::ImageTransform;

/// `int process_image(uint32_t width, uint32_t height,
///                    uint8_t* rgba_data, const char* params)`
type ProcessImageFn = unsafe extern "C" fn(u32, u32, *mut u8, *const c_char) -> c_int;

/// A loaded plugin library exposing `process_image`.
pub struct PluginLoader {
    _library: Library,
    process_fn: ProcessImageFn,
}

impl PluginLoader {
    /// Loads `lib{name}.so` / `{name}.dll` / `lib{name}.dylib` from
    /// `plugin_dir`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PluginLoad` if the library cannot be opened
    /// and `AppError::SymbolLoad` if it lacks `process_image`.
    pub fn load(plugin_name: &str, plugin_dir: &Path) -> Result<Self, AppError> {
        let lib_path = library_path(plugin_name, plugin_dir);

        log::info!("Loading plugin: {}", lib_path.display());

        // SAFETY: loading a library runs its initialisers; only plugins
        // built from trusted sources should be placed in the plugin dir.
        let library = unsafe { Library::new(&lib_path) }.map_err(|source| {
            AppError::PluginLoad {
                path: lib_path.clone(),
                source,
            }
        })?;

        // SAFETY: the symbol is declared with the plugin ABI above.
        let process_fn = unsafe {
            let sym: Symbol<'_, ProcessImageFn> = library
                .get(b"process_image")
                .map_err(AppError::SymbolLoad)?;
            *sym
        };

        Ok(Self {
            _library: library,
            process_fn,
        })
    }

    /// Runs the plugin over an RGBA buffer of `width * height * 4` bytes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Params` if `params` contains a NUL byte and
    /// `AppError::PluginExec` if the plugin reports failure.
    pub fn process_image(
        &self,
        width: u32,
        height: u32,
        rgba_data: &mut [u8],
        params: &str,
    ) -> Result<(), AppError> {
        let params_cstring = CString::new(params).map_err(|_| AppError::Params)?;

        log::debug!(
            "Calling plugin: {width}x{height}, {} bytes, params={params:?}",
            rgba_data.len(),
        );

        // SAFETY: rgba_data is a live, exclusively borrowed buffer sized
        // by the caller from the image dimensions, and params_cstring
        // outlives the call.
        let code = unsafe {
            (self.process_fn)(
                width,
                height,
                rgba_data.as_mut_ptr(),
                params_cstring.as_ptr(),
            )
        };

        if code == 0 {
            Ok(())
        } else {
            Err(AppError::PluginExec { code })
        }
    }
}

/// [`ImageTransform`] backed by a plugin library. Output files are
/// named `<stem>_<plugin name>.png`.
pub struct PluginTransform {
    loader: PluginLoader,
    params: String,
    suffix: String,
    label: String,
}

impl PluginTransform {
    pub fn new(loader: PluginLoader, name: &str, params: String) -> Self {
        Self {
            loader,
            params,
            suffix: format!("_{name}"),
            label: format!("{name} image"),
        }
    }
}

impl ImageTransform for PluginTransform {
    fn suffix(&self) -> &str {
        &self.suffix
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, AppError> {
        let (width, height) = image.dimensions();
        let mut rgba = image.into_rgba8();
        self.loader
            .process_image(width, height, rgba.as_mut(), &self.params)?;
        Ok(DynamicImage::ImageRgba8(rgba))
    }
}

/// Target operating system for library name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Os {
    Linux,
    Windows,
    MacOs,
}

impl Os {
    const fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }
}

fn library_filename(name: &str, os: Os) -> String {
    match os {
        Os::Windows => format!("{name}.dll"),
        Os::MacOs => format!("lib{name}.dylib"),
        Os::Linux => format!("lib{name}.so"),
    }
}

fn library_path(name: &str, dir: &Path) -> PathBuf {
    dir.join(library_filename(name, Os::current()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Os::Linux, "sepia_plugin", "libsepia_plugin.so")]
    #[case(Os::Windows, "sepia_plugin", "sepia_plugin.dll")]
    #[case(Os::MacOs, "sepia_plugin", "libsepia_plugin.dylib")]
    fn library_filename_for_os(
        #[case] os: Os,
        #[case] name: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(library_filename(name, os), expected);
    }

    #[test]
    fn library_path_joins_dir_and_filename() {
        let path = library_path("sepia_plugin", Path::new("target/debug"));
        let expected = PathBuf::from("target/debug")
            .join(library_filename("sepia_plugin", Os::current()));
        assert_eq!(path, expected);
    }

    #[test]
    fn load_nonexistent_plugin_returns_error() {
        let result =
            PluginLoader::load("nonexistent_plugin_xyz", Path::new("target/debug"));
        assert!(matches!(result, Err(AppError::PluginLoad { .. })));
    }
}
