use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use image_desk::error::AppError;
use image_desk::mover::{CopyMover, FileMover, RenameMover};
use image_desk::plugin_loader::{PluginLoader, PluginTransform};
use image_desk::preview::{Bounds, Preview};
use image_desk::report::{Level, NotificationIntent};
use image_desk::session::{ActionOutcome, Session};
use image_desk::transform::{Grayscale, ImageTransform, write_png};

/// Convert images to grayscale, move them between folders,
/// and render previews.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write `<stem>_grayscale.png` next to the image
    Convert {
        /// Path to the source image
        input: String,

        /// Save a preview of the result here (PNG)
        #[arg(long)]
        preview: Option<PathBuf>,

        #[command(flatten)]
        bounds: BoundsArgs,

        /// Use a plugin instead of grayscale (name without extension)
        #[arg(long, requires = "params")]
        plugin: Option<String>,

        /// Path to a text file with plugin parameters
        #[arg(long)]
        params: Option<PathBuf>,

        /// Directory containing plugin libraries
        #[arg(long, default_value = "target/debug")]
        plugin_path: PathBuf,
    },

    /// Move the image into a destination folder
    Move {
        /// Path to the image to move
        input: String,

        /// Existing destination directory
        destination: String,

        /// Copy instead of moving
        #[arg(long)]
        keep_source: bool,
    },

    /// Render a scaled preview of an image (PNG)
    Preview {
        /// Path to the source image
        input: String,

        /// Where to save the preview
        output: PathBuf,

        #[command(flatten)]
        bounds: BoundsArgs,
    },
}

#[derive(Args, Debug)]
struct BoundsArgs {
    /// Preview box width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Preview box height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,
}

impl BoundsArgs {
    fn to_bounds(&self) -> Result<Bounds, AppError> {
        Bounds::new(self.width, self.height)
    }
}

fn load_plugin(
    name: &str,
    params: &Path,
    plugin_dir: &Path,
) -> Result<PluginTransform, AppError> {
    let params_text =
        fs::read_to_string(params).map_err(|source| AppError::Io {
            path: params.to_path_buf(),
            source,
        })?;
    let loader = PluginLoader::load(name, plugin_dir)?;
    Ok(PluginTransform::new(loader, name, params_text))
}

fn save_preview(preview: &Preview, output: &Path) -> Result<(), AppError> {
    log::info!("Saving preview: {}", output.display());
    write_png(&preview.image, output)
}

/// Prints the notification where the user will see it and maps its
/// level to an exit code.
fn show(notification: &NotificationIntent) -> ExitCode {
    match notification.level {
        Level::Info => {
            println!("{notification}");
            ExitCode::SUCCESS
        }
        Level::Warning => {
            eprintln!("{notification}");
            ExitCode::from(2)
        }
        Level::Error => {
            eprintln!("{notification}");
            ExitCode::FAILURE
        }
    }
}

fn fail(err: &AppError) -> ExitCode {
    eprintln!("Error: {err}");
    ExitCode::FAILURE
}

fn run_convert(
    session: &Session,
    input: &str,
    preview_out: Option<&Path>,
) -> ExitCode {
    let ActionOutcome {
        notification,
        preview,
        ..
    } = session.convert(input);

    if let (Some(out), Some(preview)) = (preview_out, preview.as_ref()) {
        if let Err(err) = save_preview(preview, out) {
            log::warn!("Could not save preview: {err}");
        }
    }

    show(&notification)
}

fn run(command: Command) -> ExitCode {
    match command {
        Command::Convert {
            input,
            preview,
            bounds,
            plugin,
            params,
            plugin_path,
        } => {
            let bounds = match bounds.to_bounds() {
                Ok(bounds) => bounds,
                Err(err) => return fail(&err),
            };
            let transform: Box<dyn ImageTransform> = match (plugin, params) {
                (Some(name), Some(params)) => {
                    match load_plugin(&name, &params, &plugin_path) {
                        Ok(transform) => Box::new(transform),
                        Err(err) => return fail(&err),
                    }
                }
                _ => Box::new(Grayscale),
            };
            let session = Session::new(transform, Box::new(RenameMover), bounds);
            run_convert(&session, &input, preview.as_deref())
        }
        Command::Move {
            input,
            destination,
            keep_source,
        } => {
            let mover: Box<dyn FileMover> = if keep_source {
                Box::new(CopyMover)
            } else {
                Box::new(RenameMover)
            };
            let session = Session::new(Box::new(Grayscale), mover, Bounds::default());
            show(&session.move_to(&input, &destination).notification)
        }
        Command::Preview {
            input,
            output,
            bounds,
        } => {
            let bounds = match bounds.to_bounds() {
                Ok(bounds) => bounds,
                Err(err) => return fail(&err),
            };
            let session =
                Session::new(Box::new(Grayscale), Box::new(RenameMover), bounds);
            show(&session.save_preview(&input, &output).notification)
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    run(cli.command)
}
