use std::path::PathBuf;

use clap::ValueEnum;

/// How the decoder fits the source frame into the target character grid's
/// pixel box (`W·8 × H·16`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum ScaleMode {
    /// Preserve aspect ratio, fit within the box. Default.
    #[default]
    Fit,
    /// Preserve aspect ratio, cover the box, then crop center.
    Fill,
    /// Ignore aspect ratio, scale to the exact box.
    Stretch,
}

/// Symbol set the converter draws with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum SymbolSet {
    /// Unicode block-drawing characters.
    #[default]
    Block,
    /// Plain ASCII ramp.
    Ascii,
    /// Whitespace only (background color carries the image).
    Space,
}

impl SymbolSet {
    /// The symbol-class token the converter CLI expects for `--symbols`.
    #[must_use]
    pub fn as_cli_token(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Ascii => "ascii",
            Self::Space => "space",
        }
    }
}

/// Color fidelity the converter targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum ColorMode {
    /// 2-color (monochrome) output.
    Mono,
    /// 16-color ANSI palette.
    Ansi16,
    /// 256-color ANSI palette.
    Ansi256,
    /// 24-bit truecolor.
    #[default]
    Full,
}

impl ColorMode {
    /// The numeric token the converter CLI expects for `--colors`.
    #[must_use]
    pub fn as_cli_token(self) -> &'static str {
        match self {
            Self::Mono => "2",
            Self::Ansi16 => "16",
            Self::Ansi256 => "256",
            Self::Full => "full",
        }
    }
}

/// Dithering strategy applied during color quantization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum DitherMode {
    /// No dithering.
    #[default]
    None,
    /// Ordered (Bayer) dithering.
    Ordered,
    /// Error-diffusion dithering.
    Diffusion,
}

impl DitherMode {
    /// The token the converter CLI expects for `--dither`.
    #[must_use]
    pub fn as_cli_token(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Ordered => "ordered",
            Self::Diffusion => "diffusion",
        }
    }
}

/// Whether the pipeline starts the playback engine as soon as a frame is
/// ready ("stream") or waits for every frame to render first ("preload").
/// Preload is a trivial specialization of stream that blocks on
/// `FrameStore::wait(total_frames)` up front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum PlayMode {
    /// Start as soon as the first frame is ready (or after ~500ms).
    #[default]
    Stream,
    /// Wait for every frame to be rendered before starting playback.
    Preload,
}

/// Resolved configuration for one playback cycle. Built once from CLI
/// arguments plus terminal-derived defaults; immutable for the lifetime of
/// the cycle (re-derived per-cycle for the playlist loop).
#[derive(Clone, Debug)]
pub struct PlayerConfig {
    /// Target frames per second — both the decoder's sampling rate and
    /// the playback base rate.
    pub target_fps: u32,
    /// How the decoder fits source frames into the character grid.
    pub scale_mode: ScaleMode,
    /// Converter color fidelity.
    pub color_mode: ColorMode,
    /// Converter dithering strategy.
    pub dither_mode: DitherMode,
    /// Converter symbol set.
    pub symbol_set: SymbolSet,
    /// Display width in terminal columns (status line excluded).
    pub width: u16,
    /// Display height in terminal rows (status line excluded).
    pub height: u16,
    /// Number of concurrent converter workers. Defaults to logical CPU
    /// count if unset at the CLI layer.
    pub worker_count: usize,
    /// Bound on in-memory rendered frames ahead of the playback floor.
    pub buffer_frames: usize,
    /// Restart the playlist from the top after the last video finishes.
    pub loop_playlist: bool,
    /// Suppress progress bars during initial load. Never suppresses the
    /// in-playback status line or interactive control.
    pub quiet: bool,
    /// `Stream` (default) or `Preload`.
    pub play_mode: PlayMode,
    /// `ffmpeg` executable, overridable for tests.
    pub ffmpeg_bin: PathBuf,
    /// `ffprobe` executable, overridable for tests.
    pub ffprobe_bin: PathBuf,
    /// `chafa` (or compatible) image→terminal-art executable.
    pub chafa_bin: PathBuf,
}

impl PlayerConfig {
    /// Pixel box passed to the decoder's scale filter: `W·8 × H·16`,
    /// approximating a terminal character cell.
    #[must_use]
    pub fn pixel_box(&self) -> (u32, u32) {
        (u32::from(self.width) * 8, u32::from(self.height) * 16)
    }
}
