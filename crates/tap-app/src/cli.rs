use std::path::PathBuf;

use clap::Parser;
use tap_core::config::{ColorMode, DitherMode, PlayMode, PlayerConfig, ScaleMode, SymbolSet};

/// tapvid — plays a video (or a folder of videos) as live ANSI art in
/// the terminal, streamed through an external decoder and converter.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Video file to play, or a file inside a folder of videos to use
    /// as a playlist.
    pub source: PathBuf,

    /// Target frames per second — both the decode sampling rate and the
    /// playback base rate.
    #[arg(long, default_value_t = 15)]
    pub fps: u32,

    /// How source frames are fit into the character grid.
    #[arg(long, value_enum, default_value_t = ScaleMode::Fit)]
    pub scale_mode: ScaleMode,

    /// Converter color fidelity.
    #[arg(long, value_enum, default_value_t = ColorMode::Full)]
    pub color_mode: ColorMode,

    /// Converter dithering strategy.
    #[arg(long, value_enum, default_value_t = DitherMode::None)]
    pub dither_mode: DitherMode,

    /// Converter symbol set.
    #[arg(long, value_enum, default_value_t = SymbolSet::Block)]
    pub symbols: SymbolSet,

    /// Display width in terminal columns. Defaults to the terminal's
    /// current width.
    #[arg(long)]
    pub width: Option<u16>,

    /// Display height in terminal rows, excluding the status line.
    /// Defaults to the terminal's current height minus one.
    #[arg(long)]
    pub height: Option<u16>,

    /// Number of concurrent converter workers. Defaults to the logical
    /// CPU count.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Bound on in-memory rendered frames held ahead of playback.
    #[arg(long, default_value_t = 300)]
    pub buffer_frames: usize,

    /// Restart the playlist from the top after the last video finishes.
    #[arg(long, default_value_t = false)]
    pub r#loop: bool,

    /// Suppress progress output during initial load.
    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    /// `stream` starts as soon as a frame is ready; `preload` waits for
    /// the whole video to render first.
    #[arg(long, value_enum, default_value_t = PlayMode::Stream)]
    pub play_mode: PlayMode,

    /// Decoder executable.
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg_bin: PathBuf,

    /// Metadata probe executable.
    #[arg(long, default_value = "ffprobe")]
    pub ffprobe_bin: PathBuf,

    /// Image-to-text converter executable.
    #[arg(long, default_value = "chafa")]
    pub chafa_bin: PathBuf,

    /// Log level: error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Resolve the immutable per-cycle configuration, falling back to
    /// the terminal's current size for any dimension left unset. The
    /// last terminal row is reserved for the status line.
    ///
    /// # Errors
    /// Returns an error if the terminal size cannot be queried and no
    /// explicit `--width`/`--height` was given.
    pub fn resolve_config(&self) -> anyhow::Result<PlayerConfig> {
        let (width, height) = match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (w, h) => {
                let (term_w, term_h) = crossterm::terminal::size()?;
                (
                    w.unwrap_or(term_w),
                    h.unwrap_or(term_h.saturating_sub(1).max(1)),
                )
            }
        };

        Ok(PlayerConfig {
            target_fps: self.fps.max(1),
            scale_mode: self.scale_mode,
            color_mode: self.color_mode,
            dither_mode: self.dither_mode,
            symbol_set: self.symbols,
            width,
            height,
            worker_count: self
                .workers
                .unwrap_or_else(|| std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)),
            buffer_frames: self.buffer_frames.max(1),
            loop_playlist: self.r#loop,
            quiet: self.quiet,
            play_mode: self.play_mode,
            ffmpeg_bin: self.ffmpeg_bin.clone(),
            ffprobe_bin: self.ffprobe_bin.clone(),
            chafa_bin: self.chafa_bin.clone(),
        })
    }
}
