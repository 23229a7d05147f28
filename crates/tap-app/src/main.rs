use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tap_core::Playlist;
use tap_playback::CycleOutcome;

pub mod cli;
pub mod cycle;
pub mod input;
pub mod scratch;
pub mod terminal;

use cli::Cli;
use input::{spawn_input_reader, ControlHandle};
use terminal::TerminalGuard;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // All fatal-startup paths run before `TerminalGuard::enter`,
            // so stderr here lands on a normal, cooked terminal.
            eprintln!("tapvid: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if !cli.source.exists() {
        anyhow::bail!("source not found: {}", cli.source.display());
    }
    let config = cli.resolve_config().context("failed to resolve display configuration")?;
    let mut playlist = Playlist::from_source(&cli.source);

    terminal::install_panic_hook();

    let control = ControlHandle::new();
    let _input_reader = spawn_input_reader(control.clone(), config.target_fps);

    {
        let quit_handle = control.clone();
        ctrlc::set_handler(move || quit_handle.request_quit())
            .context("failed to install Ctrl-C handler")?;
    }

    // Scoped so the guard drops — and the terminal is actually restored —
    // before the accumulated cycle failures below are printed. A cycle
    // error (the only one `cycle::run` returns once past startup is a
    // terminal write failure) is cycle-fatal, not process-fatal: record it
    // and fall through to the same playlist advance as a finished cycle,
    // rather than propagating it out of this block.
    {
        let _terminal_guard = TerminalGuard::enter().context("failed to enter raw terminal mode")?;
        let mut stdout = std::io::stdout();

        loop {
            if control.quit_requested() {
                break;
            }

            let source = playlist.current().to_path_buf();
            let result = match cycle::run(&source, &config, &control, &mut stdout) {
                Ok(result) => result,
                Err(e) => {
                    control.record_cycle_failure(format!("{}: {e:#}", source.display()));
                    if !playlist.advance(config.loop_playlist) {
                        break;
                    }
                    continue;
                }
            };

            match result.outcome {
                CycleOutcome::Quit => break,
                CycleOutcome::Finished | CycleOutcome::Next => {
                    if !playlist.advance(config.loop_playlist) {
                        break;
                    }
                }
                CycleOutcome::Prev => {
                    playlist.back();
                }
            }
        }
    }

    for failure in control.take_cycle_failures() {
        eprintln!("tapvid: {failure}");
    }

    Ok(())
}
