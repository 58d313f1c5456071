//! Command dispatch and handlers.

pub mod convert;
pub mod extract;
pub mod generate;

use std::env;
use std::path::{Path, PathBuf};

use crate::cli::Command;
use crate::config::Config;
use crate::context::ServiceContext;

/// Transcript name stamped on recorded sessions.
const SESSION_NAME: &str = "weave-session";

/// Dispatch a parsed command to its handler.
///
/// When `WEAVE_TRANSCRIPT` names a recorded transcript, model calls replay
/// from it instead of reaching a live backend. When `WEAVE_RECORD` names an
/// output path, live calls are recorded there for later replay.
///
/// # Errors
///
/// Returns an error string when context construction or the selected command
/// handler fails.
pub async fn dispatch(command: Command) -> Result<(), String> {
    // Extraction is a pure text transformation; it needs no model backend.
    if let Command::Extract { input, out } = &command {
        return extract::run(input, out);
    }

    let config = Config::from_env();
    let record_path = env::var("WEAVE_RECORD").ok().map(PathBuf::from);
    let ctx = build_context(config, record_path.is_some())?;

    let result = match command {
        Command::Generate { spec, spec_file, mode, arch, out, job } => {
            generate::run(&ctx, spec, spec_file, mode, arch, &out, job).await
        }
        Command::Convert { direction, source, spec, out, job } => {
            convert::run(&ctx, direction, &source, &spec, &out, job).await
        }
        Command::Extract { .. } => unreachable!("handled above"),
    };

    // The transcript is written even when the run failed; a failing session
    // is exactly the one worth replaying.
    if let Some(path) = record_path {
        if let Some(transcript) = ctx.take_transcript(SESSION_NAME) {
            transcript.save(&path)?;
            eprintln!("Transcript saved to {}", path.display());
        }
    }

    result
}

/// Picks the adapter stack from the environment.
fn build_context(config: Config, record: bool) -> Result<ServiceContext, String> {
    if let Ok(path) = env::var("WEAVE_TRANSCRIPT") {
        ServiceContext::replaying(Path::new(&path), config)
    } else if record {
        ServiceContext::recording(config)
    } else {
        ServiceContext::live(config)
    }
}
