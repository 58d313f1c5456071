//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::prompt::{Architecture, ConversionDirection, GenerationMode};

/// Top-level CLI parser for `weave`.
#[derive(Debug, Parser)]
#[command(name = "weave", version, about = "Reassemble model streams into project archives")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a project archive from a specification.
    Generate {
        /// Specification text.
        #[arg(long, conflicts_with = "spec_file")]
        spec: Option<String>,
        /// Read the specification from a file instead.
        #[arg(long)]
        spec_file: Option<PathBuf>,
        /// What kind of project to produce.
        #[arg(long, value_enum, default_value = "backend")]
        mode: GenerationMode,
        /// Backend architecture.
        #[arg(long, value_enum, default_value = "monolith")]
        arch: Architecture,
        /// Where to write the archive.
        #[arg(long, default_value = "weave-output.tar.gz")]
        out: PathBuf,
        /// Job key for duplicate-submission protection (defaults to a fresh
        /// UUID, so unrelated invocations never block each other).
        #[arg(long)]
        job: Option<String>,
    },
    /// Convert an existing frontend or backend into its counterpart.
    Convert {
        /// Conversion direction.
        #[arg(long, value_enum)]
        direction: ConversionDirection,
        /// File holding the source to convert, dumped as text.
        #[arg(long)]
        source: PathBuf,
        /// Extra instructions for the conversion.
        #[arg(long, default_value = "")]
        spec: String,
        /// Where to write the archive.
        #[arg(long, default_value = "weave-output.tar.gz")]
        out: PathBuf,
        /// Job key for duplicate-submission protection.
        #[arg(long)]
        job: Option<String>,
    },
    /// Extract fenced file blocks from saved model output into an archive.
    Extract {
        /// Text file holding the saved model response.
        #[arg(long)]
        input: PathBuf,
        /// Where to write the archive.
        #[arg(long, default_value = "weave-output.tar.gz")]
        out: PathBuf,
    },
}
