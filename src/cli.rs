//! Command-line arguments of the `streamzip` binary.

use clap::Parser;

use crate::options::{ExtractOptions, OverwriteMode};

#[derive(Parser, Debug)]
#[command(name = "streamzip")]
#[command(version)]
#[command(about = "Extract or test ZIP archives read from a file or from stdin", long_about = None)]
#[command(after_help = "Examples:\n  \
  streamzip data1.zip -x joe        extract all files except joe from data1.zip\n  \
  streamzip -p foo.zip | more       send contents of foo.zip via pipe into more\n  \
  cat foo.zip | streamzip -t -      test an archive arriving on stdin")]
pub struct Cli {
    /// ZIP file path, or `-` to read the archive from stdin
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely/show version info
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Test archive integrity without writing anything
    #[arg(short = 't')]
    pub test: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n', conflicts_with = "overwrite")]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn reads_stdin(&self) -> bool {
        self.file == "-"
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Whether any positional or exclusion filter narrows the selection.
    pub fn has_filters(&self) -> bool {
        !self.files.is_empty() || !self.exclude.is_empty()
    }

    /// Existing files are kept unless `-o` is given.
    pub fn extract_options(&self) -> ExtractOptions {
        let overwrite = if self.overwrite {
            OverwriteMode::Overwrite
        } else {
            OverwriteMode::Skip
        };
        ExtractOptions::default()
            .overwrite(overwrite)
            .junk_paths(self.junk_paths)
    }

    /// Default log filter when `RUST_LOG` is unset. `-q` wins over `-v`.
    pub fn log_level(&self) -> &'static str {
        if self.is_very_quiet() {
            "off"
        } else if self.is_quiet() {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
