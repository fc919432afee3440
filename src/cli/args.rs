//! Command-line arguments, grounded on the `clap::Parser` derive style
//! used for the converter CLI in `kassoulet-bz2zstd`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "seqzip", author, version, about = "Genomic text compressor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compress a source file into a .sz archive.
    Compress {
        input: PathBuf,

        /// Output file path (defaults to `<input>.sz`).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing output file.
        #[arg(short, long)]
        force: bool,

        /// Remove the source file after successful compression.
        #[arg(long)]
        replace_source: bool,

        /// Write compressed bytes to stdout instead of a file.
        #[arg(long)]
        stdout: bool,

        /// Maximum worker threads (0 = auto-detect from available cores).
        #[arg(short = 'T', long, default_value_t = 0)]
        threads: usize,

        /// VBlock size in megabytes.
        #[arg(short = 'B', long)]
        vb_size_mb: Option<usize>,

        /// Compress then reconstruct in memory and compare digests.
        #[arg(long)]
        test: bool,

        /// Disable the running content digest.
        #[arg(long)]
        no_digest: bool,

        /// Second input for paired-end (R1/R2) compression.
        #[arg(long)]
        pair: Option<PathBuf>,

        /// Encryption password (enables the block-cipher layer).
        #[arg(long)]
        password: Option<String>,
    },

    /// Decompress a .sz archive back to its source format.
    Decompress {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        force: bool,

        #[arg(long)]
        stdout: bool,

        #[arg(long)]
        password: Option<String>,
    },

    /// List the sections and contexts stored in a .sz archive.
    List { input: PathBuf },

    /// Decompress a .sz archive to stdout without writing a file.
    Cat { input: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compress_with_explicit_output() {
        let cli = Cli::parse_from(["seqzip", "compress", "in.fa", "-o", "out.sz"]);
        match cli.command {
            Command::Compress { input, output, .. } => {
                assert_eq!(input, PathBuf::from("in.fa"));
                assert_eq!(output, Some(PathBuf::from("out.sz")));
            }
            _ => panic!("expected Compress"),
        }
    }

    #[test]
    fn parses_decompress_stdout_flag() {
        let cli = Cli::parse_from(["seqzip", "decompress", "in.sz", "--stdout"]);
        match cli.command {
            Command::Decompress { stdout, .. } => assert!(stdout),
            _ => panic!("expected Decompress"),
        }
    }
}
