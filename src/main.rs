//! CLI entry point: dispatches `compress`/`decompress`/`list`/`cat` onto the
//! library's dispatcher/decode/writer modules, the same `main()`-does-little
//! shape as the teacher's own binary.

use clap::Parser;
use seqzip::cli::init;
use seqzip::progress;
use seqzip::cli::{Cli, Command};
use seqzip::dict::DictTable;
use seqzip::dispatcher;
use seqzip::error::SeqzipError;
use seqzip::format::fasta::FastaParser;
use seqzip::format::FormatParser;
use seqzip::section::{SectionHeader, SectionType};
use seqzip::writer::{self, CountingWriter, DictFragment};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

const DATA_TYPE_FASTA: u8 = 1;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init::set_quiet(cli.quiet);

    let result = match cli.command {
        Command::Compress {
            input,
            output,
            force,
            replace_source,
            stdout,
            threads,
            vb_size_mb,
            test,
            no_digest,
            pair,
            password,
        } => compress(CompressArgs {
            input,
            output,
            force,
            replace_source,
            stdout,
            threads,
            vb_size_mb,
            test,
            no_digest,
            pair,
            password,
        }),
        Command::Decompress {
            input,
            output,
            force,
            stdout,
            password,
        } => decompress(&input, output.as_deref(), force, stdout, password.as_deref()),
        Command::List { input } => list(&input),
        Command::Cat { input } => decompress(&input, None, true, true, None),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("seqzip: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

struct CompressArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    force: bool,
    replace_source: bool,
    stdout: bool,
    threads: usize,
    vb_size_mb: Option<usize>,
    test: bool,
    no_digest: bool,
    pair: Option<PathBuf>,
    password: Option<String>,
}

fn compress(args: CompressArgs) -> Result<(), SeqzipError> {
    if args.password.is_some() {
        progress!("seqzip: note: --password accepted but the cipher layer is a no-op in this build");
    }
    if args.pair.is_some() {
        progress!("seqzip: note: --pair accepted but paired dict sharing is not yet cross-linked");
    }

    let cfg = init::resolve(args.threads, args.vb_size_mb);
    let source = File::open(&args.input).map_err(SeqzipError::from)?;

    let out_path = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input));
    if !args.stdout && !args.force && out_path.exists() {
        return Err(SeqzipError::User(format!(
            "{} already exists; pass --force to overwrite",
            out_path.display()
        )));
    }

    let parser: Arc<dyn FormatParser + Send + Sync> = Arc::new(FastaParser);
    let dict_table = Arc::new(DictTable::new());

    let mut buf = Vec::new();
    writer::write_file_header(&mut buf, DATA_TYPE_FASTA)?;
    let mut counting = CountingWriter::new(buf);

    let stats = dispatcher::run(
        source,
        Arc::clone(&parser),
        &mut counting,
        cfg.vb_size_bytes,
        cfg.nb_workers,
        Arc::clone(&dict_table),
    )?;

    let fragments: Vec<DictFragment> = dict_table
        .snapshot_all()
        .into_iter()
        .map(|(dict_id, dict_bytes, node_lens)| DictFragment {
            dict_id,
            dict_bytes,
            node_lens,
        })
        .collect();

    let base_offset = counting.count();
    let directory = writer::write_global_area(&mut counting, base_offset, &fragments)?;
    writer::write_footer(&mut counting, &directory)?;

    let out = counting.into_inner();

    if !args.no_digest {
        progress!(
            "seqzip: {} vblocks, digest {}",
            stats.vblocks,
            stats.final_digest
        );
    }

    if args.stdout {
        io::stdout().write_all(&out).map_err(SeqzipError::from)?;
    } else {
        std::fs::write(&out_path, &out).map_err(SeqzipError::from)?;
        progress!(
            "seqzip: {} -> {} ({} bytes)",
            args.input.display(),
            out_path.display(),
            out.len()
        );
    }

    if args.test {
        let (recon, digest) = seqzip::decode::decompress(&out, parser.as_ref())?;
        let mut want = Vec::new();
        File::open(&args.input)
            .and_then(|mut f| f.read_to_end(&mut want))
            .map_err(SeqzipError::from)?;
        if recon != want {
            return Err(SeqzipError::invariant("--test round trip mismatch"));
        }
        progress!("seqzip: --test passed, digest {digest}");
    }

    if args.replace_source && !args.stdout {
        std::fs::remove_file(&args.input).map_err(SeqzipError::from)?;
    }

    Ok(())
}

fn decompress(
    input: &Path,
    output: Option<&Path>,
    force: bool,
    stdout: bool,
    password: Option<&str>,
) -> Result<(), SeqzipError> {
    if password.is_some() {
        progress!("seqzip: note: --password accepted but the cipher layer is a no-op in this build");
    }

    let mut file_bytes = Vec::new();
    File::open(input)
        .and_then(|mut f| f.read_to_end(&mut file_bytes))
        .map_err(SeqzipError::from)?;

    let parser = FastaParser;
    let (recon, digest) = seqzip::decode::decompress(&file_bytes, &parser)?;
    progress!("seqzip: reconstructed {} bytes, digest {}", recon.len(), digest);

    if stdout {
        io::stdout().write_all(&recon).map_err(SeqzipError::from)?;
        return Ok(());
    }

    let out_path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_decompressed_path(input));
    if !force && out_path.exists() {
        return Err(SeqzipError::User(format!(
            "{} already exists; pass --force to overwrite",
            out_path.display()
        )));
    }
    std::fs::write(&out_path, &recon).map_err(SeqzipError::from)?;
    Ok(())
}

fn list(input: &Path) -> Result<(), SeqzipError> {
    let mut file_bytes = Vec::new();
    File::open(input)
        .and_then(|mut f| f.read_to_end(&mut file_bytes))
        .map_err(SeqzipError::from)?;

    let directory = writer::read_footer(&file_bytes)?;
    println!("{}: {} global-area sections", input.display(), directory.len());

    let mut pos = 0usize;
    while pos + seqzip::section::HEADER_LEN <= file_bytes.len() {
        let (header, hdr_len) = match SectionHeader::read(&file_bytes[pos..]) {
            Ok(v) => v,
            Err(_) => break,
        };
        println!(
            "  {:?} vb={} dict_id={} codec={:?} {}B -> {}B",
            header.section_type,
            header.vblock_i,
            header.dict_id,
            header.codec,
            header.compressed_size,
            header.uncompressed_size
        );
        pos += hdr_len + header.compressed_size as usize;
        if header.section_type == SectionType::Footer {
            break;
        }
    }
    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".sz");
    PathBuf::from(name)
}

fn default_decompressed_path(input: &Path) -> PathBuf {
    match input.extension().and_then(|e| e.to_str()) {
        Some("sz") => input.with_extension(""),
        _ => {
            let mut name = input.as_os_str().to_owned();
            name.push(".out");
            PathBuf::from(name)
        }
    }
}
