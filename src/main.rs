//! Command-line front end for streamzip.
//!
//! The archive is read either from a file or, with `-`, from stdin into
//! memory; everything after that goes through [`StreamExtractor`].

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use streamzip::{ArchiveFormat, ArchiveItem, Cli, StreamExtractor};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.reads_stdin() {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("failed to read archive from stdin")?;
        process_zip(Cursor::new(data), &cli)
    } else {
        let file = File::open(&cli.file).with_context(|| format!("cannot open {}", cli.file))?;
        process_zip(file, &cli)
    }
}

/// Dispatch to list, test or extract mode.
fn process_zip<R: Read + Seek>(mut reader: R, cli: &Cli) -> Result<()> {
    let extractor = StreamExtractor::new(ArchiveFormat::Zip)?.with_options(cli.extract_options());

    if cli.list || cli.verbose {
        let items = extractor.items(&mut reader)?;
        list_files(&items, cli.verbose);
        return Ok(());
    }

    if cli.test {
        let items = extractor.items(&mut reader)?;
        extractor.test(&mut reader)?;
        if !cli.is_quiet() {
            let total: u64 = items.iter().map(|item| item.size).sum();
            println!(
                "No errors detected in compressed data of {} ({} items, {}).",
                cli.file,
                items.len(),
                format_size(total)
            );
        }
        return Ok(());
    }

    let items = extractor.items(&mut reader)?;
    let selected: Vec<&ArchiveItem> = items.iter().filter(|item| is_selected(item, cli)).collect();

    if cli.pipe {
        let stdout = std::io::stdout();
        let multiple = selected.len() > 1;
        for item in selected {
            let mut out = stdout.lock();
            if multiple {
                writeln!(out, "--- {} ---", item.path)?;
            }
            extractor.extract_to_writer(&mut reader, item.index, &mut out)?;
        }
        return Ok(());
    }

    let out_dir = Path::new(cli.extract_dir.as_deref().unwrap_or("."));
    let mut indices = Vec::with_capacity(selected.len());
    for item in &selected {
        if !item.is_folder {
            if let Some(reason) = skip_reason(item, out_dir, cli) {
                if !cli.is_quiet() {
                    eprintln!("Skipping: {} ({})", item.path, reason);
                }
                continue;
            }
            if !cli.is_quiet() {
                println!("  extracting: {}", item.path);
            }
        }
        indices.push(item.index);
    }

    // An empty index list would select the whole archive.
    if !indices.is_empty() {
        extractor.extract_items(&mut reader, &indices, out_dir)?;
    }

    Ok(())
}

/// Why the output file of `item` is left alone, or `None` to extract it.
///
/// Existing files are only replaced with `-o`; `-n` skips them without the
/// hint.
fn skip_reason(item: &ArchiveItem, out_dir: &Path, cli: &Cli) -> Option<&'static str> {
    if cli.overwrite {
        return None;
    }

    let relative = Path::new(&item.path);
    let target = match relative.file_name() {
        Some(name) if cli.junk_paths => out_dir.join(name),
        _ => out_dir.join(relative),
    };
    if !target.exists() {
        return None;
    }

    Some(if cli.never_overwrite {
        "file exists"
    } else {
        "use -o to overwrite"
    })
}

/// Whether `item` passes the positional and `-x` filters.
///
/// Folders are only kept when no filter is given, so that full extraction
/// still creates empty directories.
fn is_selected(item: &ArchiveItem, cli: &Cli) -> bool {
    if item.is_folder {
        return !cli.has_filters() && !cli.pipe;
    }

    if !cli.files.is_empty() {
        let matches = cli.files.iter().any(|f| {
            if has_glob_chars(f) {
                glob_match(f, &item.path)
            } else {
                let basename = Path::new(&item.path)
                    .file_name()
                    .map(|s| s.to_string_lossy())
                    .unwrap_or_default();
                item.path == *f || basename == *f
            }
        });
        if !matches {
            return false;
        }
    }

    !cli
        .exclude
        .iter()
        .any(|x| item.path.contains(x.as_str()) || glob_match(x, &item.path))
}

/// Print the item table, short or verbose.
fn list_files(items: &[ArchiveItem], verbose: bool) {
    if !verbose {
        for item in items {
            println!("{}", item.path);
        }
        return;
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for item in items {
        let (year, month, day) = item.modified_date();
        let (hour, minute, _second) = item.modified_time();

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            item.size,
            item.packed_size,
            ratio(item.packed_size, item.size),
            year,
            month,
            day,
            hour,
            minute,
            item.path
        );

        if !item.is_folder {
            total_uncompressed += item.size;
            total_compressed += item.packed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {}  {:>21}  {} files",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        file_count
    );
}

/// Space saved by compression, as a right-aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed == 0 || compressed > uncompressed {
        return "  0%".to_string();
    }
    format!("{:>4}%", 100 - compressed * 100 / uncompressed)
}

fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Glob matching with `*` (any run of characters) and `?` (one character).
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    // Iterative matcher; backtracks to the most recent `*`.
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some('?') => {
                p += 1;
                t += 1;
            }
            Some(c) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matching() {
        assert!(glob_match("*.txt", "readme.txt"));
        assert!(glob_match("file?.dat", "file1.dat"));
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(glob_match("*", ""));
        assert!(!glob_match("*.txt", "readme.md"));
        assert!(!glob_match("?", ""));
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }

    fn file_item(path: &str) -> ArchiveItem {
        ArchiveItem {
            index: 0,
            path: path.to_string(),
            is_folder: false,
            size: 3,
            packed_size: 3,
            crc32: 0,
            method: streamzip::zip::CompressionMethod::Stored,
            modified: (0, 0),
        }
    }

    #[test]
    fn existing_files_are_reported_as_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"old").unwrap();
        std::fs::write(dir.path().join("b/c.txt"), b"old").unwrap();

        let default = Cli::parse_from(["streamzip", "a.zip"]);
        assert_eq!(
            skip_reason(&file_item("a.txt"), dir.path(), &default),
            Some("use -o to overwrite")
        );
        assert_eq!(skip_reason(&file_item("b/c.txt"), dir.path(), &default), Some("use -o to overwrite"));
        assert_eq!(skip_reason(&file_item("new.txt"), dir.path(), &default), None);

        let never = Cli::parse_from(["streamzip", "-n", "a.zip"]);
        assert_eq!(skip_reason(&file_item("a.txt"), dir.path(), &never), Some("file exists"));

        let overwrite = Cli::parse_from(["streamzip", "-o", "a.zip"]);
        assert_eq!(skip_reason(&file_item("a.txt"), dir.path(), &overwrite), None);
    }

    #[test]
    fn junk_paths_check_the_flattened_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("c.txt"), b"old").unwrap();

        let junk = Cli::parse_from(["streamzip", "-j", "a.zip"]);
        assert_eq!(
            skip_reason(&file_item("deep/c.txt"), dir.path(), &junk),
            Some("use -o to overwrite")
        );
        let keep = Cli::parse_from(["streamzip", "a.zip"]);
        assert_eq!(skip_reason(&file_item("deep/c.txt"), dir.path(), &keep), None);
    }

    #[test]
    fn compression_ratio() {
        assert_eq!(ratio(25, 100), "  75%");
        assert_eq!(ratio(0, 0), "  0%");
    }
}
