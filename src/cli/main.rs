use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pixmeta::config::Config;
use pixmeta::convert::{XmpKind, XmpRawValue};
use pixmeta::image::import::plan_imports;
use pixmeta::{ExifTag, Families, Family, ImageMetadata, IptcTag, X_DEFAULT, XmpTag};

#[derive(Parser, Debug)]
#[command(
    name = "pixmeta",
    version,
    about = "Inspect and edit EXIF, IPTC and XMP metadata snapshots"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (default: pixmeta.json next to binary)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config file and exit
    Init,

    /// List the tags of a snapshot
    Show {
        snapshot: PathBuf,
        /// Only show one family
        #[arg(short, long)]
        family: Option<FamilyArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one tag
    Get { snapshot: PathBuf, key: String },

    /// Set a tag from raw values. IPTC and XMP arrays take several values;
    /// XMP lang-alt values are written as `lang=text`.
    Set {
        snapshot: PathBuf,
        key: String,
        #[arg(required = true)]
        raw: Vec<String>,
    },

    /// Delete a tag
    Delete { snapshot: PathBuf, key: String },

    /// Copy metadata from one snapshot into another
    Copy {
        source: PathBuf,
        destination: PathBuf,
        #[arg(long)]
        skip_exif: bool,
        #[arg(long)]
        skip_iptc: bool,
        #[arg(long)]
        skip_xmp: bool,
    },

    /// Import EXIF from image files into `<image>.meta.json` snapshots
    Import {
        /// Image files or directories
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
        /// Re-import images that already have a snapshot
        #[arg(long)]
        overwrite: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FamilyArg {
    Exif,
    Iptc,
    Xmp,
}

impl From<FamilyArg> for Family {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Exif => Family::Exif,
            FamilyArg::Iptc => Family::Iptc,
            FamilyArg::Xmp => Family::Xmp,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    if let Command::Init = cli.command {
        let path = cli.config.as_deref();
        Config::default().save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let registry = Arc::new(config.registry()?);
    let open = |path: &Path| -> Result<ImageMetadata> {
        let mut metadata = ImageMetadata::new(path).with_registry(Arc::clone(&registry));
        metadata
            .load()
            .with_context(|| format!("Failed to load {}", path.display()))?;
        Ok(metadata)
    };

    match cli.command {
        Command::Init => {}
        Command::Show {
            snapshot,
            family,
            json,
        } => {
            let mut metadata = open(&snapshot)?;
            let families = family.map_or_else(Families::all, |f| Families::from(Family::from(f)));
            if json {
                let rows = collect_rows(&mut metadata, families)?;
                let map: serde_json::Map<String, serde_json::Value> = rows
                    .into_iter()
                    .map(|(key, shown)| (key, serde_json::Value::String(shown)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                print_snapshot(&snapshot, &mut metadata, families)?;
            }
        }
        Command::Get { snapshot, key } => {
            let mut metadata = open(&snapshot)?;
            let tag = metadata.get(&key)?;
            match tag.value() {
                Ok(value) => println!("{value}"),
                Err(e) => {
                    log::warn!("{e}");
                    println!("{}", tag.raw_display());
                }
            }
        }
        Command::Set { snapshot, key, raw } => {
            let mut metadata = open(&snapshot)?;
            set_raw(&mut metadata, &key, raw)?;
            metadata.save()?;
            log::info!("Set {key} in {}", snapshot.display());
        }
        Command::Delete { snapshot, key } => {
            let mut metadata = open(&snapshot)?;
            metadata.delete(&key)?;
            metadata.save()?;
            log::info!("Deleted {key} from {}", snapshot.display());
        }
        Command::Copy {
            source,
            destination,
            skip_exif,
            skip_iptc,
            skip_xmp,
        } => {
            let families = Families {
                exif: config.copy.exif && !skip_exif,
                iptc: config.copy.iptc && !skip_iptc,
                xmp: config.copy.xmp && !skip_xmp,
            };
            let mut src = open(&source)?;
            let mut dst = open(&destination)?;
            src.copy(&mut dst, families)?;
            dst.save()?;
            log::info!("Copied {} into {}", source.display(), destination.display());
        }
        Command::Import { paths, overwrite } => {
            let jobs = plan_imports(&paths, overwrite);
            if jobs.is_empty() {
                anyhow::bail!("No images to import in the specified paths.");
            }
            let mut failed = 0;
            for job in &jobs {
                match job.run(&registry) {
                    Ok(()) => println!("{} -> {}", job.image.display(), job.snapshot.display()),
                    Err(e) => {
                        failed += 1;
                        log::error!("Failed to import {}: {e:#}", job.image.display());
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{failed} of {} image(s) failed to import", jobs.len());
            }
        }
    }

    Ok(())
}

/// Build a tag from raw strings typed by the registry and assign it.
fn set_raw(metadata: &mut ImageMetadata, key: &str, raw: Vec<String>) -> Result<()> {
    let registry = metadata.registry();
    match Family::of_key(key)? {
        Family::Exif => {
            let (class, semantic) = registry
                .exif(key)
                .with_context(|| format!("Unknown EXIF key {key}"))?;
            let tag = ExifTag::from_raw(key, class, semantic, raw.join(" "));
            tag.value()?;
            metadata.set_exif_tag(key, tag)?;
        }
        Family::Iptc => {
            let (class, repeatable) = registry
                .iptc(key)
                .with_context(|| format!("Unknown IPTC key {key}"))?;
            if !repeatable && raw.len() > 1 {
                anyhow::bail!("{key} takes a single value");
            }
            let tag = IptcTag::from_raw(key, class, repeatable, raw);
            tag.values()?;
            metadata.set_iptc_tag(key, tag)?;
        }
        Family::Xmp => {
            let kind = registry
                .xmp(key)
                .with_context(|| format!("Unknown XMP key {key}"))?;
            let tag = XmpTag::from_raw(key, kind, xmp_raw(kind, raw));
            tag.value()?;
            metadata.set_xmp_tag(key, tag)?;
        }
    }
    Ok(())
}

fn xmp_raw(kind: XmpKind, raw: Vec<String>) -> XmpRawValue {
    match kind {
        XmpKind::Simple(_) => XmpRawValue::Text(raw.join(" ")),
        XmpKind::Bag(_) | XmpKind::Seq(_) | XmpKind::Alt(_) => XmpRawValue::Array(raw),
        XmpKind::LangAlt => XmpRawValue::LangAlt(
            raw.into_iter()
                .map(|entry| match entry.split_once('=') {
                    Some((lang, text)) => (lang.to_string(), text.to_string()),
                    None => (X_DEFAULT.to_string(), entry),
                })
                .collect(),
        ),
    }
}

/// (key, displayed value) for every tag of the selected families.
fn collect_rows(metadata: &mut ImageMetadata, families: Families) -> Result<Vec<(String, String)>> {
    let mut rows = Vec::new();
    for family in families.iter() {
        for key in metadata.keys(family)?.to_vec() {
            let tag = metadata.get(&key)?;
            let shown = match tag.value() {
                Ok(value) => value.to_string(),
                Err(_) => tag.raw_display(),
            };
            rows.push((key, shown));
        }
    }
    Ok(rows)
}

// ── Display helpers ──────────────────────────────────────────────────

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

const KEY_WIDTH: usize = 40;
const VAL_WIDTH: usize = 60;

fn print_snapshot(path: &Path, metadata: &mut ImageMetadata, families: Families) -> Result<()> {
    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(KEY_WIDTH + VAL_WIDTH + 5));

    let mut empty = true;
    for family in families.iter() {
        let rows = collect_rows(metadata, Families::from(family))?;
        if rows.is_empty() {
            continue;
        }
        empty = false;
        println!("  {BOLD}{family}{RESET}");
        println!("  {DIM}{}{RESET}", "─".repeat(KEY_WIDTH + VAL_WIDTH + 3));
        for (key, shown) in &rows {
            print_row(key, shown);
        }
        println!();
    }

    if empty {
        println!("  {DIM}(no metadata found){RESET}");
        println!();
    }
    Ok(())
}

fn print_row(key: &str, val: &str) {
    let key_col = format!("{:<width$}", key, width = KEY_WIDTH);
    let indent = " ".repeat(KEY_WIDTH + 3);
    for (i, line) in wrap_text(val, VAL_WIDTH).iter().enumerate() {
        if i == 0 {
            println!("  {key_col} : {line}");
        } else {
            println!("  {indent}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
