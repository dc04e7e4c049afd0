use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gml_decode::{decode, gml32_profiles, gml33_profiles, Element, Gml, Profile};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input XML file or directory
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// GML profile to decode with
    #[arg(short, long, value_enum, default_value_t = ProfileChoice::Gml33)]
    profile: ProfileChoice,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Pretty-print decoded entities
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProfileChoice {
    Gml32,
    Gml33,
}

impl ProfileChoice {
    fn profiles(self) -> Vec<&'static Profile> {
        match self {
            ProfileChoice::Gml32 => gml32_profiles(),
            ProfileChoice::Gml33 => gml33_profiles(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let start_time = std::time::Instant::now();

    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to build thread pool")?;
    }

    let profiles = args.profile.profiles();
    let input_files = if args.input.is_file() {
        vec![args.input.clone()]
    } else if args.input.is_dir() {
        info!("Processing directory: {:?}", args.input);
        collect_input_files(&args.input)?
    } else {
        error!("Invalid input path: {:?}", args.input);
        anyhow::bail!("Input path must be a file or directory");
    };
    info!("Found {} XML files", input_files.len());

    let results: Vec<Result<Vec<Gml>>> = input_files
        .par_iter()
        .map(|path| process_file(path, &profiles))
        .collect();

    let mut errors = Vec::new();
    for (path, result) in input_files.iter().zip(results) {
        match result {
            Ok(entities) => {
                println!("{}", path.display());
                for entity in &entities {
                    println!("{}", render(entity, args.pretty));
                }
            }
            Err(e) => errors.push(format!("{}: {:#}", path.display(), e)),
        }
    }

    info!("Total processing time: {:?}", start_time.elapsed());

    if !errors.is_empty() {
        error!("Failed to decode {} files:", errors.len());
        for err in &errors {
            error!("  {}", err);
        }
        anyhow::bail!("{} files failed to decode", errors.len());
    }

    Ok(())
}

fn render(entity: &Gml, pretty: bool) -> String {
    if pretty {
        format!("{entity:#?}")
    } else {
        format!("{entity:?}")
    }
}

/// Decodes the document root if a profile recognises it, otherwise every recognised child.
fn process_file(path: &Path, profiles: &[&Profile]) -> Result<Vec<Gml>> {
    debug!("Processing file: {:?}", path);
    let root =
        Element::parse_file(path).with_context(|| format!("Failed to parse {}", path.display()))?;
    decode_document(&root, profiles)
}

fn decode_document(root: &Element, profiles: &[&Profile]) -> Result<Vec<Gml>> {
    if is_recognised(root, profiles) {
        return Ok(vec![decode(root, profiles)?]);
    }

    root.children()
        .iter()
        .filter(|child| is_recognised(child, profiles))
        .map(|child| {
            decode(child, profiles).with_context(|| format!("Failed to decode <{}>", child.tag()))
        })
        .collect()
}

fn is_recognised(element: &Element, profiles: &[&Profile]) -> bool {
    profiles.iter().any(|profile| profile.contains(element.tag()))
}

fn collect_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;

    let nested: Vec<Vec<PathBuf>> = entries
        .into_par_iter()
        .map(|entry| -> Result<Vec<PathBuf>> {
            let path = entry.path();
            if path.is_dir() {
                collect_input_files(&path)
            } else if path.extension().and_then(|s| s.to_str()) == Some("xml") {
                Ok(vec![path])
            } else {
                Ok(Vec::new())
            }
        })
        .collect::<Result<_>>()?;

    let mut files: Vec<PathBuf> = nested.into_iter().flatten().collect();
    files.sort();
    Ok(files)
}
