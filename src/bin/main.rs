use crossterm::style::Stylize;
use langdetect::{DetectorConfig, LanguageDetector, ProfileStore};
use std::error::Error;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: langdetect <profile-dir|snapshot.bin> [--languages de,en,...] \
[--best] [--limit N] [--config config.json] [--save-snapshot out.bin] < text";

#[derive(Debug, Default)]
struct Args {
    profiles: PathBuf,
    languages: Option<Vec<String>>,
    best: bool,
    limit: Option<usize>,
    config: Option<PathBuf>,
    save_snapshot: Option<PathBuf>,
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    let mut profiles = None;

    while let Some(arg) = argv.next() {
        let mut value = |flag: &str| argv.next().ok_or_else(|| format!("{flag} needs a value"));
        match arg.as_str() {
            "--languages" | "-l" => {
                let list = value(&arg)?;
                args.languages = Some(list.split(',').map(|s| s.trim().to_string()).collect());
            }
            "--best" | "-b" => args.best = true,
            "--limit" | "-n" => {
                let n = value(&arg)?;
                args.limit = Some(n.parse().map_err(|_| format!("invalid --limit '{n}'"))?);
            }
            "--config" | "-c" => args.config = Some(value(&arg)?.into()),
            "--save-snapshot" => args.save_snapshot = Some(value(&arg)?.into()),
            "--help" | "-h" => return Err(USAGE.to_string()),
            s if s.starts_with('-') => return Err(format!("unknown option '{s}'\n{USAGE}")),
            s if profiles.is_some() => return Err(format!("unexpected argument '{s}'\n{USAGE}")),
            s => profiles = Some(PathBuf::from(s)),
        }
    }

    args.profiles = profiles.ok_or_else(|| USAGE.to_string())?;
    Ok(args)
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => DetectorConfig::from_json_file(path)?,
        None => DetectorConfig::default(),
    };

    let store = if args.profiles.is_file() {
        let store = ProfileStore::load_snapshot(&args.profiles)?;
        // without a config file, a snapshot decides its own max_rank
        if args.config.is_none() {
            config.max_rank = store.max_rank();
        }
        store
    } else {
        ProfileStore::load_dir(&args.profiles, config.max_rank)?
    };
    if let Some(path) = &args.save_snapshot {
        store.save_snapshot(path)?;
    }

    let mut detector = LanguageDetector::with_config(Arc::new(store), config.clone())?;
    if let Some(codes) = &args.languages {
        detector.set_languages(codes);
    }

    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;

    let mut result = detector.detect(&text);
    if args.best {
        result = result.best_results_within(config.best_results_threshold);
    }
    if let Some(n) = args.limit {
        result = result.limit(0, Some(n));
    }

    println!("{}", result.to_json()?);
    match result.first() {
        Some((code, score)) => eprintln!("{} {:.4}", code.green().bold(), score),
        None => eprintln!("{}", "no language detected".yellow()),
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
