//! Command-line enrollment and verification around the irismatch core.
//!
//! This binary is the "surrounding layer": it loads captures from disk,
//! assigns subject identifiers from a persisted counter, stores templates as
//! JSON records keyed by identifier, and prints machine-readable results.
//! The biometric core never touches any of this.

use clap::{Parser, Subcommand};
use irismatch::io::load_gray_image;
use irismatch::{IrisTemplate, Pipeline};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Iris enrollment and verification")]
struct Cli {
    /// Directory holding enrolled templates and the id counter.
    #[arg(short, long, value_name = "DIR", default_value = "iris-store")]
    store: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enroll an eye capture and print the assigned subject id.
    Enroll {
        /// Path to the eye image.
        #[arg(short, long, value_name = "FILE")]
        image: PathBuf,
        /// Identifier prefix for newly assigned subjects.
        #[arg(long, default_value = "BTBTC23")]
        id_prefix: String,
        /// Opaque profile fields stored next to the template, as key=value.
        #[arg(long = "profile", value_name = "KEY=VALUE")]
        profile: Vec<String>,
    },
    /// Verify a fresh capture against an enrolled subject.
    Verify {
        /// Path to the eye image.
        #[arg(short, long, value_name = "FILE")]
        image: PathBuf,
        /// Claimed subject identifier.
        #[arg(long)]
        subject_id: String,
    },
}

/// On-disk enrollment record: the template plus opaque profile fields.
#[derive(Serialize, Deserialize)]
struct TemplateRecord {
    subject_id: String,
    code: Vec<u8>,
    mask: Vec<u8>,
    profile: BTreeMap<String, String>,
    enrolled_at: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        let body = serde_json::json!({ "status": "Error", "message": err.to_string() });
        println!("{body}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(&cli.store)?;
    let pipeline = Pipeline::with_defaults();

    match &cli.command {
        Command::Enroll {
            image,
            id_prefix,
            profile,
        } => {
            let capture = load_gray_image(image)?;
            let template = pipeline.enroll(capture.view())?;
            let subject_id = next_subject_id(&cli.store, id_prefix)?;
            let record = TemplateRecord {
                subject_id: subject_id.clone(),
                code: template.code().to_vec(),
                mask: template.mask().to_vec(),
                profile: parse_profile(profile)?,
                enrolled_at: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0),
            };
            write_record(&cli.store, &record)?;
            let body = serde_json::json!({ "status": "Success", "subject_id": subject_id });
            println!("{body}");
        }
        Command::Verify { image, subject_id } => {
            let capture = load_gray_image(image)?;
            let result = pipeline.verify_with(subject_id, capture.view(), |id| {
                read_template(&cli.store, id)
            })?;
            let body = serde_json::json!({
                "match": result.matched,
                "score": round4(result.score),
                "distance": round4(result.distance),
                "insufficient_data": result.insufficient_data,
            });
            println!("{body}");
        }
    }
    Ok(())
}

/// Assigns the next identifier from a persisted monotonic counter.
fn next_subject_id(store: &Path, prefix: &str) -> std::io::Result<String> {
    let counter_path = store.join("counter");
    let count: u64 = fs::read_to_string(&counter_path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
        + 1;
    fs::write(&counter_path, count.to_string())?;
    Ok(format!("{prefix}{count:03}"))
}

fn parse_profile(pairs: &[String]) -> Result<BTreeMap<String, String>, String> {
    let mut profile = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("profile field '{pair}' is not KEY=VALUE"))?;
        profile.insert(key.to_owned(), value.to_owned());
    }
    Ok(profile)
}

fn record_path(store: &Path, subject_id: &str) -> PathBuf {
    store.join(format!("{subject_id}.json"))
}

fn write_record(store: &Path, record: &TemplateRecord) -> Result<(), Box<dyn std::error::Error>> {
    let path = record_path(store, &record.subject_id);
    fs::write(&path, serde_json::to_vec_pretty(record)?)?;
    tracing::info!(subject_id = %record.subject_id, path = %path.display(), "template stored");
    Ok(())
}

fn read_template(store: &Path, subject_id: &str) -> Option<IrisTemplate> {
    let bytes = fs::read(record_path(store, subject_id)).ok()?;
    let record: TemplateRecord = serde_json::from_slice(&bytes).ok()?;
    IrisTemplate::new(record.code, record.mask).ok()
}

fn round4(value: f32) -> f64 {
    (f64::from(value) * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::{next_subject_id, parse_profile, read_template, record_path, TemplateRecord};
    use irismatch::IrisTemplate;
    use std::collections::BTreeMap;
    use std::fs;

    #[test]
    fn counter_increments_and_pads() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(next_subject_id(dir.path(), "BTBTC23").unwrap(), "BTBTC23001");
        assert_eq!(next_subject_id(dir.path(), "BTBTC23").unwrap(), "BTBTC23002");
    }

    #[test]
    fn record_round_trips_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let template = IrisTemplate::new(vec![1, 0, 1, 1], vec![1, 1, 0, 1]).unwrap();
        let record = TemplateRecord {
            subject_id: "BTBTC23001".into(),
            code: template.code().to_vec(),
            mask: template.mask().to_vec(),
            profile: BTreeMap::new(),
            enrolled_at: 0,
        };
        fs::write(
            record_path(dir.path(), &record.subject_id),
            serde_json::to_vec(&record).unwrap(),
        )
        .unwrap();

        let loaded = read_template(dir.path(), "BTBTC23001").unwrap();
        assert_eq!(loaded, template);
        assert!(read_template(dir.path(), "BTBTC23999").is_none());
    }

    #[test]
    fn profile_pairs_parse_and_reject_malformed() {
        let parsed = parse_profile(&["firstName=Ada".into(), "city=Pune".into()]).unwrap();
        assert_eq!(parsed["firstName"], "Ada");
        assert!(parse_profile(&["nope".into()]).is_err());
    }
}
