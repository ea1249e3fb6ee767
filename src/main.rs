//! override-trigger: evaluate one chat event against the build-override trigger.
//!
//! Reads a JSON event from stdin:
//!
//! ```json
//! {"message": {"id": "1", "channel_id": "2", "content": "...", "author": {...}}, "member": null}
//! ```
//!
//! and writes the verdict to stdout:
//!
//! ```json
//! {"matched": true, "source": "message", "signature": "...", "reason": "...", "summary": "Matched ..."}
//! ```
//!
//! Options:
//!   --config PATH   overlay file to merge over the defaults (`~` is expanded)
//!   --verbose       log at debug level

use std::io::Read;
use std::path::PathBuf;

use log::error;
use serde::Deserialize;

use override_trigger::config::Config;
use override_trigger::sources::{KnownMember, Member, Message, MessageTextSources};
use override_trigger::summary::DefaultSummary;
use override_trigger::{MatchContext, Trigger, logging, render};

#[derive(Deserialize)]
struct EventInput {
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    member: Option<Member>,
}

#[derive(Default)]
struct Args {
    config: Option<PathBuf>,
    verbose: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config requires a path")?;
                args.config = Some(PathBuf::from(shellexpand::tilde(&path).into_owned()));
            }
            "--verbose" | "-v" => args.verbose = true,
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(args)
}

fn load_config(args: &Args) -> Config {
    match &args.config {
        Some(path) => match Config::from_path(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("override-trigger: {e}");
                std::process::exit(1);
            }
        },
        None => Config::load(),
    }
}

#[tokio::main]
async fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("override-trigger: {e}");
            std::process::exit(1);
        }
    };

    let config = load_config(&args);
    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        config.settings.level_filter().unwrap_or_else(|e| {
            eprintln!("override-trigger: {e}, using info");
            log::LevelFilter::Info
        })
    };
    if let Err(e) = logging::init(level, config.settings.log_matches) {
        eprintln!("override-trigger: logger already initialized: {e}");
    }

    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        error!("failed to read stdin");
        std::process::exit(1);
    }

    let event: EventInput = match serde_json::from_str(&input) {
        Ok(v) => v,
        Err(e) => {
            error!("JSON parse error: {e}");
            std::process::exit(1);
        }
    };

    let trigger = match Trigger::from_config(&config) {
        Ok(trigger) => trigger,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    let trigger =
        trigger.with_sources(MessageTextSources::with_lookup(KnownMember(event.member.clone())));

    let outcome = trigger.evaluate(event.message.as_ref()).await;
    let output = match outcome {
        Ok(Some(result)) => {
            let context = MatchContext::new(event.message, event.member);
            let summary = render(&result, &context, &DefaultSummary);
            logging::log_match(&result, &summary);
            serde_json::json!({
                "matched": true,
                "source": result.source.as_str(),
                "signature": result.signature,
                "reason": result.reason.as_str(),
                "summary": summary,
            })
        }
        Ok(None) => serde_json::json!({ "matched": false }),
        Err(e) => {
            error!("resolution failed, trigger skipped: {e}");
            std::process::exit(2);
        }
    };

    println!("{output}");
}
