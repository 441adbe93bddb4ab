//! zonegate: evaluate request paths against an access configuration.
//!
//! Reads one JSON request per line from stdin and writes one JSON decision
//! per line to stdout:
//!
//! ```text
//! {"path": "/members_only/lounge", "facts": {"signed_in": true}}
//! {"path":"/members_only/lounge","decision":"deny","reason":"...","outcome":{"action":"redirect","location":"/login","notice":"restricted"}}
//! ```
//!
//! Condition names in the configuration are bound to the request's `facts`;
//! a fact that is absent counts as false.
//!
//! Usage: `zonegate [--config PATH] [--log-file PATH | --no-log] [-v|-vv]`

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use zonegate::config::Config;
use zonegate::gate::Outcome;
use zonegate::{Condition, ConditionTable, ConfigError, Gate};

type Facts = HashMap<String, bool>;

/// Exit status for bad arguments and configuration errors.
const EXIT_CONFIG: i32 = 2;

#[derive(Deserialize)]
struct Request {
    path: String,
    #[serde(default)]
    facts: Facts,
}

#[derive(Serialize)]
struct Response<'a> {
    path: &'a str,
    decision: &'static str,
    reason: String,
    outcome: Outcome,
}

struct Args {
    config: Option<PathBuf>,
    log_file: Option<PathBuf>,
    level: LevelFilter,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        log_file: Some(zonegate::logging::expand_path(
            zonegate::logging::DEFAULT_LOG_PATH,
        )),
        level: LevelFilter::Warn,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter.next().ok_or("--config requires a path")?;
                args.config = Some(zonegate::logging::expand_path(&value));
            }
            "--log-file" => {
                let value = iter.next().ok_or("--log-file requires a path")?;
                args.log_file = Some(zonegate::logging::expand_path(&value));
            }
            "--no-log" => args.log_file = None,
            "-v" => args.level = LevelFilter::Info,
            "-vv" => args.level = LevelFilter::Debug,
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(args)
}

/// Bind every condition name in the config to a lookup in the request's facts.
fn fact_conditions(config: &Config) -> ConditionTable<Facts> {
    let mut table = ConditionTable::new();
    for name in config.condition_names() {
        let key = name.to_string();
        table.insert(
            name,
            Condition::when(move |facts: &Facts| facts.get(&key).copied().unwrap_or(false)),
        );
    }
    table
}

/// Load the configuration at `path` (or the default overlay) and build the gate.
fn load_gate(path: Option<&Path>) -> Result<Gate<Facts>, ConfigError> {
    let config = Config::load(path)?;
    config.gate(&fact_conditions(&config))
}

fn respond(gate: &Gate<Facts>, line: &str) -> serde_json::Value {
    let request: Request = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => return serde_json::json!({ "error": format!("JSON parse error: {e}") }),
    };
    let (ruling, outcome) = match gate.evaluate(&request.path, &request.facts) {
        Ok(result) => result,
        Err(e) => return serde_json::json!({ "path": request.path, "error": e.to_string() }),
    };
    zonegate::logging::log_decision(&request.path, &ruling);
    let response = Response {
        path: &request.path,
        decision: ruling.verdict.as_str(),
        reason: ruling.reason,
        outcome,
    };
    serde_json::to_value(&response)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }))
}

fn main() {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("zonegate: {e}");
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Best-effort: a broken log file must never block decisions.
    if let Err(e) = zonegate::logging::init(args.level, args.log_file.as_deref()) {
        eprintln!("zonegate: logging disabled: {e}");
    }

    let gate = match load_gate(args.config.as_deref()) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("zonegate: {e}");
            std::process::exit(EXIT_CONFIG);
        }
    };
    log::info!(
        "{} trigger(s), safe zone {:?}",
        gate.registry().len(),
        gate.registry().safe_zone()
    );

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("zonegate: failed to read stdin: {e}");
                std::process::exit(1);
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let output = respond(&gate, &line);
        if writeln!(stdout, "{output}").is_err() {
            std::process::exit(1);
        }
    }
}
