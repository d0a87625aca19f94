use std::io::{Read, Write};
use std::process::exit;

use vc_verify::config::VerifierConfig;
use vc_verify::verifier::Verifier;

fn usage() {
    eprintln!("Usage: vc-verify [--config <file>] <credential-file|->");
}

fn read_input(filename: &str) -> std::io::Result<String> {
    let mut data = String::new();
    if filename == "-" {
        std::io::stdin().read_to_string(&mut data)?;
    } else {
        std::fs::File::open(filename)?.read_to_string(&mut data)?;
    }
    Ok(data)
}

fn write_json(data: &str) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if let Err(err) = writeln!(handle, "{}", data) {
        eprintln!("Unable to write output: {}", err);
        exit(2);
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, filename) = match args.as_slice() {
        [filename] => (None, filename),
        [flag, path, filename] if flag == "--config" => (Some(path.as_str()), filename),
        _ => {
            usage();
            exit(2);
        }
    };
    let config = match VerifierConfig::load(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Unable to load configuration: {}", err);
            exit(2);
        }
    };
    let verifier = match Verifier::from_config(config) {
        Ok(verifier) => verifier,
        Err(err) => {
            eprintln!("Unable to set up verifier: {}", err);
            exit(2);
        }
    };
    let data = match read_input(filename) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("Unable to read {}: {}", filename, err);
            exit(2);
        }
    };
    let outcome = verifier.verify(&data).await;
    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => write_json(&json),
        Err(err) => {
            eprintln!("Unable to serialize outcome: {}", err);
            exit(2);
        }
    }
    exit(if outcome.is_verified() { 0 } else { 1 });
}
