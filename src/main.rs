use std::env;
use std::fs;
use std::process;

use darbuka::{parse_rhythm, split_header, TimeSignature};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: darbuka <input> [output.json]");
        eprintln!("       darbuka --time-signature N/D <input> [output.json]");
        process::exit(1);
    }

    let mut signature_override: Option<TimeSignature> = None;
    let mut input_path = &args[1];
    let mut output_path: Option<&String> = args.get(2);

    // Parse flags
    if args[1] == "--time-signature" {
        if args.len() < 4 {
            eprintln!("Usage: darbuka --time-signature N/D <input> [output.json]");
            process::exit(1);
        }
        signature_override = match TimeSignature::from_str(&args[2]) {
            Ok(ts) => Some(ts),
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        };
        input_path = &args[3];
        output_path = args.get(4);
    }

    // Read input file
    let source = match fs::read_to_string(input_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", input_path, e);
            process::exit(1);
        }
    };

    // Split off YAML front matter, if any
    let (header, body) = match split_header(&source) {
        Ok(split) => split,
        Err(e) => {
            eprintln!("Error in '{}': {}", input_path, e);
            process::exit(1);
        }
    };

    let time_signature = signature_override
        .or(header.time_signature)
        .unwrap_or_default();

    let rhythm = parse_rhythm(body, &time_signature);
    if let Some(error) = &rhythm.error {
        // Malformed measures are a warning: the best-effort result is
        // still emitted for the caller to render.
        eprintln!("Warning: {}", error);
    }

    let json = match serde_json::to_string_pretty(&rhythm) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serializing result: {}", e);
            process::exit(1);
        }
    };

    // Output
    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, &json) {
                eprintln!("Error writing to '{}': {}", path, e);
                process::exit(1);
            }
            eprintln!("Wrote {} measures to {}", rhythm.measures.len(), path);
        }
        None => {
            println!("{}", json);
        }
    }
}
