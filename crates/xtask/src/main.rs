use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use dwhelper_core::{parse_knowledge_base, KnowledgeBase};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let task = args.get(1).map(|s| s.as_str()).unwrap_or("");

    let result = match task {
        "check-data" => check_data(args.get(2).map(PathBuf::from)),
        "export-schema" => export_schema(),
        _ => {
            eprintln!("Usage: cargo run -p xtask -- <check-data [path] | export-schema>");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn check_data(path: Option<PathBuf>) -> Result<(), String> {
    let path = path.unwrap_or_else(|| workspace_root().join("data").join("app_data.json"));
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let kb = parse_knowledge_base(&raw).map_err(|e| format!("{}: {e}", path.display()))?;

    println!("app_data.json contains required sections.");
    println!(
        "  {} symptoms, {} questions, {} chemical tests",
        kb.symptoms.len(),
        kb.questions.len(),
        kb.chemical_tests.len()
    );
    Ok(())
}

fn export_schema() -> Result<(), String> {
    let schema = schemars::schema_for!(KnowledgeBase);
    let json = serde_json::to_string_pretty(&schema).map_err(|e| e.to_string())?;
    let dst = workspace_root().join("data").join("app_data.schema.json");
    std::fs::write(&dst, json + "\n")
        .map_err(|e| format!("failed to write {}: {e}", dst.display()))?;
    println!("Schema written to {}", dst.display());
    Ok(())
}

fn workspace_root() -> PathBuf {
    // Walk up from current dir to find Cargo.toml with [workspace]
    let mut dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    loop {
        let manifest = dir.join("Cargo.toml");
        if let Ok(contents) = std::fs::read_to_string(&manifest) {
            if contents.contains("[workspace]") {
                return dir;
            }
        }
        if !dir.pop() {
            return PathBuf::from(".");
        }
    }
}
