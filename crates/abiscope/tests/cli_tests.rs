//! CLI integration tests for abiscope.
//!
//! Tests that need a real binary compile the C fixture into a shared
//! library with whatever compiler is on PATH, and skip gracefully when
//! none is available.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

/// Get the path to the abiscope binary.
fn abiscope_bin() -> String {
    env!("CARGO_BIN_EXE_abiscope").to_string()
}

/// Run abiscope with the given arguments.
fn run_abiscope(args: &[&str]) -> Output {
    Command::new(abiscope_bin())
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to execute abiscope")
}

fn find_c_compiler() -> Option<&'static str> {
    ["cc", "clang", "gcc"].into_iter().find(|compiler| {
        Command::new(compiler)
            .arg("--version")
            .output()
            .is_ok_and(|out| out.status.success())
    })
}

/// Compiles the fixture into a shared library with debug info.
/// Returns None (and a note on stderr) when that isn't possible here.
fn build_fixture_library() -> Option<PathBuf> {
    let compiler = match find_c_compiler() {
        Some(c) => c,
        None => {
            eprintln!("Skipping test: no C compiler (cc/clang/gcc) found");
            return None;
        }
    };

    let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/demo.c");
    if !source.exists() {
        eprintln!("Skipping test: fixture demo.c not found");
        return None;
    }

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    let out_dir = std::env::temp_dir().join(format!(
        "abiscope-cli-fixture-{}-{}",
        std::process::id(),
        stamp
    ));
    if let Err(e) = std::fs::create_dir_all(&out_dir) {
        eprintln!("Skipping test: failed to create temp dir: {e}");
        return None;
    }
    let out_lib = out_dir.join("libdemo.so");

    let compile = Command::new(compiler)
        .args(["-g", "-O0", "-shared", "-fPIC"])
        .arg(&source)
        .arg("-o")
        .arg(&out_lib)
        .output();
    match compile {
        Ok(out) if out.status.success() => Some(out_lib),
        Ok(out) => {
            eprintln!(
                "Skipping test: compiler failed: {}",
                String::from_utf8_lossy(&out.stderr)
            );
            None
        }
        Err(e) => {
            eprintln!("Skipping test: failed to invoke compiler: {e}");
            None
        }
    }
}

#[test]
fn version_prints_and_succeeds() {
    let out = run_abiscope(&["version"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("abiscope "), "got: {stdout}");
}

#[test]
fn parse_missing_file_fails() {
    let out = run_abiscope(&["parse", "/nonexistent/definitely-missing"]);
    assert!(!out.status.success());
}

#[test]
fn parse_unrecognized_file_fails_with_message() {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("abiscope-cli-notelf-{}", std::process::id()));
    std::fs::write(&path, b"this is not an object file").unwrap();

    let out = run_abiscope(&["parse", path.to_str().unwrap()]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unrecognized file type"), "got: {stderr}");

    std::fs::remove_file(&path).ok();
}

#[test]
fn load_round_trips_a_corpus() {
    let corpus = r#"{
        "library": "libx.so",
        "locations": [
            {"function": {"name": "f", "type": "Function", "direction": "export",
                          "parameters": [
                              {"name": "a", "type": "int", "class": "Int", "size": "4",
                               "location": "%rdi", "direction": "import"}
                          ]}}
        ]
    }"#;
    let dir = std::env::temp_dir();
    let path = dir.join(format!("abiscope-cli-corpus-{}.json", std::process::id()));
    std::fs::write(&path, corpus).unwrap();

    let out = run_abiscope(&["load", path.to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["library"], "libx.so");
    assert_eq!(
        value["locations"][0]["function"]["parameters"][0]["location"],
        "%rdi"
    );
    // String sizes were coerced to integers on reload.
    assert_eq!(value["locations"][0]["function"]["parameters"][0]["size"], 4);

    std::fs::remove_file(&path).ok();
}

#[test]
fn load_rejects_malformed_sizes() {
    let corpus = r#"{
        "library": "libx.so",
        "locations": [
            {"variable": {"name": "v", "type": "int", "size": "4x", "direction": "export"}}
        ]
    }"#;
    let dir = std::env::temp_dir();
    let path = dir.join(format!("abiscope-cli-badsize-{}.json", std::process::id()));
    std::fs::write(&path, corpus).unwrap();

    let out = run_abiscope(&["load", path.to_str().unwrap()]);
    assert!(!out.status.success());

    std::fs::remove_file(&path).ok();
}

#[test]
fn parse_extracts_locations_from_compiled_fixture() {
    let Some(lib) = build_fixture_library() else {
        return;
    };

    let out = run_abiscope(&["parse", lib.to_str().unwrap(), "--pretty"]);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "parse failed: {stderr}");

    let stdout = String::from_utf8_lossy(&out.stdout);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid corpus JSON");

    let locations = value["locations"].as_array().expect("locations array");
    assert!(!locations.is_empty(), "no locations in corpus");

    // Find the seven-argument function and check the classic SysV spill.
    let add_longs = locations
        .iter()
        .filter_map(|l| l.get("function"))
        .find(|f| f["name"] == "add_longs")
        .expect("add_longs in corpus");
    let parameters = add_longs["parameters"].as_array().unwrap();
    let locations_of: Vec<&str> = parameters
        .iter()
        .map(|p| p["location"].as_str().unwrap_or(""))
        .collect();
    assert!(locations_of.starts_with(&["%rdi", "%rsi", "%rdx", "%rcx", "%r8", "%r9", "framebase+8"]),
        "unexpected locations: {locations_of:?}");

    // Doubles land in SSE registers.
    let scale = locations
        .iter()
        .filter_map(|l| l.get("function"))
        .find(|f| f["name"] == "scale")
        .expect("scale in corpus");
    assert_eq!(scale["parameters"][0]["location"], "%xmm0");
    assert_eq!(scale["parameters"][1]["location"], "%xmm1");

    // The pointer parameter carries its indirection count.
    let string_length = locations
        .iter()
        .filter_map(|l| l.get("function"))
        .find(|f| f["name"] == "string_length")
        .expect("string_length in corpus");
    assert_eq!(string_length["parameters"][0]["class"], "Pointer");
    assert_eq!(string_length["parameters"][0]["indirections"], 1);
}

#[test]
fn run_is_silent_on_compiled_fixture() {
    let Some(lib) = build_fixture_library() else {
        return;
    };

    let out = run_abiscope(&["run", lib.to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "run failed: {stderr}");
    assert!(out.stdout.is_empty(), "run should not print the corpus");
}

#[test]
fn disasm_prints_a_listing() {
    let Some(lib) = build_fixture_library() else {
        return;
    };

    let out = run_abiscope(&["disasm", lib.to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "disasm failed: {stderr}");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("add_longs"), "listing misses symbols");
}
