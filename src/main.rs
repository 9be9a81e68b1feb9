// CLI entry point: `coreasm file1 file2 ...`.
//
// A thin `std::env::args()` walk, no argument-parsing crate, since the
// interface is nothing more than a list of base names. For each base
// name the `.as` source is read, the `.am` expansion is always written,
// and `.ob`/`.ext`/`.ent` are written only when the file assembles
// cleanly. File handles are opened and closed within `process_file` on
// every path, including error paths.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::{error, info};

use coreasm::error::AssemblerError;
use coreasm::pipeline;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: coreasm file1 [file2 ...]");
        return ExitCode::from(1);
    }

    let mut any_invalid = false;

    for base in &args {
        match process_file(base) {
            Ok(true) => {}
            Ok(false) => any_invalid = true,
            Err(err) => {
                error!("{err}");
                eprintln!("{err}");
                // A resource failure aborts the whole run.
                return ExitCode::from(2);
            }
        }
    }

    if any_invalid {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Returns `Ok(true)` if the file assembled cleanly and its artifacts
/// were written, `Ok(false)` if it was rejected (diagnostics already
/// printed), and `Err` only for a fatal resource failure.
fn process_file(base: &str) -> Result<bool, AssemblerError> {
    let as_path = PathBuf::from(format!("{base}.as"));
    info!("assembling {}", as_path.display());

    let source = read_file(&as_path)?;
    let result = pipeline::assemble_source(&source, base);

    write_file(&sibling(base, "am"), &result.am_text)?;

    result.diagnostics.print();

    if !result.is_valid() {
        return Ok(false);
    }

    if let Some(ob) = &result.ob_text {
        write_file(&sibling(base, "ob"), ob)?;
    }
    if let Some(ext) = &result.ext_text {
        write_file(&sibling(base, "ext"), ext)?;
    }
    if let Some(ent) = &result.ent_text {
        write_file(&sibling(base, "ent"), ent)?;
    }

    Ok(true)
}

fn sibling(base: &str, extension: &str) -> PathBuf {
    PathBuf::from(format!("{base}.{extension}"))
}

fn read_file(path: &Path) -> Result<String, AssemblerError> {
    fs::read_to_string(path).map_err(|source| AssemblerError::Open { path: path.to_path_buf(), source })
}

fn write_file(path: &Path, contents: &str) -> Result<(), AssemblerError> {
    fs::write(path, contents).map_err(|source| AssemblerError::Write { path: path.to_path_buf(), source })
}
