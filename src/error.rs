// Fatal (non-recoverable) errors.
//
// Only file I/O failures land here. They abort the whole run. Everything
// else is a `Diagnostic` (see `diagnostics.rs`) that invalidates a single
// file without stopping the process.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("could not open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
