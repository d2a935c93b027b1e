//! Writing the generated units to disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What happened to one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Write `contents` to `path`. With `only_if_changed`, an existing file whose
/// bytes already match is left alone so its modification time survives.
pub fn write_output(path: &Path, contents: &str, only_if_changed: bool) -> io::Result<WriteOutcome> {
    if only_if_changed {
        match fs::read(path) {
            Ok(existing) if existing == contents.as_bytes() => return Ok(WriteOutcome::Unchanged),
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
    }
    fs::write(path, contents)?;
    Ok(WriteOutcome::Written)
}

/// `V8<Interface>.h` and `V8<Interface>.cpp` inside `dir`. Named after the
/// compiled interface, not the input file, so the source unit's own
/// `#include` finds its header.
pub fn output_paths(dir: &Path, interface_name: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("V8{interface_name}.h")),
        dir.join(format!("V8{interface_name}.cpp")),
    )
}
