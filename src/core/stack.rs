//! Caller stack strings for attaching to diagnostic events

use backtrace::Backtrace;
use std::path::{Path, PathBuf};

const OWN_FRAME: &str = "core::stack::stack";

struct Call {
    name: String,
    file: Option<PathBuf>,
    line: Option<u32>,
}

/// The call stack of the caller as `[file.rs:12 file.rs:40 ...]`.
///
/// `skip` drops that many frames above the caller of this function, so
/// `stack(0)` starts at the caller itself. Frames from the Rust runtime and
/// the standard library are left out.
pub fn stack(skip: usize) -> String {
    let trace = Backtrace::new();
    let calls: Vec<Call> = trace
        .frames()
        .iter()
        .flat_map(|frame| frame.symbols())
        .map(|symbol| Call {
            name: symbol.name().map(|n| format!("{n:#}")).unwrap_or_default(),
            file: symbol.filename().map(Path::to_path_buf),
            line: symbol.lineno(),
        })
        .collect();

    let start = calls
        .iter()
        .position(|call| call.name.contains(OWN_FRAME))
        .map_or(0, |own| own + 1);

    let frames: Vec<String> = calls[start..]
        .iter()
        .filter_map(|call| {
            let file = call.file.as_deref()?;
            let line = call.line?;
            if is_runtime(file) {
                return None;
            }
            let base = file.file_name()?.to_string_lossy();
            Some(format!("{base}:{line}"))
        })
        .skip(skip)
        .collect();

    format!("[{}]", frames.join(" "))
}

fn is_runtime(file: &Path) -> bool {
    let path = file.to_string_lossy();
    path.starts_with("/rustc/")
        || path.contains("/library/std/")
        || path.contains("/library/core/")
        || path.contains("/library/test/")
}
