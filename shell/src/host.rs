//! The host implementation used by the command line driver.

use finch_runtime::InterpreterHost;
use std::cell::Cell;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

/// Hosts the runtime on the real process: output goes to stdout, errors to
/// the logger, and modules come from disk.
pub struct ShellHost {
    errors: Rc<Cell<usize>>,
}

impl ShellHost {
    /// Create a host along with a shared counter of the errors it has
    /// reported, which decides the process exit code.
    pub fn new() -> (ShellHost, Rc<Cell<usize>>) {
        let errors = Rc::new(Cell::new(0));

        (
            ShellHost {
                errors: errors.clone(),
            },
            errors,
        )
    }
}

impl InterpreterHost for ShellHost {
    fn output(&mut self, text: &str) {
        let mut stdout = io::stdout();
        stdout.write_all(text.as_bytes()).ok();
        stdout.flush().ok();
    }

    fn error(&mut self, message: &str) {
        self.errors.set(self.errors.get() + 1);
        log::error!("{}", message);
    }

    fn load_module(&mut self, path: &str) -> io::Result<String> {
        for candidate in candidates(path) {
            if candidate.is_file() {
                log::debug!("loading module '{}' from '{}'", path, candidate.display());
                return fs::read_to_string(candidate);
            }
        }

        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("module '{}' not found", path),
        ))
    }
}

/// Paths to try for a module name: the literal path, the path with the
/// `.fin` extension, then both again under each entry of `FINCH_PATH`.
fn candidates(path: &str) -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from(path),
        PathBuf::from(format!("{}.fin", path)),
    ];

    if let Ok(search) = env::var("FINCH_PATH") {
        for dir in search.split(':') {
            paths.push(PathBuf::from(dir).join(path));
            paths.push(PathBuf::from(dir).join(format!("{}.fin", path)));
        }
    }

    paths
}
