use clap::Parser;
use finch_runtime::prelude::*;
use finch_runtime::syntax::source::SourceFile;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

mod host;

use host::ShellHost;

#[derive(Debug, Parser)]
#[command(name = "finch", about = "The Finch programming language", version)]
struct Options {
    /// Set the verbosity level
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbosity: u8,

    /// Silence all log output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Script files to execute
    files: Vec<PathBuf>,
}

fn main() {
    // Parse command line args.
    let options = Options::parse();

    stderrlog::new()
        .verbosity(options.verbosity as usize)
        .quiet(options.quiet)
        .init()
        .ok();

    let (shell_host, errors) = ShellHost::new();
    let mut interpreter = Interpreter::new(shell_host);

    // If at least one file is given, execute those in order and exit.
    if !options.files.is_empty() {
        for file in &options.files {
            if !execute_file(&mut interpreter, file) {
                process::exit(exitcode::NOINPUT);
            }
        }
    }
    // Interactive mode.
    else if atty::is(atty::Stream::Stdin) {
        interactive_main(&mut interpreter);
    }
    // Execute stdin as a whole program.
    else {
        log::trace!("stdin is not a tty");
        execute_stdin(&mut interpreter);
    }

    if errors.get() > 0 {
        process::exit(exitcode::SOFTWARE);
    }
}

fn execute_file(interpreter: &mut Interpreter, path: &Path) -> bool {
    let source = match SourceFile::open(path) {
        Ok(source) => source,
        Err(e) => {
            log::error!("opening file {:?}: {}", path, e);
            return false;
        }
    };

    if let Err(e) = interpreter.interpret(source) {
        log::error!("{}", e);
        process::exit(exitcode::SOFTWARE);
    }

    true
}

fn execute_stdin(interpreter: &mut Interpreter) {
    let mut source = String::new();

    if let Err(e) = io::stdin().read_to_string(&mut source) {
        log::error!("{}", e);
        process::exit(exitcode::IOERR);
    }

    if let Err(e) = interpreter.interpret(SourceFile::named("<stdin>", source)) {
        log::error!("{}", e);
        process::exit(exitcode::SOFTWARE);
    }
}

fn interactive_main(interpreter: &mut Interpreter) {
    println!("finch {}", env!("CARGO_PKG_VERSION"));

    loop {
        print!(">> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            // EOF ends the session.
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                log::error!("{}", e);
                break;
            }
        }

        if line.trim().is_empty() {
            continue;
        }

        match interpreter.interpret(SourceFile::named("<repl>", line)) {
            Ok(value) => {
                if !interpreter.environment().is_nil(&value) {
                    println!("= {}", value);
                }
            }
            Err(e) => log::error!("{}", e),
        }
    }
}
