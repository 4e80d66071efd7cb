use std::io;

use anyhow::{bail, Result};
use clap::Parser;
use log::{error, info};
use rustyline::config::Config as EditorConfig;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;
use simplelog::{Config as LogConfig, LevelFilter, SimpleLogger};

mod input;
mod lang;

use input::ReplHelper;
use lang::runtime::Runtime;

const HISTORY_FILE: &str = ".scrip_history";
const PROMPT: &str = ">>> ";

#[derive(Parser)]
#[command(version, about = "A small imperative scripting language")]
struct Opt {
    /// Show debug output
    #[arg(short, long)]
    debug: bool,
}

fn init_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        LevelFilter::Info
    } else {
        LevelFilter::Error
    };

    match SimpleLogger::init(filter, LogConfig::default()) {
        Ok(_) => Ok(()),
        Err(e) => bail!("Failed to init logger: {}", e),
    }
}

fn init_editor() -> Result<Editor<ReplHelper, FileHistory>> {
    let config = EditorConfig::builder().auto_add_history(true).build();
    let mut editor = Editor::with_config(config)?;
    editor.set_helper(Some(ReplHelper::new()));

    Ok(editor)
}

fn welcome() {
    println!("scrip v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit;' or press Ctrl-D to quit");
    println!();
}

fn main() -> Result<()> {
    let opts = Opt::parse();
    init_logging(opts.debug)?;

    let mut editor = init_editor()?;
    let _ = editor.load_history(HISTORY_FILE);
    welcome();

    let mut stdout = io::stdout();
    let mut runtime = Runtime::new(&mut stdout);

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                info!("read: {}", &line);

                if line.trim() == "exit;" {
                    break;
                }

                if let Err(e) = runtime.run(&line) {
                    eprintln!("Error: {}", e);
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("Press Ctrl-D or type 'exit;' to quit");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                error!("Unexpected error: {}", e);
                break;
            }
        }
    }

    if let Err(e) = editor.save_history(HISTORY_FILE) {
        bail!("Failed to save history: {}", e);
    }

    Ok(())
}
