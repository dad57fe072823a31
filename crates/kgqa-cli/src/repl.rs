//! Interactive question loop.
//!
//! Uses `rustyline` for line editing and history by default; a plain stdin
//! loop is used with `--no-default-features`.

use anyhow::Result;
use colored::Colorize;

use crate::ask::print_outcome;
use crate::setup::Services;

const PROMPT: &str = "kgqa> ";

enum ReplControl {
    Continue,
    Exit,
}

pub async fn cmd_repl(services: &Services, show_query: bool) -> Result<()> {
    println!("{}", "KGQA REPL".green().bold());
    println!(
        "Store: {}. Ask a question, or `:quit` to exit.\n",
        services.qa.store().describe()
    );

    #[cfg(feature = "repl-rustyline")]
    {
        repl_rustyline(services, show_query).await
    }
    #[cfg(not(feature = "repl-rustyline"))]
    {
        repl_simple(services, show_query).await
    }
}

async fn dispatch_line(services: &Services, line: &str, show_query: bool) -> Result<ReplControl> {
    match line {
        ":quit" | ":q" | ":exit" => return Ok(ReplControl::Exit),
        ":help" => {
            println!("Type a question in plain English. `:quit` exits.");
            return Ok(ReplControl::Continue);
        }
        _ => {}
    }
    let outcome = services.qa.answer(line).await?;
    print_outcome(&outcome, show_query);
    Ok(ReplControl::Continue)
}

#[cfg(feature = "repl-rustyline")]
async fn repl_rustyline(services: &Services, show_query: bool) -> Result<()> {
    use anyhow::anyhow;
    use rustyline::error::ReadlineError;

    let mut rl = rustyline::DefaultEditor::new()
        .map_err(|e| anyhow!("failed to init rustyline: {e}"))?;
    loop {
        let line = match rl.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => continue,
            Err(e) => return Err(anyhow!("readline error: {e}")),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rl.add_history_entry(line)
            .map_err(|e| anyhow!("failed to record history: {e}"))?;

        match dispatch_line(services, line, show_query).await {
            Ok(ReplControl::Continue) => {}
            Ok(ReplControl::Exit) => break,
            Err(e) => eprintln!("{} {e}", "error:".red().bold()),
        }
    }
    Ok(())
}

#[cfg(not(feature = "repl-rustyline"))]
async fn repl_simple(services: &Services, show_query: bool) -> Result<()> {
    use std::io::{self, Write};

    let stdin = io::stdin();
    loop {
        print!("{}", PROMPT.cyan().bold());
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match dispatch_line(services, line, show_query).await {
            Ok(ReplControl::Continue) => {}
            Ok(ReplControl::Exit) => break,
            Err(e) => eprintln!("{} {e}", "error:".red().bold()),
        }
    }
    Ok(())
}
