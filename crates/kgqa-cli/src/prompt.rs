//! Single-line prompts on the terminal.

use anyhow::{anyhow, Result};

/// Read one line after printing `prompt`. `None` on end of input.
#[cfg(feature = "repl-rustyline")]
pub fn read_line(prompt: &str) -> Result<Option<String>> {
    use rustyline::error::ReadlineError;

    let mut rl = rustyline::DefaultEditor::new()
        .map_err(|e| anyhow!("failed to init rustyline: {e}"))?;
    match rl.readline(prompt) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
        Err(e) => Err(anyhow!("readline error: {e}")),
    }
}

#[cfg(not(feature = "repl-rustyline"))]
pub fn read_line(prompt: &str) -> Result<Option<String>> {
    use std::io::{self, Write};

    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Prompt for a secret. Input is echoed; set the matching env var to avoid
/// typing it.
pub fn read_secret(prompt: &str) -> Result<String> {
    read_line(prompt)?.ok_or_else(|| anyhow!("no input given for {:?}", prompt.trim()))
}
