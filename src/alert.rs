use std::io::Write;
use std::process::Command;

use anyhow::{bail, Context, Result};

/// Short cue asking a human to step in. Callers treat failures as non-fatal.
pub trait Alert {
    fn play(&self) -> Result<()>;
}

/// Rings the terminal bell on stderr.
pub struct TerminalBell;

impl Alert for TerminalBell {
    fn play(&self) -> Result<()> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

/// Runs an external player, e.g. `["paplay", "/usr/share/sounds/alarm.oga"]`.
pub struct CommandAlert {
    program: String,
    args: Vec<String>,
}

impl CommandAlert {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command.split_first().context("alert command is empty")?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Alert for CommandAlert {
    fn play(&self) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .with_context(|| format!("failed to run {}", self.program))?;
        if !status.success() {
            bail!("{} exited with {}", self.program, status);
        }
        Ok(())
    }
}

/// Picks the configured alert: an external command when one is set, the
/// terminal bell otherwise.
pub fn from_config(command: Option<&[String]>) -> Result<Box<dyn Alert>> {
    match command {
        Some(cmd) => Ok(Box::new(CommandAlert::new(cmd)?)),
        None => Ok(Box::new(TerminalBell)),
    }
}
