//! Shell display-power driver (no relay wired).
//!
//! Uses the Raspberry Pi firmware tool:
//!
//! | Call                      | Effect                          |
//! |---------------------------|---------------------------------|
//! | `vcgencmd display_power`  | prints `display_power=0` or `=1`|
//! | `vcgencmd display_power 1`| HDMI output on                  |
//! | `vcgencmd display_power 0`| HDMI output off                 |
//!
//! Switching on queries first and only issues the "on" command when the
//! output is reported off, so repeated motion does not re-wake the
//! panel.  Switching off is unconditional.  No state is tracked here.

use std::process::Command;

use log::{debug, info, warn};

use crate::error::DisplayError;

use super::display_worker::PowerSwitch;

/// Runs an external program and hands back its stdout.
pub trait CommandRunner: Send + 'static {
    fn run(&mut self, program: &str, args: &[&str]) -> Result<String, DisplayError>;
}

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&mut self, program: &str, args: &[&str]) -> Result<String, DisplayError> {
        let output = Command::new(program).args(args).output().map_err(|e| {
            warn!("Display: cannot run {}: {}", program, e);
            DisplayError::CommandUnavailable
        })?;
        if !output.status.success() {
            return Err(DisplayError::CommandFailed {
                status: output.status.code(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub struct ShellSwitch<R> {
    program: String,
    runner: R,
}

impl<R: CommandRunner> ShellSwitch<R> {
    pub fn new(program: impl Into<String>, runner: R) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    /// `true` if the tool reports the output as off.
    pub fn is_reported_off(&mut self) -> Result<bool, DisplayError> {
        let reply = self.runner.run(&self.program, &["display_power"])?;
        Ok(reply.trim_start().starts_with("display_power=0"))
    }

    /// Turn the output on without querying first.
    pub fn force_on(&mut self) -> Result<(), DisplayError> {
        self.runner.run(&self.program, &["display_power", "1"])?;
        info!("Display: output forced on");
        Ok(())
    }
}

impl<R: CommandRunner> PowerSwitch for ShellSwitch<R> {
    fn switch_on(&mut self) -> Result<(), DisplayError> {
        if self.is_reported_off()? {
            self.runner.run(&self.program, &["display_power", "1"])?;
            info!("Display: output on");
        } else {
            debug!("Display: output already on");
        }
        Ok(())
    }

    fn switch_off(&mut self) -> Result<(), DisplayError> {
        self.runner.run(&self.program, &["display_power", "0"])?;
        info!("Display: output off");
        Ok(())
    }
}
