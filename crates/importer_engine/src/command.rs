//! External command lines built from typed argument slots.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Command;

use importer_logging::{importer_debug, importer_warn};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unable to create temporary file: {0}")]
    TempFile(#[source] io::Error),
    #[error("failed to run {command_line:?}: {source}")]
    Spawn {
        command_line: String,
        #[source]
        source: io::Error,
    },
}

/// One argument of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Appended verbatim (sub-commands, flags).
    Raw(String),
    /// Shell-escaped as a single token.
    Quoted(String),
    /// Written to a temporary file whose quoted path takes the slot's place.
    TempFileBacked(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    slots: Vec<Slot>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            slots: Vec::new(),
        }
    }

    pub fn raw(mut self, value: impl Into<String>) -> Self {
        self.slots.push(Slot::Raw(value.into()));
        self
    }

    pub fn quoted(mut self, value: impl Into<String>) -> Self {
        self.slots.push(Slot::Quoted(value.into()));
        self
    }

    pub fn temp_file(mut self, content: impl Into<String>) -> Self {
        self.slots.push(Slot::TempFileBacked(content.into()));
        self
    }

    /// A raw flag, followed by its quoted value when given.
    pub fn switch(self, flag: impl Into<String>, value: Option<&str>) -> Self {
        let spec = self.raw(flag);
        match value {
            Some(value) => spec.quoted(value),
            None => spec,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Produce the command line, creating one temporary file per
    /// [`Slot::TempFileBacked`]. The files live as long as the result.
    pub fn render(&self) -> Result<RenderedCommand, CommandError> {
        let mut line = shell_words::quote(&self.program).into_owned();
        let mut temp_files = Vec::new();

        for slot in &self.slots {
            line.push(' ');
            match slot {
                Slot::Raw(value) => line.push_str(value),
                Slot::Quoted(value) => line.push_str(&shell_words::quote(value)),
                Slot::TempFileBacked(content) => {
                    let file = write_temp_file(content).map_err(CommandError::TempFile)?;
                    line.push_str(&shell_words::quote(&file.path().to_string_lossy()));
                    temp_files.push(file);
                }
            }
        }

        Ok(RenderedCommand { line, temp_files })
    }
}

fn write_temp_file(content: &str) -> io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// A command line ready to run, owning the temporary files it refers to.
#[derive(Debug)]
pub struct RenderedCommand {
    line: String,
    temp_files: Vec<NamedTempFile>,
}

impl RenderedCommand {
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn temp_paths(&self) -> Vec<PathBuf> {
        self.temp_files.iter().map(|f| f.path().to_path_buf()).collect()
    }
}

impl fmt::Display for RenderedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Runs a rendered command line to completion; its output is not inspected.
pub trait CommandRunner {
    fn run(&self, command: &RenderedCommand) -> Result<(), CommandError>;
}

/// Runs command lines through `sh -c` in a fixed working directory.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
    working_dir: PathBuf,
}

impl ShellRunner {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            shell: "sh".to_string(),
            working_dir: working_dir.into(),
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &RenderedCommand) -> Result<(), CommandError> {
        importer_debug!("running {}", command.line());
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command.line())
            .current_dir(&self.working_dir)
            .output()
            .map_err(|source| CommandError::Spawn {
                command_line: command.line().to_string(),
                source,
            })?;

        // The exit status is reported but does not fail the pipeline.
        if !output.status.success() {
            importer_warn!(
                "{} exited with {}: {}",
                command.line(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}
