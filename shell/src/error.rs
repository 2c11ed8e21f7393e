use std::{ffi,io};

use nix::unistd::Pid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
	#[error("empty command")]
	EmptyCommand,
	#[error("failed to create child process: {0}")]
	Fork(#[source] nix::Error),
	#[error("failed to create pipe: {0}")]
	Pipe(#[source] nix::Error),
	#[error("failed to duplicate descriptor: {0}")]
	Dup(#[source] nix::Error),
	#[error("failed to open {path}: {source}")]
	RedirectOpen { path: String, source: io::Error },
	#[error("failed to execute command: {command}: {source}")]
	Exec { command: String, source: nix::Error },
	#[error("error occurred while waiting for process {pid}: {source}")]
	Wait { pid: Pid, source: nix::Error },
	#[error("nul byte in argument: {0}")]
	Nul(#[from] ffi::NulError),
}

pub type Result<T> = std::result::Result<T, ShellError>;
