use std::convert::Infallible;
use std::ffi::CString;
use std::fs;
use std::io::{self,Write};
use std::os::fd::{AsRawFd,IntoRawFd,OwnedFd,RawFd};
use std::os::unix::fs::OpenOptionsExt;

use nix::fcntl::{self,FcntlArg,FdFlag};
use nix::sys::signal::{self,SigHandler,Signal};
use nix::unistd::{self,ForkResult,Pid};
use tracing::debug;

use crate::error::{Result,ShellError};
use crate::types::Stage;

const OUTPUT_MODE: u32 = 0o644;
const FAILURE_STATUS: libc::c_int = 1;

/// Moves `fd` onto the standard stream `target`. The original is closed when `fd` drops.
fn attach(fd: OwnedFd, target: RawFd) -> Result<()> {
	if fd.as_raw_fd() == target {
		// already in place; keep it open across exec instead of closing it
		fcntl::fcntl(target, FcntlArg::F_SETFD(FdFlag::empty())).map_err(ShellError::Dup)?;
		let _ = fd.into_raw_fd();
		return Ok(());
	}
	unistd::dup2(fd.as_raw_fd(), target).map_err(ShellError::Dup)?;
	Ok(())
}

fn open_redirect(path: &str, options: &fs::OpenOptions) -> Result<OwnedFd> {
	let file = options.open(path).map_err(|e| ShellError::RedirectOpen { path: path.to_string(), source: e })?;
	Ok(file.into())
}

fn do_exec_stage(stage: &Stage, stdin: Option<OwnedFd>, stdout: Option<OwnedFd>) -> Result<Infallible> {
	// the interpreter ignores SIGPIPE and that disposition would survive exec
	let _ = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) };
	match stdin {
		Some(fd) => attach(fd, libc::STDIN_FILENO)?,
		None => if let Some(path) = stage.input() {
			let fd = open_redirect(path, fs::OpenOptions::new().read(true))?;
			attach(fd, libc::STDIN_FILENO)?;
		},
	}
	match stdout {
		Some(fd) => attach(fd, libc::STDOUT_FILENO)?,
		None => if let Some(path) = stage.output() {
			let fd = open_redirect(path, fs::OpenOptions::new().write(true).create(true).truncate(true).mode(OUTPUT_MODE))?;
			attach(fd, libc::STDOUT_FILENO)?;
		},
	}

	let argv: std::result::Result<Vec<CString>, _> = stage.arguments.iter().map(|&s| CString::new(s)).collect();
	let argv: Vec<CString> = argv?;
	unistd::execvp(&argv[0], &argv).map_err(|e| ShellError::Exec { command: stage.text.to_string(), source: e })
}

fn exec_stage(stage: &Stage, stdin: Option<OwnedFd>, stdout: Option<OwnedFd>) -> ! {
	if let Err(e) = do_exec_stage(stage, stdin, stdout) {
		let _ = writeln!(&mut io::stderr(), "jobsh: {}", e);
	}
	// _exit skips the parent's stdio buffers this process inherited
	unsafe { libc::_exit(FAILURE_STATUS) }
}

/// Forks a child for `stage` and replaces its image with the stage's program.
///
/// `stdin` and `stdout` are the pipe ends this stage inherits from its neighbours; they take
/// precedence over the stage's own `<` and `>` files. Both are consumed: the parent's copies
/// are closed before this returns, on success and on failure alike. The child never returns.
pub fn launch(stage: &Stage, stdin: Option<OwnedFd>, stdout: Option<OwnedFd>) -> Result<Pid> {
	let name = match stage.name() {
		Some(name) => name,
		None => { return Err(ShellError::EmptyCommand); },
	};
	match unsafe { unistd::fork() }.map_err(ShellError::Fork)? {
		ForkResult::Parent { child } => {
			debug!(pid = %child, program = name, "forked stage");
			Ok(child)
		},
		ForkResult::Child => exec_stage(stage, stdin, stdout),
	}
}
