use std::os::fd::OwnedFd;

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::wait::{self,WaitStatus};
use nix::unistd::{self,Pid};
use tracing::{debug,warn};

use crate::builtin::{self,Flow};
use crate::error::ShellError;
use crate::global;
use crate::job::JobTable;
use crate::launch;
use crate::types::Pipeline;

/// Launches every stage of `pipeline`, left to right, and returns the children that started.
///
/// The pipe feeding stage i+1 is created right before stage i forks. A stage that cannot be
/// launched is reported and skipped; its neighbours see end-of-file or a broken pipe. If a pipe
/// cannot be created nothing further is forked.
fn spawn_stages(pipeline: &Pipeline) -> Vec<Pid> {
	let stages = &pipeline.stages;
	let mut children = Vec::with_capacity(stages.len());
	let mut pipe_stdin: Option<OwnedFd> = None;
	for (i, stage) in stages.iter().enumerate() {
		let is_last = i + 1 == stages.len();
		let mut pipe_stdout: Option<OwnedFd> = None;
		let mut pipe_stdin_next: Option<OwnedFd> = None;
		if !is_last {
			match unistd::pipe2(OFlag::O_CLOEXEC) {
				Ok((pipe_read, pipe_write)) => {
					debug!(boundary = i, "created pipe");
					pipe_stdin_next = Some(pipe_read);
					pipe_stdout = Some(pipe_write);
				},
				Err(e) => {
					eprintln!("jobsh: {}", ShellError::Pipe(e));
					break;
				},
			}
		}
		// launch consumes both ends handed to the child, closing the parent's copies
		match launch::launch(stage, pipe_stdin.take(), pipe_stdout) {
			Ok(pid) => children.push(pid),
			Err(e) => eprintln!("jobsh: stage {}: {}", i + 1, e),
		}
		pipe_stdin = pipe_stdin_next;
	}
	children
}

fn wait_foreground(pid: Pid, text: &str) {
	loop {
		match wait::waitpid(pid, None) {
			Ok(WaitStatus::Exited(_, 0)) => { return; },
			Ok(WaitStatus::Exited(_, code)) => {
				eprintln!("jobsh: command exited with non-zero status {}: {}", code, text);
				return;
			},
			Ok(WaitStatus::Signaled(_, signal, _)) => {
				eprintln!("jobsh: command terminated by {}: {}", signal, text);
				return;
			},
			Ok(_) | Err(Errno::EINTR) => {},
			Err(e) => {
				eprintln!("jobsh: {}", ShellError::Wait { pid: pid, source: e });
				return;
			},
		}
	}
}

/// Runs `pipeline` to completion, or registers its children in `job_table` if it ends in `&`.
pub fn run(job_table: &mut JobTable, pipeline: &Pipeline) {
	let interior = &pipeline.stages[..pipeline.stages.len().saturating_sub(1)];
	for stage in interior.iter().filter(|s| s.is_background) {
		warn!(stage = stage.text, "background marker on a non-terminal stage");
		eprintln!("jobsh: ignoring '&' before '|': {}", stage.text);
	}

	let children = spawn_stages(pipeline);
	if pipeline.is_background() {
		for pid in children {
			job_table.insert(pid, pipeline.text);
			println!("Background process started: {} (PID: {})", pipeline.text, pid);
		}
	} else {
		for pid in children {
			wait_foreground(pid, pipeline.text);
		}
	}
}

/// Dispatches a parsed line: a line that is exactly a built-in's name runs in-process,
/// anything else goes through `run`.
pub fn eval(state: &mut global::State, pipeline: &Pipeline) -> Flow {
	if let Some(stage) = pipeline.single_stage() {
		if stage.arguments.len() == 1 && stage.redirects.is_empty() && !stage.is_background {
			if let Some(func) = builtin::match_builtin(stage.arguments[0]) {
				return func(state, &[]);
			}
		}
	}
	run(&mut state.job_table, pipeline);
	Flow::Continue
}
