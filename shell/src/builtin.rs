use std::io::{self,Write};

use nix::sys::wait::WaitStatus;
use tracing::debug;

use crate::global;
use crate::job::JobEvent;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Flow { Continue, Exit }

pub fn builtin_exit(_: &mut global::State, _: &[&str]) -> Flow {
	Flow::Exit
}

fn report(event: &JobEvent) {
	let job = event.job();
	match *event {
		JobEvent::Completed(_, WaitStatus::Signaled(_, signal, _)) =>
			println!("Background process completed: {} (killed by {})", job.command, signal),
		JobEvent::Completed(..) =>
			println!("Background process completed: {}", job.command),
		JobEvent::Failed(_, ref e) =>
			eprintln!("jobsh: {} ({})", e, job.command),
	}
}

pub fn builtin_myjobs(state: &mut global::State, _: &[&str]) -> Flow {
	for event in state.job_table.poll() {
		debug!(pid = %event.job().pid, state = ?event.state(), "background job left the table");
		report(&event);
	}
	let stdout = io::stdout();
	let mut out = stdout.lock();
	let _ = writeln!(out, "Background processes:");
	for job in state.job_table.list() {
		let _ = writeln!(out, "PID: {}, Command: {}", job.pid, job.command);
	}
	let _ = out.flush();
	Flow::Continue
}

pub fn match_builtin(name: &str) -> Option<fn(&mut global::State, &[&str]) -> Flow> {
	match name {
		"exit" => Some(builtin_exit),
		"myjobs" => Some(builtin_myjobs),
		_ => None,
	}
}
