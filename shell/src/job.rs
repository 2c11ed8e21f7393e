use nix::sys::wait::{self,WaitPidFlag,WaitStatus};
use nix::unistd::Pid;
use tracing::debug;

use crate::error::ShellError;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum JobState { Running, Completed, Failed }

trait WaitStatusExt {
	fn state(self) -> JobState;
}

impl WaitStatusExt for WaitStatus {
	fn state(self) -> JobState {
		match self {
			WaitStatus::Exited(..) => JobState::Completed,
			WaitStatus::Signaled(..) => JobState::Completed,
			_ => JobState::Running,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct BackgroundJob {
	pub pid: Pid,
	pub command: String,
}

/// A job that left the table during a poll.
#[derive(Debug)]
pub enum JobEvent {
	Completed(BackgroundJob, WaitStatus),
	Failed(BackgroundJob, ShellError),
}

impl JobEvent {
	pub fn job(&self) -> &BackgroundJob {
		match *self {
			JobEvent::Completed(ref job, _) => job,
			JobEvent::Failed(ref job, _) => job,
		}
	}

	pub fn state(&self) -> JobState {
		match *self {
			JobEvent::Completed(..) => JobState::Completed,
			JobEvent::Failed(..) => JobState::Failed,
		}
	}
}

/// Background children in insertion order. Entries are only ever removed by `poll`.
#[derive(Debug, Default)]
pub struct JobTable {
	jobs: Vec<BackgroundJob>,
}

impl JobTable {
	pub fn new() -> JobTable {
		JobTable { jobs: vec![] }
	}

	pub fn insert(&mut self, pid: Pid, command: &str) {
		debug!(pid = %pid, command = command, "registered background job");
		self.jobs.push(BackgroundJob { pid: pid, command: command.to_string() });
	}

	/// Reaps every job that is no longer running without blocking.
	///
	/// Exited or signalled children are returned as `Completed`; a job whose wait call fails is
	/// returned as `Failed`. Both are removed. Running jobs stay where they are.
	pub fn poll(&mut self) -> Vec<JobEvent> {
		let mut events = vec![];
		let mut i = 0;
		while i < self.jobs.len() {
			let pid = self.jobs[i].pid;
			match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
				Ok(status) if status.state() == JobState::Running => {
					i += 1;
				},
				Ok(status) => {
					let job = self.jobs.remove(i);
					debug!(pid = %pid, ?status, "reaped background job");
					events.push(JobEvent::Completed(job, status));
				},
				Err(e) => {
					let job = self.jobs.remove(i);
					events.push(JobEvent::Failed(job, ShellError::Wait { pid: pid, source: e }));
				},
			}
		}
		events
	}

	pub fn list(&self) -> &[BackgroundJob] {
		&self.jobs
	}

	pub fn len(&self) -> usize {
		self.jobs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.jobs.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::process;
	use std::thread::sleep;
	use std::time::{Duration,Instant};

	fn spawn(program: &str, args: &[&str]) -> Pid {
		let child = process::Command::new(program).args(args).spawn().unwrap();
		Pid::from_raw(child.id() as i32)
	}

	fn poll_until_empty(table: &mut JobTable) -> Vec<JobEvent> {
		let deadline = Instant::now() + Duration::from_secs(10);
		let mut events = vec![];
		while !table.is_empty() && Instant::now() < deadline {
			events.extend(table.poll());
			sleep(Duration::from_millis(20));
		}
		events
	}

	#[test]
	fn exited_job_is_removed_once() {
		let mut table = JobTable::new();
		let pid = spawn("true", &[]);
		table.insert(pid, "true &");

		let events = poll_until_empty(&mut table);
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].state(), JobState::Completed);
		assert_eq!(events[0].job().command, "true &");
		match events[0] {
			JobEvent::Completed(_, WaitStatus::Exited(p, 0)) => assert_eq!(p, pid),
			ref e => panic!("unexpected event {:?}", e),
		}

		assert!(table.poll().is_empty());
		assert!(table.list().is_empty());
	}

	#[test]
	fn running_job_stays_listed() {
		let mut table = JobTable::new();
		let pid = spawn("sleep", &["5"]);
		table.insert(pid, "sleep 5 &");

		assert!(table.poll().is_empty());
		assert_eq!(table.list(), &[BackgroundJob { pid: pid, command: "sleep 5 &".to_string() }]);

		nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGKILL).unwrap();
		let events = poll_until_empty(&mut table);
		assert_eq!(events.len(), 1);
		match events[0] {
			JobEvent::Completed(_, WaitStatus::Signaled(p, nix::sys::signal::Signal::SIGKILL, _)) => assert_eq!(p, pid),
			ref e => panic!("unexpected event {:?}", e),
		}
	}

	#[test]
	fn wait_error_fails_and_removes_job() {
		let mut table = JobTable::new();
		// pid 1 is never our child
		table.insert(Pid::from_raw(1), "init");
		let events = table.poll();
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].state(), JobState::Failed);
		assert!(table.is_empty());
	}

	#[test]
	fn insertion_order_is_kept() {
		let mut table = JobTable::new();
		let first = spawn("sleep", &["5"]);
		let second = spawn("sleep", &["5"]);
		table.insert(first, "first");
		table.insert(second, "second");
		let commands: Vec<&str> = table.list().iter().map(|j| j.command.as_str()).collect();
		assert_eq!(commands, vec!["first", "second"]);
		assert_eq!(table.len(), 2);

		for &pid in &[first, second] {
			nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGKILL).unwrap();
		}
		poll_until_empty(&mut table);
		assert!(table.is_empty());
	}
}
