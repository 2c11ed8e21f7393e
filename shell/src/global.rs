use crate::job;

/// Interpreter state, created once at start-up and passed to whatever needs it.
pub struct State {
	pub job_table: job::JobTable,
}

impl State {
	pub fn new() -> State {
		let job_table = job::JobTable::new();
		State { job_table: job_table }
	}
}
