use std::io;
use std::process::ExitCode;
use io::Write;
use io::BufRead;

use anyhow::{Context,Result};
use tracing::debug;
use tracing_subscriber::{fmt,prelude::*,EnvFilter};

use jobsh::{builtin,eval,global,parser};

const PROMPT: &'static [u8] = b"jobsh> ";

fn run() -> Result<()> {
	let mut state = global::State::new();
	let mut stdout = io::stdout();
	let stdin = io::stdin();
	let mut stdin_locked = stdin.lock();
	let mut line: Vec<u8> = vec![];
	loop {
		stdout.write_all(PROMPT).context("failed to write prompt")?;
		stdout.flush().context("failed to write prompt")?;
		line.clear();
		if stdin_locked.read_until(b'\n', &mut line).context("failed to read command line")? == 0 {
			if !state.job_table.is_empty() {
				debug!(jobs = state.job_table.len(), "end of input with background jobs still listed");
			}
			break;
		}
		let text = String::from_utf8_lossy(&line);
		let pipeline = parser::parse(&text);
		if eval::eval(&mut state, &pipeline) == builtin::Flow::Exit {
			debug!(jobs = state.job_table.len(), "exit");
			break;
		}
	}
	Ok(())
}

fn main() -> ExitCode {
	tracing_subscriber::registry()
		.with(fmt::layer().with_writer(io::stderr))
		.with(EnvFilter::from_default_env())
		.init();

	match run() {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("jobsh: {:?}", e);
			ExitCode::FAILURE
		}
	}
}
