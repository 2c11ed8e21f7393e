use tracing::debug;

use crate::types::*;

const PIPE: char = '|';
const BACKGROUND: char = '&';

fn redirect_type(token: &str) -> Option<RedirectType> {
	match token {
		"<" => Some(RedirectType::Input),
		">" => Some(RedirectType::Output),
		_ => None,
	}
}

fn strip_background(text: &str) -> (&str, bool) {
	match text.strip_suffix(BACKGROUND) {
		Some(rest) => (rest.trim_end(), true),
		None => (text, false),
	}
}

fn parse_stage(text: &str) -> Stage {
	let (text, is_background) = strip_background(text.trim());
	let tokens: Vec<&str> = text.split_whitespace().collect();

	let mut arguments: Vec<&str> = Vec::with_capacity(tokens.len());
	let mut redirects: Vec<Redirect> = vec![];
	let mut i = 0;
	while i < tokens.len() {
		// an operator with nothing after it stays an ordinary argument
		match (redirect_type(tokens[i]), tokens.get(i + 1)) {
			(Some(typ), Some(&target)) => {
				redirects.push(Redirect { target: target, typ: typ });
				i += 2;
			},
			_ => {
				arguments.push(tokens[i]);
				i += 1;
			},
		}
	}

	Stage { text: text, arguments: arguments, redirects: redirects, is_background: is_background }
}

pub fn parse(line: &str) -> Pipeline {
	let text = line.trim();
	let stages: Vec<Stage> = text.split(PIPE).map(parse_stage).collect();
	debug!(stages = stages.len(), background = stages.last().map_or(false, |s| s.is_background), "parsed pipeline");
	Pipeline { text: text, stages: stages }
}
