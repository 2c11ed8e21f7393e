#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType { Input, Output }

#[derive(Debug, PartialEq, Eq)]
pub struct Redirect<'a> {
	pub target: &'a str,
	pub typ: RedirectType,
}

#[derive(Debug)]
pub struct Stage<'a> {
	pub text: &'a str,
	pub arguments: Vec<&'a str>,
	pub redirects: Vec<Redirect<'a>>,
	pub is_background: bool,
}

impl<'a> Stage<'a> {
	fn redirect(&self, typ: RedirectType) -> Option<&'a str> {
		self.redirects.iter().rev().find(|r| r.typ == typ).map(|r| r.target)
	}

	/// File named by the last `<` of the stage, if any.
	pub fn input(&self) -> Option<&'a str> {
		self.redirect(RedirectType::Input)
	}

	/// File named by the last `>` of the stage, if any.
	pub fn output(&self) -> Option<&'a str> {
		self.redirect(RedirectType::Output)
	}

	pub fn name(&self) -> Option<&'a str> {
		self.arguments.first().cloned()
	}
}

/// A line split on `|`. `stages` is never empty.
#[derive(Debug)]
pub struct Pipeline<'a> {
	pub text: &'a str,
	pub stages: Vec<Stage<'a>>,
}

impl<'a> Pipeline<'a> {
	/// Only the terminal stage's `&` decides whether the pipeline runs asynchronously.
	pub fn is_background(&self) -> bool {
		self.stages.last().map_or(false, |s| s.is_background)
	}

	pub fn single_stage(&self) -> Option<&Stage<'a>> {
		match self.stages.as_slice() {
			[stage] => Some(stage),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn stage<'a>(arguments: Vec<&'a str>, redirects: Vec<Redirect<'a>>, is_background: bool) -> Stage<'a> {
		Stage { text: "", arguments: arguments, redirects: redirects, is_background: is_background }
	}

	#[test]
	fn last_redirect_wins() {
		let s = stage(vec!["cat"], vec![
			Redirect { target: "a", typ: RedirectType::Input },
			Redirect { target: "out", typ: RedirectType::Output },
			Redirect { target: "b", typ: RedirectType::Input },
		], false);
		assert_eq!(s.input(), Some("b"));
		assert_eq!(s.output(), Some("out"));
		assert_eq!(s.name(), Some("cat"));
	}

	#[test]
	fn background_follows_terminal_stage() {
		let p = Pipeline { text: "", stages: vec![stage(vec!["a"], vec![], true), stage(vec!["b"], vec![], false)] };
		assert!(!p.is_background());
		assert!(p.single_stage().is_none());

		let p = Pipeline { text: "", stages: vec![stage(vec!["a"], vec![], false), stage(vec!["b"], vec![], true)] };
		assert!(p.is_background());
	}
}
