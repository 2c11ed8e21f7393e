pub mod types;
pub mod parser;
pub mod error;
pub mod launch;
pub mod job;
pub mod global;
pub mod builtin;
pub mod eval;
