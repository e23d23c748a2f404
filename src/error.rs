//! Structured error taxonomy for the minor-finder engines.
//!
//! Mirrors the categories the original `cknots` tooling handled ad hoc
//! (malformed input aborts ingest, bad parameters abort before search,
//! internal contract violations assert-and-abort): input-format errors,
//! parameter errors, engine-internal contract violations, and frontier
//! (state-space) exhaustion. The search sweep itself never returns an
//! error for "zero minors found" - that is a valid, successful outcome.

use std::fmt;

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
	/// Malformed NODE/EDGE/decomposition token, unknown node reference,
	/// FORGET_NODE on an absent name, or a non-empty bag at end-of-stream.
	#[error("{source_file}:{line}: {message}")]
	Parse {
		source_file: String,
		line: usize,
		message: String,
	},
	/// A CLI parameter is infeasible for the chosen encoding, e.g. `k > 8`
	/// overflows the L-engine's 32-bit segment masks, or `width > 8` breaks
	/// the K6-engine's 3-bit branch-id packing.
	#[error("invalid parameter: {0}")]
	InvalidParameter(String),
	/// Caught by the post-hoc minor validator; in debug builds this should
	/// never be reached because `debug_assert!` fires first.
	#[error("internal contract violation: {0}")]
	Internal(String),
	/// The frontier (partial-state set) exceeded its configured bound.
	/// Partial results are discarded, not emitted.
	#[error("frontier exceeded {limit} states, aborting")]
	FrontierExhausted { limit: usize },
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
	pub fn parse(source_file: impl Into<String>, line: usize, message: impl fmt::Display) -> Self {
		EngineError::Parse { source_file: source_file.into(), line, message: message.to_string() }
	}
}
