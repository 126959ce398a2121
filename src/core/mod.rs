// Group resolution: parse a line, filter by shape, then prune or pick a winner.

pub mod classify;
pub mod dominance;
pub mod engine;
pub mod record;
pub mod shape;
pub mod winner;

pub use engine::{Decision, DecisionSink, Engine, EngineOptions, GroupDecision, LineRange, RunReport, Strategy};
pub use record::{ImageRecord, MalformedPolicy, ParsedLine, RecordParseError};
