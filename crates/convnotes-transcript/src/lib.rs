mod aggregate;
mod parse;
mod record;

pub use aggregate::{aggregate_dir, aggregate_for_transcript, Aggregated, TRANSCRIPT_EXTENSION};
pub use parse::{parse_transcript, ModelSighting, ParsedTranscript, INTERRUPTION_MARKER};
