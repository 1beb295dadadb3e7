//! Default field values applied when a source omits them
//!
//! Every extractor and every normalizer branch consults this table; no
//! branch carries its own inline defaults.

/// Fallback schedule title when a source provides none
pub const TITLE: &str = "Workout";

/// Generic placeholder exercise name
pub const EXERCISE_NAME: &str = "Work";

// EMOM
pub const EMOM_MINUTES: u32 = 20;

// TABATA (canonical 8 x 20/10)
pub const TABATA_ROUNDS: u32 = 8;
pub const TABATA_WORK_SECONDS: u32 = 20;
pub const TABATA_REST_SECONDS: u32 = 10;

// CIRCUIT
pub const CIRCUIT_ROUNDS: u32 = 3;
pub const CIRCUIT_EXERCISE_SECONDS: u32 = 30;
pub const CIRCUIT_ROUND_REST_SECONDS: u32 = 30;

// INTERVAL
pub const INTERVAL_SETS: u32 = 10;
pub const INTERVAL_WORK_SECONDS: u32 = 30;
pub const INTERVAL_REST_SECONDS: u32 = 15;

// Sequenced intervals
pub const SEQUENCE_SETS: u32 = 3;
pub const SEQUENCE_ITEM_SECONDS: u32 = 20;
/// Forced onto the final exercise when the text says "rest" but no rest
/// could be parsed from the sequence itself
pub const SEQUENCE_FINAL_REST_SECONDS: u32 = 15;
/// Between-round rest inferred by the HIIT extractor when no numeral
/// follows "rest"
pub const HIIT_ROUND_REST_SECONDS: u32 = 30;

// Work/rest-pattern extractor (":45 WORK // :15 REST" texts)
pub const WORK_REST_ROUNDS: u32 = 4;
pub const WORK_REST_ITEM_REST_SECONDS: u32 = 15;
/// "Rest 2:30 after each round" when the clause carries no parsable time
pub const WORK_REST_ROUND_REST_SECONDS: u32 = 150;

// Terminal fallback schedule: 20 rounds of 40s work / 20s rest
pub const FALLBACK_SETS: u32 = 20;
pub const FALLBACK_WORK_SECONDS: u32 = 40;
pub const FALLBACK_REST_SECONDS: u32 = 20;
