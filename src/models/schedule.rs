//! Canonical timer-schedule types
//!
//! Every pipeline path (deterministic extraction, AI normalization, the
//! terminal fallback) converges on `Schedule`. The playback client consumes
//! this shape directly; `debug` is informational and not part of the
//! playback contract.

use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Schedule
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
  pub title: String,

  /// Derived from the blocks, never trusted from input
  pub total_minutes: u32,

  /// Non-empty; currently always a single block
  pub blocks: Vec<Block>,

  pub cues: Cues,
  pub debug: DebugInfo,
}

/// Audible/visual cue flags for the playback client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cues {
  pub start: bool,
  pub halfway: bool,
  pub last_round: bool,
  pub tts: bool,
}

/// Diagnostic metadata, not part of the playback contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugInfo {
  pub used_ai: bool,
  pub inferred_mode: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
}

/// ---------------------------------------------------------------------------
/// Blocks
/// ---------------------------------------------------------------------------

/// One archetype-typed segment of a workout schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
  /// One instruction at the top of each minute for `minutes` minutes.
  /// Odd/even instructions alternate; a single instruction repeats.
  #[serde(rename = "EMOM")]
  Emom {
    minutes: u32,
    instructions: Vec<EmomInstruction>,
  },

  /// `rounds` repetitions of (work, rest), same exercise throughout
  #[serde(rename = "TABATA")]
  Tabata {
    rounds: u32,
    work_seconds: u32,
    rest_seconds: u32,
    exercise: String,
  },

  /// `rounds` passes over the exercise list, resting between rounds
  /// (no rest after the final round)
  #[serde(rename = "CIRCUIT")]
  Circuit {
    rounds: u32,
    exercises: Vec<CircuitExercise>,
    rest_between_rounds_seconds: u32,
  },

  /// Simple when `sequence` is empty: `sets` repetitions of (work, rest).
  /// Sequenced otherwise: each set runs the full sequence and the items'
  /// own trailing rests replace the block-level `rest_seconds`.
  #[serde(rename = "INTERVAL")]
  Interval {
    sets: u32,
    work_seconds: u32,
    rest_seconds: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sequence: Vec<SequenceItem>,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmomInstruction {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub minute_mod: Option<MinuteMod>,
  pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinuteMod {
  Odd,
  Even,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitExercise {
  pub name: String,
  pub seconds: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reps: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceItem {
  pub name: String,
  pub seconds: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rest_after_seconds: Option<u32>,
}

/// ---------------------------------------------------------------------------
/// Inbound request
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
  #[serde(default)]
  pub text: String,
  #[serde(default)]
  pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
  pub level: UserLevel,
}

/// Only surfaces into the generative prompt; the deterministic path
/// ignores it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserLevel {
  Beginner,
  Intermediate,
  Advanced,
}

impl UserLevel {
  pub fn as_str(&self) -> &'static str {
    match self {
      UserLevel::Beginner => "beginner",
      UserLevel::Intermediate => "intermediate",
      UserLevel::Advanced => "advanced",
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
