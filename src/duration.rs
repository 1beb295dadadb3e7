//! Derived timing fields
//!
//! The single source of truth for schedule arithmetic. Extractors and the
//! normalizer both call into here so `total_minutes` can never diverge
//! between paths.

use crate::models::schedule::{Block, Cues};

/// Total minutes at or above which the halfway cue fires
const HALFWAY_MINUTES: u32 = 10;
/// Round count at or above which the halfway cue fires
const HALFWAY_ROUNDS: u32 = 8;

/// ---------------------------------------------------------------------------
/// Block durations
/// ---------------------------------------------------------------------------

/// Whole minutes a single block occupies.
///
/// For a sequenced interval only the sequence items and their trailing
/// rests count; the block-level `rest_seconds` is ignored.
pub fn block_minutes(block: &Block) -> u32 {
  match block {
    Block::Emom { minutes, .. } => *minutes,
    Block::Tabata {
      rounds,
      work_seconds,
      rest_seconds,
      ..
    } => ceil_minutes(rounds * (work_seconds + rest_seconds)),
    Block::Circuit {
      rounds,
      exercises,
      rest_between_rounds_seconds,
    } => {
      let round_work: u32 = exercises.iter().map(|e| e.seconds).sum();
      let rest_total = rounds.saturating_sub(1) * rest_between_rounds_seconds;
      ceil_minutes(rounds * round_work + rest_total)
    }
    Block::Interval {
      sets,
      work_seconds,
      rest_seconds,
      sequence,
    } => {
      if sequence.is_empty() {
        ceil_minutes(sets * (work_seconds + rest_seconds))
      } else {
        let per_set: u32 = sequence
          .iter()
          .map(|item| item.seconds + item.rest_after_seconds.unwrap_or(0))
          .sum();
        ceil_minutes(sets * per_set)
      }
    }
  }
}

/// Sum of all block durations in whole minutes
pub fn total_minutes(blocks: &[Block]) -> u32 {
  blocks.iter().map(block_minutes).sum()
}

fn ceil_minutes(seconds: u32) -> u32 {
  seconds.div_ceil(60)
}

/// ---------------------------------------------------------------------------
/// Cues
/// ---------------------------------------------------------------------------

/// Cue flags for a schedule. Start/last-round/tts are always on; halfway
/// only makes sense for longer or round-heavy workouts.
pub fn cues_for(total_minutes: u32, blocks: &[Block]) -> Cues {
  let round_heavy = blocks.iter().any(|b| block_rounds(b) >= HALFWAY_ROUNDS);
  Cues {
    start: true,
    halfway: total_minutes >= HALFWAY_MINUTES || round_heavy,
    last_round: true,
    tts: true,
  }
}

/// Round count of a block; an EMOM counts one round per minute
fn block_rounds(block: &Block) -> u32 {
  match block {
    Block::Emom { minutes, .. } => *minutes,
    Block::Tabata { rounds, .. } => *rounds,
    Block::Circuit { rounds, .. } => *rounds,
    Block::Interval { sets, .. } => *sets,
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::schedule::{CircuitExercise, EmomInstruction, SequenceItem};

  #[test]
  fn test_emom_minutes_pass_through() {
    let block = Block::Emom {
      minutes: 20,
      instructions: vec![EmomInstruction {
        minute_mod: None,
        name: "Work".to_string(),
      }],
    };
    assert_eq!(block_minutes(&block), 20);
  }

  #[test]
  fn test_tabata_rounds_up_to_whole_minutes() {
    // 8 * 30s = 240s = exactly 4 minutes
    let block = Block::Tabata {
      rounds: 8,
      work_seconds: 20,
      rest_seconds: 10,
      exercise: "Work".to_string(),
    };
    assert_eq!(block_minutes(&block), 4);

    // 7 * 30s = 210s -> rounds up to 4
    let block = Block::Tabata {
      rounds: 7,
      work_seconds: 20,
      rest_seconds: 10,
      exercise: "Work".to_string(),
    };
    assert_eq!(block_minutes(&block), 4);
  }

  #[test]
  fn test_circuit_excludes_rest_after_final_round() {
    // 3 rounds * 60s of work + 2 * 30s rest = 240s = 4 min
    let block = Block::Circuit {
      rounds: 3,
      exercises: vec![
        CircuitExercise {
          name: "Squats".to_string(),
          seconds: 30,
          reps: None,
        },
        CircuitExercise {
          name: "Push-ups".to_string(),
          seconds: 30,
          reps: None,
        },
      ],
      rest_between_rounds_seconds: 30,
    };
    assert_eq!(block_minutes(&block), 4);
  }

  #[test]
  fn test_simple_interval_duration() {
    // 20 * (40 + 20) = 1200s = 20 min
    let block = Block::Interval {
      sets: 20,
      work_seconds: 40,
      rest_seconds: 20,
      sequence: vec![],
    };
    assert_eq!(block_minutes(&block), 20);
  }

  #[test]
  fn test_sequenced_interval_counts_item_rests_not_block_rest() {
    // 4 * (45 + 15 + 45) = 420s = 7 min; block rest_seconds is ignored
    let block = Block::Interval {
      sets: 4,
      work_seconds: 45,
      rest_seconds: 150,
      sequence: vec![
        SequenceItem {
          name: "Run".to_string(),
          seconds: 45,
          rest_after_seconds: Some(15),
        },
        SequenceItem {
          name: "Squat".to_string(),
          seconds: 45,
          rest_after_seconds: None,
        },
      ],
    };
    assert_eq!(block_minutes(&block), 7);
  }

  #[test]
  fn test_total_minutes_sums_blocks() {
    let blocks = vec![
      Block::Emom {
        minutes: 10,
        instructions: vec![],
      },
      Block::Tabata {
        rounds: 8,
        work_seconds: 20,
        rest_seconds: 10,
        exercise: "Work".to_string(),
      },
    ];
    assert_eq!(total_minutes(&blocks), 14);
  }

  #[test]
  fn test_halfway_cue_thresholds() {
    let short = vec![Block::Interval {
      sets: 4,
      work_seconds: 30,
      rest_seconds: 15,
      sequence: vec![],
    }];
    let cues = cues_for(total_minutes(&short), &short);
    assert!(!cues.halfway);
    assert!(cues.start && cues.last_round && cues.tts);

    // Round-heavy fires even under ten minutes
    let tabata = vec![Block::Tabata {
      rounds: 8,
      work_seconds: 20,
      rest_seconds: 10,
      exercise: "Work".to_string(),
    }];
    assert!(cues_for(total_minutes(&tabata), &tabata).halfway);

    // Long duration fires regardless of rounds
    let emom = vec![Block::Emom {
      minutes: 12,
      instructions: vec![],
    }];
    assert!(cues_for(total_minutes(&emom), &emom).halfway);
  }
}
