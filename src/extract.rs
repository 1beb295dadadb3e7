//! Deterministic pattern extractors
//!
//! Each extractor recognizes one workout archetype from raw text via
//! lexical cues and numeric capture, producing a canonical schedule or
//! declining. The chain tries them in decreasing cue specificity; the
//! first structural match wins, no confidence scoring.

use std::sync::LazyLock;

use regex::Regex;

use crate::defaults;
use crate::duration;
use crate::models::schedule::{
  Block, CircuitExercise, DebugInfo, EmomInstruction, MinuteMod, Schedule, SequenceItem,
};

/// ---------------------------------------------------------------------------
/// Patterns
/// ---------------------------------------------------------------------------

static EMOM_CUE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\bemom\b|\bevery\s+minute\b").expect("valid emom cue regex"));
static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b(\d{1,3})\s*[- ]?min(?:ute)?s?\b").expect("valid minutes regex")
});
static ODD_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\bodd\b:?\s*([^.;,\n]+)").expect("valid odd regex"));
static EVEN_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\beven\b:?\s*([^.;,\n]+)").expect("valid even regex"));

static TABATA_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\btabata\b").expect("valid tabata regex"));

static ROUNDS_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,3})\s*rounds?\b").expect("valid rounds regex"));
static TOTAL_ROUNDS_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\btotal\s+(\d{1,3})\s*rounds?\b").expect("valid total rounds regex")
});

static WORK_SECS_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b(\d{1,4})\s*s(?:ec(?:ond)?s?)?\s*(?:of\s+)?(?:work|on)\b")
    .expect("valid work seconds regex")
});
static REST_SECS_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b(\d{1,4})\s*s(?:ec(?:ond)?s?)?\s*(?:of\s+)?rest\b")
    .expect("valid rest seconds regex")
});
static REST_AFTER_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\brest\b\D{0,8}?(\d{1,4})").expect("valid rest after regex"));
static BARE_SECS_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b(\d{1,4})\s*s(?:ec(?:ond)?s?)?\b").expect("valid bare seconds regex")
});
static REST_WORD_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\brest\b").expect("valid rest word regex"));

static SEQ_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b(\d{1,4})\s*s(?:ec(?:ond)?s?)?\s+([a-z][a-z \-']*)")
    .expect("valid sequence item regex")
});

static WORK_REST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i):(\d{1,2})\s*work\s*//\s*:(\d{1,2})\s*rest").expect("valid work/rest marker")
});
static ROUND_REST_CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\brest\b[^\n]*\bafter\s+each\s+round\b").expect("valid round rest clause")
});
static ROUND_REST_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\brest\s*(\d{1,2}):(\d{2})\b").expect("valid round rest time regex")
});

/// ---------------------------------------------------------------------------
/// Extractor chain
/// ---------------------------------------------------------------------------

/// Try every extractor in fixed priority order; first success wins.
pub fn extract_schedule(text: &str) -> Option<Schedule> {
  extract_emom(text)
    .or_else(|| extract_tabata(text))
    .or_else(|| extract_hiit(text))
    .or_else(|| extract_interval(text))
    .or_else(|| extract_work_rest(text))
}

/// Scan the text for a bare minute count, e.g. "20 min"
pub(crate) fn scan_minutes(text: &str) -> Option<u32> {
  capture_u32(&MINUTES_RE, text)
}

fn capture_u32(re: &Regex, text: &str) -> Option<u32> {
  re.captures(text)
    .and_then(|c| c.get(1))
    .and_then(|m| m.as_str().parse::<u32>().ok())
    .filter(|n| *n > 0)
}

/// ---------------------------------------------------------------------------
/// EMOM
/// ---------------------------------------------------------------------------

/// Requires the EMOM cue and a minute count; partial matches are not
/// guessed.
pub(crate) fn extract_emom(text: &str) -> Option<Schedule> {
  if !EMOM_CUE_RE.is_match(text) {
    return None;
  }
  let minutes = scan_minutes(text)?;

  let mut instructions = Vec::new();
  if let Some(odd) = capture_phrase(&ODD_RE, text) {
    instructions.push(EmomInstruction {
      minute_mod: Some(MinuteMod::Odd),
      name: odd,
    });
  }
  if let Some(even) = capture_phrase(&EVEN_RE, text) {
    instructions.push(EmomInstruction {
      minute_mod: Some(MinuteMod::Even),
      name: even,
    });
  }
  if instructions.is_empty() {
    instructions.push(EmomInstruction {
      minute_mod: None,
      name: defaults::EXERCISE_NAME.to_string(),
    });
  }

  Some(schedule(
    format!("EMOM {} min", minutes),
    Block::Emom {
      minutes,
      instructions,
    },
    "EMOM",
  ))
}

fn capture_phrase(re: &Regex, text: &str) -> Option<String> {
  re.captures(text)
    .and_then(|c| c.get(1))
    .map(|m| m.as_str().trim().to_string())
    .filter(|s| !s.is_empty())
}

/// ---------------------------------------------------------------------------
/// TABATA
/// ---------------------------------------------------------------------------

pub(crate) fn extract_tabata(text: &str) -> Option<Schedule> {
  if !TABATA_RE.is_match(text) {
    return None;
  }

  let rounds = capture_u32(&ROUNDS_RE, text).unwrap_or(defaults::TABATA_ROUNDS);
  let work_seconds = capture_u32(&WORK_SECS_RE, text).unwrap_or(defaults::TABATA_WORK_SECONDS);
  let rest_seconds = capture_u32(&REST_SECS_RE, text).unwrap_or(defaults::TABATA_REST_SECONDS);

  Some(schedule(
    "Tabata".to_string(),
    Block::Tabata {
      rounds,
      work_seconds,
      rest_seconds,
      exercise: defaults::EXERCISE_NAME.to_string(),
    },
    "TABATA",
  ))
}

/// ---------------------------------------------------------------------------
/// HIIT sequence
/// ---------------------------------------------------------------------------

/// Requires an explicit round count and at least one "<n>s <label>"
/// capture. "total <n> rounds" takes priority over a bare "<n> rounds".
fn extract_hiit(text: &str) -> Option<Schedule> {
  let rounds = capture_u32(&TOTAL_ROUNDS_RE, text).or_else(|| capture_u32(&ROUNDS_RE, text))?;

  let mut items: Vec<(String, u32)> = Vec::new();
  for caps in SEQ_ITEM_RE.captures_iter(text) {
    let seconds = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
    let label = caps.get(2).map(|m| m.as_str().trim().to_string());
    if let (Some(seconds), Some(label)) = (seconds, label) {
      // "work"/"on" are duration suffixes, not exercise names
      let lower = label.to_lowercase();
      if lower == "work" || lower == "on" {
        continue;
      }
      items.push((label, seconds));
    }
  }

  let last_is_rest = items
    .last()
    .map(|(name, _)| name.to_lowercase().contains("rest"))
    .unwrap_or(false);

  let mut sequence: Vec<SequenceItem> = Vec::new();
  for (name, seconds) in &items {
    if name.to_lowercase().contains("rest") {
      if let Some(prev) = sequence.last_mut() {
        prev.rest_after_seconds = Some(prev.rest_after_seconds.unwrap_or(0) + seconds);
      }
      continue;
    }
    sequence.push(SequenceItem {
      name: name.clone(),
      seconds: *seconds,
      rest_after_seconds: None,
    });
  }
  if sequence.is_empty() {
    return None;
  }

  // Between-round rest: only inferred when the text mentions rest and the
  // final captured item was not itself a rest
  if REST_WORD_RE.is_match(text) && !last_is_rest {
    let rest = capture_u32(&REST_AFTER_RE, text).unwrap_or(defaults::HIIT_ROUND_REST_SECONDS);
    if let Some(last) = sequence.last_mut() {
      last.rest_after_seconds = Some(rest);
    }
  }

  let work_seconds = sequence.first().map(|i| i.seconds)?;
  Some(schedule(
    "HIIT Rounds".to_string(),
    Block::Interval {
      sets: rounds,
      work_seconds,
      rest_seconds: 0,
      sequence,
    },
    "HIIT",
  ))
}

/// ---------------------------------------------------------------------------
/// Generic interval
/// ---------------------------------------------------------------------------

/// The least specific extractor; runs after the keyword archetypes so it
/// cannot misclassify EMOM/TABATA text.
fn extract_interval(text: &str) -> Option<Schedule> {
  let rounds = capture_u32(&ROUNDS_RE, text)?;
  let work_seconds = capture_u32(&WORK_SECS_RE, text).or_else(|| bare_work_seconds(text))?;
  let rest_seconds = capture_u32(&REST_SECS_RE, text)
    .or_else(|| capture_u32(&REST_AFTER_RE, text))
    .unwrap_or(0);

  Some(schedule(
    "Intervals".to_string(),
    Block::Interval {
      sets: rounds,
      work_seconds,
      rest_seconds,
      sequence: vec![],
    },
    "INTERVAL",
  ))
}

/// First bare "<n>s" that is not immediately describing a rest
fn bare_work_seconds(text: &str) -> Option<u32> {
  for caps in BARE_SECS_RE.captures_iter(text) {
    let full = caps.get(0)?;
    let tail = &text[full.end()..];
    let tail = &tail[..tail.len().min(12)];
    if REST_WORD_RE.is_match(tail) {
      continue;
    }
    if let Some(n) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
      if n > 0 {
        return Some(n);
      }
    }
  }
  None
}

/// ---------------------------------------------------------------------------
/// Work/rest pattern
/// ---------------------------------------------------------------------------

/// Recognizes ":45 WORK // :15 REST" texts with a "Rest m:ss after each
/// round" clause; exercise names are the remaining free-standing lines.
fn extract_work_rest(text: &str) -> Option<Schedule> {
  let marker = WORK_REST_MARKER_RE.captures(text)?;
  if !ROUND_REST_CLAUSE_RE.is_match(text) {
    return None;
  }

  let work_seconds = marker.get(1)?.as_str().parse::<u32>().ok()?;
  let round_rest = ROUND_REST_TIME_RE
    .captures(text)
    .and_then(|c| {
      let minutes = c.get(1)?.as_str().parse::<u32>().ok()?;
      let seconds = c.get(2)?.as_str().parse::<u32>().ok()?;
      Some(minutes * 60 + seconds)
    })
    .unwrap_or(defaults::WORK_REST_ROUND_REST_SECONDS);
  let rounds = capture_u32(&ROUNDS_RE, text).unwrap_or(defaults::WORK_REST_ROUNDS);

  // Exercise names: segments that carry no structure (no digits, no
  // leading marker)
  let names: Vec<String> = text
    .split(['\n', ','])
    .map(str::trim)
    .filter(|seg| {
      !seg.is_empty()
        && !seg.starts_with('*')
        && !seg.chars().any(|c| c.is_ascii_digit())
        && !seg.eq_ignore_ascii_case("work")
        && !seg.eq_ignore_ascii_case("rest")
    })
    .map(str::to_string)
    .collect();

  let mut sequence: Vec<SequenceItem> = if names.is_empty() {
    vec![SequenceItem {
      name: defaults::EXERCISE_NAME.to_string(),
      seconds: work_seconds,
      rest_after_seconds: None,
    }]
  } else {
    names
      .into_iter()
      .map(|name| SequenceItem {
        name,
        seconds: work_seconds,
        rest_after_seconds: Some(defaults::WORK_REST_ITEM_REST_SECONDS),
      })
      .collect()
  };
  if let Some(last) = sequence.last_mut() {
    last.rest_after_seconds = None;
  }

  Some(schedule(
    "Work/Rest Rounds".to_string(),
    Block::Interval {
      sets: rounds,
      work_seconds,
      rest_seconds: round_rest,
      sequence,
    },
    "WORK_REST",
  ))
}

/// ---------------------------------------------------------------------------
/// Shared assembly
/// ---------------------------------------------------------------------------

fn schedule(title: String, block: Block, mode: &str) -> Schedule {
  let blocks = vec![block];
  let total_minutes = duration::total_minutes(&blocks);
  Schedule {
    title,
    total_minutes,
    cues: duration::cues_for(total_minutes, &blocks),
    blocks,
    debug: DebugInfo {
      used_ai: false,
      inferred_mode: mode.to_string(),
      notes: None,
    },
  }
}

// Kept here so the normalizer's circuit path shares the same placeholder
pub(crate) fn placeholder_exercise() -> CircuitExercise {
  CircuitExercise {
    name: defaults::EXERCISE_NAME.to_string(),
    seconds: defaults::CIRCUIT_EXERCISE_SECONDS,
    reps: None,
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_emom_with_odd_even_instructions() {
    let s = extract_emom("EMOM 20 min: odd 12 burpees, even 45s plank").unwrap();
    assert_eq!(s.total_minutes, 20);
    assert!(!s.debug.used_ai);
    assert_eq!(s.debug.inferred_mode, "EMOM");
    match &s.blocks[0] {
      Block::Emom {
        minutes,
        instructions,
      } => {
        assert_eq!(*minutes, 20);
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[0].minute_mod, Some(MinuteMod::Odd));
        assert_eq!(instructions[0].name, "12 burpees");
        assert_eq!(instructions[1].minute_mod, Some(MinuteMod::Even));
        assert_eq!(instructions[1].name, "45s plank");
      }
      other => panic!("expected EMOM block, got {:?}", other),
    }
  }

  #[test]
  fn test_emom_without_odd_even_gets_generic_instruction() {
    let s = extract_emom("every minute for 10 minutes").unwrap();
    match &s.blocks[0] {
      Block::Emom { instructions, .. } => {
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].name, "Work");
        assert!(instructions[0].minute_mod.is_none());
      }
      other => panic!("expected EMOM block, got {:?}", other),
    }
  }

  #[test]
  fn test_emom_declines_without_minute_count() {
    assert!(extract_emom("EMOM until you drop").is_none());
    assert!(extract_emom("20 min of squats").is_none());
  }

  #[test]
  fn test_tabata_defaults() {
    let s = extract_tabata("quick tabata please").unwrap();
    assert_eq!(s.total_minutes, 4);
    match &s.blocks[0] {
      Block::Tabata {
        rounds,
        work_seconds,
        rest_seconds,
        ..
      } => {
        assert_eq!((*rounds, *work_seconds, *rest_seconds), (8, 20, 10));
      }
      other => panic!("expected TABATA block, got {:?}", other),
    }
  }

  #[test]
  fn test_tabata_with_explicit_values() {
    let s = extract_tabata("Tabata 6 rounds, 30s work, 15s rest").unwrap();
    match &s.blocks[0] {
      Block::Tabata {
        rounds,
        work_seconds,
        rest_seconds,
        ..
      } => {
        assert_eq!((*rounds, *work_seconds, *rest_seconds), (6, 30, 15));
      }
      other => panic!("expected TABATA block, got {:?}", other),
    }
    // 6 * 45s = 270s -> 5 minutes
    assert_eq!(s.total_minutes, 5);
  }

  #[test]
  fn test_emom_wins_over_tabata_cue() {
    let s = extract_schedule("EMOM 12 min, tabata style effort").unwrap();
    assert_eq!(s.debug.inferred_mode, "EMOM");
  }

  #[test]
  fn test_hiit_absorbs_trailing_rest_item() {
    let s = extract_schedule("Total 3 rounds: 30s jumping jacks, 30s squats, 30s rest").unwrap();
    assert_eq!(s.debug.inferred_mode, "HIIT");
    match &s.blocks[0] {
      Block::Interval {
        sets,
        rest_seconds,
        sequence,
        ..
      } => {
        assert_eq!(*sets, 3);
        assert_eq!(*rest_seconds, 0);
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence[1].name, "squats");
        assert_eq!(sequence[1].rest_after_seconds, Some(30));
      }
      other => panic!("expected INTERVAL block, got {:?}", other),
    }
    // 3 * (30 + 30 + 30) = 270s -> 5 minutes
    assert_eq!(s.total_minutes, 5);
  }

  #[test]
  fn test_hiit_infers_between_round_rest() {
    let s = extract_schedule("4 rounds: 20s burpees, 20s lunges, rest between rounds").unwrap();
    match &s.blocks[0] {
      Block::Interval { sequence, .. } => {
        assert_eq!(sequence.last().unwrap().rest_after_seconds, Some(30));
      }
      other => panic!("expected INTERVAL block, got {:?}", other),
    }
  }

  #[test]
  fn test_hiit_declines_without_round_count() {
    assert!(extract_schedule("30s jumping jacks, 30s squats").is_none());
  }

  #[test]
  fn test_generic_interval_from_work_rest_suffixes() {
    let s = extract_schedule("3 rounds, 60s work, 30s rest").unwrap();
    assert_eq!(s.debug.inferred_mode, "INTERVAL");
    match &s.blocks[0] {
      Block::Interval {
        sets,
        work_seconds,
        rest_seconds,
        sequence,
      } => {
        assert_eq!((*sets, *work_seconds, *rest_seconds), (3, 60, 30));
        assert!(sequence.is_empty());
      }
      other => panic!("expected INTERVAL block, got {:?}", other),
    }
  }

  #[test]
  fn test_generic_interval_bare_seconds_defaults_rest_to_zero() {
    let s = extract_schedule("3 rounds of 45 seconds").unwrap();
    match &s.blocks[0] {
      Block::Interval {
        work_seconds,
        rest_seconds,
        ..
      } => {
        assert_eq!(*work_seconds, 45);
        assert_eq!(*rest_seconds, 0);
      }
      other => panic!("expected INTERVAL block, got {:?}", other),
    }
  }

  #[test]
  fn test_work_rest_pattern_scenario() {
    let s =
      extract_schedule("4 Rounds: :45 WORK // :15 REST, Run, Squat, *Rest 2:30 after each round")
        .unwrap();
    assert_eq!(s.debug.inferred_mode, "WORK_REST");
    match &s.blocks[0] {
      Block::Interval {
        sets,
        work_seconds,
        rest_seconds,
        sequence,
      } => {
        assert_eq!(*sets, 4);
        assert_eq!(*work_seconds, 45);
        assert_eq!(*rest_seconds, 150);
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence[0].name, "Run");
        assert_eq!(sequence[0].seconds, 45);
        assert_eq!(sequence[0].rest_after_seconds, Some(15));
        assert_eq!(sequence[1].name, "Squat");
        assert_eq!(sequence[1].rest_after_seconds, None);
      }
      other => panic!("expected INTERVAL block, got {:?}", other),
    }
    // 4 * (45 + 15 + 45) = 420s -> 7 minutes
    assert_eq!(s.total_minutes, 7);
  }

  #[test]
  fn test_empty_and_freeform_text_decline() {
    assert!(extract_schedule("").is_none());
    assert!(extract_schedule("just make me sweat somehow").is_none());
  }

  #[test]
  fn test_recomputation_invariant_on_extractor_output() {
    for text in [
      "EMOM 20 min: odd 12 burpees, even 45s plank",
      "Tabata 8 rounds, 20s work, 10s rest",
      "3 rounds, 60s work, 30s rest",
      "Total 3 rounds: 30s jumping jacks, 30s squats, 30s rest",
    ] {
      let s = extract_schedule(text).unwrap();
      assert_eq!(s.total_minutes, duration::total_minutes(&s.blocks), "{}", text);
    }
  }
}
