//! Response normalizer
//!
//! Maps the loose object tree the model returns into the canonical
//! schedule. The model has produced several output dialects over time:
//! canonical schedules, flat event timelines, single raw archetype
//! objects, and bare exercise lists. Each dialect gets its own
//! conversion function and the dispatch tries them in a fixed order;
//! any coercion failure surfaces as `None`, never a panic.

use serde_json::{Map, Value};

use crate::defaults;
use crate::duration;
use crate::extract;
use crate::models::schedule::{
  Block, CircuitExercise, DebugInfo, EmomInstruction, MinuteMod, Schedule, SequenceItem,
};

/// ---------------------------------------------------------------------------
/// Dispatch
/// ---------------------------------------------------------------------------

/// First matching dialect wins; `None` tells the caller to fall back.
pub fn normalize(loose: &Value, text: &str) -> Option<Schedule> {
  from_timeline(loose)
    .or_else(|| from_canonical(loose, text))
    .or_else(|| from_single_block(loose, text))
    .or_else(|| from_exercise_list(loose, text))
    .or_else(|| from_text_cues(text))
}

/// ---------------------------------------------------------------------------
/// Dialect: flat timeline
/// ---------------------------------------------------------------------------

struct TimelineEvent {
  kind: String,
  label: String,
  seconds: u32,
  round: Option<u32>,
}

/// Compress a pre-expanded event timeline back into a parametrized block.
/// Lossy: only the first round's structure is trusted to represent all
/// rounds. Prep/cooldown events carry no round structure and are skipped.
fn from_timeline(loose: &Value) -> Option<Schedule> {
  let raw = loose.get("timeline")?.as_array()?;
  if raw.is_empty() {
    return None;
  }

  let events: Vec<TimelineEvent> = raw
    .iter()
    .filter_map(|entry| {
      let obj = entry.as_object()?;
      Some(TimelineEvent {
        kind: obj.get("kind")?.as_str()?.to_lowercase(),
        label: obj
          .get("label")
          .and_then(Value::as_str)
          .unwrap_or(defaults::EXERCISE_NAME)
          .to_string(),
        seconds: obj.get("seconds").and_then(as_u32).unwrap_or(0),
        round: obj.get("round").and_then(as_u32).filter(|r| *r > 0),
      })
    })
    .collect();
  if events.is_empty() {
    return None;
  }

  let max_round = events.iter().filter_map(|e| e.round).max();
  let title = loose
    .get("title")
    .and_then(Value::as_str)
    .unwrap_or(defaults::TITLE)
    .to_string();

  let block = match events.iter().find(|e| e.kind == "round_rest") {
    Some(round_rest) => {
      let first_round = events
        .iter()
        .filter(|e| e.kind == "work")
        .filter_map(|e| e.round)
        .min()
        .unwrap_or(1);
      let mut exercises: Vec<CircuitExercise> = events
        .iter()
        .filter(|e| e.kind == "work" && e.round.unwrap_or(first_round) == first_round)
        .map(|e| CircuitExercise {
          name: e.label.clone(),
          seconds: nonzero_or(e.seconds, defaults::CIRCUIT_EXERCISE_SECONDS),
          reps: None,
        })
        .collect();
      if exercises.is_empty() {
        exercises.push(extract::placeholder_exercise());
      }
      Block::Circuit {
        rounds: max_round.unwrap_or(defaults::CIRCUIT_ROUNDS),
        exercises,
        rest_between_rounds_seconds: nonzero_or(
          round_rest.seconds,
          defaults::CIRCUIT_ROUND_REST_SECONDS,
        ),
      }
    }
    None => {
      let work = events.iter().find(|e| e.kind == "work");
      let rest = events.iter().find(|e| e.kind == "rest");
      let work_count = events.iter().filter(|e| e.kind == "work").count() as u32;
      Block::Interval {
        sets: max_round.unwrap_or_else(|| work_count.max(1)),
        work_seconds: work
          .map(|e| nonzero_or(e.seconds, defaults::INTERVAL_WORK_SECONDS))
          .unwrap_or(defaults::INTERVAL_WORK_SECONDS),
        rest_seconds: rest.map(|e| e.seconds).unwrap_or(0),
        sequence: vec![],
      }
    }
  };

  Some(assemble(title, vec![block], "flat timeline"))
}

/// ---------------------------------------------------------------------------
/// Dialect: already canonical
/// ---------------------------------------------------------------------------

/// Re-validate and repair a schedule-shaped object. Totals are always
/// recomputed; blocks naming no known archetype are dropped.
fn from_canonical(loose: &Value, text: &str) -> Option<Schedule> {
  let title = loose.get("title")?.as_str()?;
  let raw_blocks = loose.get("blocks")?.as_array()?;

  let blocks: Vec<Block> = raw_blocks
    .iter()
    .filter_map(Value::as_object)
    .filter_map(|obj| repair_block(obj, text))
    .collect();
  if blocks.is_empty() {
    return None;
  }

  Some(assemble(title.to_string(), blocks, "canonical repair"))
}

/// ---------------------------------------------------------------------------
/// Dialect: single raw archetype object
/// ---------------------------------------------------------------------------

fn from_single_block(loose: &Value, text: &str) -> Option<Schedule> {
  let obj = loose.as_object()?;
  let tag = obj.get("type").and_then(Value::as_str)?;
  if !is_archetype(tag) {
    return None;
  }
  let block = repair_block(obj, text)?;
  let title = field_str(obj, &["title", "name"]).unwrap_or_else(|| defaults::TITLE.to_string());
  Some(assemble(title, vec![block], "single block"))
}

fn is_archetype(tag: &str) -> bool {
  ["EMOM", "TABATA", "CIRCUIT", "INTERVAL"]
    .iter()
    .any(|a| tag.eq_ignore_ascii_case(a))
}

/// ---------------------------------------------------------------------------
/// Dialect: bare exercise list
/// ---------------------------------------------------------------------------

/// An exercise list with no usable wrapper: either `blocks[0].exercises`
/// without a title, or `workout_type: INTERVAL` with a top-level
/// `exercises` array. Treated as an unlabeled sequenced interval.
fn from_exercise_list(loose: &Value, text: &str) -> Option<Schedule> {
  let obj = loose.as_object()?;

  let host: &Map<String, Value> = if let Some(first) = obj
    .get("blocks")
    .and_then(Value::as_array)
    .and_then(|blocks| blocks.first())
    .and_then(Value::as_object)
    .filter(|first| first.contains_key("exercises"))
  {
    first
  } else if field_str(obj, &["workout_type", "type"])
    .map(|t| t.eq_ignore_ascii_case("INTERVAL"))
    .unwrap_or(false)
    && obj.contains_key("exercises")
  {
    obj
  } else {
    return None;
  };

  let items = host.get("exercises")?.as_array()?;
  let sequence = rectify_sequence(items, text);
  if sequence.is_empty() {
    return None;
  }

  let sets = count_field(host, &["sets", "rounds"])
    .or_else(|| count_field(obj, &["sets", "rounds"]))
    .unwrap_or(defaults::SEQUENCE_SETS);
  let work_seconds = sequence[0].seconds;
  let title = field_str(obj, &["title", "name"]).unwrap_or_else(|| defaults::TITLE.to_string());

  Some(assemble(
    title,
    vec![Block::Interval {
      sets,
      work_seconds,
      rest_seconds: 0,
      sequence,
    }],
    "exercise list",
  ))
}

/// ---------------------------------------------------------------------------
/// Dialect: text-cue coercion
/// ---------------------------------------------------------------------------

/// Last resort before giving up: the loose object told us nothing, but
/// the text itself carries an unambiguous EMOM or TABATA cue. The
/// schedule content is deterministic, so `used_ai` stays false.
fn from_text_cues(text: &str) -> Option<Schedule> {
  extract::extract_emom(text)
    .or_else(|| extract::extract_tabata(text))
    .map(|mut s| {
      s.debug.notes = Some("text cue coercion".to_string());
      s
    })
}

/// ---------------------------------------------------------------------------
/// Block repair
/// ---------------------------------------------------------------------------

/// Coerce one block-shaped object into a canonical block, mapping field
/// synonyms and filling gaps from the defaults table. Unknown archetype
/// tags yield `None`.
fn repair_block(obj: &Map<String, Value>, text: &str) -> Option<Block> {
  let tag = field_str(obj, &["type", "workout_type"])?;
  match tag.to_uppercase().as_str() {
    "EMOM" => Some(repair_emom(obj, text)),
    "TABATA" => Some(repair_tabata(obj)),
    "CIRCUIT" => Some(repair_circuit(obj)),
    "INTERVAL" => Some(repair_interval(obj, text)),
    _ => None,
  }
}

fn repair_emom(obj: &Map<String, Value>, text: &str) -> Block {
  let minutes = count_field(obj, &["minutes", "duration_minutes"])
    .or_else(|| extract::scan_minutes(text))
    .unwrap_or(defaults::EMOM_MINUTES);

  let mut instructions: Vec<EmomInstruction> = obj
    .get("instructions")
    .and_then(Value::as_array)
    .map(|raw| {
      raw
        .iter()
        .filter_map(Value::as_object)
        .map(|item| EmomInstruction {
          minute_mod: item
            .get("minute_mod")
            .and_then(Value::as_str)
            .and_then(|m| match m.to_lowercase().as_str() {
              "odd" => Some(MinuteMod::Odd),
              "even" => Some(MinuteMod::Even),
              _ => None,
            }),
          name: field_str(item, &["name", "exercise"])
            .unwrap_or_else(|| defaults::EXERCISE_NAME.to_string()),
        })
        .collect()
    })
    .unwrap_or_default();
  if instructions.is_empty() {
    instructions.push(EmomInstruction {
      minute_mod: None,
      name: defaults::EXERCISE_NAME.to_string(),
    });
  }

  Block::Emom {
    minutes,
    instructions,
  }
}

fn repair_tabata(obj: &Map<String, Value>) -> Block {
  Block::Tabata {
    rounds: count_field(obj, &["rounds", "sets"]).unwrap_or(defaults::TABATA_ROUNDS),
    work_seconds: field_u32(obj, &["work_seconds", "work"]).unwrap_or(defaults::TABATA_WORK_SECONDS),
    rest_seconds: field_u32(obj, &["rest_seconds", "rest"]).unwrap_or(defaults::TABATA_REST_SECONDS),
    exercise: field_str(obj, &["exercise", "name"])
      .unwrap_or_else(|| defaults::EXERCISE_NAME.to_string()),
  }
}

fn repair_circuit(obj: &Map<String, Value>) -> Block {
  let mut exercises: Vec<CircuitExercise> = obj
    .get("exercises")
    .and_then(Value::as_array)
    .map(|raw| {
      raw
        .iter()
        .filter_map(Value::as_object)
        .map(|item| CircuitExercise {
          name: field_str(item, &["name", "exercise"])
            .unwrap_or_else(|| defaults::EXERCISE_NAME.to_string()),
          seconds: field_u32(item, &["seconds", "duration", "duration_seconds"])
            .filter(|s| *s > 0)
            .unwrap_or(defaults::CIRCUIT_EXERCISE_SECONDS),
          reps: item.get("reps").and_then(as_u32).filter(|r| *r > 0),
        })
        .collect()
    })
    .unwrap_or_default();
  if exercises.is_empty() {
    exercises.push(extract::placeholder_exercise());
  }

  Block::Circuit {
    rounds: count_field(obj, &["rounds", "sets"]).unwrap_or(defaults::CIRCUIT_ROUNDS),
    exercises,
    rest_between_rounds_seconds: field_u32(
      obj,
      &["rest_between_rounds_seconds", "rest_between_rounds", "round_rest_seconds", "rest"],
    )
    .unwrap_or(defaults::CIRCUIT_ROUND_REST_SECONDS),
  }
}

fn repair_interval(obj: &Map<String, Value>, text: &str) -> Block {
  let sequence = obj
    .get("sequence")
    .or_else(|| obj.get("exercises"))
    .and_then(Value::as_array)
    .map(|items| rectify_sequence(items, text))
    .unwrap_or_default();

  if sequence.is_empty() {
    Block::Interval {
      sets: count_field(obj, &["sets", "rounds"]).unwrap_or(defaults::INTERVAL_SETS),
      work_seconds: field_u32(obj, &["work_seconds", "work"])
        .filter(|s| *s > 0)
        .unwrap_or(defaults::INTERVAL_WORK_SECONDS),
      rest_seconds: field_u32(obj, &["rest_seconds", "rest"])
        .unwrap_or(defaults::INTERVAL_REST_SECONDS),
      sequence,
    }
  } else {
    let work_seconds = sequence[0].seconds;
    Block::Interval {
      sets: count_field(obj, &["sets", "rounds"]).unwrap_or(defaults::SEQUENCE_SETS),
      work_seconds,
      rest_seconds: 0,
      sequence,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Sequence rectifier
/// ---------------------------------------------------------------------------

/// Clean a raw sequence: items named "rest" are never emitted as
/// exercises; each one's duration is absorbed as the trailing rest of
/// the exercise immediately preceding it. A leading rest has nothing to
/// attach to and is dropped; consecutive rests accumulate. If nothing
/// ends up carrying a rest but the text says "rest", the final exercise
/// gets a default trailing rest.
pub(crate) fn rectify_sequence(items: &[Value], text: &str) -> Vec<SequenceItem> {
  let mut out: Vec<SequenceItem> = Vec::new();

  for item in items {
    let Some(obj) = item.as_object() else {
      continue;
    };
    let name = field_str(obj, &["name", "exercise", "label"])
      .unwrap_or_else(|| defaults::EXERCISE_NAME.to_string());
    let seconds = field_u32(obj, &["duration", "seconds", "duration_seconds"])
      .filter(|s| *s > 0)
      .unwrap_or(defaults::SEQUENCE_ITEM_SECONDS);

    if name.to_lowercase().contains("rest") {
      if let Some(prev) = out.last_mut() {
        prev.rest_after_seconds = Some(prev.rest_after_seconds.unwrap_or(0) + seconds);
      }
      continue;
    }

    out.push(SequenceItem {
      name,
      seconds,
      rest_after_seconds: obj.get("rest_after_seconds").and_then(as_u32).filter(|r| *r > 0),
    });
  }

  let has_rest = out.iter().any(|i| i.rest_after_seconds.is_some());
  if !out.is_empty() && !has_rest && text.to_lowercase().contains("rest") {
    if let Some(last) = out.last_mut() {
      last.rest_after_seconds = Some(defaults::SEQUENCE_FINAL_REST_SECONDS);
    }
  }

  out
}

/// ---------------------------------------------------------------------------
/// Coercion helpers
/// ---------------------------------------------------------------------------

fn as_u32(value: &Value) -> Option<u32> {
  if let Some(n) = value.as_u64() {
    return u32::try_from(n).ok();
  }
  if let Some(f) = value.as_f64() {
    if f.is_finite() && (0.0..=u32::MAX as f64).contains(&f) {
      return Some(f.round() as u32);
    }
  }
  value.as_str().and_then(|s| s.trim().parse::<u32>().ok())
}

fn field_u32(obj: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
  keys.iter().find_map(|key| obj.get(*key).and_then(as_u32))
}

/// Like `field_u32` but rejects zero; round/set/minute counts must be
/// positive
fn count_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
  field_u32(obj, keys).filter(|n| *n > 0)
}

fn field_str(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
  keys
    .iter()
    .find_map(|key| obj.get(*key).and_then(Value::as_str))
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}

fn nonzero_or(value: u32, fallback: u32) -> u32 {
  if value > 0 {
    value
  } else {
    fallback
  }
}

fn assemble(title: String, blocks: Vec<Block>, notes: &str) -> Schedule {
  let total_minutes = duration::total_minutes(&blocks);
  let inferred_mode = blocks.first().map(block_mode).unwrap_or("UNKNOWN").to_string();
  Schedule {
    title,
    total_minutes,
    cues: duration::cues_for(total_minutes, &blocks),
    blocks,
    debug: DebugInfo {
      used_ai: true,
      inferred_mode,
      notes: Some(notes.to_string()),
    },
  }
}

fn block_mode(block: &Block) -> &'static str {
  match block {
    Block::Emom { .. } => "EMOM",
    Block::Tabata { .. } => "TABATA",
    Block::Circuit { .. } => "CIRCUIT",
    Block::Interval { .. } => "INTERVAL",
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
