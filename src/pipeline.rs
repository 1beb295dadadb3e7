//! Request orchestration
//!
//! An ordered chain of strategies, each returning an optional schedule:
//! deterministic extraction first, then the generative path, then a
//! hardcoded safe default. Provider errors and normalization failures
//! are logged and absorbed here; the chain as a whole cannot fail.

use crate::defaults;
use crate::duration;
use crate::extract;
use crate::llm::ClaudeClient;
use crate::models::schedule::{Block, DebugInfo, Schedule, UserLevel};
use crate::normalize;

/// Produce a schedule for the given text. Total: every input terminates
/// in a valid canonical schedule, provider or no provider.
pub async fn generate(
  client: Option<&ClaudeClient>,
  text: &str,
  level: Option<UserLevel>,
) -> Schedule {
  if let Some(schedule) = extract_strategy(text) {
    return schedule;
  }
  if let Some(schedule) = generative_strategy(client, text, level).await {
    return schedule;
  }
  tracing::warn!("all strategies exhausted, serving fallback schedule");
  safe_default()
}

fn extract_strategy(text: &str) -> Option<Schedule> {
  let schedule = extract::extract_schedule(text)?;
  tracing::info!(mode = %schedule.debug.inferred_mode, "matched deterministic extractor");
  Some(schedule)
}

async fn generative_strategy(
  client: Option<&ClaudeClient>,
  text: &str,
  level: Option<UserLevel>,
) -> Option<Schedule> {
  let client = client?;
  match client.generate_schedule_value(text, level).await {
    Ok(loose) => {
      let normalized = normalize::normalize(&loose, text);
      if normalized.is_none() {
        tracing::warn!("model output matched no known dialect");
      }
      normalized
    }
    Err(e) => {
      tracing::warn!(error = %e, "generative call failed");
      None
    }
  }
}

/// The terminal fallback: a fixed 20-minute interval session
fn safe_default() -> Schedule {
  let blocks = vec![Block::Interval {
    sets: defaults::FALLBACK_SETS,
    work_seconds: defaults::FALLBACK_WORK_SECONDS,
    rest_seconds: defaults::FALLBACK_REST_SECONDS,
    sequence: vec![],
  }];
  let total_minutes = duration::total_minutes(&blocks);
  Schedule {
    title: "Interval Training".to_string(),
    total_minutes,
    cues: duration::cues_for(total_minutes, &blocks),
    blocks,
    debug: DebugInfo {
      used_ai: false,
      inferred_mode: "FALLBACK".to_string(),
      notes: None,
    },
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
