pub mod schedule;

pub use schedule::{Block, GenerateRequest, Schedule};
