pub mod defaults;
pub mod duration;
pub mod extract;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod server;

pub use models::schedule::Schedule;
