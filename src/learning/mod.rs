pub mod graph;
pub mod promotion;
pub mod scheduler;
pub mod sequencer;
pub mod stats;
pub mod tracer;
pub mod types;

pub use scheduler::Scheduler;
pub use sequencer::Sequencer;
pub use tracer::KnowledgeTracer;
pub use types::{BloomLevel, KnowledgeNode, Quality, ReviewEntry};
