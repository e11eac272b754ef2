pub mod chain_decoder;
pub mod normalizer;
pub mod pipeline;
pub mod router;
pub mod source;

pub use normalizer::normalize;
pub use pipeline::{run_cycle, CycleReport, PipelineConfig, PipelineState};
pub use router::SourceRouter;
pub use source::{ChainLogSource, EventSource, RestSource, Source, SubgraphSource};
