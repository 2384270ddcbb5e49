pub mod diagram_pipeline;
pub mod network_pipeline;

pub use diagram_pipeline::{DiagramOutcome, DiagramPipeline};
pub use network_pipeline::NetworkPipeline;
