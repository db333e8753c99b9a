//! Diagnosis policy: cache gate, generation pipeline and prompt text.

pub mod gate;
pub mod pipeline;
pub mod prompt;

pub use gate::{Diagnosis, DiagnosisGate};
pub use pipeline::DiagnosisPipeline;
