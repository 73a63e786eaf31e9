mod archive;
mod guard;
mod pipeline;
mod registry;
mod walker;
mod writer;

pub mod extractors;
pub mod progress;

pub use extractors::Extractor;
pub use guard::TimeoutGuard;
pub use pipeline::{ProcessingPipeline, RunState};
pub use progress::{BarReporter, LogReporter, PipelineEvent, ProgressReporter, SilentReporter};
pub use registry::{ExtractorRegistry, Handler};
pub use walker::{scan_directory, DirectoryScan};
pub use writer::ResultWriter;
