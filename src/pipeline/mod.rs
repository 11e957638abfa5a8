// Pipeline: import, per-review analysis, language cohorts, topic modeling,
// merge, and the stage runners behind the CLI.

pub mod analyze;
pub mod cohorts;
pub mod enrich;
pub mod ingest;
pub mod stages;
