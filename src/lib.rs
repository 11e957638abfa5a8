// reviewlens: multilingual review analytics for bank agencies
//
// This is the library root. Each module corresponds to a stage or a
// boundary of the analytics pipeline.

pub mod config;
pub mod db;
pub mod language;
pub mod output;
pub mod pipeline;
pub mod sentiment;
pub mod status;
pub mod topics;
pub mod validation;
