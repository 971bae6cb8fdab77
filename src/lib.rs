#![warn(rust_2018_idioms)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_lossless,            // Infallible casts are clear enough with `as`
    clippy::cast_possible_truncation, // Counters are bounded by u32 item counts
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Contract panics are documented on the buffer
    clippy::module_name_repetitions,  // e.g. BufferError in buffer module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod buffer;
pub mod domain;
pub mod pipeline;
pub mod telemetry;

// Re-export main types for easy access
pub use app::{App, Config};
pub use buffer::BoundedBuffer;
pub use pipeline::{PipelineRunner, PipelineSettings};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
