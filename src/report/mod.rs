//! Human-readable reports for verified runs.

pub mod markdown;

pub use markdown::{render_markdown, write_markdown};
