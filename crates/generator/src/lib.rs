// Markdown for check summaries and pull request comments

pub mod markdown;

pub use markdown::*;
