pub mod archive;
pub mod chunking;
pub mod config;
pub mod error;
pub mod filter;
pub mod language;
pub mod merge;
pub mod pipeline;
pub mod selector;
pub mod walker;
pub mod writer;

pub use chunking::{Part, parse_size, split_into_parts};
pub use config::Config;
pub use error::{AppError, Result};
pub use filter::IgnoreRules;
pub use merge::{MergeOptions, MergedBuffer, merge_entries};
pub use pipeline::{MergeOutcome, MergePlan, run_merge};
pub use selector::{MenuChoice, Prompter, Selection, Selector, SelectorState, expand_selections, run_selector};
pub use walker::{FileEntry, FileWalker};
pub use writer::{OutputLocation, WriteReport, write_parts};
