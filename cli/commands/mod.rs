pub mod completion;
pub mod config;
pub mod merge;
pub mod select;
