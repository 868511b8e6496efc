pub mod types;
pub mod parse;
pub mod queries;

pub use types::*;
pub use parse::{parse_questions, split_options};
pub use queries::*;
