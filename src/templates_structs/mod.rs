// Template contexts and JSON envelopes, organized by surface.

pub mod api;
pub mod survey;

pub use api::*;
pub use survey::*;
