pub mod questions;
pub mod responses;
