#![allow(dead_code)]

pub mod engine;
pub mod errors;
pub mod navigator;
pub mod placeholders;
pub mod splice;

pub use engine::{insert, insert_basic, InsertReport, InsertRequest};
pub use errors::InsertError;
pub use navigator::{NavigatorConfig, PlaceholderNavigator};
pub use placeholders::PlaceholderSpan;
