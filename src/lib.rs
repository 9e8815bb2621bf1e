// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod config;
pub mod diagram;
pub mod json_schema;
pub mod logging;
pub mod parser;
pub mod relations;
pub mod schema;
pub mod source;
