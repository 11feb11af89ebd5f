#![allow(dead_code)]

pub use caesium_console_test_utils::init_tracing;

use std::error::Error;

pub type TestResult = Result<(), Box<dyn Error>>;
