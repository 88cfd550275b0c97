//! End-to-end tests: build archives in memory, open them as packages, and
//! check what comes back out.

mod charset;
mod common;
mod concurrency;
mod docprops;
mod streaming;
mod styles;

pub use common::*;
