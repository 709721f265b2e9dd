//! Shared test harness modules for the Waymark CLI.
#![expect(
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "tests fail fast on broken setup and index JSON output of known shape"
)]

use super::*;

mod helpers;
mod query_unit;
