//! Provider adapters for the Waymark distance layer.
//!
//! Responsibilities:
//! - Talk to routing backends over HTTP and gRPC.
//! - Translate provider wire formats into [`waymark_core`] value types.
//! - Compose Google clients with tiling, throttling and fan-out.
//!
//! Boundaries:
//! - Do not encode tiling, throttling or merge rules (live in `waymark-core`).
//! - Never retry; every failure is returned to the caller.
//!
//! Invariants:
//! - Every matrix returned by a `MapService` has a zero diagonal.
//! - No global mutable state.

pub mod routing;
