//! Crate-level tests driving the full simulation plugin.

mod simulation;
