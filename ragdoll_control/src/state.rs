//! State machine module root.
//!
//! Figure-level mode switching between passive ragdoll and posed control.

pub mod mode;
