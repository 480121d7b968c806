//! # Service Layer
//!
//! Multi-repository operations that need a consistent snapshot or a single
//! transaction: commission previews/snapshots and the monthly payroll run.
//!
//! Services compose the pure functions from resto-core with the repository
//! helpers; all money math happens in the core, all I/O happens here.

pub mod commission;
pub mod payroll;
