//! # Repository Implementations
//!
//! One repository per aggregate, each owning a pool clone.
//!
//! Query helpers that must participate in a caller-owned transaction (the
//! payroll run snapshot) are module-level functions over
//! `&mut SqliteConnection`; the pool-bound repository methods wrap them.

pub mod deduction;
pub mod dispatch;
pub mod employee;
pub mod payroll;
pub mod plan;
