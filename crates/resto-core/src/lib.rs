//! # resto-core: Pure Business Logic for the Resto Back Office
//!
//! This crate is the **heart** of the commission & payroll engine. It
//! contains all payout math as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Resto Back Office Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                resto-db (services + repositories)               │   │
//! │  │   preview_commission, apply_commission, run_payroll, seed       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ resto-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │  bracket  │  │ reconcile │  │ aggregate │  │   │
//! │  │   │   cents   │  │  lookup   │  │ sold qty  │  │ per-emp   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                 │   │
//! │  │   │commission │  │  payroll  │  │ validation│                 │   │
//! │  │   │  resolver │  │ line math │  │   rules   │                 │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Employee, FieldDispatch, PayrollRun, ...)
//! - [`money`] - Money type with integer-cents arithmetic
//! - [`bracket`] - Bracket tables: lenient parsing + payout lookup
//! - [`commission`] - Resolution chain with explicit degraded results
//! - [`reconcile`] - Dispatch/return reconciliation + settlement validation
//! - [`aggregate`] - Per-employee commission aggregation
//! - [`payroll`] - Period resolution and payroll line netting
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, always
//! 2. **No I/O**: database and network access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64), no floats
//! 4. **Explicit Errors**: typed errors, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use resto_core::bracket::{lookup, parse_brackets_str};
//! use resto_core::money::Money;
//!
//! let brackets = parse_brackets_str(
//!     r#"[{"min":100,"max":500,"fixed":100},{"min":501,"max":750,"fixed":200}]"#,
//! );
//! assert_eq!(lookup(&brackets, Money::from_units(500)), Money::from_units(100));
//! assert_eq!(lookup(&brackets, Money::from_units(501)), Money::from_units(200));
//! assert_eq!(lookup(&brackets, Money::from_units(50)), Money::zero());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod bracket;
pub mod commission;
pub mod error;
pub mod money;
pub mod payroll;
pub mod reconcile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
