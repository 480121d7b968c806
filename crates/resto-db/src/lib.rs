//! # resto-db
//!
//! SQLite persistence and services for the back-office payout engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           resto-db                                      │
//! │                                                                         │
//! │  ┌────────────────┐    ┌────────────────┐    ┌────────────────┐        │
//! │  │    Database    │───►│  Repositories  │───►│    SQLite      │        │
//! │  │  (pool + cfg)  │    │  (per entity)  │    │  (WAL mode)    │        │
//! │  └───────┬────────┘    └────────────────┘    └────────────────┘        │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  ┌────────────────┐                                                     │
//! │  │    Services    │  commission preview/apply, payroll run builder      │
//! │  │                │  (transactions over repository helpers +            │
//! │  │                │   resto-core pure functions)                        │
//! │  └────────────────┘                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use resto_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("resto.db")).await?;
//! let outcome = db.payroll_service().run_payroll(2025, 11, false).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// Re-export main types
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::deduction::DeductionRepository;
pub use repository::dispatch::DispatchRepository;
pub use repository::employee::EmployeeRepository;
pub use repository::payroll::PayrollRepository;
pub use repository::plan::PlanRepository;
pub use service::commission::{
    CommissionPreview, CommissionReport, CommissionRow, CommissionService, NextTarget,
};
pub use service::payroll::{PayrollService, RunDetail, RunOutcome};

// Re-export the core crate so binaries depend on one surface
pub use resto_core;
