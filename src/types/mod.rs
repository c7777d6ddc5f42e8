//! Type definitions for the contract monitoring pipeline

pub mod alert;
pub mod contract;

pub use alert::{AlertReason, ContractAlert, RiskLevel};
pub use contract::{ContractRecord, Priority, PRIORITY_SENTINEL};
