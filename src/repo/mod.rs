//! MySQL access. Every function takes a bare connection so callers decide
//! whether it runs inside a transaction.

pub mod approval;
pub mod attendance;
pub mod employee;
pub mod policy;
pub mod user;
