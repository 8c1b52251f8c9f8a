//! Pure attendance rules: no I/O, no clocks. Services feed them rows read in
//! one transaction and persist what they return.

pub mod policy;
pub mod status;
pub mod sweep;
pub mod visibility;
pub mod workflow;
