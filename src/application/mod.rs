//! Engines implementing the credit-transfer protocol, the campaign status
//! workflow and the read-only reporting views. All of them talk to the
//! persistent stores only through the ports in [`crate::domain::ports`].

pub mod lifecycle;
pub mod query;
pub mod transfer;
