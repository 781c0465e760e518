pub mod account;
pub mod campaign;
pub mod ports;
pub mod transaction;
