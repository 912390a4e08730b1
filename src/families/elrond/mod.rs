//! Elrond family: API client and address/fee rules.

pub mod api;
pub mod family;

pub use api::ElrondApi;
pub use family::ElrondFamily;
