//! Ethereum family: JSON-RPC/explorer client and address/fee rules.

pub mod api;
pub mod family;

pub use api::EthereumApi;
pub use family::EthereumFamily;
