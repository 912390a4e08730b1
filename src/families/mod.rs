//! Supported chain families.
//!
//! Each family contributes a [`crate::chain::ChainApiClient`] and a
//! [`crate::bridge::FamilySpec`]; [`crate::bridge::FamilyRegistry`] pairs them
//! into bridges at startup.

pub mod elrond;
pub mod ethereum;
