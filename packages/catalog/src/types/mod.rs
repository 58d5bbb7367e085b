//! Catalog data types.

pub mod filter;
pub mod id;
pub mod modality;
pub mod offering;
pub mod spec;
