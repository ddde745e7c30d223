//! The extraction engine: turns a free-form product-management request
//! into schema-valid entity drafts via a generative model.

pub mod context;
pub mod normalize;
pub mod parser;
pub mod persona;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod schema;
pub mod types;
