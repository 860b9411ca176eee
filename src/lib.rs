//! Assembles folders of feature diagrams into a single paginated PDF appendix.
//!
//! The pipeline is [`discovery`] → [`fit`] → [`appendix::assemble`] → [`builder::render`], tied
//! together by [`appendix::generate`].

pub mod appendix;
pub mod builder;
pub mod config;
pub mod discovery;
pub mod elements;
pub mod error;
pub mod fit;
pub mod fonts;
pub mod model;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use appendix::{generate, GeneratedAppendix};
pub use config::AppendixConfig;
pub use error::AppendixError;
