// yrini/src/document/mod.rs

//! INI document model with inheritance-aware section views.
//!
//! A [`Document`] keeps three things apart: the header pairs, every section's
//! own pairs (with comments at their original positions), and the
//! inheritance map. Lookups through [`SectionView`] combine them on demand.

pub mod core;
pub mod merging;
pub mod section;
pub mod view;

// Re-export the main types
pub use self::core::Document;
pub use section::{Entry, Section};
pub use view::{SectionView, SectionViewMut};

// Re-export key helpers
pub use section::{
    is_comment_key, is_plus_key, COMMENT_KEY_PREFIX, INHERITS_KEY, PLUS_KEY, PLUS_KEY_PREFIX,
};
