//! Per-category content transforms.
//!
//! Pure functions over `(source, configuration) -> output`; all chain
//! wiring, error containment and filesystem side effects live in
//! [`crate::chain`] and [`crate::task`].

pub mod image;
pub mod markup;
pub mod script;
pub mod style;
