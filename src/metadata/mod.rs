//! The metadata vocabulary the importer operates on.
//!
//! An owned, in-memory object model of the ECMA-335 entities that matter for
//! merging one module into another: tokens, modules, type and member rows,
//! signature trees, CIL bodies, marshalling descriptors, and custom
//! attributes. Any reader capable of producing these shapes can feed the
//! importer.

pub mod body;
pub mod customattributes;
pub mod identity;
pub mod marshalling;
pub mod members;
pub mod module;
pub mod signatures;
pub mod token;
pub mod types;
