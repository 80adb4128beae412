// Copyright 2025-2026 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]

//! # dotgraft
//!
//! Merges a freshly compiled .NET module into an existing target module's
//! metadata graph. Given the compiler output for user-edited code, `dotgraft`
//! decides for every compiled type whether it fuses onto an existing target
//! type or becomes a fresh one, rewrites every cross-reference — type
//! references, signatures, member references, custom attributes, instruction
//! operands, exception handlers — from the source module's identity space
//! into the target's, and carries the single edited method's replacement body
//! back onto its original target method.
//!
//! # Architecture
//!
//! - [`crate::metadata`] — the owned metadata vocabulary: tokens, modules,
//!   type and member rows, signature trees, CIL bodies
//! - [`crate::importer`] — the importer core: scope classification, type
//!   resolution, signature/member/body translation, the type plan, and name
//!   deduplication
//! - [`crate::Error`] and [`crate::Result`] — error handling; recoverable
//!   problems accumulate as diagnostics instead
//!
//! # Usage
//!
//! ```rust,ignore
//! use dotgraft::prelude::*;
//!
//! let importer = ModuleImporter::new(&mut target_module);
//! let result = importer.import(source_module, &DebugFileInfo::default(), edited_method)?;
//!
//! if result.succeeded() {
//!     // apply result.new_non_nested_types / result.merged_non_nested_types
//! } else {
//!     for diagnostic in &result.diagnostics {
//!         eprintln!("{diagnostic}");
//!     }
//! }
//! # Ok::<(), dotgraft::Error>(())
//! ```
//!
//! The importer consumes an already-parsed source module and produces
//! descriptor objects; parsing bytes into a [`crate::metadata::module::ModuleDef`]
//! and re-emitting the merged result are the metadata reader/writer's jobs.

mod error;

pub mod importer;
pub mod metadata;
pub mod prelude;

pub use error::{Error, Result};
pub use importer::{
    DebugFileFormat, DebugFileInfo, EditedMethodBody, ImportOptions, ImportResult, ImportedType,
    MergedImportedType, ModuleImporter, NewImportedType,
};
