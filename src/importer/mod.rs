//! The module importer.
//!
//! Merges a freshly compiled source module into an existing target module:
//! members that already exist become stubs whose references redirect to the
//! target originals, genuinely new types and members receive fresh target
//! rows, and the single edited method gets a replacement body with its
//! operands rewritten into the target identity space.
//!
//! Execution is three-pass: **plan** (decide Merge vs New per type, register
//! identity maps), **populate** (allocate and fill member rows, signatures,
//! attributes), **wire** (import bodies, overrides, and operand references
//! once every identity is known). Forward references resolve through the maps
//! built during planning.
//!
//! One [`ModuleImporter`] performs one import; the call consumes the importer
//! and releases the source module on every exit path. Recoverable problems
//! accumulate as diagnostics and the result may be partially useful; fatal
//! inconsistencies abort with the diagnostics collected so far.

mod body;
mod compare;
mod dedup;
pub mod diagnostics;
mod members;
mod planner;
mod resolver;
mod scope;
mod sigimport;

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    metadata::{module::ModuleDef, token::Token},
    Error, Result,
};

use diagnostics::{DiagnosticCode, Diagnostics, ImportDiagnostic};
use planner::PlannedType;

pub use planner::{EditedMethodBody, ImportedType, MergedImportedType, NewImportedType};

/// Format of the symbol file accompanying the compiled source module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugFileFormat {
    /// No symbols
    #[default]
    None,
    /// Windows PDB
    Pdb,
    /// Portable PDB (not supported; fails fast with IM0010)
    PortablePdb,
    /// PDB embedded in the PE image (not supported; fails fast with IM0010)
    Embedded,
}

/// The symbol file produced next to the compiled source module.
#[derive(Debug, Clone, Default)]
pub struct DebugFileInfo {
    /// Symbol format
    pub format: DebugFileFormat,
    /// Raw symbol file bytes
    pub raw_file: Vec<u8>,
}

/// Options controlling one import.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Keep RVAs on imported fields instead of resetting them to none.
    /// Initial value bytes are copied either way.
    pub keep_imported_rva: bool,
}

/// Outcome of one import call.
///
/// Partial success is legitimate: the type lists may be non-empty alongside
/// error diagnostics, and the caller decides what is still usable.
#[derive(Debug)]
pub struct ImportResult {
    /// Diagnostics collected during the import
    pub diagnostics: Vec<ImportDiagnostic>,
    /// Fresh top-level types to add to the target
    pub new_non_nested_types: Vec<NewImportedType>,
    /// Target top-level types modified in place, with empty merges dropped
    pub merged_non_nested_types: Vec<MergedImportedType>,
}

impl ImportResult {
    /// True when no error-severity diagnostic was recorded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.severity == diagnostics::DiagnosticSeverity::Error)
    }
}

/// Imports a compiled source module into a target module.
///
/// # Examples
///
/// ```rust,ignore
/// use dotgraft::{ModuleImporter, DebugFileInfo};
///
/// let importer = ModuleImporter::new(&mut target_module);
/// let result = importer.import(source_module, DebugFileInfo::default(), edited_method)?;
/// for diagnostic in &result.diagnostics {
///     eprintln!("{diagnostic}");
/// }
/// ```
pub struct ModuleImporter<'m> {
    pub(crate) target: &'m mut ModuleDef,
    source: Option<Rc<ModuleDef>>,
    pub(crate) options: ImportOptions,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) planned: Vec<PlannedType>,
    /// source TypeDef token -> index into `planned`
    pub(crate) type_def_map: FxHashMap<Token, usize>,
    /// source TypeRef token -> target type token
    pub(crate) type_ref_map: FxHashMap<Token, Token>,
    /// source MethodDef token -> target MethodDef token
    pub(crate) method_map: FxHashMap<Token, Token>,
    /// source Field token -> target Field token
    pub(crate) field_map: FxHashMap<Token, Token>,
    /// source Property token -> target Property token
    pub(crate) property_map: FxHashMap<Token, Token>,
    /// source Event token -> target Event token
    pub(crate) event_map: FxHashMap<Token, Token>,
    /// source member tokens identified as target originals
    pub(crate) stubs: FxHashSet<Token>,
    /// the methods whose bodies replace existing target bodies
    pub(crate) edited_methods_to_fix: Vec<(Token, Token)>,
    /// occupied (namespace, name) pairs among target top-level types
    pub(crate) top_level_names: FxHashSet<(String, String)>,
}

impl<'m> ModuleImporter<'m> {
    /// Creates an importer for the given target module with default options.
    pub fn new(target: &'m mut ModuleDef) -> Self {
        Self::with_options(target, ImportOptions::default())
    }

    /// Creates an importer for the given target module.
    pub fn with_options(target: &'m mut ModuleDef, options: ImportOptions) -> Self {
        let top_level_names = target
            .top_level_types()
            .map(|t| (t.namespace.clone(), t.name.clone()))
            .collect();
        ModuleImporter {
            target,
            source: None,
            options,
            diagnostics: Diagnostics::new(),
            planned: Vec::new(),
            type_def_map: FxHashMap::default(),
            type_ref_map: FxHashMap::default(),
            method_map: FxHashMap::default(),
            field_map: FxHashMap::default(),
            property_map: FxHashMap::default(),
            event_map: FxHashMap::default(),
            stubs: FxHashSet::default(),
            edited_methods_to_fix: Vec::new(),
            top_level_names,
        }
    }

    /// Imports the parsed source module, replacing the body of
    /// `edited_method` (a target `MethodDef` token).
    ///
    /// Consumes the importer: one instance performs one import. Recoverable
    /// problems land in [`ImportResult::diagnostics`]; a fatal inconsistency
    /// in the inputs yields a result whose type lists are empty and whose
    /// diagnostics describe the failure.
    ///
    /// # Errors
    ///
    /// Returns an error only for internal invariant violations, never for
    /// malformed edits.
    pub fn import(
        mut self,
        source: ModuleDef,
        debug_file: &DebugFileInfo,
        edited_method: Token,
    ) -> Result<ImportResult> {
        self.source = Some(Rc::new(source));
        let outcome = self.run(debug_file, edited_method);
        // Release the source image on every exit path.
        self.source = None;

        let diagnostics = std::mem::take(&mut self.diagnostics).into_vec();
        match outcome {
            Ok((new_non_nested_types, merged_non_nested_types)) => Ok(ImportResult {
                diagnostics,
                new_non_nested_types,
                merged_non_nested_types,
            }),
            Err(Error::Aborted) => Ok(ImportResult {
                diagnostics,
                new_non_nested_types: Vec::new(),
                merged_non_nested_types: Vec::new(),
            }),
            Err(error) => Err(error),
        }
    }

    #[allow(clippy::type_complexity)]
    fn run(
        &mut self,
        debug_file: &DebugFileInfo,
        edited_method: Token,
    ) -> Result<(Vec<NewImportedType>, Vec<MergedImportedType>)> {
        match debug_file.format {
            DebugFileFormat::None | DebugFileFormat::Pdb => {}
            DebugFileFormat::PortablePdb | DebugFileFormat::Embedded => {
                // Fail fast rather than silently dropping symbols.
                self.diagnostics.error(
                    DiagnosticCode::UnsupportedDebugFormat,
                    format!("Debug file format {:?} is not supported", debug_file.format),
                );
                return Err(Error::Aborted);
            }
        }

        self.plan(edited_method)?;
        self.populate()?;
        self.deduplicate_names()?;
        self.wire()?;
        self.fix_edited_methods()?;
        Ok(self.materialize_plan())
    }

    /// Populate pass: allocate member rows for everything the plan marked as
    /// new, then fill type-level data, then member data. Shell allocation for
    /// the whole plan precedes any signature translation so that cyclic
    /// references always find a registered identity.
    fn populate(&mut self) -> Result<()> {
        let mut field_fills: Vec<(Token, Token)> = Vec::new();
        let mut method_fills: Vec<(Token, Token)> = Vec::new();

        for index in 0..self.planned.len() {
            let source_type = self.planned[index].source;
            let merged = self.planned[index].merged;
            let target_type = self.planned[index].target;

            let src = self.src()?;
            let type_def = src
                .type_def(source_type)
                .ok_or(Error::TokenNotFound(source_type))?;
            let fields: Vec<Token> = type_def.fields.clone();
            let methods: Vec<Token> = type_def.methods.clone();
            drop(src);

            for field in fields {
                if self.field_map.contains_key(&field) {
                    continue; // stub
                }
                let target = self.register_field_shell(field)?;
                field_fills.push((field, target));
                if merged {
                    self.planned[index].new_fields.push(target);
                } else if let Some(row) = self.target.type_def_mut(target_type) {
                    row.fields.push(target);
                }
            }
            for method in methods {
                if self.method_map.contains_key(&method) {
                    continue; // stub
                }
                let target = self.register_method_shell(method)?;
                method_fills.push((method, target));
                if merged {
                    self.planned[index].new_methods.push(target);
                } else if let Some(row) = self.target.type_def_mut(target_type) {
                    row.methods.push(target);
                }
            }
        }

        for index in 0..self.planned.len() {
            if !self.planned[index].merged {
                self.fill_new_type(index)?;
            }
        }

        for (source, target) in field_fills {
            self.fill_field(source, target)?;
        }
        for (source, target) in method_fills {
            self.fill_method(source, target)?;
        }

        // Properties and events import after methods so their accessors
        // rebind through the method map.
        for index in 0..self.planned.len() {
            let source_type = self.planned[index].source;
            let merged = self.planned[index].merged;
            let target_type = self.planned[index].target;

            let src = self.src()?;
            let type_def = src
                .type_def(source_type)
                .ok_or(Error::TokenNotFound(source_type))?;
            let properties: Vec<Token> = type_def.properties.clone();
            let events: Vec<Token> = type_def.events.clone();
            drop(src);

            for property in properties {
                if self.property_map.contains_key(&property) {
                    continue; // stub
                }
                let target = self.import_property(property)?;
                if merged {
                    self.planned[index].new_properties.push(target);
                } else if let Some(row) = self.target.type_def_mut(target_type) {
                    row.properties.push(target);
                }
            }
            for event in events {
                if self.event_map.contains_key(&event) {
                    continue; // stub
                }
                let target = self.import_event(event)?;
                if merged {
                    self.planned[index].new_events.push(target);
                } else if let Some(row) = self.target.type_def_mut(target_type) {
                    row.events.push(target);
                }
            }
        }
        Ok(())
    }

    /// Fills the type-level data of a freshly created target type: base type,
    /// interfaces, layout, generic parameters, attributes, and security.
    fn fill_new_type(&mut self, index: usize) -> Result<()> {
        let source_type = self.planned[index].source;
        let target_type = self.planned[index].target;

        let src = self.src()?;
        let type_def = src
            .type_def(source_type)
            .ok_or(Error::TokenNotFound(source_type))?
            .clone();
        drop(src);

        let base = match type_def.base {
            Some(token) => self.import_type_def_or_ref(token)?,
            None => None,
        };
        let mut interfaces = Vec::with_capacity(type_def.interfaces.len());
        for interface in &type_def.interfaces {
            if let Some(token) = self.import_type_def_or_ref(*interface)? {
                interfaces.push(token);
            }
        }
        let generic_params = self.import_generic_params(&type_def.generic_params)?;
        let custom_attributes = self.import_custom_attributes(&type_def.custom_attributes)?;

        let row = self
            .target
            .type_def_mut(target_type)
            .ok_or(Error::TokenNotFound(target_type))?;
        row.base = base;
        row.interfaces = interfaces;
        row.generic_params = generic_params;
        row.class_layout = type_def.class_layout;
        row.custom_attributes = custom_attributes;
        row.security = type_def.security;
        Ok(())
    }

    /// Wire pass: bodies and overrides for every imported (non-stub) method,
    /// in plan order.
    fn wire(&mut self) -> Result<()> {
        for index in 0..self.planned.len() {
            let source_type = self.planned[index].source;

            let src = self.src()?;
            let methods: Vec<Token> = src
                .type_def(source_type)
                .ok_or(Error::TokenNotFound(source_type))?
                .methods
                .clone();
            drop(src);

            for source_method in methods {
                if self.stubs.contains(&source_method) {
                    continue;
                }
                let Some(target_method) = self.method_map.get(&source_method).copied() else {
                    continue;
                };
                let imported = self.import_body(source_method, target_method, false)?;
                if let Some(row) = self.target.method_mut(target_method) {
                    row.body = imported;
                }
                self.import_method_overrides(source_method, target_method)?;
            }
        }
        Ok(())
    }

    pub(crate) fn src(&self) -> Result<Rc<ModuleDef>> {
        self.source
            .clone()
            .ok_or_else(|| Error::internal("source module already released"))
    }
}
