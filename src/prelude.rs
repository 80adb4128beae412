//! # dotgraft Prelude
//!
//! Convenient re-exports of the most commonly used types. Import this module
//! to get quick access to the importer surface and the metadata vocabulary it
//! operates on.

/// The main error type for all dotgraft operations
pub use crate::Error;

/// The result type used throughout dotgraft
pub use crate::Result;

/// The importer surface
pub use crate::importer::{
    DebugFileFormat, DebugFileInfo, EditedMethodBody, ImportOptions, ImportResult, ImportedType,
    MergedImportedType, ModuleImporter, NewImportedType,
};

/// Import diagnostics
pub use crate::importer::diagnostics::{
    DiagnosticCode, DiagnosticSeverity, Diagnostics, ImportDiagnostic,
};

/// Metadata token type for referencing table entries
pub use crate::metadata::token::{TableId, Token};

/// The in-memory module and its reference tables
pub use crate::metadata::module::{AssemblyRef, ModuleDef, ModuleRef};

/// Assembly identity
pub use crate::metadata::identity::{AssemblyIdentity, AssemblyVersion};

/// Type rows and attributes
pub use crate::metadata::types::{ResolutionScope, TypeAttributes, TypeDef, TypeRef, TypeSpec};

/// Member rows and attributes
pub use crate::metadata::members::{
    ConstantValue, EventAttributes, EventDef, FieldAttributes, FieldDef, GenericParam, ImplMap,
    MemberRef, MemberRefSignature, MethodAttributes, MethodDef, MethodImplAttributes, MethodSpec,
    ParamAttributes, ParamDef, PropertyAttributes, PropertyDef, StandAloneSig,
};

/// Signature trees
pub use crate::metadata::signatures::{
    SignatureField, SignatureLocalVariable, SignatureLocalVariables, SignatureMethod,
    SignatureParameter, SignatureProperty, TypeSignature,
};

/// CIL bodies and instructions
pub use crate::metadata::body::{
    opcodes, CilBody, ExceptionHandler, ExceptionHandlerFlags, Immediate, Instruction,
    LocalVariable, OpCode, Operand, SequencePoint,
};

/// Custom attributes
pub use crate::metadata::customattributes::{
    CustomAttribute, CustomAttributeArgument, CustomAttributeNamedArgument, CustomAttributeValue,
};

/// Marshalling descriptors
pub use crate::metadata::marshalling::MarshallingInfo;
