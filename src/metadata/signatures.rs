//! Parsed signature trees for types, methods, fields, properties, and locals.
//!
//! These mirror the blob-encoded signatures of ECMA-335 II.23.2 as owned data.
//! Primitive element kinds are unit variants, so translating a signature between
//! modules reproduces the target's canonical primitive by construction; only the
//! token-carrying variants need rewriting.

use crate::metadata::token::Token;

/// Represents a parsed type in various signatures
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypeSignature {
    #[default]
    /// Not defined
    Unknown,
    /// void
    Void,
    /// bool
    Boolean,
    /// char
    Char,
    /// signed 8bit integer
    I1,
    /// unsigned 8bit integer
    U1,
    /// signed 16bit integer
    I2,
    /// unsigned 16bit integer
    U2,
    /// signed 32bit integer
    I4,
    /// unsigned 32bit integer
    U4,
    /// signed 64bit integer
    I8,
    /// unsigned 64bit integer
    U8,
    /// 32bit floating-point
    R4,
    /// 64bit floating-point
    R8,
    /// System.String
    String,
    /// signed integer, sized to executing platform
    I,
    /// unsigned integer, sized to executing platform
    U,
    /// System.Object
    Object,
    /// Type is referenced during runtime
    TypedByRef,
    /// A pointer to a type
    Ptr(SignaturePointer),
    /// Type by reference
    ByRef(Box<TypeSignature>),
    /// CIL value-type
    // TypeDefOrRefOrSpecEncoded
    ValueType(Token),
    /// CIL Class
    // TypeDefOrRefOrSpecEncoded
    Class(Token),
    /// Generic type parameter
    GenericParamType {
        /// Index into the owner type's generic parameter list
        number: u32,
        /// The `TypeDef` or `TypeRef` that declares the parameter
        owner: Token,
    },
    /// Generic method parameter
    GenericParamMethod {
        /// Index into the owner method's generic parameter list
        number: u32,
        /// The `MethodDef` that declares the parameter
        owner: Token,
    },
    /// Multi-dimensional array
    Array(SignatureArray),
    /// Single dimension array
    SzArray(SignatureSzArray),
    /// Generic type and its arguments
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
    /// Function pointer
    FnPtr(Box<SignatureMethod>),
    /// Required modifier wrapping an inner type
    // Token to TypeDef | TypeRef
    ModifiedRequired(Token, Box<TypeSignature>),
    /// Optional modifier wrapping an inner type
    // Token to TypeDef | TypeRef
    ModifiedOptional(Token, Box<TypeSignature>),
    /// A pinned type
    Pinned(Box<TypeSignature>),
    /// Fixed-length value array (non-standard extension)
    ValueArray(u32, Box<TypeSignature>),
    /// Type from another module (non-standard extension)
    Module(u32, Box<TypeSignature>),
    /// Sentinel for vararg method signature
    Sentinel,
    /// Implemented within the CLI
    Internal,
}

impl TypeSignature {
    /// True for the primitive element kinds that map onto the corlib's built-in types.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeSignature::Void
                | TypeSignature::Boolean
                | TypeSignature::Char
                | TypeSignature::I1
                | TypeSignature::U1
                | TypeSignature::I2
                | TypeSignature::U2
                | TypeSignature::I4
                | TypeSignature::U4
                | TypeSignature::I8
                | TypeSignature::U8
                | TypeSignature::R4
                | TypeSignature::R8
                | TypeSignature::String
                | TypeSignature::I
                | TypeSignature::U
                | TypeSignature::Object
                | TypeSignature::TypedByRef
        )
    }
}

/// Array shape for a multi-dimensional array signature
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureArray {
    /// The element type of the array
    pub base: Box<TypeSignature>,
    /// The number of dimensions
    pub rank: u32,
    /// Declared sizes, in order from dimension 0 (may be shorter than `rank`)
    pub sizes: Vec<u32>,
    /// Declared lower bounds, in order from dimension 0 (may be shorter than `rank`)
    pub lower_bounds: Vec<i32>,
}

/// A single dimension array
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureSzArray {
    /// Custom modifiers - `TypeDefOrRefOrSpecEncoded`
    pub modifiers: Vec<Token>,
    /// The type in the array
    pub base: Box<TypeSignature>,
}

/// A pointer to a type
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignaturePointer {
    /// Custom modifiers - `TypeDefOrRefOrSpecEncoded`
    pub modifiers: Vec<Token>,
    /// The type pointed to
    pub base: Box<TypeSignature>,
}

/// Parameter with optional custom modifiers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureParameter {
    /// Custom modifiers of the parameter - `TypeDefOrRefOrSpecEncoded`
    pub modifiers: Vec<Token>,
    /// Parameter is passed by reference
    pub by_ref: bool,
    /// The type of the parameter
    pub base: TypeSignature,
}

impl SignatureParameter {
    /// Plain parameter of the given type, no modifiers
    #[must_use]
    pub fn new(base: TypeSignature) -> Self {
        SignatureParameter {
            modifiers: Vec::new(),
            by_ref: false,
            base,
        }
    }
}

/// Represents a method signature (II.23.2.1)
#[derive(Debug, Clone, PartialEq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SignatureMethod {
    /// Used to encode the keyword instance in the calling convention, see §II.15.3
    pub has_this: bool,
    /// Used to encode the keyword explicit in the calling convention, see §II.15.3
    pub explicit_this: bool,
    /// Used to encode the keyword default in the calling convention, see §II.15.3
    pub default: bool,
    /// Used to encode the keyword vararg in the calling convention, see §II.15.3
    pub vararg: bool,
    /// Uses native 'cdecl' calling convention
    pub cdecl: bool,
    /// Uses native 'stdcall' calling convention
    pub stdcall: bool,
    /// Uses native 'thiscall' calling convention
    pub thiscall: bool,
    /// Uses native 'fastcall' calling convention
    pub fastcall: bool,
    /// Number of generic parameters this method declares
    pub param_count_generic: u32,
    /// The return type of this method
    pub return_type: SignatureParameter,
    /// The parameters of this method
    pub params: Vec<SignatureParameter>,
    /// The vararg parameters, trailing the sentinel
    pub varargs: Vec<SignatureParameter>,
}

impl SignatureMethod {
    /// Instance or static method with default calling convention
    #[must_use]
    pub fn new(has_this: bool, return_type: TypeSignature, params: Vec<TypeSignature>) -> Self {
        SignatureMethod {
            has_this,
            default: true,
            return_type: SignatureParameter::new(return_type),
            params: params.into_iter().map(SignatureParameter::new).collect(),
            ..SignatureMethod::default()
        }
    }

    /// Number of argument slots including the implicit `this`
    #[must_use]
    pub fn slot_count(&self) -> usize {
        usize::from(self.has_this) + self.params.len()
    }
}

/// Field signature (II.23.2.4)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureField {
    /// The custom modifiers for this field - `TypeDefOrRefOrSpecEncoded`
    pub modifiers: Vec<Token>,
    /// The signature of this type
    pub base: TypeSignature,
}

impl SignatureField {
    /// Field of the given type, no modifiers
    #[must_use]
    pub fn new(base: TypeSignature) -> Self {
        SignatureField {
            modifiers: Vec::new(),
            base,
        }
    }
}

/// Property signature (II.23.2.5)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureProperty {
    /// Indicates the passing of a 'this' pointer
    pub has_this: bool,
    /// The custom modifiers for this property - `TypeDefOrRefOrSpecEncoded`
    pub modifiers: Vec<Token>,
    /// The signature of this property
    pub base: TypeSignature,
    /// The parameters of this property (indexers)
    pub params: Vec<SignatureParameter>,
}

/// Local variable signature (II.23.2.6)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureLocalVariables {
    /// The local variables
    pub locals: Vec<SignatureLocalVariable>,
}

/// Represents a local variable in a method body
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureLocalVariable {
    /// Custom modifiers
    pub modifiers: Vec<Token>,
    /// Is passed by reference
    pub is_byref: bool,
    /// This variable is pinned
    pub is_pinned: bool,
    /// The signature of this variable
    pub base: TypeSignature,
}

/// Type specification signature (II.23.2.14)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureTypeSpec {
    /// Signature of this type
    pub base: TypeSignature,
}

/// Represents a method specification (II.23.2.15)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureMethodSpec {
    /// Types of the generic arguments
    pub generic_args: Vec<TypeSignature>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::{TableId, Token};

    #[test]
    fn primitives_are_primitive() {
        assert!(TypeSignature::I4.is_primitive());
        assert!(TypeSignature::Object.is_primitive());
        assert!(!TypeSignature::Class(Token::from_parts(TableId::TypeDef, 1)).is_primitive());
        assert!(!TypeSignature::Unknown.is_primitive());
    }

    #[test]
    fn slot_count_includes_this() {
        let instance = SignatureMethod::new(true, TypeSignature::Void, vec![TypeSignature::I4]);
        assert_eq!(instance.slot_count(), 2);

        let stat = SignatureMethod::new(false, TypeSignature::Void, vec![TypeSignature::I4]);
        assert_eq!(stat.slot_count(), 1);
    }

    #[test]
    fn structural_equality() {
        let a = SignatureMethod::new(false, TypeSignature::I4, vec![TypeSignature::String]);
        let b = SignatureMethod::new(false, TypeSignature::I4, vec![TypeSignature::String]);
        assert_eq!(a, b);
    }
}
