//! Type rows: definitions, references, and specifications.
//!
//! These are the owned counterparts of the TypeDef, TypeRef, and TypeSpec tables.
//! Member ownership is expressed as token lists into the module's member tables,
//! mirroring the `field_list`/`method_list` ranges of the binary format.

use bitflags::bitflags;

use crate::metadata::{
    customattributes::CustomAttribute,
    members::{ClassLayout, GenericParam, SecurityDeclaration},
    signatures::TypeSignature,
    token::Token,
};

/// Bitmask for the visibility bits of [`TypeAttributes`]
pub const TYPE_VISIBILITY_MASK: u32 = 0x0000_0007;

bitflags! {
    /// Type attributes (a 4-byte bitmask, §II.23.1.15)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TypeAttributes: u32 {
        /// Class has no public scope
        const NOT_PUBLIC = 0x0000_0000;
        /// Class has public scope
        const PUBLIC = 0x0000_0001;
        /// Class is nested with public visibility
        const NESTED_PUBLIC = 0x0000_0002;
        /// Class is nested with private visibility
        const NESTED_PRIVATE = 0x0000_0003;
        /// Class is nested with family visibility
        const NESTED_FAMILY = 0x0000_0004;
        /// Class is nested with assembly visibility
        const NESTED_ASSEMBLY = 0x0000_0005;
        /// Class is nested with family-and-assembly visibility
        const NESTED_FAM_AND_ASSEM = 0x0000_0006;
        /// Class is nested with family-or-assembly visibility
        const NESTED_FAM_OR_ASSEM = 0x0000_0007;
        /// Class is laid out sequentially
        const SEQUENTIAL_LAYOUT = 0x0000_0008;
        /// Class layout is supplied explicitly
        const EXPLICIT_LAYOUT = 0x0000_0010;
        /// Type is an interface
        const INTERFACE = 0x0000_0020;
        /// Class is abstract
        const ABSTRACT = 0x0000_0080;
        /// Class cannot be extended
        const SEALED = 0x0000_0100;
        /// Class name is special
        const SPECIAL_NAME = 0x0000_0400;
        /// Class/Interface is imported
        const IMPORT = 0x0000_1000;
        /// Class can be serialized
        const SERIALIZABLE = 0x0000_2000;
        /// Initialize the class before first static field access
        const BEFORE_FIELD_INIT = 0x0010_0000;
        /// CLI provides 'special' behavior, depending upon the name
        const RT_SPECIAL_NAME = 0x0000_0800;
        /// Type has security associated with it
        const HAS_SECURITY = 0x0004_0000;
    }
}

impl TypeAttributes {
    /// True when the visibility bits mark the type as nested
    #[must_use]
    pub fn is_nested(&self) -> bool {
        (self.bits() & TYPE_VISIBILITY_MASK) >= TypeAttributes::NESTED_PUBLIC.bits()
    }
}

/// Where a type reference resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionScope {
    /// The current module
    Module,
    /// Another module of the same assembly, by `ModuleRef` token
    ModuleRef(Token),
    /// Another assembly, by `AssemblyRef` token
    AssemblyRef(Token),
    /// The enclosing type of a nested type reference, by `TypeRef` token
    TypeRef(Token),
}

/// The TypeDef table defines the types declared in this module.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// a 4-byte bitmask of type `TypeAttributes`, §II.23.1.15
    pub flags: TypeAttributes,
    /// `TypeName`
    pub name: String,
    /// `TypeNamespace` (empty for nested types and the global `<Module>` type)
    pub namespace: String,
    /// This type's base aka 'extends' (`TypeDef`, `TypeRef` or `TypeSpec` token)
    pub base: Option<Token>,
    /// Fields declared by this type, in declaration order
    pub fields: Vec<Token>,
    /// Methods declared by this type, in declaration order
    pub methods: Vec<Token>,
    /// Properties declared by this type
    pub properties: Vec<Token>,
    /// Events declared by this type
    pub events: Vec<Token>,
    /// Types nested inside this type
    pub nested_types: Vec<Token>,
    /// The type this one is nested in, if any
    pub enclosing_type: Option<Token>,
    /// Interfaces this type implements (`TypeDef`/`TypeRef`/`TypeSpec` tokens)
    pub interfaces: Vec<Token>,
    /// Generic parameters this type declares
    pub generic_params: Vec<GenericParam>,
    /// Field alignment and class size, when supplied explicitly
    pub class_layout: Option<ClassLayout>,
    /// Custom attributes applied to this type
    pub custom_attributes: Vec<CustomAttribute>,
    /// Declarative security attached to this type
    pub security: Vec<SecurityDeclaration>,
}

impl TypeDef {
    /// Creates a bare type definition; the module assigns rid/token on insertion.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, flags: TypeAttributes) -> Self {
        TypeDef {
            rid: 0,
            token: Token::new(0),
            flags,
            name: name.into(),
            namespace: namespace.into(),
            base: None,
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            nested_types: Vec::new(),
            enclosing_type: None,
            interfaces: Vec::new(),
            generic_params: Vec::new(),
            class_layout: None,
            custom_attributes: Vec::new(),
            security: Vec::new(),
        }
    }

    /// Returns the full name (Namespace.Name) of the type
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{0}.{1}", self.namespace, self.name)
        }
    }

    /// True for the module's global `<Module>` type
    #[must_use]
    pub fn is_global_module_type(&self) -> bool {
        self.namespace.is_empty() && self.name == "<Module>"
    }
}

/// The TypeRef table references types defined in other scopes.
#[derive(Debug, Clone)]
pub struct TypeRef {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// Where the referenced type lives
    pub scope: ResolutionScope,
    /// `TypeName`
    pub name: String,
    /// `TypeNamespace`
    pub namespace: String,
    /// Custom attributes applied to this reference
    pub custom_attributes: Vec<CustomAttribute>,
}

impl TypeRef {
    /// Creates a bare type reference; the module assigns rid/token on insertion.
    #[must_use]
    pub fn new(
        scope: ResolutionScope,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        TypeRef {
            rid: 0,
            token: Token::new(0),
            scope,
            name: name.into(),
            namespace: namespace.into(),
            custom_attributes: Vec::new(),
        }
    }

    /// Returns the full name (Namespace.Name) of the referenced type
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{0}.{1}", self.namespace, self.name)
        }
    }
}

/// The TypeSpec table holds instantiated/constructed type signatures.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// Signature of this type
    pub signature: TypeSignature,
}

impl TypeSpec {
    /// Creates a bare type specification; the module assigns rid/token on insertion.
    #[must_use]
    pub fn new(signature: TypeSignature) -> Self {
        TypeSpec {
            rid: 0,
            token: Token::new(0),
            signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_visibility() {
        assert!(!TypeAttributes::PUBLIC.is_nested());
        assert!(TypeAttributes::NESTED_PRIVATE.is_nested());
        assert!(TypeAttributes::NESTED_FAM_OR_ASSEM.is_nested());
    }

    #[test]
    fn fullname_skips_empty_namespace() {
        let global = TypeDef::new("", "<Module>", TypeAttributes::NOT_PUBLIC);
        assert_eq!(global.fullname(), "<Module>");
        assert!(global.is_global_module_type());

        let named = TypeDef::new("MyApp", "Widget", TypeAttributes::PUBLIC);
        assert_eq!(named.fullname(), "MyApp.Widget");
        assert!(!named.is_global_module_type());
    }
}
