//! Member rows: fields, methods, parameters, properties, events, and the
//! reference tables that point at members in other scopes.

use bitflags::bitflags;

use crate::metadata::{
    body::CilBody,
    customattributes::CustomAttribute,
    marshalling::MarshallingInfo,
    signatures::{SignatureField, SignatureMethod, SignatureProperty, TypeSignature},
    token::Token,
};

/// Bitmask for the member-access bits of [`MethodAttributes`] and [`FieldAttributes`]
pub const MEMBER_ACCESS_MASK: u32 = 0x0000_0007;

bitflags! {
    /// Field attributes (a 2-byte bitmask, §II.23.1.5)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldAttributes: u32 {
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessible by anyone in the assembly
        const ASSEMBLY = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessible by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessible by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Field can only be initialized, not written to after init
        const INIT_ONLY = 0x0020;
        /// Value is a compile-time constant
        const LITERAL = 0x0040;
        /// Reserved (to indicate this field should not be serialized when type is remoted)
        const NOT_SERIALIZED = 0x0080;
        /// Field is special
        const SPECIAL_NAME = 0x0200;
        /// Implementation is forwarded through PInvoke
        const PINVOKE_IMPL = 0x2000;
        /// CLI provides 'special' behavior, depending upon the name
        const RT_SPECIAL_NAME = 0x0400;
        /// Field has marshalling information
        const HAS_FIELD_MARSHAL = 0x1000;
        /// Field has a default value
        const HAS_DEFAULT = 0x8000;
        /// Field has an RVA
        const HAS_FIELD_RVA = 0x0100;
    }
}

bitflags! {
    /// Method attributes (a 2-byte bitmask, §II.23.1.10)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodAttributes: u32 {
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessible by anyone in the assembly
        const ASSEMBLY = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessible by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessible by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method always gets a new slot in the vtable
        const NEW_SLOT = 0x0100;
        /// Method can only be overridden if also accessible
        const STRICT = 0x0200;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// Implementation is forwarded through PInvoke
        const PINVOKE_IMPL = 0x2000;
        /// CLI provides 'special' behavior, depending upon the name
        const RT_SPECIAL_NAME = 0x1000;
        /// Method has security associated with it
        const HAS_SECURITY = 0x4000;
        /// Method calls another method containing security code
        const REQUIRE_SEC_OBJECT = 0x8000;
    }
}

bitflags! {
    /// Method implementation attributes (a 2-byte bitmask, §II.23.1.11)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MethodImplAttributes: u32 {
        /// Method impl is native
        const NATIVE = 0x0001;
        /// Method impl is OPTIL
        const OPTIL = 0x0002;
        /// Method impl is provided by the runtime
        const RUNTIME = 0x0003;
        /// Method impl is unmanaged, otherwise managed
        const UNMANAGED = 0x0004;
        /// Method cannot be inlined
        const NO_INLINING = 0x0008;
        /// Method is defined; used primarily in merge scenarios
        const FORWARD_REF = 0x0010;
        /// Method is a synchronized method
        const SYNCHRONIZED = 0x0020;
        /// Method signature is exported exactly as declared
        const PRESERVE_SIG = 0x0080;
        /// Runtime provides the implementation internally
        const INTERNAL_CALL = 0x1000;
        /// Method will not be optimized by the JIT
        const NO_OPTIMIZATION = 0x0040;
        /// Method should be inlined if possible
        const AGGRESSIVE_INLINING = 0x0100;
    }
}

bitflags! {
    /// Param attributes (a 2-byte bitmask, §II.23.1.13)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ParamAttributes: u32 {
        /// Param is [In]
        const IN = 0x0001;
        /// Param is [Out]
        const OUT = 0x0002;
        /// Param is optional
        const OPTIONAL = 0x0010;
        /// Param has a default value
        const HAS_DEFAULT = 0x1000;
        /// Param has marshalling information
        const HAS_FIELD_MARSHAL = 0x2000;
    }
}

bitflags! {
    /// Property attributes (a 2-byte bitmask, §II.23.1.14)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PropertyAttributes: u32 {
        /// Property is special
        const SPECIAL_NAME = 0x0200;
        /// CLI provides 'special' behavior, depending upon the name
        const RT_SPECIAL_NAME = 0x0400;
        /// Property has a default value
        const HAS_DEFAULT = 0x1000;
    }
}

bitflags! {
    /// Event attributes (a 2-byte bitmask, §II.23.1.4)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventAttributes: u32 {
        /// Event is special
        const SPECIAL_NAME = 0x0200;
        /// CLI provides 'special' behavior, depending upon the name
        const RT_SPECIAL_NAME = 0x0400;
    }
}

bitflags! {
    /// PInvoke attributes for an impl map entry (a 2-byte bitmask, §II.23.1.8)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PInvokeAttributes: u32 {
        /// PInvoke is to use the member name as specified
        const NO_MANGLE = 0x0001;
        /// Marshal strings as ANSI
        const CHAR_SET_ANSI = 0x0002;
        /// Marshal strings as Unicode
        const CHAR_SET_UNICODE = 0x0004;
        /// Marshal strings automatically
        const CHAR_SET_AUTO = 0x0006;
        /// Information about target function to be supported
        const SUPPORTS_LAST_ERROR = 0x0040;
        /// Platform API calling convention
        const CALL_CONV_WINAPI = 0x0100;
        /// Cdecl calling convention
        const CALL_CONV_CDECL = 0x0200;
        /// Stdcall calling convention
        const CALL_CONV_STDCALL = 0x0300;
        /// Thiscall calling convention
        const CALL_CONV_THISCALL = 0x0400;
        /// Fastcall calling convention
        const CALL_CONV_FASTCALL = 0x0500;
    }
}

/// A compile-time constant attached to a field, parameter, or property.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// Null reference constant
    Null,
    /// Boolean constant
    Boolean(bool),
    /// 16-bit Unicode character constant
    Char(u16),
    /// Signed 8-bit constant
    I1(i8),
    /// Unsigned 8-bit constant
    U1(u8),
    /// Signed 16-bit constant
    I2(i16),
    /// Unsigned 16-bit constant
    U2(u16),
    /// Signed 32-bit constant
    I4(i32),
    /// Unsigned 32-bit constant
    U4(u32),
    /// Signed 64-bit constant
    I8(i64),
    /// Unsigned 64-bit constant
    U8(u64),
    /// 32-bit floating point constant
    R4(f32),
    /// 64-bit floating point constant
    R8(f64),
    /// String constant
    String(String),
}

/// Field alignment and class size, from the ClassLayout table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassLayout {
    /// a 2-byte value, specifying the alignment of fields
    pub packing_size: u16,
    /// a 4-byte value, specifying the size of the class
    pub class_size: u32,
}

/// A declarative security record from the DeclSecurity table.
///
/// The permission set blob is scope-independent (type names inside it are
/// strings), so it crosses modules verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityDeclaration {
    /// a 2-byte security action code
    pub action: u16,
    /// The encoded permission set
    pub permission_set: Vec<u8>,
}

/// P/Invoke forwarding information from the ImplMap table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplMap {
    /// a 2-byte bitmask of type `PInvokeAttributes`
    pub flags: PInvokeAttributes,
    /// Name of the target export
    pub import_name: String,
    /// `ModuleRef` token of the target module
    pub import_scope: Token,
}

/// The Field table defines fields for types in the TypeDef table.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// a 2-byte bitmask of type `FieldAttributes`, §II.23.1.5
    pub flags: FieldAttributes,
    /// Field name
    pub name: String,
    /// Field signature
    pub signature: SignatureField,
    /// A default value (flags.HAS_DEFAULT)
    pub constant: Option<ConstantValue>,
    /// Marshalling descriptor (flags.HAS_FIELD_MARSHAL)
    pub marshal: Option<MarshallingInfo>,
    /// RVA (flags.HAS_FIELD_RVA)
    pub rva: Option<u32>,
    /// Mapped initial value bytes, when the field has an RVA
    pub initial_value: Option<Vec<u8>>,
    /// Byte offset of the field within the class, when layout is explicit
    pub layout_offset: Option<u32>,
    /// Custom attributes applied to this field
    pub custom_attributes: Vec<CustomAttribute>,
}

impl FieldDef {
    /// Creates a bare field; the module assigns rid/token on insertion.
    #[must_use]
    pub fn new(name: impl Into<String>, signature: SignatureField, flags: FieldAttributes) -> Self {
        FieldDef {
            rid: 0,
            token: Token::new(0),
            flags,
            name: name.into(),
            signature,
            constant: None,
            marshal: None,
            rva: None,
            initial_value: None,
            layout_offset: None,
            custom_attributes: Vec::new(),
        }
    }

    /// True when the field is static
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(FieldAttributes::STATIC)
    }
}

/// A row of the Param table, describing one declared parameter.
#[derive(Debug, Clone)]
pub struct ParamDef {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// a 2-byte bitmask of type `ParamAttributes`, §II.23.1.13
    pub flags: ParamAttributes,
    /// Sequence number: 0 is the return value, 1.. are the parameters
    pub sequence: u16,
    /// Parameter name
    pub name: String,
    /// A default value (flags.HAS_DEFAULT)
    pub constant: Option<ConstantValue>,
    /// Marshalling descriptor (flags.HAS_FIELD_MARSHAL)
    pub marshal: Option<MarshallingInfo>,
    /// Custom attributes applied to this parameter
    pub custom_attributes: Vec<CustomAttribute>,
}

impl ParamDef {
    /// Creates a bare param def; the module assigns rid/token on insertion.
    #[must_use]
    pub fn new(sequence: u16, name: impl Into<String>, flags: ParamAttributes) -> Self {
        ParamDef {
            rid: 0,
            token: Token::new(0),
            flags,
            sequence,
            name: name.into(),
            constant: None,
            marshal: None,
            custom_attributes: Vec::new(),
        }
    }
}

/// A generic parameter declared by a type or method.
#[derive(Debug, Clone)]
pub struct GenericParam {
    /// 2-byte index of the parameter, numbered left-to-right from zero
    pub number: u16,
    /// a 2-byte bitmask of variance and constraint flags, §II.23.1.7
    pub flags: u16,
    /// Parameter name
    pub name: String,
    /// Constraint types (`TypeDef`/`TypeRef`/`TypeSpec` tokens)
    pub constraints: Vec<Token>,
    /// Custom attributes applied to this generic parameter
    pub custom_attributes: Vec<CustomAttribute>,
}

/// The MethodDef table describes the methods declared in this module.
#[derive(Debug, Clone)]
pub struct MethodDef {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// a 2-byte bitmask of type `MethodAttributes`, §II.23.1.10
    pub flags: MethodAttributes,
    /// a 2-byte bitmask of type `MethodImplAttributes`, §II.23.1.11
    pub impl_flags: MethodImplAttributes,
    /// Method name
    pub name: String,
    /// Method signature
    pub signature: SignatureMethod,
    /// Declared parameters (sequence 0 = return value)
    pub params: Vec<ParamDef>,
    /// Generic parameters this method declares
    pub generic_params: Vec<GenericParam>,
    /// P/Invoke forwarding (flags.PINVOKE_IMPL)
    pub impl_map: Option<ImplMap>,
    /// Methods this one overrides (method-def-or-member-ref tokens)
    pub overrides: Vec<Token>,
    /// The CIL body, absent for abstract/runtime/extern methods
    pub body: Option<CilBody>,
    /// Custom attributes applied to this method
    pub custom_attributes: Vec<CustomAttribute>,
    /// Declarative security attached to this method
    pub security: Vec<SecurityDeclaration>,
}

impl MethodDef {
    /// Creates a bare method; the module assigns rid/token on insertion.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        signature: SignatureMethod,
        flags: MethodAttributes,
    ) -> Self {
        MethodDef {
            rid: 0,
            token: Token::new(0),
            flags,
            impl_flags: MethodImplAttributes::empty(),
            name: name.into(),
            signature,
            params: Vec::new(),
            generic_params: Vec::new(),
            impl_map: None,
            overrides: Vec::new(),
            body: None,
            custom_attributes: Vec::new(),
            security: Vec::new(),
        }
    }

    /// True when the method is static
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodAttributes::STATIC)
    }

    /// True when the method is virtual
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.flags.contains(MethodAttributes::VIRTUAL)
    }

    /// Sorts the declared params by sequence and drops entries whose sequence
    /// exceeds the signature's parameter count.
    ///
    /// Run after the signature has been (re)assigned so the param rows and the
    /// signature agree again.
    pub fn normalize_params(&mut self) {
        let max_sequence = u16::try_from(self.signature.params.len()).unwrap_or(u16::MAX);
        self.params.retain(|p| p.sequence <= max_sequence);
        self.params.sort_by_key(|p| p.sequence);
    }
}

/// The Property table rows, bound to accessor methods through MethodSemantics.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// a 2-byte bitmask of type `PropertyAttributes`, §II.23.1.14
    pub flags: PropertyAttributes,
    /// Property name
    pub name: String,
    /// Property signature
    pub signature: SignatureProperty,
    /// A default value (flags.HAS_DEFAULT)
    pub constant: Option<ConstantValue>,
    /// Getter method token
    pub getter: Option<Token>,
    /// Setter method token
    pub setter: Option<Token>,
    /// Other accessor method tokens
    pub others: Vec<Token>,
    /// Custom attributes applied to this property
    pub custom_attributes: Vec<CustomAttribute>,
}

impl PropertyDef {
    /// Creates a bare property; the module assigns rid/token on insertion.
    #[must_use]
    pub fn new(name: impl Into<String>, signature: SignatureProperty) -> Self {
        PropertyDef {
            rid: 0,
            token: Token::new(0),
            flags: PropertyAttributes::empty(),
            name: name.into(),
            signature,
            constant: None,
            getter: None,
            setter: None,
            others: Vec::new(),
            custom_attributes: Vec::new(),
        }
    }

    /// All bound accessor tokens, in get/set/other order
    pub fn accessors(&self) -> impl Iterator<Item = Token> + '_ {
        self.getter
            .into_iter()
            .chain(self.setter)
            .chain(self.others.iter().copied())
    }
}

/// The Event table rows, bound to accessor methods through MethodSemantics.
#[derive(Debug, Clone)]
pub struct EventDef {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// a 2-byte bitmask of type `EventAttributes`, §II.23.1.4
    pub flags: EventAttributes,
    /// Event name
    pub name: String,
    /// The delegate type of the event (`TypeDef`/`TypeRef`/`TypeSpec` token)
    pub event_type: Option<Token>,
    /// Add accessor method token
    pub add_method: Option<Token>,
    /// Remove accessor method token
    pub remove_method: Option<Token>,
    /// Raise accessor method token
    pub raise_method: Option<Token>,
    /// Other accessor method tokens
    pub others: Vec<Token>,
    /// Custom attributes applied to this event
    pub custom_attributes: Vec<CustomAttribute>,
}

impl EventDef {
    /// Creates a bare event; the module assigns rid/token on insertion.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        EventDef {
            rid: 0,
            token: Token::new(0),
            flags: EventAttributes::empty(),
            name: name.into(),
            event_type: None,
            add_method: None,
            remove_method: None,
            raise_method: None,
            others: Vec::new(),
            custom_attributes: Vec::new(),
        }
    }

    /// All bound accessor tokens, in add/remove/raise/other order
    pub fn accessors(&self) -> impl Iterator<Item = Token> + '_ {
        self.add_method
            .into_iter()
            .chain(self.remove_method)
            .chain(self.raise_method)
            .chain(self.others.iter().copied())
    }
}

/// Signature payload of a member reference.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberRefSignature {
    /// Reference to a method
    Method(SignatureMethod),
    /// Reference to a field
    Field(SignatureField),
}

/// The MemberRef table references fields and methods of types in other scopes.
#[derive(Debug, Clone)]
pub struct MemberRef {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// Declaring scope: `TypeDef`, `TypeRef`, `TypeSpec`, `MethodDef`, or `ModuleRef` token
    pub parent: Token,
    /// Member name
    pub name: String,
    /// Method or field signature
    pub signature: MemberRefSignature,
}

/// The MethodSpec table instantiates generic methods.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// The generic method being instantiated (`MethodDef` or `MemberRef` token)
    pub method: Token,
    /// Types of the generic arguments
    pub generic_args: Vec<TypeSignature>,
}

/// The StandAloneSig table carries signatures referenced directly from IL
/// (`calli` call sites and local variable signatures).
#[derive(Debug, Clone)]
pub struct StandAloneSig {
    /// `RowID`
    pub rid: u32,
    /// Token
    pub token: Token,
    /// The method signature at a `calli` site
    pub signature: SignatureMethod,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::signatures::SignatureParameter;

    #[test]
    fn method_flag_helpers() {
        let m = MethodDef::new(
            "Run",
            SignatureMethod::new(false, TypeSignature::Void, vec![]),
            MethodAttributes::PUBLIC | MethodAttributes::STATIC,
        );
        assert!(m.is_static());
        assert!(!m.is_virtual());
    }

    #[test]
    fn normalize_params_drops_stale_rows() {
        let mut m = MethodDef::new(
            "Run",
            SignatureMethod::new(false, TypeSignature::Void, vec![TypeSignature::I4]),
            MethodAttributes::PUBLIC,
        );
        m.params.push(ParamDef::new(2, "stale", ParamAttributes::empty()));
        m.params.push(ParamDef::new(1, "x", ParamAttributes::empty()));
        m.params.push(ParamDef::new(0, "", ParamAttributes::empty()));
        m.normalize_params();
        assert_eq!(m.params.len(), 2);
        assert_eq!(m.params[0].sequence, 0);
        assert_eq!(m.params[1].name, "x");
    }

    #[test]
    fn property_accessors_in_order() {
        let mut p = PropertyDef::new(
            "Value",
            SignatureProperty {
                has_this: true,
                modifiers: Vec::new(),
                base: TypeSignature::I4,
                params: vec![SignatureParameter::new(TypeSignature::I4)],
            },
        );
        p.setter = Some(Token::new(0x0600_0002));
        p.getter = Some(Token::new(0x0600_0001));
        let order: Vec<_> = p.accessors().collect();
        assert_eq!(order, vec![Token::new(0x0600_0001), Token::new(0x0600_0002)]);
    }
}
