//! Custom attribute values and their argument sums (ECMA-335 II.23.3).

use crate::metadata::{signatures::TypeSignature, token::Token};

/// A custom attribute applied to a metadata row.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttribute {
    /// The attribute constructor (`MethodDef` or `MemberRef` token)
    pub constructor: Token,
    /// The attribute payload
    pub value: CustomAttributeValue,
}

/// Payload of a custom attribute: either the undecoded blob or the parsed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomAttributeValue {
    /// Blob kept verbatim (not decoded by the producer)
    Raw(Vec<u8>),
    /// Decoded constructor and named arguments
    Parsed {
        /// Fixed arguments from the constructor signature
        fixed_args: Vec<CustomAttributeArgument>,
        /// Named arguments (fields and properties)
        named_args: Vec<CustomAttributeNamedArgument>,
    },
}

/// Represents a single custom attribute argument value
#[derive(Debug, Clone, PartialEq)]
pub enum CustomAttributeArgument {
    /// Boolean value
    Bool(bool),
    /// Character value (16-bit Unicode)
    Char(char),
    /// Signed 8-bit integer
    I1(i8),
    /// Unsigned 8-bit integer
    U1(u8),
    /// Signed 16-bit integer
    I2(i16),
    /// Unsigned 16-bit integer
    U2(u16),
    /// Signed 32-bit integer
    I4(i32),
    /// Unsigned 32-bit integer
    U4(u32),
    /// Signed 64-bit integer
    I8(i64),
    /// Unsigned 64-bit integer
    U8(u64),
    /// 32-bit floating point
    R4(f32),
    /// 64-bit floating point
    R8(f64),
    /// UTF-8 string, or null
    String(Option<String>),
    /// A `System.Type` argument, carried as a type signature
    Type(TypeSignature),
    /// Enum value: the enum's type signature plus the underlying value
    Enum(TypeSignature, Box<CustomAttributeArgument>),
    /// A boxed argument (`object`-typed slots)
    Boxed(Box<CustomAttributeArgument>),
    /// Array of arguments, or null
    Array(Option<Vec<CustomAttributeArgument>>),
}

/// Represents a named argument (field or property) in a custom attribute
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttributeNamedArgument {
    /// Whether this is a field (true) or property (false)
    pub is_field: bool,
    /// Name of the field or property
    pub name: String,
    /// Declared type of the argument
    pub arg_type: TypeSignature,
    /// Value of the argument
    pub value: CustomAttributeArgument,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::{TableId, Token};

    #[test]
    fn raw_and_parsed_are_distinct() {
        let ctor = Token::from_parts(TableId::MemberRef, 1);
        let raw = CustomAttribute {
            constructor: ctor,
            value: CustomAttributeValue::Raw(vec![0x01, 0x00, 0x00, 0x00]),
        };
        let parsed = CustomAttribute {
            constructor: ctor,
            value: CustomAttributeValue::Parsed {
                fixed_args: vec![CustomAttributeArgument::I4(1)],
                named_args: Vec::new(),
            },
        };
        assert_ne!(raw, parsed);
    }

    #[test]
    fn nested_arguments() {
        let arg = CustomAttributeArgument::Array(Some(vec![
            CustomAttributeArgument::Boxed(Box::new(CustomAttributeArgument::String(Some(
                "hello".into(),
            )))),
            CustomAttributeArgument::Enum(
                TypeSignature::ValueType(Token::from_parts(TableId::TypeRef, 3)),
                Box::new(CustomAttributeArgument::I4(2)),
            ),
        ]));
        if let CustomAttributeArgument::Array(Some(items)) = &arg {
            assert_eq!(items.len(), 2);
        } else {
            panic!("expected array");
        }
    }
}
