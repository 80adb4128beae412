//! Native type marshalling descriptors (ECMA-335 II.23.2.9).
//!
//! A closed variant set covering the descriptor shapes that appear on fields
//! and parameters: plain native types, fixed strings and arrays, safe arrays,
//! sized arrays, COM interfaces, custom marshalers, and a raw fallback for
//! descriptors this vocabulary does not model.

/// A parsed marshalling descriptor attached to a field or parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarshallingInfo {
    /// Descriptor kept as raw bytes (shapes outside the closed set)
    Raw {
        /// The undecoded descriptor blob
        data: Vec<u8>,
    },
    /// Fixed-length character array embedded in a structure
    FixedSysString {
        /// Fixed size of the string buffer in characters
        size: u32,
    },
    /// COM safe array with variant type information
    SafeArray {
        /// VARIANT type constant for array elements
        variant_type: u16,
        /// Optional user-defined type name
        user_defined_name: Option<String>,
    },
    /// Fixed-size array with compile-time known size
    FixedArray {
        /// Number of elements in the fixed array
        size: u32,
        /// Optional element type (a `NATIVE_TYPE` constant)
        element_type: Option<u8>,
    },
    /// Runtime-sized array with parameter-based sizing
    Array {
        /// Element type (a `NATIVE_TYPE` constant)
        element_type: u8,
        /// Optional parameter index carrying the array size
        size_param_index: Option<u16>,
        /// Optional fixed number of elements
        num_elements: Option<u32>,
    },
    /// User-defined marshalling with a custom marshaler
    Custom {
        /// GUID string of the marshaler (historical, usually empty)
        guid: String,
        /// Native type name (historical, usually empty)
        native_type_name: String,
        /// Assembly-qualified marshaler type name
        custom_marshaler: String,
        /// Cookie string passed to the marshaler
        cookie: String,
    },
    /// COM interface with an optional IID parameter
    Interface {
        /// Optional parameter index carrying the interface IID
        iid_param_index: Option<u16>,
    },
    /// A simple native type with no parameters (a `NATIVE_TYPE` constant)
    Plain {
        /// The native type constant
        native_type: u8,
    },
}

impl MarshallingInfo {
    /// Marshal as a plain native type
    #[must_use]
    pub fn plain(native_type: u8) -> Self {
        MarshallingInfo::Plain { native_type }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_roundtrip() {
        let info = MarshallingInfo::plain(0x14); // LPSTR
        assert_eq!(info, MarshallingInfo::Plain { native_type: 0x14 });
    }

    #[test]
    fn variants_compare_field_wise() {
        let a = MarshallingInfo::FixedArray {
            size: 16,
            element_type: Some(0x02),
        };
        let b = MarshallingInfo::FixedArray {
            size: 16,
            element_type: Some(0x02),
        };
        assert_eq!(a, b);
        assert_ne!(
            a,
            MarshallingInfo::FixedArray {
                size: 8,
                element_type: Some(0x02),
            }
        );
    }
}
