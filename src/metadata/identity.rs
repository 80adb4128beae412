//! Assembly identity for scope classification.
//!
//! .NET assemblies are identified by the combination of simple name, four-part
//! version, culture, and public key token. The importer compares identities to
//! decide whether an assembly reference points back at the source module, at the
//! target module, or at a foreign assembly.

use std::fmt;

/// Four-part assembly version (major.minor.build.revision).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AssemblyVersion {
    /// Major version component
    pub major: u16,
    /// Minor version component
    pub minor: u16,
    /// Build number component
    pub build: u16,
    /// Revision number component
    pub revision: u16,
}

impl AssemblyVersion {
    /// Creates a new version from its four components
    #[must_use]
    pub fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        AssemblyVersion {
            major,
            minor,
            build,
            revision,
        }
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Complete identity information for a .NET assembly.
///
/// Two assemblies with identical components are considered the same assembly;
/// [`AssemblyIdentity::matches`] implements the full-name comparison the scope
/// classifier relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssemblyIdentity {
    /// Simple assembly name (e.g. "mscorlib", "System.Core")
    pub name: String,
    /// Four-part version for binding decisions
    pub version: AssemblyVersion,
    /// Localization culture; `None` for culture-neutral assemblies
    pub culture: Option<String>,
    /// Public key token (8 bytes) when the assembly is strong-named
    pub public_key_token: Option<Vec<u8>>,
}

impl AssemblyIdentity {
    /// Creates a new assembly identity
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: AssemblyVersion,
        culture: Option<String>,
        public_key_token: Option<Vec<u8>>,
    ) -> Self {
        AssemblyIdentity {
            name: name.into(),
            version,
            culture,
            public_key_token,
        }
    }

    /// Full-name equality: name, version, culture, and public key token must all match.
    ///
    /// Assembly simple names compare case-insensitively, as the runtime's binder does.
    #[must_use]
    pub fn matches(&self, other: &AssemblyIdentity) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.version == other.version
            && culture_eq(self.culture.as_deref(), other.culture.as_deref())
            && self.public_key_token == other.public_key_token
    }

    /// Display name in the conventional `Name, Version=..., Culture=..., PublicKeyToken=...` form.
    #[must_use]
    pub fn display_name(&self) -> String {
        let culture = self.culture.as_deref().unwrap_or("neutral");
        let pkt = match &self.public_key_token {
            Some(bytes) => bytes.iter().map(|b| format!("{b:02x}")).collect::<String>(),
            None => "null".to_string(),
        };
        format!(
            "{}, Version={}, Culture={}, PublicKeyToken={}",
            self.name, self.version, culture, pkt
        )
    }
}

fn culture_eq(a: Option<&str>, b: Option<&str>) -> bool {
    // An absent culture and an explicit "neutral" are the same thing.
    let norm = |c: Option<&str>| match c {
        None => None,
        Some(s) if s.eq_ignore_ascii_case("neutral") || s.is_empty() => None,
        Some(s) => Some(s.to_ascii_lowercase()),
    };
    norm(a) == norm(b)
}

impl fmt::Display for AssemblyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str, version: AssemblyVersion) -> AssemblyIdentity {
        AssemblyIdentity::new(name, version, None, None)
    }

    #[test]
    fn matches_is_case_insensitive_on_name() {
        let a = identity("MyLib", AssemblyVersion::new(1, 0, 0, 0));
        let b = identity("mylib", AssemblyVersion::new(1, 0, 0, 0));
        assert!(a.matches(&b));
    }

    #[test]
    fn version_mismatch_fails() {
        let a = identity("MyLib", AssemblyVersion::new(1, 0, 0, 0));
        let b = identity("MyLib", AssemblyVersion::new(1, 0, 0, 1));
        assert!(!a.matches(&b));
    }

    #[test]
    fn neutral_culture_equals_absent() {
        let mut a = identity("MyLib", AssemblyVersion::default());
        a.culture = Some("neutral".to_string());
        let b = identity("MyLib", AssemblyVersion::default());
        assert!(a.matches(&b));
    }

    #[test]
    fn public_key_token_compared() {
        let mut a = identity("MyLib", AssemblyVersion::default());
        a.public_key_token = Some(vec![0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89]);
        let b = identity("MyLib", AssemblyVersion::default());
        assert!(!a.matches(&b));
    }

    #[test]
    fn display_name_format() {
        let mut id = identity("System.Core", AssemblyVersion::new(3, 5, 0, 0));
        id.public_key_token = Some(vec![0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89]);
        assert_eq!(
            id.display_name(),
            "System.Core, Version=3.5.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089"
        );
    }
}
