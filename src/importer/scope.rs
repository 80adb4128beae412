//! Resolution-scope classification.
//!
//! Every type reference in the source module resolves through a scope. The
//! importer needs to know whether that scope points back at the source module
//! itself, at the module being edited, or at a foreign assembly — the three
//! cases take entirely different paths through the type resolver.

use crate::{
    metadata::types::ResolutionScope,
    Error, Result,
};

use super::ModuleImporter;

/// Classification of a source-module resolution scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    /// The scope names the source module or its assembly
    Source,
    /// The scope names the target module or its assembly
    Target,
    /// The scope names some other assembly or module
    Foreign,
}

impl ModuleImporter<'_> {
    /// Classifies a resolution scope taken from the source module.
    ///
    /// Assembly references compare by full name (name, version, culture,
    /// public key token); module references by case-insensitive file name;
    /// the self-scope is the source module by construction. Nested `TypeRef`
    /// scopes never reach this point — the resolver walks to the outermost
    /// reference first.
    pub(crate) fn classify_scope(&self, scope: &ResolutionScope) -> Result<ScopeKind> {
        let src = self.src()?;
        match scope {
            ResolutionScope::Module => Ok(ScopeKind::Source),
            ResolutionScope::ModuleRef(token) => {
                let module_ref = src
                    .module_ref(*token)
                    .ok_or(Error::TokenNotFound(*token))?;
                if module_ref.name.eq_ignore_ascii_case(&src.name) {
                    Ok(ScopeKind::Source)
                } else if module_ref.name.eq_ignore_ascii_case(&self.target.name) {
                    Ok(ScopeKind::Target)
                } else {
                    Ok(ScopeKind::Foreign)
                }
            }
            ResolutionScope::AssemblyRef(token) => {
                let assembly_ref = src
                    .assembly_ref(*token)
                    .ok_or(Error::TokenNotFound(*token))?;
                let identity = &assembly_ref.identity;
                let is_source = src
                    .assembly
                    .as_ref()
                    .is_some_and(|a| a.matches(identity));
                let is_target = self
                    .target
                    .assembly
                    .as_ref()
                    .is_some_and(|a| a.matches(identity));
                if is_source {
                    Ok(ScopeKind::Source)
                } else if is_target {
                    Ok(ScopeKind::Target)
                } else {
                    Ok(ScopeKind::Foreign)
                }
            }
            ResolutionScope::TypeRef(_) => Err(Error::internal(
                "nested TypeRef scope reached the scope classifier",
            )),
        }
    }
}
