//! Type resolution from the source identity space into the target.
//!
//! A type-def-or-ref-or-spec token from the source module becomes a target
//! token: planned type definitions through the plan map, references through
//! name resolution (target scope) or reference synthesis (foreign scope),
//! specifications through signature translation.

use crate::{
    metadata::{
        token::{TableId, Token},
        types::{ResolutionScope, TypeRef, TypeSpec},
    },
    Error, Result,
};

use super::{
    diagnostics::{DiagnosticCode, DiagnosticSeverity, ImportDiagnostic},
    scope::ScopeKind,
    ModuleImporter,
};

/// Cap on resolution-scope chain walks; longer chains resolve to null.
pub(crate) const MAX_SCOPE_RECURSION: usize = 500;

impl ModuleImporter<'_> {
    /// Translates a source type-def-or-ref-or-spec token to the target module.
    ///
    /// Returns `Ok(None)` when the type could not be resolved recoverably
    /// (diagnostic already recorded); fatal inconsistencies raise an error.
    pub(crate) fn import_type_def_or_ref(&mut self, token: Token) -> Result<Option<Token>> {
        if token.is_table(TableId::TypeDef) {
            // Planning registers every reachable source TypeDef before anything
            // resolves through it.
            let planned = self
                .planned_index_of(token)
                .ok_or_else(|| Error::internal(format!("unplanned source TypeDef {token}")))?;
            return Ok(Some(self.planned[planned].target));
        }
        if token.is_table(TableId::TypeRef) {
            return self.import_type_ref(token);
        }
        if token.is_table(TableId::TypeSpec) {
            let src = self.src()?;
            let spec = src.type_spec(token).ok_or(Error::TokenNotFound(token))?;
            let signature = spec.signature.clone();
            drop(src);
            let imported = self.import_type_sig(&signature)?;
            return Ok(Some(self.target.push_type_spec(TypeSpec::new(imported))));
        }
        Err(Error::internal(format!(
            "token {token} is not a type-def-or-ref-or-spec"
        )))
    }

    fn import_type_ref(&mut self, token: Token) -> Result<Option<Token>> {
        if let Some(cached) = self.type_ref_map.get(&token) {
            return Ok(Some(*cached));
        }

        let src = self.src()?;

        // Walk to the outermost enclosing reference; the chain ends up
        // outermost-first.
        let mut chain = Vec::new();
        let mut current = token;
        loop {
            if chain.len() >= MAX_SCOPE_RECURSION {
                log::warn!("TypeRef scope chain exceeds {MAX_SCOPE_RECURSION} entries, resolving to null");
                return Ok(None);
            }
            let type_ref = src.type_ref(current).ok_or(Error::TokenNotFound(current))?;
            chain.push(current);
            match type_ref.scope {
                ResolutionScope::TypeRef(outer) => current = outer,
                _ => break,
            }
        }
        chain.reverse();

        let outermost = src
            .type_ref(chain[0])
            .ok_or(Error::TokenNotFound(chain[0]))?;
        let outer_scope = outermost.scope;
        drop(src);

        match self.classify_scope(&outer_scope)? {
            ScopeKind::Target => self.resolve_target_type_ref(token, &chain),
            ScopeKind::Source => Err(Error::internal(
                "source-scoped TypeRef encountered; self references must be TypeDefs",
            )),
            ScopeKind::Foreign => self.synthesize_foreign_type_ref(token, &chain, outer_scope),
        }
    }

    /// A reference whose scope is the target assembly resolves by name against
    /// the target's type definitions.
    fn resolve_target_type_ref(&mut self, token: Token, chain: &[Token]) -> Result<Option<Token>> {
        let src = self.src()?;
        let outermost = src
            .type_ref(chain[0])
            .ok_or(Error::TokenNotFound(chain[0]))?;

        let mut resolved = match self.target.find_type(&outermost.namespace, &outermost.name) {
            Some(t) => t.token,
            None => {
                let fullname = outermost.fullname();
                drop(src);
                self.diagnostics.push(
                    ImportDiagnostic::new(
                        DiagnosticSeverity::Error,
                        DiagnosticCode::TargetTypeRefNotFound,
                        format!("Could not resolve type reference '{fullname}' in the edited module"),
                    )
                    .with_location(fullname),
                );
                return Ok(None);
            }
        };

        for nested in &chain[1..] {
            let nested_ref = src.type_ref(*nested).ok_or(Error::TokenNotFound(*nested))?;
            resolved = match self.target.find_nested_type(resolved, &nested_ref.name) {
                Some(t) => t.token,
                None => {
                    let fullname = nested_ref.fullname();
                    drop(src);
                    self.diagnostics.push(
                        ImportDiagnostic::new(
                            DiagnosticSeverity::Error,
                            DiagnosticCode::TargetTypeRefNotFound,
                            format!(
                                "Could not resolve type reference '{fullname}' in the edited module"
                            ),
                        )
                        .with_location(fullname),
                    );
                    return Ok(None);
                }
            };
        }

        drop(src);
        self.type_ref_map.insert(token, resolved);
        Ok(Some(resolved))
    }

    /// A reference into a foreign assembly is rebuilt in the target: the
    /// outermost reference gets a translated scope, nested references chain
    /// through the freshly created rows.
    fn synthesize_foreign_type_ref(
        &mut self,
        token: Token,
        chain: &[Token],
        outer_scope: ResolutionScope,
    ) -> Result<Option<Token>> {
        let target_scope = match outer_scope {
            ResolutionScope::AssemblyRef(src_token) => {
                let src = self.src()?;
                let identity = src
                    .assembly_ref(src_token)
                    .ok_or(Error::TokenNotFound(src_token))?
                    .identity
                    .clone();
                drop(src);
                ResolutionScope::AssemblyRef(self.target.get_or_create_assembly_ref(&identity))
            }
            ResolutionScope::ModuleRef(src_token) => {
                let src = self.src()?;
                let name = src
                    .module_ref(src_token)
                    .ok_or(Error::TokenNotFound(src_token))?
                    .name
                    .clone();
                drop(src);
                ResolutionScope::ModuleRef(self.target.get_or_create_module_ref(&name))
            }
            ResolutionScope::Module | ResolutionScope::TypeRef(_) => {
                return Err(Error::internal("foreign scope is neither assembly nor module"))
            }
        };

        let mut scope = target_scope;
        let mut created = Token::new(0);
        for src_token in chain {
            let src = self.src()?;
            let source_ref = src.type_ref(*src_token).ok_or(Error::TokenNotFound(*src_token))?;
            let (namespace, name) = (source_ref.namespace.clone(), source_ref.name.clone());
            let attributes = source_ref.custom_attributes.clone();
            drop(src);

            created = self
                .target
                .push_type_ref(TypeRef::new(scope, namespace, name));
            let imported_attrs = self.import_custom_attributes(&attributes)?;
            if let Some(row) = self.target.type_ref_mut(created) {
                row.custom_attributes = imported_attrs;
            }
            self.type_ref_map.insert(*src_token, created);
            scope = ResolutionScope::TypeRef(created);
        }

        debug_assert!(self.type_ref_map.contains_key(&token));
        Ok(Some(created))
    }
}
