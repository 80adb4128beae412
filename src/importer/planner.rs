//! The type plan: which source types merge onto existing target types and
//! which become fresh ones.
//!
//! Planning runs before any member is populated. It discovers the edited
//! method, walks both declaring-type chains to their outermost types, decides
//! Merge vs New for every reachable source type, and registers the identity
//! maps that later passes resolve forward references through.

use crate::{
    metadata::{
        body::CilBody,
        members::MethodImplAttributes,
        module::ModuleDef,
        token::{TableId, Token},
        types::TypeDef,
    },
    Error, Result,
};

use super::{
    compare,
    diagnostics::{DiagnosticCode, DiagnosticSeverity, ImportDiagnostic},
    ModuleImporter,
};

/// A target method whose body is replaced by the edit.
#[derive(Debug, Clone)]
pub struct EditedMethodBody {
    /// The target method receiving the new body
    pub target_method: Token,
    /// The translated replacement body; `None` clears the target body
    pub body: Option<CilBody>,
    /// Implementation attributes accompanying the new body
    pub impl_flags: MethodImplAttributes,
}

/// A source type that becomes a fresh target type.
#[derive(Debug, Clone)]
pub struct NewImportedType {
    /// The original compiled type (source-module token)
    pub source: Token,
    /// The freshly created target type
    pub target: Token,
    /// True when the type was renamed to avoid a collision
    pub renamed: bool,
}

/// A source type folded onto an existing target type.
#[derive(Debug, Clone)]
pub struct MergedImportedType {
    /// The original compiled type (source-module token)
    pub source: Token,
    /// The pre-existing target type being extended in place
    pub target: Token,
    /// True when colliding member names are disambiguated instead of stubbed
    pub rename_duplicates: bool,
    /// Fresh types nested under this type
    pub new_nested_types: Vec<NewImportedType>,
    /// Nested types merged in place, recursively
    pub merged_nested_types: Vec<MergedImportedType>,
    /// Newly imported fields (target tokens)
    pub new_fields: Vec<Token>,
    /// Newly imported methods (target tokens)
    pub new_methods: Vec<Token>,
    /// Newly imported properties (target tokens)
    pub new_properties: Vec<Token>,
    /// Newly imported events (target tokens)
    pub new_events: Vec<Token>,
    /// Replacement bodies for edited methods of this type
    pub edited_method_bodies: Vec<EditedMethodBody>,
}

impl MergedImportedType {
    /// True when the merge carries nothing: no new members, no nested
    /// additions, no edited bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_nested_types.is_empty()
            && self.new_fields.is_empty()
            && self.new_methods.is_empty()
            && self.new_properties.is_empty()
            && self.new_events.is_empty()
            && self.edited_method_bodies.is_empty()
            && self.merged_nested_types.iter().all(MergedImportedType::is_empty)
    }
}

/// The decision made for one source type.
#[derive(Debug, Clone)]
pub enum ImportedType {
    /// The type becomes a fresh target type
    New(NewImportedType),
    /// The type is fused onto an existing target type
    Merged(MergedImportedType),
}

/// Internal working form of one planned type; materialized into the public
/// descriptors once the import completes.
#[derive(Debug)]
pub(crate) struct PlannedType {
    pub(crate) source: Token,
    pub(crate) target: Token,
    pub(crate) merged: bool,
    pub(crate) rename_duplicates: bool,
    pub(crate) renamed: bool,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) new_fields: Vec<Token>,
    pub(crate) new_methods: Vec<Token>,
    pub(crate) new_properties: Vec<Token>,
    pub(crate) new_events: Vec<Token>,
    pub(crate) edited_bodies: Vec<EditedMethodBody>,
}

impl PlannedType {
    fn new(source: Token, target: Token, parent: Option<usize>) -> Self {
        PlannedType {
            source,
            target,
            merged: false,
            rename_duplicates: false,
            renamed: false,
            parent,
            children: Vec::new(),
            new_fields: Vec::new(),
            new_methods: Vec::new(),
            new_properties: Vec::new(),
            new_events: Vec::new(),
            edited_bodies: Vec::new(),
        }
    }
}

fn find_type_by_chain(module: &ModuleDef, chain: &[(String, String)]) -> Option<Token> {
    let (namespace, name) = chain.first()?;
    let mut current = module.find_type(namespace, name)?.token;
    for (_, nested_name) in &chain[1..] {
        current = module.find_nested_type(current, nested_name)?.token;
    }
    Some(current)
}

/// True when two method-override declarations (method-def or member-ref
/// tokens, each in its own module) name the same method.
fn override_equiv(
    src_module: &ModuleDef,
    src: Token,
    tgt_module: &ModuleDef,
    tgt: Token,
) -> bool {
    let resolve = |module: &ModuleDef, token: Token| -> Option<(Vec<(String, String)>, String)> {
        if token.is_table(TableId::MethodDef) {
            let declaring = module.declaring_type_of_method(token)?;
            let chain = compare::type_name_chain(module, declaring)?;
            Some((chain, module.method(token)?.name.clone()))
        } else if token.is_table(TableId::MemberRef) {
            let member_ref = module.member_ref(token)?;
            let chain = compare::type_name_chain(module, member_ref.parent)?;
            Some((chain, member_ref.name.clone()))
        } else {
            None
        }
    };
    match (resolve(src_module, src), resolve(tgt_module, tgt)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

impl ModuleImporter<'_> {
    /// Builds the type plan for the given target edited method.
    ///
    /// On success every reachable source type has a planned target identity
    /// and every stub member is registered; fatal discovery failures record
    /// IM0001/IM0002 and abort.
    pub(crate) fn plan(&mut self, edited_method: Token) -> Result<()> {
        let tgt_method = self
            .target
            .method(edited_method)
            .ok_or(Error::TokenNotFound(edited_method))?;
        let tgt_method_name = tgt_method.name.clone();
        let tgt_method_sig = tgt_method.signature.clone();
        let tgt_overrides = tgt_method.overrides.clone();

        let tgt_declaring = self
            .target
            .declaring_type_of_method(edited_method)
            .ok_or_else(|| Error::internal("edited method has no declaring type"))?;
        let tgt_chain = compare::type_name_chain(self.target, tgt_declaring)
            .ok_or_else(|| Error::internal("edited method declaring chain does not resolve"))?;

        // Find the source counterpart of the declaring type by its full
        // nesting chain, ignoring scope.
        let src = self.src()?;
        let Some(src_declaring) = find_type_by_chain(&src, &tgt_chain) else {
            let fullname = tgt_chain
                .iter()
                .map(|(ns, n)| {
                    if ns.is_empty() {
                        n.clone()
                    } else {
                        format!("{ns}.{n}")
                    }
                })
                .collect::<Vec<_>>()
                .join("/");
            drop(src);
            self.diagnostics.push(
                ImportDiagnostic::new(
                    DiagnosticSeverity::Error,
                    DiagnosticCode::DeclaringTypeNotFound,
                    "Could not find the declaring type of the edited method in the compiled assembly",
                )
                .with_location(fullname),
            );
            return Err(Error::Aborted);
        };

        // Find the source method: same name, same signature ignoring scope.
        // The `this` convention is deliberately ignored so a static toggle
        // still resolves (and is reported later as IM0009).
        let declaring = src
            .type_def(src_declaring)
            .ok_or(Error::TokenNotFound(src_declaring))?;
        let mut candidates: Vec<Token> = declaring
            .methods
            .iter()
            .copied()
            .filter(|m| {
                src.method(*m).is_some_and(|method| {
                    method.name == tgt_method_name
                        && compare::method_sigs_equiv_ignoring_this(
                            &src,
                            &method.signature,
                            self.target,
                            &tgt_method_sig,
                        )
                })
            })
            .collect();
        if candidates.len() > 1 {
            // Explicit interface implementations can collide on signature;
            // disambiguate on the first override declaration.
            candidates.retain(|m| {
                let src_first = src.method(*m).and_then(|method| method.overrides.first().copied());
                match (src_first, tgt_overrides.first().copied()) {
                    (Some(a), Some(b)) => override_equiv(&src, a, self.target, b),
                    (None, None) => true,
                    _ => false,
                }
            });
        }
        let Some(src_method) = candidates.first().copied() else {
            drop(src);
            self.diagnostics.push(
                ImportDiagnostic::new(
                    DiagnosticSeverity::Error,
                    DiagnosticCode::EditedMethodNotFound,
                    "Could not find the edited method in the compiled assembly",
                )
                .with_location(tgt_method_name),
            );
            return Err(Error::Aborted);
        };

        // Walk both declaring chains in lockstep to the outermost types and
        // merge that pair in update-in-place mode.
        let src_outer = src.outermost_type(src_declaring)?;
        drop(src);
        let tgt_outer = self.target.outermost_type(tgt_declaring)?;
        self.plan_merged_pair(src_outer, tgt_outer, false, None)?;

        // The global <Module> type merges with renaming: every compiled
        // global member is new, colliding names get disambiguated.
        let src = self.src()?;
        let src_global = src.global_type().map(|t| t.token);
        drop(src);
        if let Some(src_global) = src_global {
            if self.planned_index_of(src_global).is_none() {
                if let Some(tgt_global) = self.target.global_type().map(|t| t.token) {
                    self.plan_merged_pair(src_global, tgt_global, true, None)?;
                }
            }
        }

        // Every remaining top-level source type becomes a fresh target type
        // with a collision-free name.
        let src = self.src()?;
        let remaining: Vec<Token> = src
            .top_level_types()
            .map(|t| t.token)
            .filter(|t| self.planned_index_of(*t).is_none())
            .collect();
        drop(src);
        for type_token in remaining {
            self.plan_new_type(type_token, None, None)?;
        }

        // Force-register the edited pair: a static toggle keeps the
        // signatures from matching during stub detection, but the edited
        // method is a stub by definition.
        self.method_map.insert(src_method, edited_method);
        self.stubs.insert(src_method);
        self.edited_methods_to_fix.push((src_method, edited_method));
        Ok(())
    }

    /// Registers a Merge decision for a source/target type pair, matches
    /// members into stubs (unless renaming), and recurses through nested
    /// types. Target-side nested types with no source counterpart are left
    /// untouched; source-side extras become new types under the target
    /// nesting.
    fn plan_merged_pair(
        &mut self,
        src_type: Token,
        tgt_type: Token,
        rename_duplicates: bool,
        parent: Option<usize>,
    ) -> Result<usize> {
        let index = self.planned.len();
        let mut planned = PlannedType::new(src_type, tgt_type, parent);
        planned.merged = true;
        planned.rename_duplicates = rename_duplicates;
        self.planned.push(planned);
        self.type_def_map.insert(src_type, index);
        if let Some(parent) = parent {
            self.planned[parent].children.push(index);
        }

        if !rename_duplicates {
            self.match_stub_members(src_type, tgt_type)?;
        }

        let src = self.src()?;
        let nested: Vec<(Token, String)> = src
            .type_def(src_type)
            .ok_or(Error::TokenNotFound(src_type))?
            .nested_types
            .iter()
            .filter_map(|t| src.type_def(*t).map(|td| (*t, td.name.clone())))
            .collect();
        drop(src);

        for (nested_token, nested_name) in nested {
            match self.target.find_nested_type(tgt_type, &nested_name) {
                Some(existing) => {
                    let existing = existing.token;
                    self.plan_merged_pair(nested_token, existing, false, Some(index))?;
                }
                None => {
                    self.plan_new_type(nested_token, Some(index), Some(tgt_type))?;
                }
            }
        }
        Ok(index)
    }

    /// Matches members of a merged pair by name and scope-insensitive
    /// signature. Matches become stubs: lookups redirect to the target
    /// original and no body is imported for them.
    fn match_stub_members(&mut self, src_type: Token, tgt_type: Token) -> Result<()> {
        let src = self.src()?;
        let src_def = src.type_def(src_type).ok_or(Error::TokenNotFound(src_type))?;
        let tgt_def = self
            .target
            .type_def(tgt_type)
            .ok_or(Error::TokenNotFound(tgt_type))?;

        for src_member in &src_def.methods {
            let Some(method) = src.method(*src_member) else { continue };
            let matched = tgt_def.methods.iter().copied().find(|t| {
                self.target.method(*t).is_some_and(|candidate| {
                    candidate.name == method.name
                        && compare::method_sigs_equiv(
                            &src,
                            &method.signature,
                            self.target,
                            &candidate.signature,
                        )
                })
            });
            if let Some(matched) = matched {
                self.method_map.insert(*src_member, matched);
                self.stubs.insert(*src_member);
            }
        }

        for src_member in &src_def.fields {
            let Some(field) = src.field(*src_member) else { continue };
            let matched = tgt_def.fields.iter().copied().find(|t| {
                self.target.field(*t).is_some_and(|candidate| {
                    candidate.name == field.name
                        && compare::sigs_equiv(
                            &src,
                            &field.signature.base,
                            self.target,
                            &candidate.signature.base,
                        )
                })
            });
            if let Some(matched) = matched {
                self.field_map.insert(*src_member, matched);
                self.stubs.insert(*src_member);
            }
        }

        for src_member in &src_def.properties {
            let Some(property) = src.property(*src_member) else { continue };
            let matched = tgt_def.properties.iter().copied().find(|t| {
                self.target.property(*t).is_some_and(|candidate| {
                    candidate.name == property.name
                        && compare::property_sigs_equiv(
                            &src,
                            &property.signature,
                            self.target,
                            &candidate.signature,
                        )
                })
            });
            if let Some(matched) = matched {
                self.property_map.insert(*src_member, matched);
                self.stubs.insert(*src_member);
            }
        }

        for src_member in &src_def.events {
            let Some(event) = src.event(*src_member) else { continue };
            let matched = tgt_def.events.iter().copied().find(|t| {
                self.target
                    .event(*t)
                    .is_some_and(|candidate| candidate.name == event.name)
            });
            if let Some(matched) = matched {
                self.event_map.insert(*src_member, matched);
                self.stubs.insert(*src_member);
            }
        }
        Ok(())
    }

    /// Registers a New decision: creates the empty target shell (so cyclic
    /// references resolve), uniquifies the name for top-level types, and
    /// recurses through nested types, which are all fresh as well.
    fn plan_new_type(
        &mut self,
        src_type: Token,
        parent: Option<usize>,
        tgt_enclosing: Option<Token>,
    ) -> Result<usize> {
        let src = self.src()?;
        let src_def = src.type_def(src_type).ok_or(Error::TokenNotFound(src_type))?;
        let namespace = src_def.namespace.clone();
        let original_name = src_def.name.clone();
        let flags = src_def.flags;
        let nested: Vec<Token> = src_def.nested_types.clone();
        drop(src);

        let (name, renamed) = if tgt_enclosing.is_none() {
            self.unique_top_level_name(&namespace, &original_name)
        } else {
            (original_name, false)
        };

        let mut shell = TypeDef::new(namespace, name, flags);
        shell.enclosing_type = tgt_enclosing;
        let target_token = self.target.push_type_def(shell);

        let index = self.planned.len();
        let mut planned = PlannedType::new(src_type, target_token, parent);
        planned.renamed = renamed;
        self.planned.push(planned);
        self.type_def_map.insert(src_type, index);
        if let Some(parent) = parent {
            self.planned[parent].children.push(index);
            // Only fresh enclosing types own their nested list directly; a
            // merged enclosing type gets its additions through the descriptor.
            if !self.planned[parent].merged {
                let parent_target = self.planned[parent].target;
                if let Some(row) = self.target.type_def_mut(parent_target) {
                    row.nested_types.push(target_token);
                }
            }
        }

        for nested_token in nested {
            self.plan_new_type(nested_token, Some(index), Some(target_token))?;
        }
        Ok(index)
    }

    /// Produces a collision-free name for a new top-level type: `__N__` is
    /// prefixed with an increasing counter until the (namespace, name) pair
    /// is unused. Prefixing leaves any backtick arity suffix intact.
    fn unique_top_level_name(&mut self, namespace: &str, name: &str) -> (String, bool) {
        let key = (namespace.to_string(), name.to_string());
        if !self.top_level_names.contains(&key) {
            self.top_level_names.insert(key);
            return (name.to_string(), false);
        }
        let mut counter = 0usize;
        loop {
            let candidate = format!("__{counter}__{name}");
            let key = (namespace.to_string(), candidate.clone());
            if !self.top_level_names.contains(&key) {
                self.top_level_names.insert(key);
                return (candidate, true);
            }
            counter += 1;
        }
    }

    /// Converts the internal plan into the public descriptors, consuming the
    /// per-type accumulators. Only non-nested descriptors are returned; the
    /// nested structure hangs off its parents.
    pub(crate) fn materialize_plan(&mut self) -> (Vec<NewImportedType>, Vec<MergedImportedType>) {
        let mut new_types = Vec::new();
        let mut merged_types = Vec::new();

        let top_level: Vec<usize> = (0..self.planned.len())
            .filter(|i| self.planned[*i].parent.is_none())
            .collect();
        for index in top_level {
            if self.planned[index].merged {
                let merged = self.materialize_merged(index);
                if !merged.is_empty() {
                    merged_types.push(merged);
                }
            } else {
                new_types.push(self.materialize_new(index));
            }
        }
        (new_types, merged_types)
    }

    fn materialize_new(&self, index: usize) -> NewImportedType {
        let planned = &self.planned[index];
        NewImportedType {
            source: planned.source,
            target: planned.target,
            renamed: planned.renamed,
        }
    }

    fn materialize_merged(&mut self, index: usize) -> MergedImportedType {
        let children = self.planned[index].children.clone();
        let mut new_nested_types = Vec::new();
        let mut merged_nested_types = Vec::new();
        for child in children {
            if self.planned[child].merged {
                merged_nested_types.push(self.materialize_merged(child));
            } else {
                new_nested_types.push(self.materialize_new(child));
            }
        }
        let planned = &mut self.planned[index];
        MergedImportedType {
            source: planned.source,
            target: planned.target,
            rename_duplicates: planned.rename_duplicates,
            new_nested_types,
            merged_nested_types,
            new_fields: std::mem::take(&mut planned.new_fields),
            new_methods: std::mem::take(&mut planned.new_methods),
            new_properties: std::mem::take(&mut planned.new_properties),
            new_events: std::mem::take(&mut planned.new_events),
            edited_method_bodies: std::mem::take(&mut planned.edited_bodies),
        }
    }

    /// Attaches the replacement bodies for the edited methods and remaps
    /// their parameter operands onto the target method's slots.
    pub(crate) fn fix_edited_methods(&mut self) -> Result<()> {
        let edited: Vec<(Token, Token)> = self.edited_methods_to_fix.clone();
        for (src_method, tgt_method) in edited {
            let body = self.import_body(src_method, tgt_method, true)?;

            let src = self.src()?;
            let impl_flags = src
                .method(src_method)
                .ok_or(Error::TokenNotFound(src_method))?
                .impl_flags;
            let declaring = src
                .declaring_type_of_method(src_method)
                .ok_or_else(|| Error::internal("edited source method has no declaring type"))?;
            drop(src);

            let index = self.planned_index_of(declaring).ok_or_else(|| {
                Error::internal("edited method's declaring type was never planned")
            })?;
            self.planned[index].edited_bodies.push(EditedMethodBody {
                target_method: tgt_method,
                body,
                impl_flags,
            });
        }
        Ok(())
    }

    pub(crate) fn planned_index_of(&self, src_type: Token) -> Option<usize> {
        self.type_def_map.get(&src_type).copied()
    }

    pub(crate) fn planned_index_of_target(&self, tgt_type: Token) -> Option<usize> {
        self.planned.iter().position(|p| p.target == tgt_type)
    }
}
