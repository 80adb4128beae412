//! Name deduplication for merge-with-rename types.
//!
//! Runs on the global `<Module>` merge (and any other merge in rename mode)
//! after members are populated. Compiled members whose imported counterparts
//! collide with pre-existing target members get `name_0, name_1, …` suffixes,
//! iterating the counter until the candidate collides with nothing — the
//! compiler may itself have emitted a `name_0`. Renaming a virtual member
//! would break override resolution, so those collisions are reported instead.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    metadata::{
        signatures::{SignatureMethod, SignatureProperty},
        token::Token,
    },
    Error, Result,
};

use super::{
    compare,
    diagnostics::{DiagnosticCode, DiagnosticSeverity, ImportDiagnostic},
    ModuleImporter,
};

impl ModuleImporter<'_> {
    /// Resolves name collisions on every merged type in rename mode.
    pub(crate) fn deduplicate_names(&mut self) -> Result<()> {
        let rename_indices: Vec<usize> = (0..self.planned.len())
            .filter(|i| self.planned[*i].merged && self.planned[*i].rename_duplicates)
            .collect();
        for index in rename_indices {
            self.deduplicate_merged_type(index)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn deduplicate_merged_type(&mut self, index: usize) -> Result<()> {
        let target_type = self.planned[index].target;
        let type_def = self
            .target
            .type_def(target_type)
            .ok_or(Error::TokenNotFound(target_type))?;

        // Existing target members define the occupied name space: methods and
        // properties key on name plus signature ignoring the return type;
        // events and fields share one plain name set.
        let mut method_keys: Vec<(String, SignatureMethod)> = type_def
            .methods
            .iter()
            .filter_map(|t| self.target.method(*t))
            .map(|m| (m.name.clone(), m.signature.clone()))
            .collect();
        let mut property_keys: Vec<(String, SignatureProperty)> = type_def
            .properties
            .iter()
            .filter_map(|t| self.target.property(*t))
            .map(|p| (p.name.clone(), p.signature.clone()))
            .collect();
        let mut event_and_field_names: FxHashSet<String> = type_def
            .events
            .iter()
            .filter_map(|t| self.target.event(*t))
            .map(|e| e.name.clone())
            .chain(
                type_def
                    .fields
                    .iter()
                    .filter_map(|t| self.target.field(*t))
                    .map(|f| f.name.clone()),
            )
            .collect();

        // Accessor-name suggestions seeded by property/event renames, applied
        // when their methods are processed below.
        let mut suggested: FxHashMap<Token, String> = FxHashMap::default();

        for property_token in self.planned[index].new_properties.clone() {
            let property = self
                .target
                .property(property_token)
                .ok_or(Error::TokenNotFound(property_token))?;
            let name = property.name.clone();
            let signature = property.signature.clone();
            let accessors: Vec<Token> = property.accessors().collect();
            let getter = property.getter;
            let setter = property.setter;

            if !self.property_key_collides(&property_keys, &name, &signature) {
                property_keys.push((name, signature));
                continue;
            }
            if self.any_accessor_virtual(&accessors) {
                self.diagnostics.push(
                    ImportDiagnostic::new(
                        DiagnosticSeverity::Error,
                        DiagnosticCode::VirtualPropertyRename,
                        format!("Property '{name}' collides with an existing member and is virtual; renaming a virtual property is not supported"),
                    )
                    .with_location(name.clone()),
                );
                continue;
            }
            let new_name = self.next_free_name(&name, |cand, me| {
                me.property_key_collides(&property_keys, cand, &signature)
            });
            if let Some(getter) = getter {
                suggested.insert(getter, format!("get_{new_name}"));
            }
            if let Some(setter) = setter {
                suggested.insert(setter, format!("set_{new_name}"));
            }
            if let Some(row) = self.target.property_mut(property_token) {
                row.name = new_name.clone();
            }
            property_keys.push((new_name, signature));
        }

        for event_token in self.planned[index].new_events.clone() {
            let event = self
                .target
                .event(event_token)
                .ok_or(Error::TokenNotFound(event_token))?;
            let name = event.name.clone();
            let accessors: Vec<Token> = event.accessors().collect();
            let add_method = event.add_method;
            let remove_method = event.remove_method;
            let raise_method = event.raise_method;

            if !event_and_field_names.contains(&name) {
                event_and_field_names.insert(name);
                continue;
            }
            if self.any_accessor_virtual(&accessors) {
                self.diagnostics.push(
                    ImportDiagnostic::new(
                        DiagnosticSeverity::Error,
                        DiagnosticCode::VirtualEventRename,
                        format!("Event '{name}' collides with an existing member and is virtual; renaming a virtual event is not supported"),
                    )
                    .with_location(name.clone()),
                );
                continue;
            }
            let new_name =
                self.next_free_name(&name, |cand, _| event_and_field_names.contains(cand));
            if let Some(add_method) = add_method {
                suggested.insert(add_method, format!("add_{new_name}"));
            }
            if let Some(remove_method) = remove_method {
                suggested.insert(remove_method, format!("remove_{new_name}"));
            }
            if let Some(raise_method) = raise_method {
                suggested.insert(raise_method, format!("raise_{new_name}"));
            }
            if let Some(row) = self.target.event_mut(event_token) {
                row.name = new_name.clone();
            }
            event_and_field_names.insert(new_name);
        }

        for method_token in self.planned[index].new_methods.clone() {
            let method = self
                .target
                .method(method_token)
                .ok_or(Error::TokenNotFound(method_token))?;
            let original_name = method.name.clone();
            let signature = method.signature.clone();
            let is_virtual = method.is_virtual();

            // A rename of the owning property or event supersedes the
            // accessor's current name.
            let mut name = suggested
                .get(&method_token)
                .cloned()
                .unwrap_or_else(|| original_name.clone());

            if self.method_key_collides(&method_keys, &name, &signature) {
                if is_virtual {
                    self.diagnostics.push(
                        ImportDiagnostic::new(
                            DiagnosticSeverity::Error,
                            DiagnosticCode::VirtualMethodRename,
                            format!("Method '{name}' collides with an existing member and is virtual; renaming a virtual method is not supported"),
                        )
                        .with_location(name.clone()),
                    );
                    method_keys.push((name, signature));
                    continue;
                }
                name = self.next_free_name(&name, |cand, me| {
                    me.method_key_collides(&method_keys, cand, &signature)
                });
            }

            if name != original_name {
                if let Some(row) = self.target.method_mut(method_token) {
                    row.name = name.clone();
                }
            }
            method_keys.push((name, signature));
        }

        for field_token in self.planned[index].new_fields.clone() {
            let field = self
                .target
                .field(field_token)
                .ok_or(Error::TokenNotFound(field_token))?;
            let name = field.name.clone();
            if !event_and_field_names.contains(&name) {
                event_and_field_names.insert(name);
                continue;
            }
            let new_name =
                self.next_free_name(&name, |cand, _| event_and_field_names.contains(cand));
            if let Some(row) = self.target.field_mut(field_token) {
                row.name = new_name.clone();
            }
            event_and_field_names.insert(new_name);
        }

        Ok(())
    }

    fn method_key_collides(
        &self,
        keys: &[(String, SignatureMethod)],
        name: &str,
        signature: &SignatureMethod,
    ) -> bool {
        keys.iter().any(|(n, sig)| {
            n == name
                && compare::method_sigs_equiv_ignoring_return(self.target, sig, self.target, signature)
        })
    }

    fn property_key_collides(
        &self,
        keys: &[(String, SignatureProperty)],
        name: &str,
        signature: &SignatureProperty,
    ) -> bool {
        keys.iter().any(|(n, sig)| {
            n == name
                && compare::property_sigs_equiv_ignoring_return(
                    self.target,
                    sig,
                    self.target,
                    signature,
                )
        })
    }

    fn any_accessor_virtual(&self, accessors: &[Token]) -> bool {
        accessors
            .iter()
            .filter_map(|t| self.target.method(*t))
            .any(crate::metadata::members::MethodDef::is_virtual)
    }

    /// `base_0, base_1, …` until the candidate collides with nothing.
    fn next_free_name(
        &self,
        base: &str,
        mut collides: impl FnMut(&str, &Self) -> bool,
    ) -> String {
        let mut counter = 0usize;
        loop {
            let candidate = format!("{base}_{counter}");
            if !collides(&candidate, self) {
                return candidate;
            }
            counter += 1;
        }
    }
}
