//! Method body translation.
//!
//! Rebuilds a source method's instruction stream for the target identity
//! space. Instructions are cloned one-for-one with their offsets, so branch
//! targets and exception-handler boundaries (all IL offsets) survive
//! unchanged; local and argument slots go through per-body scratch maps, and
//! token operands are dispatched to the type, member, and signature importers.

use rustc_hash::FxHashMap;

use crate::{
    metadata::{
        body::{CilBody, ExceptionHandler, Instruction, LocalVariable, Operand},
        token::{TableId, Token},
    },
    Error, Result,
};

use super::{
    diagnostics::{DiagnosticCode, DiagnosticSeverity, ImportDiagnostic},
    ModuleImporter,
};

/// Per-body scratch maps from source slots to target slots. Rebuilt at the
/// start of every body import and of the edited-method parameter remap.
#[derive(Debug, Default)]
struct BodyMaps {
    locals: FxHashMap<u16, u16>,
    args: FxHashMap<u16, u16>,
}

impl ModuleImporter<'_> {
    /// Imports the body of `src_method_token` for `tgt_method_token`.
    ///
    /// Returns `Ok(None)` when the source method has no body (the caller
    /// clears the target body). `edited` marks the one method whose body
    /// replaces an existing target body: only there may the static flag
    /// differ between the two sides, reported as IM0009 while the import
    /// continues.
    pub(crate) fn import_body(
        &mut self,
        src_method_token: Token,
        tgt_method_token: Token,
        edited: bool,
    ) -> Result<Option<CilBody>> {
        let src = self.src()?;
        let src_method = src
            .method(src_method_token)
            .ok_or(Error::TokenNotFound(src_method_token))?;
        let Some(body) = src_method.body.clone() else {
            return Ok(None);
        };
        let src_static = src_method.is_static();
        let src_param_count = src_method.signature.params.len();
        let src_slots = src_method.signature.slot_count();
        let src_name = src_method.name.clone();
        drop(src);

        let tgt_method = self
            .target
            .method(tgt_method_token)
            .ok_or(Error::TokenNotFound(tgt_method_token))?;
        let tgt_static = tgt_method.is_static();
        let tgt_param_count = tgt_method.signature.params.len();

        let mut maps = BodyMaps::default();

        // Locals carry over slot-for-slot: same name, translated signature.
        let mut locals = Vec::with_capacity(body.locals.len());
        for (index, local) in body.locals.iter().enumerate() {
            let slot = u16::try_from(index).map_err(|_| Error::internal("local slot overflow"))?;
            maps.locals.insert(slot, slot);
            locals.push(LocalVariable {
                name: local.name.clone(),
                signature: self.import_local_sig(&local.signature)?,
            });
        }

        // Argument slots: skip the implicit `this` on either side
        // independently, then pair the declared parameters.
        if src_static != tgt_static {
            if edited {
                self.diagnostics.push(
                    ImportDiagnostic::new(
                        DiagnosticSeverity::Error,
                        DiagnosticCode::EditedMethodStaticToggle,
                        "Adding or removing 'static' from the edited method is not supported",
                    )
                    .with_location(src_name.clone()),
                );
            } else {
                return Err(Error::internal(format!(
                    "static flag mismatch importing body of '{src_name}'"
                )));
            }
        }
        if src_param_count != tgt_param_count {
            return Err(Error::internal(format!(
                "parameter count mismatch importing body of '{src_name}': {src_param_count} vs {tgt_param_count}"
            )));
        }
        let src_this = u16::from(!src_static);
        let tgt_this = u16::from(!tgt_static);
        if src_this == 1 && tgt_this == 1 {
            maps.args.insert(0, 0);
        }
        for k in 0..src_param_count {
            let k = u16::try_from(k).map_err(|_| Error::internal("argument slot overflow"))?;
            maps.args.insert(src_this + k, tgt_this + k);
        }
        debug_assert!(maps.args.len() <= src_slots + 1);

        // Shallow-clone every instruction, then translate operands in a
        // second pass so intra-body references see the complete stream.
        let mut instructions: Vec<Instruction> = body.instructions.clone();
        for instruction in &mut instructions {
            instruction.operand = self.import_operand(&instruction.operand, &maps)?;
        }

        let mut exception_handlers = Vec::with_capacity(body.exception_handlers.len());
        for handler in &body.exception_handlers {
            let catch_type = match handler.catch_type {
                Some(token) => self.import_type_def_or_ref(token)?,
                None => None,
            };
            exception_handlers.push(ExceptionHandler {
                catch_type,
                ..handler.clone()
            });
        }

        Ok(Some(CilBody {
            keep_old_max_stack: body.keep_old_max_stack,
            init_locals: body.init_locals,
            header_size: body.header_size,
            max_stack: body.max_stack,
            local_var_sig_token: body.local_var_sig_token,
            locals,
            instructions,
            exception_handlers,
        }))
    }

    fn import_operand(&mut self, operand: &Operand, maps: &BodyMaps) -> Result<Operand> {
        Ok(match operand {
            Operand::Local(slot) => match maps.locals.get(slot) {
                Some(mapped) => Operand::Local(*mapped),
                None => {
                    log::warn!("local slot {slot} outside the declared locals, kept as-is");
                    operand.clone()
                }
            },
            Operand::Argument(slot) => match maps.args.get(slot) {
                Some(mapped) => Operand::Argument(*mapped),
                None => {
                    log::warn!("argument slot {slot} has no counterpart, kept as-is");
                    operand.clone()
                }
            },
            Operand::Token(token) => Operand::Token(self.import_operand_token(*token)?),
            // Branch targets, switch tables, strings, and immediates are
            // position- and module-independent.
            Operand::None
            | Operand::Immediate(_)
            | Operand::Target(_)
            | Operand::Switch(_)
            | Operand::String(_) => operand.clone(),
        })
    }

    /// Dispatches a token operand by its declared kind. Unresolvable tokens
    /// keep their source value; the diagnostic has already been recorded.
    fn import_operand_token(&mut self, token: Token) -> Result<Token> {
        let table = token.table();
        let translated = if table == TableId::TypeDef as u8
            || table == TableId::TypeRef as u8
            || table == TableId::TypeSpec as u8
        {
            self.import_type_def_or_ref(token)?
        } else if table == TableId::MethodDef as u8 || table == TableId::MethodSpec as u8 {
            self.import_method_token(token)?
        } else if table == TableId::MemberRef as u8 {
            self.import_member_ref(token)?
        } else if table == TableId::Field as u8 {
            self.import_field_token(token)?
        } else if table == TableId::StandAloneSig as u8 {
            self.import_standalone_sig(token)?
        } else {
            return Err(Error::internal(format!(
                "unexpected token operand {token} in method body"
            )));
        };
        Ok(translated.unwrap_or(token))
    }

    /// Wires overrides for an imported method: each `MethodImpl` declaration
    /// is translated once all member identities are known.
    pub(crate) fn import_method_overrides(
        &mut self,
        src_method_token: Token,
        tgt_method_token: Token,
    ) -> Result<()> {
        let src = self.src()?;
        let overrides = src
            .method(src_method_token)
            .ok_or(Error::TokenNotFound(src_method_token))?
            .overrides
            .clone();
        drop(src);

        let mut translated = Vec::with_capacity(overrides.len());
        for declaration in overrides {
            if let Some(token) = self.import_method_token(declaration)? {
                translated.push(token);
            }
        }
        let row = self
            .target
            .method_mut(tgt_method_token)
            .ok_or(Error::TokenNotFound(tgt_method_token))?;
        row.overrides = translated;
        Ok(())
    }
}
