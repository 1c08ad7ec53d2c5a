use super::ProgramBuilder;
use crate::{
    instructions::{BinaryOp, InstKind, SideEffectDecl, UnaryOp, UndefinedKind},
    values::{Constant, InstId},
};
use indexmap::IndexMap;

/// Appends instructions to one function of a [`ProgramBuilder`].
///
/// Nested functions borrow the parent builder, so a closure body is finished before the
/// enclosing function continues, mirroring source order.
pub struct FunctionBuilder<'a> {
    builder: &'a mut ProgramBuilder,
    function: InstId,
}

impl<'a> FunctionBuilder<'a> {
    pub(crate) fn new(builder: &'a mut ProgramBuilder, function: InstId) -> Self {
        Self { builder, function }
    }

    pub fn id(&self) -> InstId {
        self.function
    }

    pub fn constant(&mut self, value: impl Into<Constant>) -> InstId {
        self.emit(InstKind::ConstInst(value.into()))
    }

    pub fn undefined(&mut self, name: &str) -> InstId {
        let id = self.emit(InstKind::Undefined(UndefinedKind::Value));
        self.builder.set_name(id, name);
        id
    }

    /// Placeholder for reading `object.key` before anything was written to it.
    pub fn undefined_member(&mut self, object: InstId, key: InstId) -> InstId {
        let id = self.emit(InstKind::Undefined(UndefinedKind::Member));
        self.builder.member(id, object, key);
        id
    }

    pub fn param(&mut self, name: &str) -> InstId {
        let index = self.signature_len(|params, _| params.len());
        let id = self.emit(InstKind::Parameter {
            index,
            is_free_value: false,
        });
        self.builder.set_name(id, name);
        self.with_signature(|params, _, _, _| params.push(id));
        id
    }

    /// A variable captured from an enclosing function.
    pub fn free_value(&mut self, name: &str) -> InstId {
        let index = self.signature_len(|_, free_values| free_values.len());
        let id = self.emit(InstKind::Parameter {
            index,
            is_free_value: true,
        });
        self.builder.set_name(id, name);
        self.with_signature(|_, free_values, _, _| free_values.push(id));
        id
    }

    pub fn make(&mut self, name: &str) -> InstId {
        let id = self.emit(InstKind::Make);
        self.builder.set_name(id, name);
        id
    }

    pub fn binop(&mut self, op: BinaryOp, x: InstId, y: InstId) -> InstId {
        self.emit(InstKind::BinOp { op, x, y })
    }

    pub fn add(&mut self, x: InstId, y: InstId) -> InstId {
        self.binop(BinaryOp::Add, x, y)
    }

    pub fn unop(&mut self, op: UnaryOp, x: InstId) -> InstId {
        self.emit(InstKind::UnOp { op, x })
    }

    /// Member read `object.key`; the result is registered as that member.
    pub fn field(&mut self, object: InstId, key: InstId) -> InstId {
        let id = self.emit(InstKind::Field { object, key });
        self.builder.member(id, object, key);
        id
    }

    pub fn call(&mut self, method: InstId, args: Vec<InstId>) -> InstId {
        self.emit(InstKind::Call {
            method,
            args,
            binding: IndexMap::new(),
        })
    }

    /// Call that also binds captured variables of the callee by name.
    pub fn call_with_binding(
        &mut self,
        method: InstId,
        args: Vec<InstId>,
        binding: Vec<(&str, InstId)>,
    ) -> InstId {
        let binding = binding
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        self.emit(InstKind::Call {
            method,
            args,
            binding,
        })
    }

    pub fn ret(&mut self, results: Vec<InstId>) -> InstId {
        let id = self.emit(InstKind::Return { results });
        self.with_signature(|_, _, returns, _| returns.push(id));
        id
    }

    pub fn phi(&mut self, edges: Vec<InstId>) -> InstId {
        self.emit(InstKind::Phi { edges })
    }

    /// Adds an incoming edge to a phi created before its loop back-edge existed.
    pub fn add_phi_edge(&mut self, phi: InstId, edge: InstId) {
        let added = match self.builder.inst_mut(phi) {
            Some(inst) => match &mut inst.kind {
                InstKind::Phi { edges } => {
                    edges.push(edge);
                    true
                }
                _ => false,
            },
            None => return,
        };
        if !added {
            self.builder.add_error(format!("{} is not a phi", phi));
        }
    }

    /// The value of captured variable `name` after `call` ran a closure that writes it.
    pub fn side_effect(&mut self, name: &str, call: InstId, value: InstId) -> InstId {
        let id = self.emit(InstKind::SideEffect { call, value });
        self.builder.set_name(id, name);
        id
    }

    /// Declares that this function writes captured variable `name` with `modify`.
    pub fn declare_side_effect(&mut self, name: &str, modify: InstId) {
        let decl = SideEffectDecl {
            name: name.to_string(),
            modify,
        };
        self.with_signature(|_, _, _, side_effects| side_effects.push(decl));
    }

    /// Lists an instruction emitted elsewhere among this function's returns.
    pub fn declare_return(&mut self, ret: InstId) {
        self.with_signature(|_, _, returns, _| {
            if !returns.contains(&ret) {
                returns.push(ret);
            }
        });
    }

    /// Names `value` as the SSA variable `name` and returns it.
    pub fn assign(&mut self, name: &str, value: InstId) -> InstId {
        self.builder.set_name(value, name);
        value
    }

    pub fn member(&mut self, value: InstId, object: InstId, key: InstId) {
        self.builder.member(value, object, key);
    }

    pub fn add_mask(&mut self, value: InstId, mask: InstId) {
        self.builder.add_mask(value, mask);
    }

    /// Declares a nested function without a body, for forward references.
    pub fn declare_function(&mut self, name: &str) -> InstId {
        let id = self.emit(InstKind::Function {
            params: Vec::new(),
            free_values: Vec::new(),
            returns: Vec::new(),
            side_effects: Vec::new(),
        });
        self.builder.set_name(id, name);
        id
    }

    /// Declares a nested function and returns a builder for its body.
    pub fn function(&mut self, name: &str) -> FunctionBuilder<'_> {
        let id = self.declare_function(name);
        FunctionBuilder::new(self.builder, id)
    }

    /// Continues the body of a function declared earlier.
    pub fn enter(&mut self, function: InstId) -> FunctionBuilder<'_> {
        let is_function = matches!(
            self.builder.inst_mut(function).map(|inst| &inst.kind),
            Some(InstKind::Function { .. }) | None
        );
        if !is_function {
            self.builder
                .add_error(format!("{} is not a function", function));
        }
        FunctionBuilder::new(self.builder, function)
    }

    fn emit(&mut self, kind: InstKind) -> InstId {
        let function = self.function;
        self.builder.push(Some(function), kind)
    }

    fn signature_len(&mut self, f: impl FnOnce(&Vec<InstId>, &Vec<InstId>) -> usize) -> usize {
        match self.builder.inst_mut(self.function).map(|inst| &inst.kind) {
            Some(InstKind::Function {
                params,
                free_values,
                ..
            }) => f(params, free_values),
            _ => 0,
        }
    }

    fn with_signature(
        &mut self,
        f: impl FnOnce(
            &mut Vec<InstId>,
            &mut Vec<InstId>,
            &mut Vec<InstId>,
            &mut Vec<SideEffectDecl>,
        ),
    ) {
        let function = self.function;
        let applied = match self.builder.inst_mut(function) {
            Some(inst) => match &mut inst.kind {
                InstKind::Function {
                    params,
                    free_values,
                    returns,
                    side_effects,
                } => {
                    f(params, free_values, returns, side_effects);
                    true
                }
                _ => false,
            },
            None => return,
        };
        if !applied {
            self.builder
                .add_error(format!("{} is not a function", function));
        }
    }
}
