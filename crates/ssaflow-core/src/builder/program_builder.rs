use super::FunctionBuilder;
use crate::{
    instructions::{InstKind, Instruction, MemberOf},
    program::Program,
    values::InstId,
    IrError, Result,
};
use std::sync::Arc;

pub struct ProgramBuilder {
    name: String,
    instructions: Vec<Instruction>,
    root: Option<InstId>,
    errors: Vec<String>,
}

impl ProgramBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            instructions: Vec::new(),
            root: None,
            errors: Vec::new(),
        }
    }

    /// Builder for the root function, created on first use.
    pub fn main(&mut self) -> FunctionBuilder<'_> {
        let root = match self.root {
            Some(root) => root,
            None => {
                let root = self.push(
                    None,
                    InstKind::Function {
                        params: Vec::new(),
                        free_values: Vec::new(),
                        returns: Vec::new(),
                        side_effects: Vec::new(),
                    },
                );
                self.set_name(root, "main");
                self.root = Some(root);
                root
            }
        };
        FunctionBuilder::new(self, root)
    }

    /// Resumes building a function declared earlier.
    pub fn function(&mut self, function: InstId) -> Result<FunctionBuilder<'_>> {
        match self.instructions.get(function.index()).map(|inst| &inst.kind) {
            Some(InstKind::Function { .. }) => Ok(FunctionBuilder::new(self, function)),
            Some(_) => Err(IrError::BuilderError(format!(
                "{} is not a function",
                function
            ))),
            None => Err(IrError::UnknownInstruction(function)),
        }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn set_name(&mut self, id: InstId, name: &str) {
        if let Some(inst) = self.inst_mut(id) {
            inst.name = Some(name.to_string());
        }
    }

    /// Registers `value` as the member `object.key`.
    pub fn member(&mut self, value: InstId, object: InstId, key: InstId) {
        if let Some(inst) = self.inst_mut(value) {
            inst.member = Some(MemberOf { object, key });
        }
    }

    /// Records `mask` as a conditional alternative definition of `value`.
    pub fn add_mask(&mut self, value: InstId, mask: InstId) {
        if let Some(inst) = self.inst_mut(value) {
            if !inst.masks.contains(&mask) {
                inst.masks.push(mask);
            }
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn finish(self) -> Result<Arc<Program>> {
        if !self.errors.is_empty() {
            return Err(IrError::BuilderError(format!(
                "IR building errors: {:?}",
                self.errors
            )));
        }
        let program = Program::from_parts(self.name, self.root, self.instructions)?;
        tracing::debug!(
            program = program.name(),
            instructions = program.len(),
            "program frozen"
        );
        Ok(Arc::new(program))
    }

    pub(crate) fn push(&mut self, function: Option<InstId>, kind: InstKind) -> InstId {
        let id = InstId::from(self.instructions.len());
        self.instructions.push(Instruction::new(id, function, kind));
        id
    }

    pub(crate) fn inst_mut(&mut self, id: InstId) -> Option<&mut Instruction> {
        if id.0 < 0 || id.index() >= self.instructions.len() {
            self.add_error(format!("Unknown instruction {}", id));
            return None;
        }
        self.instructions.get_mut(id.index())
    }

    pub(crate) fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }
}
