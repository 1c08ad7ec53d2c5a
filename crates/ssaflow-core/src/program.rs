use crate::{
    instructions::{InstKind, Instruction},
    values::InstId,
    IrError, Result,
};

/// A frozen instruction arena with a precomputed users index.
///
/// Programs are immutable after [`crate::ProgramBuilder::finish`] and are shared behind an
/// `Arc`, so any number of concurrent traversals can read them without synchronization.
#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    root: Option<InstId>,
    instructions: Vec<Instruction>,
    users: Vec<Vec<InstId>>,
}

impl Program {
    pub(crate) fn from_parts(
        name: String,
        root: Option<InstId>,
        instructions: Vec<Instruction>,
    ) -> Result<Self> {
        let len = instructions.len();
        for (index, inst) in instructions.iter().enumerate() {
            if inst.id.index() != index {
                return Err(IrError::BuilderError(format!(
                    "Instruction {} stored at slot {}",
                    inst.id, index
                )));
            }
            if let Some(missing) = inst
                .references()
                .into_iter()
                .find(|r| r.0 < 0 || r.index() >= len)
            {
                return Err(IrError::InvalidReference {
                    from: inst.id,
                    to: missing,
                });
            }
        }

        let mut users: Vec<Vec<InstId>> = vec![Vec::new(); len];
        for inst in &instructions {
            for operand in inst.operands() {
                let list = &mut users[operand.index()];
                if !list.contains(&inst.id) {
                    list.push(inst.id);
                }
            }
        }

        Ok(Self {
            name,
            root,
            instructions,
            users,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The top-level function every other instruction is nested in.
    pub fn root(&self) -> Option<InstId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instruction(&self, id: InstId) -> Option<&Instruction> {
        if id.0 < 0 {
            return None;
        }
        self.instructions.get(id.index())
    }

    pub fn get(&self, id: InstId) -> Result<&Instruction> {
        self.instruction(id).ok_or(IrError::UnknownInstruction(id))
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    pub fn users(&self, id: InstId) -> &[InstId] {
        if id.0 < 0 {
            return &[];
        }
        self.users.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn operands(&self, id: InstId) -> Vec<InstId> {
        self.instruction(id)
            .map(Instruction::operands)
            .unwrap_or_default()
    }

    pub fn function_of(&self, id: InstId) -> Option<InstId> {
        self.instruction(id).and_then(Instruction::function_of)
    }

    /// Instructions of `function` carrying the variable name `name`, in definition order.
    pub fn definitions_of(&self, function: InstId, name: &str) -> Vec<InstId> {
        self.instructions
            .iter()
            .filter(|inst| inst.function == Some(function) && inst.name.as_deref() == Some(name))
            .map(|inst| inst.id)
            .collect()
    }

    /// Calls whose method is exactly `function`.
    pub fn call_sites(&self, function: InstId) -> Vec<InstId> {
        self.users(function)
            .iter()
            .copied()
            .filter(|user| {
                matches!(
                    self.instruction(*user).map(|inst| &inst.kind),
                    Some(InstKind::Call { method, .. }) if *method == function
                )
            })
            .collect()
    }

    pub fn find_by_name(&self, name: &str) -> Vec<InstId> {
        self.instructions
            .iter()
            .filter(|inst| inst.name.as_deref() == Some(name))
            .map(|inst| inst.id)
            .collect()
    }

    pub fn line_disasm(&self, id: InstId) -> String {
        match self.instruction(id) {
            Some(inst) => crate::format::line_disasm(self, inst),
            None => String::new(),
        }
    }
}
