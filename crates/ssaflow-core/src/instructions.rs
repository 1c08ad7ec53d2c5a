use crate::values::{Constant, InstId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    ConstInst,
    Undefined,
    Parameter,
    Function,
    Call,
    Return,
    Phi,
    SideEffect,
    Field,
    BinOp,
    UnOp,
    Make,
}

impl Opcode {
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::ConstInst => "Const",
            Opcode::Undefined => "Undefined",
            Opcode::Parameter => "Parameter",
            Opcode::Function => "Function",
            Opcode::Call => "Call",
            Opcode::Return => "Return",
            Opcode::Phi => "Phi",
            Opcode::SideEffect => "SideEffect",
            Opcode::Field => "Field",
            Opcode::BinOp => "BinOp",
            Opcode::UnOp => "UnOp",
            Opcode::Make => "Make",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UndefinedKind {
    /// An unknown or external name, e.g. a library function or an unbound variable.
    Value,
    /// Placeholder for a member read that was never written.
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

/// A captured variable that a closure writes; `modify` is the value written inside the closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffectDecl {
    pub name: String,
    pub modify: InstId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberOf {
    pub object: InstId,
    pub key: InstId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstKind {
    ConstInst(Constant),
    Undefined(UndefinedKind),
    Parameter {
        index: usize,
        is_free_value: bool,
    },
    Function {
        params: Vec<InstId>,
        free_values: Vec<InstId>,
        returns: Vec<InstId>,
        side_effects: Vec<SideEffectDecl>,
    },
    Call {
        method: InstId,
        args: Vec<InstId>,
        binding: IndexMap<String, InstId>,
    },
    Return {
        results: Vec<InstId>,
    },
    Phi {
        edges: Vec<InstId>,
    },
    SideEffect {
        call: InstId,
        value: InstId,
    },
    Field {
        object: InstId,
        key: InstId,
    },
    BinOp {
        op: BinaryOp,
        x: InstId,
        y: InstId,
    },
    UnOp {
        op: UnaryOp,
        x: InstId,
    },
    Make,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: InstId,
    pub name: Option<String>,
    /// Enclosing function; `None` only for the program's root function.
    pub function: Option<InstId>,
    pub kind: InstKind,
    pub member: Option<MemberOf>,
    /// Conditional writes to the same member elsewhere in the program.
    pub masks: Vec<InstId>,
}

impl Instruction {
    pub fn new(id: InstId, function: Option<InstId>, kind: InstKind) -> Self {
        Self {
            id,
            name: None,
            function,
            kind,
            member: None,
            masks: Vec::new(),
        }
    }

    pub fn opcode(&self) -> Opcode {
        match &self.kind {
            InstKind::ConstInst(_) => Opcode::ConstInst,
            InstKind::Undefined(_) => Opcode::Undefined,
            InstKind::Parameter { .. } => Opcode::Parameter,
            InstKind::Function { .. } => Opcode::Function,
            InstKind::Call { .. } => Opcode::Call,
            InstKind::Return { .. } => Opcode::Return,
            InstKind::Phi { .. } => Opcode::Phi,
            InstKind::SideEffect { .. } => Opcode::SideEffect,
            InstKind::Field { .. } => Opcode::Field,
            InstKind::BinOp { .. } => Opcode::BinOp,
            InstKind::UnOp { .. } => Opcode::UnOp,
            InstKind::Make => Opcode::Make,
        }
    }

    /// Structural operands, in the order users are indexed.
    pub fn operands(&self) -> Vec<InstId> {
        match &self.kind {
            InstKind::Call {
                method,
                args,
                binding,
            } => {
                let mut values = Vec::with_capacity(1 + args.len() + binding.len());
                values.push(*method);
                values.extend(args.iter().copied());
                values.extend(binding.values().copied());
                values
            }
            InstKind::Return { results } => results.clone(),
            InstKind::Phi { edges } => edges.clone(),
            InstKind::SideEffect { value, .. } => vec![*value],
            InstKind::Field { object, key } => vec![*object, *key],
            InstKind::BinOp { x, y, .. } => vec![*x, *y],
            InstKind::UnOp { x, .. } => vec![*x],
            InstKind::ConstInst(_)
            | InstKind::Undefined(_)
            | InstKind::Parameter { .. }
            | InstKind::Function { .. }
            | InstKind::Make => Vec::new(),
        }
    }

    pub fn has_operands(&self) -> bool {
        !self.operands().is_empty()
    }

    /// Every id this instruction mentions, including non-operand links such as function
    /// parameters, members and masks.
    pub fn references(&self) -> Vec<InstId> {
        let mut refs = self.operands();
        if let Some(function) = self.function {
            refs.push(function);
        }
        match &self.kind {
            InstKind::Function {
                params,
                free_values,
                returns,
                side_effects,
            } => {
                refs.extend(params.iter().copied());
                refs.extend(free_values.iter().copied());
                refs.extend(returns.iter().copied());
                refs.extend(side_effects.iter().map(|se| se.modify));
            }
            InstKind::SideEffect { call, .. } => refs.push(*call),
            _ => {}
        }
        if let Some(member) = &self.member {
            refs.push(member.object);
            refs.push(member.key);
        }
        refs.extend(self.masks.iter().copied());
        refs
    }

    /// The function this instruction belongs to for cross-process purposes: a function is its
    /// own process, everything else lives in its enclosing function.
    pub fn function_of(&self) -> Option<InstId> {
        match self.kind {
            InstKind::Function { .. } => Some(self.id),
            _ => self.function,
        }
    }

    pub fn is_member(&self) -> bool {
        self.member.is_some()
    }

    pub fn is_undefined_member(&self) -> bool {
        matches!(self.kind, InstKind::Undefined(UndefinedKind::Member))
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match &self.kind {
            InstKind::ConstInst(c) => Some(c),
            _ => None,
        }
    }
}
