use crate::{
    instructions::{InstKind, Instruction},
    program::Program,
    values::InstId,
};
use std::fmt::Write;

pub fn format_program(program: &Program) -> String {
    let mut output = String::new();

    writeln!(&mut output, "; Program: {}", program.name()).unwrap();

    for inst in program.instructions() {
        write!(&mut output, "{} = {}", inst.id, line_disasm(program, inst)).unwrap();
        if let Some(name) = &inst.name {
            write!(&mut output, "\t; {}", name).unwrap();
        }
        if let Some(function) = inst.function {
            write!(&mut output, " @{}", function).unwrap();
        }
        writeln!(&mut output).unwrap();
    }

    output
}

/// One-line rendering of a single instruction, referring to operands by their short form.
pub fn line_disasm(program: &Program, inst: &Instruction) -> String {
    match &inst.kind {
        InstKind::ConstInst(c) => c.to_string(),
        InstKind::Undefined(_) => inst
            .name
            .clone()
            .unwrap_or_else(|| "undefined".to_string()),
        InstKind::Parameter {
            index,
            is_free_value,
        } => match &inst.name {
            Some(name) => name.clone(),
            None if *is_free_value => format!("freevalue{}", index),
            None => format!("param{}", index),
        },
        InstKind::Function { params, .. } => format!(
            "fn {}({})",
            inst.name.as_deref().unwrap_or("anonymous"),
            short_list(program, params)
        ),
        InstKind::Call { method, args, .. } => {
            format!("{}({})", short(program, *method), short_list(program, args))
        }
        InstKind::Return { results } => format!("return({})", short_list(program, results)),
        InstKind::Phi { edges } => format!("phi({})", short_list(program, edges)),
        InstKind::SideEffect { call, value } => format!(
            "side-effect({}, {})",
            short(program, *value),
            short(program, *call)
        ),
        InstKind::Field { object, key } => {
            format!("{}.{}", short(program, *object), key_form(program, *key))
        }
        InstKind::BinOp { op, x, y } => format!(
            "{} {} {}",
            short(program, *x),
            op.symbol(),
            short(program, *y)
        ),
        InstKind::UnOp { op, x } => format!("{}{}", op.symbol(), short(program, *x)),
        InstKind::Make => match &inst.name {
            Some(name) => format!("make({})", name),
            None => "make".to_string(),
        },
    }
}

/// How an operand reads inside another instruction: constants as literals, named values by
/// name, everything else by id.
pub fn short(program: &Program, id: InstId) -> String {
    match program.instruction(id) {
        Some(inst) => match (&inst.kind, &inst.name) {
            (InstKind::ConstInst(c), _) => c.to_string(),
            (_, Some(name)) => name.clone(),
            _ => id.to_string(),
        },
        None => id.to_string(),
    }
}

fn key_form(program: &Program, id: InstId) -> String {
    match program.instruction(id).and_then(Instruction::as_constant) {
        Some(c) => c.key_string(),
        None => short(program, id),
    }
}

fn short_list(program: &Program, ids: &[InstId]) -> String {
    ids.iter()
        .map(|id| short(program, *id))
        .collect::<Vec<_>>()
        .join(", ")
}
