use crate::{
    context::{with_stack, AnalysisContext},
    error::panic_message,
    options::{OperationConfig, OperationOption},
    value::Value,
    values::Values,
};
use indexmap::IndexMap;
use ssaflow_core::{InstId, InstKind, Instruction, Program};
use std::panic::{self, AssertUnwindSafe};

impl Value {
    /// Every sink this value's data can reach, following users forward into callee parameters,
    /// back out through returns and into the owning object of members.
    ///
    /// Returns are resolved against the call that entered the function on the current path;
    /// with no such call every call site of the function is considered.
    pub fn get_bottom_uses(&self, options: &[OperationOption]) -> Values {
        let mut ctx = AnalysisContext::new(OperationConfig::from_options(options));
        match panic::catch_unwind(AssertUnwindSafe(|| bottom_uses(&mut ctx, self))) {
            Ok(values) => values.dedup(),
            Err(payload) => {
                tracing::error!(
                    value = ?self.id(),
                    panic = %panic_message(&*payload),
                    "bottom-use traversal panicked"
                );
                Values::new()
            }
        }
    }
}

pub(crate) fn bottom_uses(ctx: &mut AnalysisContext, value: &Value) -> Values {
    with_stack(|| {
        let Some(mut process) = ctx.try_cross_process(value) else {
            return Values::from(value.clone());
        };
        visit(&mut process, value)
    })
}

fn visit(ctx: &mut AnalysisContext, value: &Value) -> Values {
    let mut ctx = ctx.enter(-1);
    value.set_depth(ctx.depth());
    if ctx.check(value) || !ctx.hook(value) {
        return Values::from(value.clone());
    }
    let Some(mut guard) = ctx.value_should(value) else {
        tracing::debug!(value = %value, "already on path, breaking cycle");
        return Values::from(value.clone());
    };
    tracing::trace!(value = %value, depth = value.depth(), "bottom-use visit");

    let values = expand(&mut guard, value);
    if values.is_empty() {
        Values::from(value.clone())
    } else {
        values
    }
}

fn recurse(ctx: &mut AnalysisContext, parent: &Value, child: &Value) -> Values {
    child.set_parent(parent);
    child.append_depend_on(parent);
    let values = bottom_uses(ctx, child);
    values.append_depend_on(parent);
    values
}

fn recurse_all(ctx: &mut AnalysisContext, parent: &Value, ids: &[InstId]) -> Values {
    let mut values = Values::new();
    for id in ids {
        values.extend(recurse(ctx, parent, &parent.spawn(*id)));
    }
    values
}

fn users(ctx: &mut AnalysisContext, value: &Value) -> Values {
    recurse_all(ctx, value, value.program().users(value.id()))
}

/// Instructions this wrapper was reached from.
fn incoming(value: &Value) -> Vec<InstId> {
    let mut ids = value.depend_on_ids();
    if let Some(parent) = value.parent() {
        if !ids.contains(&parent.id()) {
            ids.push(parent.id());
        }
    }
    ids
}

fn expand(ctx: &mut AnalysisContext, value: &Value) -> Values {
    let Some(inst) = value.instruction() else {
        tracing::warn!(value = ?value.id(), "value refers to unknown instruction");
        return Values::new();
    };
    match &inst.kind {
        InstKind::Phi { .. } => users(ctx, value),
        InstKind::Call {
            method,
            args,
            binding,
        } => call(ctx, value, *method, args, binding),
        InstKind::Return { results } => return_uses(ctx, value, inst, results),
        _ => default(ctx, value, inst),
    }
}

fn call(
    ctx: &mut AnalysisContext,
    call: &Value,
    method: InstId,
    args: &[InstId],
    binding: &IndexMap<String, InstId>,
) -> Values {
    let program = call.program();
    let Some(InstKind::Function {
        params,
        free_values,
        ..
    }) = program.instruction(method).map(|i| &i.kind)
    else {
        return users(ctx, call);
    };

    let incoming = incoming(call);
    let mut targets: Vec<InstId> = Vec::new();
    if let Some(last) = params.len().checked_sub(1) {
        for (index, arg) in args.iter().enumerate() {
            if incoming.contains(arg) {
                // extra arguments of a variadic call land in the last parameter
                let param = params[index.min(last)];
                if !targets.contains(&param) {
                    targets.push(param);
                }
            }
        }
    }
    for (name, bound) in binding {
        if incoming.contains(bound) {
            targets.extend(
                free_values
                    .iter()
                    .copied()
                    .filter(|fv| {
                        program.instruction(*fv).and_then(|i| i.name.as_deref())
                            == Some(name.as_str())
                    }),
            );
        }
    }

    if targets.is_empty() {
        return users(ctx, call);
    }
    recurse_all(ctx, call, &targets)
}

fn return_uses(
    ctx: &mut AnalysisContext,
    ret: &Value,
    inst: &Instruction,
    results: &[InstId],
) -> Values {
    let Some(function) = inst.function else {
        return Values::new();
    };
    let program = ret.program();
    let incoming = incoming(ret);
    let position = results.iter().position(|r| incoming.contains(r));

    let calls = match ctx.cross_process().cause_call(function) {
        Some(call) => vec![call.id()],
        None => {
            let sites = program.call_sites(function);
            tracing::trace!(ret = %ret, sites = sites.len(), "no cause call, using all call sites");
            sites
        }
    };

    let mut values = Values::new();
    for call in calls {
        let indexed = match position {
            Some(k) => indexed_reads(program, call, k),
            None => Vec::new(),
        };
        if indexed.is_empty() {
            values.extend(recurse(ctx, ret, &ret.spawn(call)));
        } else {
            values.extend(recurse_all(ctx, ret, &indexed));
        }
    }
    values
}

/// Reads `call.k` of a multi-return call.
fn indexed_reads(program: &Program, call: InstId, k: usize) -> Vec<InstId> {
    program
        .users(call)
        .iter()
        .copied()
        .filter(|user| match program.instruction(*user).map(|i| &i.kind) {
            Some(InstKind::Field { object, key }) => {
                *object == call
                    && program
                        .instruction(*key)
                        .and_then(Instruction::as_constant)
                        .and_then(|c| c.as_index())
                        == Some(k)
            }
            _ => false,
        })
        .collect()
}

fn default(ctx: &mut AnalysisContext, value: &Value, inst: &Instruction) -> Values {
    let mut values = users(ctx, value);

    let Some(member) = inst.member else {
        return values;
    };
    let object_is_call = matches!(
        value.program().instruction(member.object).map(|i| &i.kind),
        Some(InstKind::Call { .. })
    );
    if inst.is_undefined_member() || object_is_call {
        return values;
    }
    if let Some(mut guard) = ctx.object_should(member.object, member.key, value.id()) {
        values.extend(recurse(&mut guard, value, &value.spawn(member.object)));
    }
    values
}
