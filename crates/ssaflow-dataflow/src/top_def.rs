use crate::{
    context::{with_stack, AnalysisContext},
    error::panic_message,
    options::{OperationConfig, OperationOption},
    value::Value,
    values::Values,
};
use ssaflow_core::{InstId, InstKind, Instruction};
use std::panic::{self, AssertUnwindSafe};

impl Value {
    /// Every origin this value's data can come from, following operands backwards across
    /// calls, parameters, closures and member writes.
    ///
    /// Leaves are constants, unresolved names and anything a bound, hook or boundary check cut
    /// short. The result is never empty for a valid value; a panic during traversal yields an
    /// empty result instead of unwinding into the caller.
    pub fn get_top_defs(&self, options: &[OperationOption]) -> Values {
        let mut ctx = AnalysisContext::new(OperationConfig::from_options(options));
        match panic::catch_unwind(AssertUnwindSafe(|| top_defs(&mut ctx, self))) {
            Ok(values) => values.dedup(),
            Err(payload) => {
                tracing::error!(
                    value = ?self.id(),
                    panic = %panic_message(&*payload),
                    "top-def traversal panicked"
                );
                Values::new()
            }
        }
    }
}

pub(crate) fn top_defs(ctx: &mut AnalysisContext, value: &Value) -> Values {
    with_stack(|| {
        let Some(mut process) = ctx.try_cross_process(value) else {
            return Values::from(value.clone());
        };
        visit(&mut process, value)
    })
}

fn visit(ctx: &mut AnalysisContext, value: &Value) -> Values {
    let mut ctx = ctx.enter(1);
    value.set_depth(ctx.depth());
    if ctx.check(value) || !ctx.hook(value) {
        return Values::from(value.clone());
    }
    let Some(mut guard) = ctx.value_should(value) else {
        tracing::debug!(value = %value, "already on path, breaking cycle");
        // a phi met again on its own loop adds nothing new
        if value.is_phi() {
            return Values::new();
        }
        return Values::from(value.clone());
    };
    tracing::trace!(value = %value, depth = value.depth(), "top-def visit");

    let values = expand(&mut guard, value);
    if values.is_empty() {
        Values::from(value.clone())
    } else {
        values
    }
}

fn recurse(ctx: &mut AnalysisContext, parent: &Value, child: &Value) -> Values {
    child.set_parent(parent);
    let values = top_defs(ctx, child);
    values.append_effect_on(parent);
    values
}

fn recurse_all(ctx: &mut AnalysisContext, parent: &Value, ids: &[InstId]) -> Values {
    let mut values = Values::new();
    for id in ids {
        values.extend(recurse(ctx, parent, &parent.spawn(*id)));
    }
    values
}

fn expand(ctx: &mut AnalysisContext, value: &Value) -> Values {
    let Some(inst) = value.instruction() else {
        tracing::warn!(value = ?value.id(), "value refers to unknown instruction");
        return Values::new();
    };
    match &inst.kind {
        InstKind::ConstInst(_) | InstKind::Undefined(_) => Values::from(value.clone()),
        InstKind::Function { returns, .. } => function(ctx, value, returns),
        InstKind::Call { method, args, .. } => call(ctx, value, *method, args),
        InstKind::Parameter {
            index,
            is_free_value: false,
        } => parameter(ctx, value, inst, *index),
        InstKind::Parameter {
            is_free_value: true,
            ..
        } => free_value(ctx, value, inst),
        InstKind::Phi { edges } => recurse_all(ctx, value, edges),
        InstKind::SideEffect { value: written, .. } => {
            let child = value.spawn(*written);
            child.set_side_effect(value);
            recurse(ctx, value, &child)
        }
        InstKind::Field { object, key } => field(ctx, value, *object, *key, &inst.masks),
        InstKind::Return { .. }
        | InstKind::BinOp { .. }
        | InstKind::UnOp { .. }
        | InstKind::Make => {
            let mut values = recurse_all(ctx, value, &inst.operands());
            values.extend(recurse_all(ctx, value, &inst.masks));
            values
        }
    }
}

fn call(ctx: &mut AnalysisContext, call: &Value, method: InstId, args: &[InstId]) -> Values {
    let callee = call.spawn(method);
    if !callee.is_function() {
        // an unresolved method is an origin as-is; only its arguments are followed
        callee.set_parent(call);
        callee.append_effect_on(call);
        let mut values = Values::from(callee);
        values.extend(recurse_all(ctx, call, args));
        return values;
    }
    enter_callee(ctx, call, &callee, None)
}

/// Expands the returns of `callee` as invoked by `call`.
fn enter_callee(
    ctx: &mut AnalysisContext,
    call: &Value,
    callee: &Value,
    result_index: Option<usize>,
) -> Values {
    callee.set_parent(call);
    callee.set_call_entry(call);
    if let Some(index) = result_index {
        callee.set_result_index(index);
    }
    let Some(mut process) = ctx.try_cross_process(callee) else {
        return Values::from(call.clone());
    };
    let values = visit(&mut process, callee);
    drop(process);

    callee.append_effect_on(call);
    values.append_effect_on(call);
    values
}

fn function(ctx: &mut AnalysisContext, function: &Value, returns: &[InstId]) -> Values {
    let index = function.result_index();
    let program = function.program();
    let mut values = Values::new();
    for ret in returns {
        let Some(InstKind::Return { results }) = program.instruction(*ret).map(|i| &i.kind) else {
            tracing::warn!(function = %function, ret = %ret, "return list entry is not a return");
            continue;
        };
        match index {
            Some(k) => match results.get(k) {
                Some(result) => values.extend(recurse(ctx, function, &function.spawn(*result))),
                None => tracing::warn!(function = %function, index = k, "return has no such position"),
            },
            None => values.extend(recurse_all(ctx, function, results)),
        }
    }
    values
}

/// The call currently supplying arguments to `function`, found by walking up the parent chain
/// to the function's entry or to a side effect that ran it.
fn find_call_entry(value: &Value, function: InstId) -> Option<Value> {
    let mut current = value.parent();
    while let Some(node) = current {
        if node.id() == function {
            return node.call_entry();
        }
        if let Some(InstKind::SideEffect { call, .. }) = node.kind() {
            let invokes = matches!(
                node.program().instruction(*call).map(|i| &i.kind),
                Some(InstKind::Call { method, .. }) if *method == function
            );
            if invokes {
                let entry = node.spawn(*call);
                entry.set_parent(&node);
                return Some(entry);
            }
        }
        current = node.parent();
    }
    None
}

fn parameter(
    ctx: &mut AnalysisContext,
    param: &Value,
    inst: &Instruction,
    index: usize,
) -> Values {
    let Some(function) = inst.function else {
        return Values::from(param.clone());
    };
    let Some(call) = find_call_entry(param, function) else {
        return Values::from(param.clone());
    };
    let Some(InstKind::Call { args, .. }) = call.kind() else {
        return Values::from(param.clone());
    };
    let declared = match param.program().instruction(function).map(|i| &i.kind) {
        Some(InstKind::Function { params, .. }) => params.len(),
        _ => 0,
    };

    // trailing arguments of a variadic call all land in the last parameter
    let actuals = if index + 1 == declared && args.len() > declared {
        &args[index..]
    } else {
        match args.get(index) {
            Some(arg) => std::slice::from_ref(arg),
            None => {
                tracing::warn!(param = %param, call = %call, index, "no argument for parameter");
                return Values::from(param.clone());
            }
        }
    };
    recurse_all(ctx, param, actuals)
}

fn free_value(ctx: &mut AnalysisContext, param: &Value, inst: &Instruction) -> Values {
    let (Some(name), Some(function)) = (inst.name.as_deref(), inst.function) else {
        return Values::from(param.clone());
    };

    if let Some(call) = find_call_entry(param, function) {
        if let Some(InstKind::Call { binding, .. }) = call.kind() {
            if let Some(bound) = binding.get(name) {
                return recurse(ctx, param, &param.spawn(*bound));
            }
        }
    }

    let program = param.program();
    let Some(enclosing) = program.instruction(function).and_then(|f| f.function) else {
        return Values::from(param.clone());
    };
    let definitions: Vec<InstId> = program
        .definitions_of(enclosing, name)
        .into_iter()
        .filter(|id| {
            !matches!(
                program.instruction(*id).map(|i| &i.kind),
                Some(InstKind::SideEffect { .. })
            )
        })
        .collect();
    if definitions.is_empty() {
        return Values::from(param.clone());
    }
    recurse_all(ctx, param, &definitions)
}

fn field(
    ctx: &mut AnalysisContext,
    value: &Value,
    object: InstId,
    key: InstId,
    masks: &[InstId],
) -> Values {
    let Some(mut guard) = ctx.object_should(object, key, value.id()) else {
        return Values::from(value.clone());
    };

    let mut values = match indexed_return(value, object, key) {
        Some((call, callee, index)) => {
            let values = enter_callee(&mut guard, &call, &callee, Some(index));
            values.append_effect_on(value);
            values
        }
        None => {
            let mut values = recurse(&mut guard, value, &value.spawn(object));
            values.extend(recurse(&mut guard, value, &value.spawn(key)));
            values
        }
    };
    values.extend(recurse_all(&mut guard, value, masks));
    values
}

/// `call.k` where `call` invokes a known function and `k` is a constant position.
fn indexed_return(value: &Value, object: InstId, key: InstId) -> Option<(Value, Value, usize)> {
    let program = value.program();
    let InstKind::Call { method, .. } = &program.instruction(object)?.kind else {
        return None;
    };
    if !matches!(program.instruction(*method)?.kind, InstKind::Function { .. }) {
        return None;
    }
    let index = program.instruction(key)?.as_constant()?.as_index()?;
    let call = value.spawn(object);
    call.set_parent(value);
    Some((call, value.spawn(*method), index))
}
