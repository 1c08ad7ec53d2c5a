use crate::{value::Value, values::Values};
use ssaflow_core::{InstId, InstKind};
use std::collections::HashSet;

impl Value {
    /// Calls that invoke this value as their callee, following it through phis, side effects,
    /// call arguments and closure bindings into the functions it is passed to.
    pub fn get_called_by(&self) -> Values {
        let program = self.program();
        let mut visited = HashSet::new();
        let mut worklist: Vec<InstId> = vec![self.id()];
        let mut calls = Values::new();

        while let Some(current) = worklist.pop() {
            if !visited.insert(current) {
                continue;
            }
            for user in program.users(current) {
                let Some(inst) = program.instruction(*user) else {
                    continue;
                };
                match &inst.kind {
                    InstKind::Phi { .. } | InstKind::SideEffect { .. } => worklist.push(*user),
                    InstKind::Call {
                        method,
                        args,
                        binding,
                    } => {
                        if *method == current {
                            calls.push(self.spawn(*user));
                            continue;
                        }
                        let Some(InstKind::Function {
                            params,
                            free_values,
                            ..
                        }) = program.instruction(*method).map(|i| &i.kind)
                        else {
                            continue;
                        };
                        if let Some(last) = params.len().checked_sub(1) {
                            worklist.extend(
                                args.iter()
                                    .enumerate()
                                    .filter(|(_, arg)| **arg == current)
                                    .map(|(index, _)| params[index.min(last)]),
                            );
                        }
                        for (name, bound) in binding {
                            if *bound != current {
                                continue;
                            }
                            worklist.extend(free_values.iter().copied().filter(|fv| {
                                program.instruction(*fv).and_then(|i| i.name.as_deref())
                                    == Some(name.as_str())
                            }));
                        }
                    }
                    _ => {}
                }
            }
        }

        tracing::trace!(value = %self, calls = calls.len(), "collected callers");
        calls.dedup()
    }
}
