//! Drives the overflow guard over functions and modules.
use cranelift_entity::SecondaryMap;
use ir::{FuncRef, Function, Module};
use rustc_hash::FxHashMap;

use crate::{
    classify::{classify, ArithOp, ArithmeticOperation, IntWidth},
    config::GuardConfig,
    error::InstrumentError,
    exemption::ExemptionSet,
    guard::{declare_panic_fn, insert_guard},
    predicate::Predicate,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FuncStats {
    /// Number of instructions inspected.
    pub visited: usize,

    /// Number of instructions guarded.
    pub instrumented: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleStats {
    /// The package is exempt and nothing was touched.
    pub exempt: bool,

    /// Number of function bodies processed.
    pub functions: usize,

    /// Number of instructions guarded.
    pub instrumented: usize,
}

/// The signed overflow instrumentation pass.
///
/// Every arithmetic instruction is visited once and is either left alone or
/// guarded. A guarded instruction is marked, so running the pass again over
/// its own output changes nothing.
#[derive(Debug)]
pub struct OverflowGuard<'a> {
    exemptions: &'a ExemptionSet,
    config: GuardConfig,
    predicates: FxHashMap<(ArithOp, IntWidth), Predicate>,
}

impl<'a> OverflowGuard<'a> {
    pub fn new(exemptions: &'a ExemptionSet, config: GuardConfig) -> Self {
        let mut predicates = FxHashMap::default();
        for op in ArithOp::ALL {
            for width in IntWidth::ALL {
                predicates.insert((op, width), Predicate::new(op, width, config.mul_strategy));
            }
        }

        Self {
            exemptions,
            config,
            predicates,
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn exemptions(&self) -> &ExemptionSet {
        self.exemptions
    }

    pub fn predicate(&self, op: ArithOp, width: IntWidth) -> &Predicate {
        match self.predicates.get(&(op, width)) {
            Some(pred) => pred,
            None => panic!("no predicate for `{op}.{width}`"),
        }
    }

    /// Instruments every function body of `module`, unless its package is
    /// exempt.
    ///
    /// All functions are validated before any is changed: on error the module
    /// is left as it was.
    #[tracing::instrument(level = "debug", skip_all, fields(package = %module.package))]
    pub fn run_on_module(&self, module: &mut Module) -> Result<ModuleStats, InstrumentError> {
        if !self.exemptions.should_instrument(&module.package) {
            tracing::debug!("package is exempt");
            return Ok(ModuleStats {
                exempt: true,
                ..ModuleStats::default()
            });
        }

        let mut plans: SecondaryMap<FuncRef, Vec<ArithmeticOperation>> = SecondaryMap::new();
        let mut functions = 0;
        for (func_ref, func) in module.funcs.iter() {
            if module.is_external(func_ref) || !func.has_body() {
                continue;
            }
            plans[func_ref] = collect(func)?.0;
            functions += 1;
        }

        if plans.values().all(Vec::is_empty) {
            tracing::debug!(functions, "nothing to instrument");
            return Ok(ModuleStats {
                exempt: false,
                functions,
                instrumented: 0,
            });
        }

        let panic_fn = declare_panic_fn(module);
        let guard = |func_ref: FuncRef, func: &mut Function| {
            self.guard_all(func, &plans[func_ref], panic_fn)
        };
        let instrumented: usize = if self.config.parallel {
            module
                .par_map_funcs(guard)
                .into_iter()
                .map(|(_, count)| count)
                .sum()
        } else {
            module
                .funcs
                .iter_mut()
                .map(|(func_ref, func)| guard(func_ref, func))
                .sum()
        };

        tracing::debug!(functions, instrumented, "instrumented module");
        Ok(ModuleStats {
            exempt: false,
            functions,
            instrumented,
        })
    }

    /// Instruments one function body, calling `panic_fn` on overflow.
    ///
    /// Exemption is decided per module and isn't checked here. On error the
    /// function is left as it was.
    pub fn run_on_func(
        &self,
        func: &mut Function,
        panic_fn: FuncRef,
    ) -> Result<FuncStats, InstrumentError> {
        let (ops, visited) = collect(func)?;
        let instrumented = self.guard_all(func, &ops, panic_fn);
        Ok(FuncStats {
            visited,
            instrumented,
        })
    }

    fn guard_all(
        &self,
        func: &mut Function,
        ops: &[ArithmeticOperation],
        panic_fn: FuncRef,
    ) -> usize {
        for op in ops {
            let guarded = insert_guard(func, op, self.predicate(op.op, op.width), panic_fn);
            tracing::trace!(
                func = func.sig.name(),
                inst = %guarded.inst,
                op = %op.op,
                width = %op.width,
                "guarded"
            );
        }

        if !ops.is_empty() {
            tracing::debug!(
                func = func.sig.name(),
                instrumented = ops.len(),
                "instrumented function"
            );
        }
        ops.len()
    }
}

/// Classifies every instruction of `func` in layout order. Returns the
/// operations to guard and the number of instructions inspected.
fn collect(func: &Function) -> Result<(Vec<ArithmeticOperation>, usize), InstrumentError> {
    let mut ops = Vec::new();
    let mut visited = 0;

    for block in func.layout.iter_block() {
        for inst in func.layout.iter_inst(block) {
            visited += 1;
            match classify(&func.dfg, inst) {
                Ok(Some(op)) => ops.push(op),
                Ok(None) => {}
                Err(reason) => {
                    return Err(InstrumentError::Malformed {
                        func: func.sig.name().to_string(),
                        inst,
                        reason,
                    })
                }
            }
        }
    }

    Ok((ops, visited))
}
