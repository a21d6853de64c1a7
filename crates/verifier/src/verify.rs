use cranelift_entity::EntitySet;
use ir::{
    BlockId, ControlFlowGraph, FuncRef, Function, InstData, InstId, Linkage, Module, Type, Value,
    ValueId,
};
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::report::{Finding, Report, Rule, Site};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Checks operand, call and return types, and phi incoming edges. With
    /// this off only the block structure is checked.
    pub dataflow: bool,
    /// Stops recording findings after this many.
    pub limit: Option<usize>,
}

impl VerifierConfig {
    pub fn structure_only() -> Self {
        Self {
            dataflow: false,
            ..Self::default()
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            dataflow: true,
            limit: Some(200),
        }
    }
}

/// Verifies every function of `module`. Functions are checked in parallel
/// and their findings merged in `FuncRef` order.
pub fn verify_module(module: &Module, cfg: &VerifierConfig) -> Report {
    let funcs: Vec<_> = module.iter_functions().collect();
    funcs
        .into_par_iter()
        .map(|func_ref| verify_function(module, func_ref, cfg))
        .collect::<Vec<_>>()
        .into_iter()
        .fold(Report::default(), |mut report, func_report| {
            report.merge(func_report, cfg.limit);
            report
        })
}

pub fn verify_function(module: &Module, func_ref: FuncRef, cfg: &VerifierConfig) -> Report {
    FuncVerifier::new(module, func_ref, cfg).run()
}

struct FuncVerifier<'a> {
    module: &'a Module,
    func_ref: FuncRef,
    func: &'a Function,
    cfg: &'a VerifierConfig,
    report: Report,
}

impl<'a> FuncVerifier<'a> {
    fn new(module: &'a Module, func_ref: FuncRef, cfg: &'a VerifierConfig) -> Self {
        Self {
            module,
            func_ref,
            func: &module.funcs[func_ref],
            cfg,
            report: Report::default(),
        }
    }

    fn run(mut self) -> Report {
        if !self.func.has_body() {
            if self.func.sig.linkage() != Linkage::External {
                self.flag(
                    Rule::NoEntry,
                    Site::Func(self.func_ref),
                    format!("`%{}` has no entry block", self.func.sig.name()),
                );
            }
            return self.report;
        }

        let cfg_graph = self
            .cfg
            .dataflow
            .then(|| ControlFlowGraph::with_function(self.func));

        let func = self.func;
        for block in func.layout.iter_block() {
            self.verify_block(block, cfg_graph.as_ref());
        }

        if let Some(cfg_graph) = &cfg_graph {
            self.verify_reachability(cfg_graph);
        }

        self.report
    }

    fn verify_block(&mut self, block: BlockId, cfg_graph: Option<&ControlFlowGraph>) {
        let func = self.func;
        let layout = &func.layout;

        let Some(last_inst) = layout.last_inst_of(block) else {
            self.flag(
                Rule::EmptyBlock,
                Site::Block(self.func_ref, block),
                format!("`{block}` has no instructions"),
            );
            return;
        };

        let mut defined: EntitySet<InstId> = EntitySet::new();
        let mut seen_non_phi = false;
        for inst in layout.iter_inst(block) {
            let data = func.dfg.inst(inst);
            let site = self.at(block, inst);

            if data.is_phi() {
                if seen_non_phi {
                    self.flag(
                        Rule::MisplacedPhi,
                        site,
                        "phi follows a non-phi instruction",
                    );
                }
                if let Some(cfg_graph) = cfg_graph {
                    self.verify_phi(block, inst, data, cfg_graph);
                }
            } else {
                seen_non_phi = true;
                self.verify_uses(block, inst, data, &defined);
            }

            if data.is_terminator() && inst != last_inst {
                self.flag(
                    Rule::CodeAfterTerminator,
                    site,
                    "terminator is followed by other instructions",
                );
            }

            for dest in data.analyze_branch().iter_dests() {
                if !layout.is_block_inserted(dest) {
                    self.flag(
                        Rule::DanglingBranch,
                        site,
                        format!("branch to `{dest}`, which is not in the layout"),
                    );
                }
            }

            if self.cfg.dataflow {
                self.verify_types(block, inst, data);
            }

            defined.insert(inst);
        }

        if !func.dfg.is_terminator(last_inst) {
            self.flag(
                Rule::Unterminated,
                Site::Block(self.func_ref, block),
                format!("`{block}` doesn't end with a terminator"),
            );
        }
    }

    /// Blocks no path from the entry reaches are reported as warnings.
    fn verify_reachability(&mut self, cfg_graph: &ControlFlowGraph) {
        let Some(entry) = cfg_graph.entry() else {
            return;
        };

        let mut reachable: EntitySet<BlockId> = EntitySet::new();
        let mut stack = vec![entry];
        while let Some(block) = stack.pop() {
            if reachable.contains(block) {
                continue;
            }
            reachable.insert(block);
            stack.extend(cfg_graph.succs_of(block).copied());
        }

        let func = self.func;
        for block in func.layout.iter_block() {
            if !reachable.contains(block) {
                self.flag(
                    Rule::UnreachableBlock,
                    Site::Block(self.func_ref, block),
                    "no path from the entry reaches this block",
                );
            }
        }
    }

    /// Checks that every operand defined in `block` is defined before `inst`,
    /// and that operands defined elsewhere come from inserted instructions.
    fn verify_uses(
        &mut self,
        block: BlockId,
        inst: InstId,
        data: &InstData,
        defined: &EntitySet<InstId>,
    ) {
        let func = self.func;
        let layout = &func.layout;
        for &arg in data.args() {
            let Value::Inst { inst: def, .. } = *func.dfg.value(arg) else {
                continue;
            };

            if !layout.is_inst_inserted(def) {
                self.flag(
                    Rule::RemovedDef,
                    self.at(block, inst),
                    format!("`{arg}` is defined by a removed instruction"),
                );
            } else if layout.inst_block(def) == block && !defined.contains(def) {
                self.flag(
                    Rule::UseBeforeDef,
                    self.at(block, inst),
                    format!("`{arg}` is used before its definition"),
                );
            }
        }
    }

    fn verify_phi(
        &mut self,
        block: BlockId,
        inst: InstId,
        data: &InstData,
        cfg_graph: &ControlFlowGraph,
    ) {
        let InstData::Phi { blocks, .. } = data else {
            return;
        };

        for &incoming in blocks {
            if !cfg_graph.is_pred_of(incoming, block) {
                self.flag(
                    Rule::PhiFromNonPred,
                    self.at(block, inst),
                    format!("`{incoming}` is not a predecessor of `{block}`"),
                );
            }
        }

        let preds = cfg_graph.pred_num_of(block);
        if blocks.len() != preds {
            self.flag(
                Rule::PhiEdgeCount,
                self.at(block, inst),
                format!(
                    "phi has {} incoming values but `{block}` has {preds} predecessors",
                    blocks.len()
                ),
            );
        }
    }

    fn verify_types(&mut self, block: BlockId, inst: InstId, data: &InstData) {
        let func = self.func;
        let dfg = &func.dfg;
        let site = self.at(block, inst);

        match data {
            InstData::Binary { code, args } => {
                let (lhs, rhs) = (dfg.value_ty(args[0]), dfg.value_ty(args[1]));
                if lhs != rhs {
                    self.flag(
                        Rule::OperandType,
                        site,
                        format!("`{code}` operands are `{lhs}` and `{rhs}`"),
                    );
                }
            }

            InstData::Br { args, .. } => {
                let ty = dfg.value_ty(args[0]);
                if ty != Type::I1 {
                    self.flag(
                        Rule::OperandType,
                        site,
                        format!("branch condition is `{ty}`, expected `i1`"),
                    );
                }
            }

            InstData::Call {
                func: callee, args, ..
            } => self.verify_call(*callee, args, site),

            InstData::Return { args } => {
                let expected = func.sig.ret_ty();
                let found = args.map_or(Type::Unit, |arg| dfg.value_ty(arg));
                if expected != found {
                    self.flag(
                        Rule::ReturnType,
                        site,
                        format!("returns `{found}` from a function returning `{expected}`"),
                    );
                }
            }

            _ => {}
        }
    }

    fn verify_call(&mut self, callee: FuncRef, args: &[ValueId], site: Site) {
        if !self.module.funcs.is_valid(callee) {
            self.flag(
                Rule::UnknownCallee,
                site,
                format!("callee `func{}` is not declared", callee.as_u32()),
            );
            return;
        }

        let module = self.module;
        let dfg = &self.func.dfg;
        let sig = module.sig(callee);
        if sig.args().len() != args.len() {
            self.flag(
                Rule::CallArity,
                site,
                format!(
                    "`%{}` takes {} arguments but {} were given",
                    sig.name(),
                    sig.args().len(),
                    args.len()
                ),
            );
            return;
        }

        let mismatched: SmallVec<[usize; 4]> = args
            .iter()
            .zip(sig.args())
            .enumerate()
            .filter(|(_, (arg, ty))| dfg.value_ty(**arg) != **ty)
            .map(|(idx, _)| idx)
            .collect();
        for idx in mismatched {
            self.flag(
                Rule::CallArgType,
                site,
                format!(
                    "argument {idx} of `%{}` is `{}`, expected `{}`",
                    sig.name(),
                    dfg.value_ty(args[idx]),
                    sig.args()[idx]
                ),
            );
        }
    }

    fn at(&self, block: BlockId, inst: InstId) -> Site {
        Site::Inst(self.func_ref, block, inst)
    }

    fn flag(&mut self, rule: Rule, site: Site, message: impl Into<String>) {
        let finding = Finding {
            rule,
            site,
            message: message.into(),
        };
        self.report.record(finding, self.cfg.limit);
    }
}
