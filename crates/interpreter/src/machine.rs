use ir::{
    interpret::{Action, EvalValue, Interpret, State, Trap},
    runtime::{OVERFLOW_MESSAGE, PANIC_OVERFLOW},
    BlockId, FuncRef, Function, InstId, Module, Value, ValueId,
};
use rustc_hash::FxHashMap;

use crate::{frame::Frame, Fault};

/// Native behavior of an external function.
pub type ExternalFn = Box<dyn Fn(&[EvalValue]) -> Result<EvalValue, Fault> + Send + Sync>;

pub struct Machine<'a> {
    module: &'a Module,
    externals: FxHashMap<String, ExternalFn>,
    frames: Vec<Frame>,
    action: Action,
    /// Fault raised in a callee, carried up while unwinding.
    fault: Option<Fault>,
}

impl<'a> Machine<'a> {
    /// Creates a machine with the runtime entry points already bound.
    pub fn new(module: &'a Module) -> Self {
        let mut machine = Self {
            module,
            externals: FxHashMap::default(),
            frames: Vec::new(),
            action: Action::Continue,
            fault: None,
        };
        machine.register_external(PANIC_OVERFLOW, |_| Err(Fault::panic(OVERFLOW_MESSAGE)));
        machine
    }

    /// Binds the external function named `symbol` to `handler`.
    pub fn register_external<F>(&mut self, symbol: &str, handler: F)
    where
        F: Fn(&[EvalValue]) -> Result<EvalValue, Fault> + Send + Sync + 'static,
    {
        self.externals.insert(symbol.to_string(), Box::new(handler));
    }

    /// Runs `func` to completion.
    ///
    /// A function returning `unit` evaluates to [`EvalValue::Undef`].
    pub fn run(&mut self, func: FuncRef, args: Vec<EvalValue>) -> Result<EvalValue, Fault> {
        self.clear_state();
        let result = self.call(func, args);
        self.clear_state();
        result
    }

    pub fn clear_state(&mut self) {
        self.frames.clear();
        self.action = Action::Continue;
        self.fault = None;
    }

    fn call(&mut self, func_ref: FuncRef, args: Vec<EvalValue>) -> Result<EvalValue, Fault> {
        let module = self.module;
        let func = &module.funcs[func_ref];
        let name = func.sig.name();

        if !func.has_body() {
            let Some(handler) = self.externals.get(name) else {
                return Err(Fault::UnresolvedExternal(name.to_string()));
            };
            return handler(&args).map_err(|fault| self.with_trace(fault));
        }

        if func.arg_values.len() != args.len() {
            return Err(Fault::Undefined(format!(
                "`%{name}` takes {} arguments but {} were given",
                func.arg_values.len(),
                args.len()
            )));
        }

        self.frames.push(Frame::new(func_ref, func, args));
        let result = self.run_on_func(func);
        self.frames.pop();
        result
    }

    fn run_on_func(&mut self, func: &Function) -> Result<EvalValue, Fault> {
        let entry = func.layout.entry_block();
        let mut pc = match entry.and_then(|block| func.layout.first_inst_of(block)) {
            Some(inst) => inst,
            None => return Err(undefined(func, "entry block is empty")),
        };

        loop {
            self.action = Action::Continue;
            let e_val = func.dfg.inst(pc).interpret(self);
            if let Some(inst_result) = func.dfg.inst_result(pc) {
                self.top_frame_mut().map_val(inst_result, e_val);
            }

            pc = match self.action {
                Action::Continue => match func.layout.next_inst_of(pc) {
                    Some(next) => next,
                    None => {
                        let block = func.layout.inst_block(pc);
                        return Err(undefined(func, &format!("`{block}` has no terminator")));
                    }
                },

                Action::JumpTo(next_block) => {
                    let current_block = func.layout.inst_block(pc);
                    self.top_frame_mut().prev_block = Some(current_block);
                    self.first_inst_of(func, next_block)?
                }

                Action::FallThrough => return Err(Fault::FallThrough),

                Action::Return(e_val) => return Ok(e_val),

                Action::Trap(trap) => return Err(self.trap(trap)),
            };
        }
    }

    fn first_inst_of(&self, func: &Function, block: BlockId) -> Result<InstId, Fault> {
        func.layout
            .first_inst_of(block)
            .ok_or_else(|| undefined(func, &format!("`{block}` is empty")))
    }

    fn trap(&mut self, trap: Trap) -> Fault {
        match trap {
            Trap::DivideByZero => Fault::DivideByZero,
            Trap::Unreachable => Fault::Unreachable,
            Trap::Unwind => match self.fault.take() {
                Some(fault) => fault,
                None => panic!("unwinding without a fault"),
            },
        }
    }

    /// Fills in the trace of a panic raised in the current frame.
    fn with_trace(&self, fault: Fault) -> Fault {
        match fault {
            Fault::Panic { message, trace } if trace.is_empty() => Fault::Panic {
                message,
                trace: self
                    .frames
                    .iter()
                    .rev()
                    .map(|frame| self.module.sig(frame.func).name().to_string())
                    .collect(),
            },
            fault => fault,
        }
    }

    fn top_frame(&self) -> &Frame {
        match self.frames.last() {
            Some(frame) => frame,
            None => panic!("no active frame"),
        }
    }

    fn top_frame_mut(&mut self) -> &mut Frame {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => panic!("no active frame"),
        }
    }

    fn top_func(&self) -> &'a Function {
        let module = self.module;
        &module.funcs[self.top_frame().func]
    }
}

impl State for Machine<'_> {
    fn lookup_val(&mut self, value: ValueId) -> EvalValue {
        match self.top_func().dfg.value(value) {
            Value::Immediate { imm, .. } => (*imm).into(),
            _ => self.top_frame().load(value),
        }
    }

    fn call_func(&mut self, func: FuncRef, args: Vec<EvalValue>) -> EvalValue {
        match self.call(func, args) {
            Ok(e_val) => {
                self.action = Action::Continue;
                e_val
            }
            Err(fault) => {
                self.fault = Some(fault);
                self.action = Action::Trap(Trap::Unwind);
                EvalValue::Undef
            }
        }
    }

    fn set_action(&mut self, action: Action) {
        self.action = action;
    }

    fn prev_block(&mut self) -> Option<BlockId> {
        self.top_frame().prev_block
    }
}

fn undefined(func: &Function, reason: &str) -> Fault {
    Fault::Undefined(format!("`%{}`: {reason}", func.sig.name()))
}
