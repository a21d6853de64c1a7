use std::io;

use crate::{
    inst::InstData, module::FuncRef, BlockId, Function, InstId, Module, OverflowCheck, Value,
    ValueId,
};

pub struct ModuleWriter<'a> {
    module: &'a Module,
}

impl<'a> ModuleWriter<'a> {
    pub fn new(module: &'a Module) -> Self {
        Self { module }
    }

    pub fn write(&mut self, mut w: impl io::Write) -> io::Result<()> {
        writeln!(w, "package = {}", self.module.package)?;

        for func in self.module.funcs.values() {
            writeln!(w)?;
            FuncWriter::with_module(func, self.module).write(&mut w)?;
        }

        Ok(())
    }

    pub fn dump_string(&mut self) -> io::Result<String> {
        let mut s = Vec::new();
        self.write(&mut s)?;
        into_string(s)
    }
}

pub struct FuncWriter<'a> {
    func: &'a Function,
    module: Option<&'a Module>,
    level: u8,
}

impl<'a> FuncWriter<'a> {
    pub fn new(func: &'a Function) -> Self {
        Self {
            func,
            module: None,
            level: 0,
        }
    }

    /// Makes a writer that resolves callee names through `module`.
    pub fn with_module(func: &'a Function, module: &'a Module) -> Self {
        Self {
            func,
            module: Some(module),
            level: 0,
        }
    }

    pub fn write(&mut self, mut w: impl io::Write) -> io::Result<()> {
        let sig = &self.func.sig;
        write!(w, "func {} %{}(", sig.linkage(), sig.name())?;
        let mut delim = "";
        for &arg in &self.func.arg_values {
            write!(w, "{delim}{}.{}", self.value(arg), self.func.dfg.value_ty(arg))?;
            delim = ", ";
        }
        write!(w, ") -> {}", sig.ret_ty())?;

        if !self.func.has_body() {
            return writeln!(w, ";");
        }

        writeln!(w, " {{")?;
        self.level += 1;

        let func = self.func;
        let mut first = true;
        for block in func.layout.iter_block() {
            if !first {
                self.newline(&mut w)?;
            }
            first = false;
            self.write_block_with_inst(block, &mut w)?;
        }

        self.level -= 1;
        writeln!(w, "}}")
    }

    pub fn dump_string(&mut self) -> io::Result<String> {
        let mut s = Vec::new();
        self.write(&mut s)?;
        into_string(s)
    }

    pub fn write_block_with_inst(
        &mut self,
        block: BlockId,
        mut w: impl io::Write,
    ) -> io::Result<()> {
        self.indent(&mut w)?;
        writeln!(w, "{block}:")?;

        let func = self.func;
        self.level += 1;
        for inst in func.layout.iter_inst(block) {
            self.indent(&mut w)?;
            self.write_inst(inst, &mut w)?;
            writeln!(w, ";")?;
        }
        self.level -= 1;

        Ok(())
    }

    pub fn write_inst(&self, inst: InstId, mut w: impl io::Write) -> io::Result<()> {
        let dfg = &self.func.dfg;
        if let Some(result) = dfg.inst_result(inst) {
            write!(w, "{}.{} = ", self.value(result), dfg.value_ty(result))?;
        }

        match dfg.overflow_check(inst) {
            OverflowCheck::Unchecked => {}
            check => write!(w, "{check} ")?,
        }

        match dfg.inst(inst) {
            InstData::Unary { code, args } => write!(w, "{code} {}", self.value(args[0])),
            InstData::Binary { code, args } => write!(
                w,
                "{code} {} {}",
                self.value(args[0]),
                self.value(args[1])
            ),
            InstData::Cast { code, args, ty } => {
                write!(w, "{code} {} {ty}", self.value(args[0]))
            }
            InstData::Jump { dests } => write!(w, "jump {}", dests[0]),
            InstData::Br { args, dests } => write!(
                w,
                "br {} {} {}",
                self.value(args[0]),
                dests[0],
                dests[1]
            ),
            InstData::Call { func, args, .. } => {
                write!(w, "call %{}", self.callee_name(*func))?;
                for &arg in args {
                    write!(w, " {}", self.value(arg))?;
                }
                Ok(())
            }
            InstData::Return { args: Some(arg) } => write!(w, "return {}", self.value(*arg)),
            InstData::Return { args: None } => write!(w, "return"),
            InstData::Unreachable => write!(w, "unreachable"),
            InstData::Phi { values, blocks, .. } => {
                write!(w, "phi")?;
                for (value, block) in values.iter().zip(blocks) {
                    write!(w, " ({} {block})", self.value(*value))?;
                }
                Ok(())
            }
        }
    }

    fn value(&self, value: ValueId) -> String {
        match self.func.dfg.value(value) {
            Value::Immediate { imm, ty } => format!("{imm}.{ty}"),
            _ => format!("v{}", value.as_u32()),
        }
    }

    fn callee_name(&self, func_ref: FuncRef) -> String {
        match self.module {
            Some(module) => module.sig(func_ref).name().to_string(),
            None => format!("func{}", func_ref.as_u32()),
        }
    }

    fn indent(&self, mut w: impl io::Write) -> io::Result<()> {
        w.write_all(" ".repeat(self.level as usize * 4).as_bytes())
    }

    fn newline(&self, mut w: impl io::Write) -> io::Result<()> {
        w.write_all(b"\n")
    }
}

fn into_string(bytes: Vec<u8>) -> io::Result<String> {
    String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
