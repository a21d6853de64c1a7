mod func_builder;
mod module_builder;

pub use func_builder::FunctionBuilder;
pub use module_builder::ModuleBuilder;

pub mod test_util {
    use super::*;

    use crate::{
        func_cursor::InstInserter,
        ir_writer::{FuncWriter, ModuleWriter},
        module::FuncRef,
        Linkage, Module, Signature, Type,
    };

    pub fn test_module_builder() -> ModuleBuilder {
        ModuleBuilder::new("test")
    }

    /// Declares a public function named `name` and returns a builder for it.
    pub fn test_func_builder<'a>(
        mb: &'a mut ModuleBuilder,
        name: &str,
        args: &[Type],
        ret_ty: Type,
    ) -> FunctionBuilder<'a, InstInserter> {
        let sig = Signature::new(name, Linkage::Public, args, ret_ty);
        let func_ref = mb.declare_function(sig);
        mb.func_builder(func_ref)
    }

    pub fn dump_func(module: &Module, func_ref: FuncRef) -> String {
        let func = &module.funcs[func_ref];
        let mut writer = FuncWriter::with_module(func, module);
        writer.dump_string().unwrap()
    }

    pub fn dump_module(module: &Module) -> String {
        ModuleWriter::new(module).dump_string().unwrap()
    }
}
