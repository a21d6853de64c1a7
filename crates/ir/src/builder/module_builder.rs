use super::FunctionBuilder;
use crate::{
    func_cursor::{CursorLocation, FuncCursor},
    module::{FuncRef, PackagePath},
    Module, Signature,
};

#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new(package: impl Into<PackagePath>) -> Self {
        Self {
            module: Module::new(package),
        }
    }

    pub fn declare_function(&mut self, sig: Signature) -> FuncRef {
        self.module.declare_function(sig)
    }

    pub fn lookup_func(&self, name: &str) -> Option<FuncRef> {
        self.module.lookup_func(name)
    }

    pub fn sig(&self, func_ref: FuncRef) -> &Signature {
        self.module.sig(func_ref)
    }

    /// Returns a builder for the body of `func`. The body is stored back into
    /// the module on [`FunctionBuilder::finish`].
    pub fn func_builder<C>(&mut self, func: FuncRef) -> FunctionBuilder<'_, C>
    where
        C: FuncCursor,
    {
        let cursor = C::at_location(CursorLocation::NoWhere);
        FunctionBuilder::new(self, func, cursor)
    }

    pub(super) fn module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    pub fn build(self) -> Module {
        self.module
    }
}
