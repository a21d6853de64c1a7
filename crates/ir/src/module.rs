use std::fmt;

use cranelift_entity::{entity_impl, PrimaryMap};
use indexmap::IndexMap;
use rayon::prelude::*;

use crate::{Function, Linkage, Signature};

/// Fully qualified import path of the package a module is compiled from,
/// e.g. `internal/bytealg`. Segments are separated by `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PackagePath(String);

impl PackagePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for PackagePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackagePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl AsRef<str> for PackagePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A compilation unit: every function compiled from one package.
#[derive(Debug, Clone)]
pub struct Module {
    /// Package the module is compiled from.
    pub package: PackagePath,

    /// Holds all function declared in the module.
    pub funcs: PrimaryMap<FuncRef, Function>,

    /// Map function name -> FuncRef to avoid duplicated declaration.
    symbols: IndexMap<String, FuncRef>,
}

impl Module {
    pub fn new(package: impl Into<PackagePath>) -> Self {
        Self {
            package: package.into(),
            funcs: PrimaryMap::default(),
            symbols: IndexMap::default(),
        }
    }

    /// Declares a function. Declaring a name twice returns the first
    /// declaration.
    pub fn declare_function(&mut self, sig: Signature) -> FuncRef {
        if let Some(&func_ref) = self.symbols.get(sig.name()) {
            return func_ref;
        }

        let name = sig.name().to_string();
        let func_ref = self.funcs.push(Function::new(&sig));
        self.symbols.insert(name, func_ref);
        func_ref
    }

    pub fn lookup_func(&self, name: &str) -> Option<FuncRef> {
        self.symbols.get(name).copied()
    }

    /// Returns `func_ref` in the module.
    pub fn iter_functions(&self) -> impl Iterator<Item = FuncRef> {
        self.funcs.keys()
    }

    pub fn sig(&self, func_ref: FuncRef) -> &Signature {
        &self.funcs[func_ref].sig
    }

    /// Returns `true` if the function has external linkage.
    pub fn is_external(&self, func_ref: FuncRef) -> bool {
        self.funcs[func_ref].sig.linkage() == Linkage::External
    }

    /// Runs `f` on every function of the module in parallel and collects the
    /// results in `FuncRef` order.
    pub fn par_map_funcs<F, R>(&mut self, f: F) -> Vec<(FuncRef, R)>
    where
        F: Fn(FuncRef, &mut Function) -> R + Sync,
        R: Send,
    {
        let funcs: Vec<_> = self.funcs.iter_mut().collect();
        funcs
            .into_par_iter()
            .map(|(func_ref, func)| (func_ref, f(func_ref, func)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncRef(u32);
entity_impl!(FuncRef);
