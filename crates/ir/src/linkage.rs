use std::fmt;

/// Linkage of symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Linkage {
    /// The symbol is defined in the module, and can be used from the outside of the module.
    Public,

    /// The symbol is defined in the module, and can NOT be called from another module.
    #[default]
    Private,

    /// The symbol is defined outside of the module. Such functions have no body.
    External,
}

impl Linkage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::External => "external",
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
