//! Findings produced by the verifier.
use std::fmt;

use ir::{BlockId, FuncRef, InstId};

/// A property of well formed IR. Each rule has a stable code, `V` followed
/// by the rule's area (1 layout, 2 control flow, 3 dataflow, 4 types) and an
/// index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// A function that isn't external has no blocks.
    NoEntry,
    EmptyBlock,
    Unterminated,
    CodeAfterTerminator,
    MisplacedPhi,

    DanglingBranch,
    UnreachableBlock,
    PhiFromNonPred,
    PhiEdgeCount,

    UseBeforeDef,
    RemovedDef,
    UnknownCallee,

    OperandType,
    CallArity,
    CallArgType,
    ReturnType,
}

impl Rule {
    pub fn code(self) -> &'static str {
        match self {
            Self::NoEntry => "V101",
            Self::EmptyBlock => "V102",
            Self::Unterminated => "V103",
            Self::CodeAfterTerminator => "V104",
            Self::MisplacedPhi => "V105",
            Self::DanglingBranch => "V201",
            Self::UnreachableBlock => "V202",
            Self::PhiFromNonPred => "V203",
            Self::PhiEdgeCount => "V204",
            Self::UseBeforeDef => "V301",
            Self::RemovedDef => "V302",
            Self::UnknownCallee => "V303",
            Self::OperandType => "V401",
            Self::CallArity => "V402",
            Self::CallArgType => "V403",
            Self::ReturnType => "V404",
        }
    }

    /// Unreachable blocks are legal, just suspicious. Everything else makes
    /// the function unfit to run or instrument.
    pub fn is_error(self) -> bool {
        self != Self::UnreachableBlock
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Where a finding was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    Func(FuncRef),
    Block(FuncRef, BlockId),
    Inst(FuncRef, BlockId, InstId),
}

impl Site {
    pub fn func(self) -> FuncRef {
        match self {
            Self::Func(func) | Self::Block(func, _) | Self::Inst(func, ..) => func,
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "func{}", self.func().as_u32())?;
        match self {
            Self::Func(_) => Ok(()),
            Self::Block(_, block) => write!(f, "/{block}"),
            Self::Inst(_, block, inst) => write!(f, "/{block}/{inst}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub rule: Rule,
    pub site: Site,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = if self.rule.is_error() {
            "error"
        } else {
            "warning"
        };
        write!(f, "{}: {kind}: {} ({})", self.site, self.message, self.rule)
    }
}

/// Findings of one verification run, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub findings: Vec<Finding>,
    /// Set when findings were dropped because the limit was hit.
    pub truncated: bool,
}

impl Report {
    /// True if nothing but warnings was found.
    pub fn is_ok(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|finding| finding.rule.is_error())
    }

    pub fn violates(&self, rule: Rule) -> bool {
        self.findings.iter().any(|finding| finding.rule == rule)
    }

    pub(crate) fn record(&mut self, finding: Finding, limit: Option<usize>) {
        if limit.is_some_and(|limit| self.findings.len() >= limit) {
            self.truncated = true;
        } else {
            self.findings.push(finding);
        }
    }

    pub(crate) fn merge(&mut self, other: Report, limit: Option<usize>) {
        self.truncated |= other.truncated;
        for finding in other.findings {
            self.record(finding, limit);
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.findings.is_empty() {
            return f.write_str("no findings");
        }

        for finding in &self.findings {
            writeln!(f, "{finding}")?;
        }
        if self.truncated {
            f.write_str("(further findings omitted)")?;
        }
        Ok(())
    }
}
