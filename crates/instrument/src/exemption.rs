//! Package-based exemption policy.
//!
//! Some packages can't be instrumented because the panic machinery itself is
//! compiled from them, or because they rely on wrapping arithmetic. A whole
//! compilation unit is exempt when its package path matches an entry of the
//! [`ExemptionSet`].
use std::{fmt, str::FromStr};

use ir::PackagePath;
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

use crate::error::ConfigError;

/// Entries of the standard exemption set.
pub const STANDARD_EXEMPTIONS: &[&str] = &[
    "runtime",
    "sync",
    "os",
    "syscall",
    "internal/*",
    "math",
    "unsafe",
];

static STANDARD: Lazy<ExemptionSet> =
    Lazy::new(|| match ExemptionSet::from_patterns(STANDARD_EXEMPTIONS.iter().copied()) {
        Ok(set) => set,
        Err(err) => panic!("invalid standard exemption: {err}"),
    });

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExemptionPattern {
    /// Matches exactly one package path.
    Literal(String),

    /// Matches a package path and every path below it, segment by segment.
    /// `internal` matches `internal` and `internal/abi` but not
    /// `internalize`.
    Prefix(String),
}

impl ExemptionPattern {
    /// Parses `path`, `path/*` or `path/...`.
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let invalid = |reason| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if pattern.is_empty() {
            return Err(ConfigError::EmptyPattern);
        }

        let (path, is_prefix) = match pattern
            .strip_suffix("/*")
            .or_else(|| pattern.strip_suffix("/..."))
        {
            Some(path) => (path, true),
            None => (pattern, false),
        };

        if path.is_empty() {
            return Err(invalid("missing package path before the wildcard"));
        }
        if path.starts_with('/') || path.ends_with('/') {
            return Err(invalid("leading or trailing `/`"));
        }
        if path.split('/').any(str::is_empty) {
            return Err(invalid("empty path segment"));
        }
        if path.contains('*') {
            return Err(invalid("`*` is only allowed as the last segment"));
        }

        let path = path.to_string();
        Ok(if is_prefix {
            Self::Prefix(path)
        } else {
            Self::Literal(path)
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Literal(lit) => lit == path,
            Self::Prefix(prefix) => is_under(prefix, path),
        }
    }
}

fn is_under(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl FromStr for ExemptionPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ExemptionPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Literal(path) => f.write_str(path),
            Self::Prefix(path) => write!(f, "{path}/*"),
        }
    }
}

/// Immutable set of exempt packages.
///
/// Built once and shared by reference; membership is decided once per
/// compilation unit.
#[derive(Debug, Clone, Default)]
pub struct ExemptionSet {
    literals: FxHashSet<String>,
    prefixes: Vec<String>,
}

impl ExemptionSet {
    /// The process-wide standard set.
    pub fn standard() -> &'static ExemptionSet {
        &STANDARD
    }

    /// A set exempting nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> ExemptionSetBuilder {
        ExemptionSetBuilder::default()
    }

    pub fn from_patterns<'a, I>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut builder = Self::builder();
        for pattern in patterns {
            builder = builder.pattern(pattern)?;
        }
        Ok(builder.build())
    }

    /// Returns `true` if `path` matches a literal or lies under a prefix.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.literals.contains(path)
            || self.prefixes.iter().any(|prefix| is_under(prefix, path))
    }

    pub fn should_instrument(&self, package: &PackagePath) -> bool {
        !self.is_exempt(package.as_str())
    }

    /// Iterates over the entries in a stable order.
    pub fn patterns(&self) -> impl Iterator<Item = ExemptionPattern> + '_ {
        let mut literals: Vec<_> = self.literals.iter().cloned().collect();
        literals.sort_unstable();
        literals
            .into_iter()
            .map(ExemptionPattern::Literal)
            .chain(self.prefixes.iter().cloned().map(ExemptionPattern::Prefix))
    }

    pub fn len(&self) -> usize {
        self.literals.len() + self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds an [`ExemptionSet`], optionally starting from an existing one.
#[derive(Debug, Clone, Default)]
pub struct ExemptionSetBuilder {
    set: ExemptionSet,
}

impl ExemptionSetBuilder {
    /// Starts from the entries of `set`.
    pub fn extend_from(set: &ExemptionSet) -> Self {
        Self { set: set.clone() }
    }

    pub fn pattern(self, pattern: &str) -> Result<Self, ConfigError> {
        Ok(self.insert(ExemptionPattern::parse(pattern)?))
    }

    pub fn insert(mut self, pattern: ExemptionPattern) -> Self {
        match pattern {
            ExemptionPattern::Literal(path) => {
                self.set.literals.insert(path);
            }
            ExemptionPattern::Prefix(path) => {
                if !self.set.prefixes.contains(&path) {
                    self.set.prefixes.push(path);
                }
            }
        }
        self
    }

    pub fn build(self) -> ExemptionSet {
        self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_set() {
        let set = ExemptionSet::standard();
        assert_eq!(set.len(), STANDARD_EXEMPTIONS.len());

        for path in [
            "runtime",
            "sync",
            "os",
            "syscall",
            "math",
            "unsafe",
            "internal",
            "internal/bytealg",
            "internal/runtime/atomic",
        ] {
            assert!(set.is_exempt(path), "{path}");
        }

        for path in [
            "app",
            "runtimex",
            "internalize",
            "myinternal/x",
            "math/big",
            "sync/atomic",
            "os/exec",
            "vendor/internal",
        ] {
            assert!(!set.is_exempt(path), "{path}");
        }
    }

    #[test]
    fn standard_set_is_shared() {
        assert!(std::ptr::eq(
            ExemptionSet::standard(),
            ExemptionSet::standard()
        ));
    }

    #[test]
    fn parse_patterns() {
        assert_eq!(
            "math".parse::<ExemptionPattern>(),
            Ok(ExemptionPattern::Literal("math".into()))
        );
        assert_eq!(
            "internal/*".parse::<ExemptionPattern>(),
            Ok(ExemptionPattern::Prefix("internal".into()))
        );
        assert_eq!(
            "vendor/golang.org/...".parse::<ExemptionPattern>(),
            Ok(ExemptionPattern::Prefix("vendor/golang.org".into()))
        );
        assert_eq!(
            ExemptionPattern::parse("internal/*").unwrap().to_string(),
            "internal/*"
        );

        assert_eq!(ExemptionPattern::parse(""), Err(ConfigError::EmptyPattern));
        for bad in ["/*", "/runtime", "runtime/", "a//b", "a/*/b", "*"] {
            assert!(
                matches!(
                    ExemptionPattern::parse(bad),
                    Err(ConfigError::InvalidPattern { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn extend_standard() {
        let set = ExemptionSetBuilder::extend_from(ExemptionSet::standard())
            .pattern("app/kernel/...")
            .unwrap()
            .pattern("crypto/subtle")
            .unwrap()
            .build();

        assert!(set.is_exempt("runtime"));
        assert!(set.is_exempt("app/kernel"));
        assert!(set.is_exempt("app/kernel/mem"));
        assert!(set.is_exempt("crypto/subtle"));
        assert!(!set.is_exempt("app/kernelx"));
        assert!(!set.is_exempt("crypto"));
        assert!(set.should_instrument(&PackagePath::new("app")));
        assert_eq!(set.len(), STANDARD_EXEMPTIONS.len() + 2);

        // The shared standard set is unaffected.
        assert!(!ExemptionSet::standard().is_exempt("crypto/subtle"));
    }

    #[test]
    fn from_patterns_rejects_bad_entry() {
        let err = ExemptionSet::from_patterns(["runtime", "bad/"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid exemption pattern `bad/`: leading or trailing `/`"
        );
    }

    #[test]
    fn patterns_round_trip() {
        let set = ExemptionSet::standard();
        let rebuilt = ExemptionSet::from_patterns(
            set.patterns()
                .map(|pattern| pattern.to_string())
                .collect::<Vec<_>>()
                .iter()
                .map(String::as_str),
        )
        .unwrap();
        assert_eq!(
            rebuilt.patterns().collect::<Vec<_>>(),
            set.patterns().collect::<Vec<_>>()
        );
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        fn segment() -> impl Strategy<Value = String> {
            "[a-z][a-z0-9_]{0,7}".prop_map(|s| s.to_string())
        }

        fn path() -> impl Strategy<Value = Vec<String>> {
            prop::collection::vec(segment(), 1..4)
        }

        proptest! {
            #[test]
            fn prefix_matches_only_on_segment_boundary(prefix in path(), rest in path(), glued in segment()) {
                let prefix = prefix.join("/");
                let set = ExemptionSet::from_patterns([format!("{prefix}/*").as_str()]).unwrap();

                prop_assert!(set.is_exempt(&prefix));
                let below = format!("{}/{}", prefix, rest.join("/"));
                prop_assert!(set.is_exempt(&below));
                let sibling = format!("{prefix}{glued}");
                prop_assert!(!set.is_exempt(&sibling));
            }

            #[test]
            fn literal_matches_exactly(lit in path(), rest in path()) {
                let lit = lit.join("/");
                let set = ExemptionSet::from_patterns([lit.as_str()]).unwrap();

                prop_assert!(set.is_exempt(&lit));
                let below = format!("{}/{}", lit, rest.join("/"));
                prop_assert!(!set.is_exempt(&below));
            }
        }
    }
}
