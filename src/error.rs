use std::fmt;

/// Errors raised while compiling a selector or predicate.
///
/// Compilation fails fast: the first malformed fragment aborts it. Soft
/// conflicts (a destination written twice, key types that disagree with the
/// node's copy strategy) are not errors; they are logged and skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Selector value with a shape that has no meaning
    InvalidSelector { fragment: String, reason: String },

    /// Predicate value with a shape that has no meaning
    InvalidPredicate { fragment: String, reason: String },

    /// An OR (array) nested directly inside another OR
    NestedDisjunction { fragment: String },

    /// Function-call head that is neither a function nor an aggregator
    UnknownFunction(String),

    /// Bare string selector that is neither an aggregator nor a function
    UnknownName(String),

    /// Function call whose arguments don't read exactly one input
    UnsupportedArguments { function: String, reason: String },

    /// Predicate operator applied to an operand it can't use
    InvalidOperand { operator: String, reason: String },

    /// `~` pattern that doesn't compile
    InvalidRegex { pattern: String, message: String },

    /// Sort or aggregation directive where it can't take effect
    MisplacedDirective { directive: String, reason: String },

    /// Any of the above, found under the destination key path `path`
    Located { path: Vec<String>, source: Box<CompileError> },
}

impl CompileError {
    /// Prefixes the error location with one more destination key.
    pub fn at(self, key: &str) -> Self {
        match self {
            CompileError::Located { mut path, source } => {
                path.insert(0, key.to_string());
                CompileError::Located { path, source }
            }
            other => CompileError::Located {
                path: vec![key.to_string()],
                source: Box::new(other),
            },
        }
    }

    /// The error without its location.
    pub fn root_cause(&self) -> &CompileError {
        match self {
            CompileError::Located { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::InvalidSelector { fragment, reason } => {
                write!(f, "Invalid selector {}: {}", fragment, reason)
            }
            CompileError::InvalidPredicate { fragment, reason } => {
                write!(f, "Invalid predicate {}: {}", fragment, reason)
            }
            CompileError::NestedDisjunction { fragment } => write!(
                f,
                "Unsupported predicate {}: an OR list cannot contain another OR list",
                fragment
            ),
            CompileError::UnknownFunction(name) => write!(f, "Unknown function: {}", name),
            CompileError::UnknownName(name) => {
                write!(f, "Unknown aggregator or function: {}", name)
            }
            CompileError::UnsupportedArguments { function, reason } => {
                write!(f, "Unsupported arguments for {}: {}", function, reason)
            }
            CompileError::InvalidOperand { operator, reason } => {
                write!(f, "Invalid operand for '{}': {}", operator, reason)
            }
            CompileError::InvalidRegex { pattern, message } => {
                write!(f, "Invalid regex '{}': {}", pattern, message)
            }
            CompileError::MisplacedDirective { directive, reason } => {
                write!(f, "Misplaced directive {}: {}", directive, reason)
            }
            CompileError::Located { path, source } => {
                write!(f, "at .{}: {}", path.join("."), source)
            }
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Located { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
