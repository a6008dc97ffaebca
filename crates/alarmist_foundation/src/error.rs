//! Error types for the Alarmist system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::value::ValueKind;

/// Result alias used throughout Alarmist.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Alarmist operations.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a parse error for a pattern, expression or template.
    #[must_use]
    pub fn parse(message: impl Into<String>, input: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError {
            message: message.into(),
            input: input.into(),
        })
    }

    /// Creates an unknown name error.
    #[must_use]
    pub fn unknown_name(kind: NameKind, name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownName {
            kind,
            name: name.into(),
        })
    }

    /// Creates an invalid operation error.
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidOperation(message.into()))
    }

    /// Creates a domain size mismatch error.
    #[must_use]
    pub fn size_mismatch(left: usize, right: usize) -> Self {
        Self::new(ErrorKind::SizeMismatch { left, right })
    }

    /// Creates a domain explosion error.
    #[must_use]
    pub fn domain_too_large(limit: usize, rule: impl Into<String>) -> Self {
        Self::new(ErrorKind::DomainTooLarge {
            limit,
            rule: rule.into(),
        })
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: ValueKind, actual: ValueKind) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates a semantic limit exceeded error.
    #[must_use]
    pub fn limit_exceeded(limit: SemanticLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns true if this error reports a broken internal invariant.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::SizeMismatch { .. } | ErrorKind::Internal(_)
        )
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    /// Malformed regex, expression, or template at load time.
    #[error("parse error: {message} in `{input}`")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// The offending input text.
        input: String,
    },

    /// A referenced condition, rule or function does not exist.
    #[error("unknown {kind}: {name}")]
    UnknownName {
        /// What sort of name was looked up.
        kind: NameKind,
        /// The name that was not found.
        name: String,
    },

    /// The caller asked for something the target does not support.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Two domain vectors of different lengths were combined.
    #[error("domain size mismatch: {left} vs {right}")]
    SizeMismatch {
        /// Length of the left operand.
        left: usize,
        /// Length of the right operand.
        right: usize,
    },

    /// Domain enumeration for a rule exceeded the configured ceiling.
    #[error("domain of rule {rule} exceeds {limit} combinations")]
    DomainTooLarge {
        /// The configured ceiling.
        limit: usize,
        /// The rule being evaluated.
        rule: String,
    },

    /// Type mismatch in a comparison or function argument.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: ValueKind,
        /// The actual type encountered.
        actual: ValueKind,
    },

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Semantic limit exceeded (kill switch triggered).
    #[error("limit exceeded: {0}")]
    LimitExceeded(SemanticLimit),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// The registry a failed name lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    /// A condition (or fact).
    Condition,
    /// A rule.
    Rule,
    /// A custom rule function.
    Function,
    /// A condition test function.
    TestFunction,
    /// A participant group.
    ParticipantGroup,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Condition => "condition",
            Self::Rule => "rule",
            Self::Function => "function",
            Self::TestFunction => "test function",
            Self::ParticipantGroup => "participant group",
        };
        f.write_str(s)
    }
}

/// Semantic limits (kill switches) that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticLimit {
    /// Forward chaining produced facts deeper than allowed.
    MaxChainDepth {
        /// The configured limit.
        limit: u32,
        /// The rule whose chained facts crossed the limit.
        rule: Option<String>,
    },
    /// More rule evaluations were requested in one call than allowed.
    MaxEvaluations {
        /// The configured limit.
        limit: usize,
    },
}

impl fmt::Display for SemanticLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxChainDepth { limit, rule } => {
                write!(f, "max chain depth ({limit}) exceeded")?;
                if let Some(rule) = rule {
                    write!(f, " after rule {rule}")?;
                }
                Ok(())
            }
            Self::MaxEvaluations { limit } => {
                write!(f, "max evaluations ({limit}) exceeded")
            }
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    /// The condition being processed.
    pub condition: Option<String>,
    /// The rule being processed.
    pub rule: Option<String>,
    /// Evaluation frames, outermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            condition: None,
            rule: None,
            stack: Vec::new(),
        }
    }

    /// Sets the condition name.
    #[must_use]
    pub fn with_condition(mut self, name: impl Into<String>) -> Self {
        self.condition = Some(name.into());
        self
    }

    /// Sets the rule name.
    #[must_use]
    pub fn with_rule(mut self, name: impl Into<String>) -> Self {
        self.rule = Some(name.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "in rule {rule}")?;
        }
        if let Some(condition) = &self.condition {
            if self.rule.is_some() {
                f.write_str(", ")?;
            }
            write!(f, "in condition {condition}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
