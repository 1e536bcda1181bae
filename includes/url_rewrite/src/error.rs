use std::num::ParseIntError;

use thiserror::Error;

/// Error when a back-reference index points past the captured groups
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackReferenceError {
    #[error("Back-reference {index} is outside the {len} captured groups")]
    OutOfRange { index: usize, len: usize },
}

/// Errors when compiling a rewrite template into a [`Pattern`](crate::Pattern)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("Placeholder starting at byte {0} is never closed")]
    UnclosedPlaceholder(usize),

    #[error("Invalid back-reference {0:?}")]
    InvalidBackReference(String),

    #[error("Unknown server variable {0:?}")]
    UnknownVariable(String),

    #[error("Unknown function or rewrite map {0:?}")]
    UnknownFunction(String),
}

/// Raised when an enumerated attribute or flag holds an unknown value
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unrecognized value {0:?}")]
pub struct UnknownValue(pub String);

/// Errors when assembling a [`Rule`](crate::Rule) from its parts
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Cannot build a rule without {0}")]
    InvalidState(&'static str),

    #[error("{0} is not supported")]
    Unsupported(String),

    #[error("Invalid regex {pattern:?}: {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("Match does not have an associated pattern")]
    MissingPattern,

    #[error("Redirect status {0} is not a 3xx code")]
    InvalidStatus(u16),

    #[error("Back-reference {reference} exceeds the {available} groups that can be captured")]
    BackReference { reference: String, available: usize },

    #[error("Invalid rewrite template: {0}")]
    Pattern(#[from] PatternError),
}

/// Errors when parsing a single Apache-style directive
#[derive(Debug, Error)]
pub enum ExpressionError {
    #[error("Missing expression identifier")]
    MissingIdentifier,

    #[error("Invalid rule identifier {0:?}")]
    InvalidIdentifier(String),

    #[error("Invalid state rule {0:?}")]
    InvalidStateRule(String),

    #[error("Quotation never closed in expression {0:?}")]
    UnclosedQuotation(String),

    #[error("RewriteCond is not followed by a RewriteRule")]
    DanglingCondition,

    #[error("Error when parsing condition rule: {0}")]
    ConditionError(#[from] CondError),

    #[error("Error when parsing rewrite rule: {0}")]
    RuleError(#[from] RuleError),

    #[error("Invalid rewrite template: {0}")]
    Pattern(#[from] PatternError),

    #[error("Failed to build rule: {0}")]
    Build(#[from] BuildError),
}

/// Errors when parsing `RewriteCond` expressions
#[derive(Debug, Error, PartialEq)]
pub enum CondError {
    #[error("Rule condition expression is empty")]
    EmptyExpression,

    #[error("Rule condition is missing a pattern")]
    MissingPattern,

    #[error("Invalid comparison expression {0:?}")]
    InvalidComparison(String),

    #[error("Unsupported file test {0:?}")]
    UnsupportedFileTest(String),

    #[error("Invalid expression suffix {0:?}")]
    InvalidSuffix(String),

    #[error("Condition flags missing brackets {0:?}")]
    FlagsMissingBrackets(String),

    #[error("Condition flags are empty")]
    FlagsEmpty,

    #[error("Invalid condition flag {0:?}")]
    InvalidFlag(String),
}

/// Errors when parsing `RewriteRule` expressions
#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("Rule is missing a pattern")]
    MissingPattern,

    #[error("Rule is missing a rewrite expression")]
    MissingRewrite,

    #[error("Invalid suffix to rule expression {0:?}")]
    InvalidSuffix(String),

    #[error("Rule flag definitions missing brackets {0:?}")]
    FlagsMissingBrackets(String),

    #[error("Rule flags empty")]
    FlagsEmpty,

    #[error("Rule flags used are mutually exclusive")]
    FlagsMutuallyExclusive,

    #[error("Invalid flag in rule definition {0:?}")]
    InvalidFlag(String),

    #[error("Rule flag {0:?} is not supported")]
    UnsupportedFlag(String),

    #[error("Invalid number in rule definition: {0}")]
    InvalidFlagNumber(#[from] ParseIntError),

    #[error("Invalid status code in rule definition {0:?}")]
    InvalidFlagStatus(String),
}

/// Error raised while loading Apache-style rules, tagged with
/// the 1-based source line it came from.
#[derive(Debug, Error)]
#[error("Line {line}: {kind}")]
pub struct ApacheError {
    pub line: usize,
    #[source]
    pub kind: ExpressionError,
}

impl ApacheError {
    /// Returns true when the line uses a feature the engine refuses to emulate.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            &self.kind,
            ExpressionError::RuleError(RuleError::UnsupportedFlag(_))
                | ExpressionError::ConditionError(CondError::UnsupportedFileTest(_))
                | ExpressionError::Build(BuildError::Unsupported(_))
        )
    }
}

/// Errors while loading IIS-style XML rules
#[derive(Debug, Error)]
pub enum IisError {
    #[error("Malformed rewrite xml: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Could not parse the rewrite rules at line {line}, column {column}: {message}")]
    Format {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("Unsupported rewrite feature at line {line}, column {column}: {message}")]
    Unsupported {
        line: u32,
        column: u32,
        message: String,
    },
}
