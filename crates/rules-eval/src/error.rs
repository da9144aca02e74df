use rules_common::Span;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    DivisionByZero { span: Span },
    UndefinedVariable { name: String, span: Span },
    UndefinedFunction { name: String, span: Span },
    TypeError { message: String, span: Span },
    IndexOutOfBounds { index: i64, len: usize, span: Span },
    InvalidRegex { pattern: String, reason: String, span: Span },
    FunctionCallFailed { name: String, reason: String, span: Span },
    PropertyAccessFailed { path: String, reason: String, span: Span },
    LoopLimitExceeded { max_iterations: u32, span: Span },
    Generic { message: String, span: Span },
}

impl EvalError {
    pub fn code(&self) -> &'static str {
        match self {
            EvalError::DivisionByZero { .. } => "EVAL_001",
            EvalError::UndefinedVariable { .. } => "EVAL_002",
            EvalError::UndefinedFunction { .. } => "EVAL_003",
            EvalError::TypeError { .. } => "EVAL_004",
            EvalError::IndexOutOfBounds { .. } => "EVAL_005",
            EvalError::InvalidRegex { .. } => "EVAL_006",
            EvalError::FunctionCallFailed { .. } => "EVAL_007",
            EvalError::PropertyAccessFailed { .. } => "EVAL_008",
            EvalError::LoopLimitExceeded { .. } => "EVAL_LOOP_LIMIT",
            EvalError::Generic { .. } => "EVAL_GENERIC",
        }
    }

    pub fn span(&self) -> Span {
        match self {
            EvalError::DivisionByZero { span }
            | EvalError::UndefinedVariable { span, .. }
            | EvalError::UndefinedFunction { span, .. }
            | EvalError::TypeError { span, .. }
            | EvalError::IndexOutOfBounds { span, .. }
            | EvalError::InvalidRegex { span, .. }
            | EvalError::FunctionCallFailed { span, .. }
            | EvalError::PropertyAccessFailed { span, .. }
            | EvalError::LoopLimitExceeded { span, .. }
            | EvalError::Generic { span, .. } => *span,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::DivisionByZero { .. } => write!(f, "division by zero"),
            EvalError::UndefinedVariable { name, .. } => write!(f, "undefined variable '{name}'"),
            EvalError::UndefinedFunction { name, .. } => write!(f, "undefined function '{name}'"),
            EvalError::TypeError { message, .. } => write!(f, "{message}"),
            EvalError::IndexOutOfBounds { index, len, .. } => write!(f, "index {index} out of bounds for list of length {len}"),
            EvalError::InvalidRegex { pattern, reason, .. } => write!(f, "invalid regex '{pattern}': {reason}"),
            EvalError::FunctionCallFailed { name, reason, .. } => write!(f, "call to '{name}' failed: {reason}"),
            EvalError::PropertyAccessFailed { path, reason, .. } => write!(f, "property access '{path}' failed: {reason}"),
            EvalError::LoopLimitExceeded { max_iterations, .. } => write!(f, "loop exceeded the cap of {max_iterations} iterations"),
            EvalError::Generic { message, .. } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for EvalError {}
