pub mod action;
pub mod condition;
pub mod document;
pub mod expr;

pub use action::{Action, ArithmeticActionOp, AssignOp, ListActionOp, DEFAULT_MAX_ITERATIONS};
pub use condition::{Condition, LogicalOp};
pub use document::{
    CircuitBreakerConfig, ConditionalBlock, ConstantDecl, DocumentShape, InputType, RuleShape, RulesDoc, SimpleRule, SubRule,
};
pub use expr::{ArithmeticKind, BinaryOp, Expr, UnaryOp};
