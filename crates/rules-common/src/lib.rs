pub mod diagnostic;
pub mod naming;
pub mod span;
pub mod value;

pub use diagnostic::Diagnostic;
pub use naming::{classify, NameClass};
pub use span::{LineIndex, SourceLocation, Span};
pub use value::{TypeTag, Value};
