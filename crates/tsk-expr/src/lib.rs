//! tsk-expr - The expression engine.
//!
//! Filters and date arithmetic are infix expressions over a tagged
//! variant value type. The pipeline is: validate the token list with a
//! recursive descent over the grammar, convert to postfix with the
//! shunting-yard algorithm, then evaluate with a stack machine.
//! Identifiers resolve through pluggable sources; the primary source is
//! a DOM resolver reading task attributes by dotted name.

pub mod eval;
pub mod ops;
pub mod parser;
pub mod postfix;
pub mod value;

pub use eval::{ConstantsResolver, Eval, Resolver};
pub use ops::{Assoc, OpDef, OpKind};
pub use value::{Value, ValueContext};
