//! Abstract syntax tree definitions.
//!
//! The tree is produced by the parser and consumed by the runtime's bytecode
//! compiler. Nodes carry no source spans; parse errors are reported before a
//! tree is ever built.

/// A block of code: a parameter name list and a sequence of expressions.
///
/// A whole program is a block with no parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub params: Vec<String>,
    pub body: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A number literal.
    Number(f64),

    /// A string literal.
    String(String),

    /// A variable reference. The spelling of the name decides which scope it
    /// resolves in: a leading capital is a global, a leading underscore is an
    /// object field, anything else is a local.
    Name(String),

    /// The current receiver.
    SelfRef,

    /// An array literal.
    Array(Vec<Expr>),

    /// A block literal.
    Block(Block),

    /// A message send. A send written with no receiver goes to the global
    /// environment object.
    Message {
        receiver: Option<Box<Expr>>,
        selector: String,
        args: Vec<Expr>,
    },

    /// `name <- value`: bind a new variable.
    Define { name: String, value: Box<Expr> },

    /// `name <-- value`: assign to an existing variable.
    Assign { name: String, value: Box<Expr> },

    /// `undef name`: remove a binding.
    Undefine { name: String },
}
