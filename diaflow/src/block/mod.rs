pub mod case;

pub use case::Case;

use crate::comp::Comp;

/// One statement of a Diaflow program.
///
/// Every expression-like field (`expr`, `cond`, `init`, ...) is opaque text
/// written by the user in the editor; nothing here looks inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `expr` is the whole assignment, e.g. `x = x + 1`.
    Assign { expr: String },
    /// Read user input into the target described by `expr`.
    Input { expr: String },
    /// Print `expr`, followed by a line break when `newline` is set.
    Output { expr: String, newline: bool },
    If {
        cond: String,
        then_body: Comp,
        else_body: Comp,
    },
    While { cond: String, body: Comp },
    /// Body runs once before `cond` is first checked.
    DoWhile { cond: String, body: Comp },
    For {
        init: String,
        cond: String,
        inc: String,
        body: Comp,
    },
    Foreach { var: String, iter: String, body: Comp },
    /// Cases are kept in declared order. Two cases may share an expression.
    Switch { expr: String, cases: Vec<Case> },
    Break,
    Continue,
    /// Call `name` with `args`, storing the result in `retvar` (may be empty).
    Call {
        name: String,
        retvar: String,
        args: Vec<String>,
    },
    Return { expr: String },
    Comment { text: String },
}

impl Block {
    pub fn assign(expr: impl Into<String>) -> Self {
        Block::Assign { expr: expr.into() }
    }

    pub fn input(expr: impl Into<String>) -> Self {
        Block::Input { expr: expr.into() }
    }

    /// Output that ends the line. Use [`Block::output_with`] to stay on it.
    pub fn output(expr: impl Into<String>) -> Self {
        Block::output_with(expr, true)
    }

    pub fn output_with(expr: impl Into<String>, newline: bool) -> Self {
        Block::Output {
            expr: expr.into(),
            newline,
        }
    }

    pub fn if_else(cond: impl Into<String>, then_body: Comp, else_body: Comp) -> Self {
        Block::If {
            cond: cond.into(),
            then_body,
            else_body,
        }
    }

    pub fn while_loop(cond: impl Into<String>, body: Comp) -> Self {
        Block::While {
            cond: cond.into(),
            body,
        }
    }

    pub fn do_while(cond: impl Into<String>, body: Comp) -> Self {
        Block::DoWhile {
            cond: cond.into(),
            body,
        }
    }

    pub fn for_loop(
        init: impl Into<String>,
        cond: impl Into<String>,
        inc: impl Into<String>,
        body: Comp,
    ) -> Self {
        Block::For {
            init: init.into(),
            cond: cond.into(),
            inc: inc.into(),
            body,
        }
    }

    pub fn foreach(var: impl Into<String>, iter: impl Into<String>, body: Comp) -> Self {
        Block::Foreach {
            var: var.into(),
            iter: iter.into(),
            body,
        }
    }

    pub fn switch(expr: impl Into<String>, cases: Vec<Case>) -> Self {
        Block::Switch {
            expr: expr.into(),
            cases,
        }
    }

    pub fn call<I, S>(name: impl Into<String>, retvar: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Block::Call {
            name: name.into(),
            retvar: retvar.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ret(expr: impl Into<String>) -> Self {
        Block::Return { expr: expr.into() }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Block::Comment { text: text.into() }
    }

    /// The XML element name this statement is stored under.
    pub fn tag(&self) -> &'static str {
        match self {
            Block::Assign { .. } => "assign",
            Block::Input { .. } => "in",
            Block::Output { newline: true, .. } => "outln",
            Block::Output { newline: false, .. } => "out",
            Block::If { .. } => "if",
            Block::While { .. } => "while",
            Block::DoWhile { .. } => "dowhile",
            Block::For { .. } => "for",
            Block::Foreach { .. } => "foreach",
            Block::Switch { .. } => "switch",
            Block::Break => "break",
            Block::Continue => "continue",
            Block::Call { .. } => "call",
            Block::Return { .. } => "return",
            Block::Comment { .. } => "comment",
        }
    }

    /// Number of statements in this subtree, counting `self`.
    pub fn node_count(&self) -> usize {
        let nested = match self {
            Block::If {
                then_body,
                else_body,
                ..
            } => then_body.node_count() + else_body.node_count(),
            Block::While { body, .. }
            | Block::DoWhile { body, .. }
            | Block::For { body, .. }
            | Block::Foreach { body, .. } => body.node_count(),
            Block::Switch { cases, .. } => cases.iter().map(|c| c.body.node_count()).sum(),
            _ => 0,
        };
        1 + nested
    }
}
