use crate::comp::Comp;

/// One arm of a [`Block::Switch`](crate::block::Block::Switch).
///
/// No uniqueness is enforced on `expr`: a switch may hold several cases with
/// the same guard and all of them are kept, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Case {
    pub expr: String,
    pub body: Comp,
}

impl Case {
    pub fn new(expr: impl Into<String>, body: Comp) -> Self {
        Case {
            expr: expr.into(),
            body,
        }
    }
}
