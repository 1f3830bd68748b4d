use tracing::trace;

use crate::block::{Block, Case};
use crate::comp::Comp;
use crate::parser::MAX_DEPTH;
use crate::parser::error::{ErrorKind, ParseError};
use crate::xml::Element;
use crate::{Function, Program};

/// Recursive descent from an element tree to a [`Program`].
///
/// Each element is visited exactly once. The first problem found ends the
/// walk; whatever was decoded up to that point is dropped on the way out.
/// Recursion stops at [`MAX_DEPTH`] element levels.
pub(crate) struct Decoder {
    file_id: usize,
}

impl Decoder {
    pub(crate) fn new(file_id: usize) -> Self {
        Decoder { file_id }
    }

    pub(crate) fn program(&self, root: &Element) -> Result<Program, ParseError> {
        if root.name != "prog" {
            return Err(self
                .error(ErrorKind::MissingRoot, root)
                .with_note(format!("found <{}> instead", root.name)));
        }

        let mut program = Program::new();
        for child in &root.children {
            if child.name != "func" {
                return Err(self.unknown(child, root));
            }
            let name = self.required(child, "name")?;
            if program.functions.contains_key(name) {
                return Err(self.error(ErrorKind::DuplicateFunction(name.to_string()), child));
            }
            let function = self.function(child)?;
            trace!(
                function = name,
                params = function.params.len(),
                nodes = function.body.node_count(),
                "decoded function"
            );
            program.functions.insert(name.to_string(), function);
        }
        Ok(program)
    }

    fn function(&self, element: &Element) -> Result<Function, ParseError> {
        let mut params = Vec::new();
        let mut body = None;

        for child in &element.children {
            match child.name.as_str() {
                "arg" => {
                    self.no_children(child)?;
                    params.push(self.required(child, "name")?.to_string());
                }
                "body" => {
                    if body.is_some() {
                        return Err(self.duplicate(element, child, "body"));
                    }
                    // <body> sits at level 3, under <prog> and <func>.
                    body = Some(self.comp(child, 3)?);
                }
                _ => return Err(self.unknown(child, element)),
            }
        }

        let body = body.ok_or_else(|| self.missing_child(element, "body"))?;
        Ok(Function { params, body })
    }

    /// Decode every child of `element` as one statement, in order. `depth` is
    /// the nesting level of `element` itself.
    fn comp(&self, element: &Element, depth: usize) -> Result<Comp, ParseError> {
        element
            .children
            .iter()
            .map(|child| self.block(child, element, depth + 1))
            .collect()
    }

    fn block(
        &self,
        element: &Element,
        parent: &Element,
        depth: usize,
    ) -> Result<Block, ParseError> {
        self.within_limit(element, depth)?;
        let block = match element.name.as_str() {
            "assign" => Block::Assign {
                expr: self.leaf(element, "expr")?,
            },
            "in" => Block::Input {
                expr: self.leaf(element, "expr")?,
            },
            "out" | "outln" => Block::Output {
                expr: self.leaf(element, "expr")?,
                newline: element.name == "outln",
            },
            "return" => Block::Return {
                expr: self.leaf(element, "expr")?,
            },
            "comment" => Block::Comment {
                text: self.leaf(element, "comment")?,
            },
            "break" => {
                self.no_children(element)?;
                Block::Break
            }
            "continue" => {
                self.no_children(element)?;
                Block::Continue
            }
            "if" => self.if_block(element, depth)?,
            "while" => Block::While {
                cond: self.attr(element, "cond")?,
                body: self.comp(element, depth)?,
            },
            "dowhile" => Block::DoWhile {
                cond: self.attr(element, "cond")?,
                body: self.comp(element, depth)?,
            },
            "for" => Block::For {
                init: self.attr(element, "init")?,
                cond: self.attr(element, "cond")?,
                inc: self.attr(element, "inc")?,
                body: self.comp(element, depth)?,
            },
            "foreach" => Block::Foreach {
                var: self.attr(element, "var")?,
                iter: self.attr(element, "iter")?,
                body: self.comp(element, depth)?,
            },
            "switch" => Block::Switch {
                expr: self.attr(element, "expr")?,
                cases: element
                    .children
                    .iter()
                    .map(|child| self.case(child, element, depth + 1))
                    .collect::<Result<_, _>>()?,
            },
            "call" => self.call(element)?,
            _ => return Err(self.unknown(element, parent)),
        };
        Ok(block)
    }

    fn if_block(&self, element: &Element, depth: usize) -> Result<Block, ParseError> {
        let cond = self.attr(element, "cond")?;
        let mut then_body = None;
        let mut else_body = None;

        for child in &element.children {
            let (slot, name) = match child.name.as_str() {
                "then" => (&mut then_body, "then"),
                "else" => (&mut else_body, "else"),
                _ => return Err(self.unknown(child, element)),
            };
            if slot.is_some() {
                return Err(self.duplicate(element, child, name));
            }
            self.within_limit(child, depth + 1)?;
            *slot = Some(self.comp(child, depth + 1)?);
        }

        Ok(Block::If {
            cond,
            then_body: then_body.ok_or_else(|| self.missing_child(element, "then"))?,
            else_body: else_body.ok_or_else(|| self.missing_child(element, "else"))?,
        })
    }

    fn case(
        &self,
        element: &Element,
        switch: &Element,
        depth: usize,
    ) -> Result<Case, ParseError> {
        if element.name != "case" {
            return Err(self.unknown(element, switch));
        }
        self.within_limit(element, depth)?;
        Ok(Case {
            expr: self.attr(element, "expr")?,
            body: self.comp(element, depth)?,
        })
    }

    fn call(&self, element: &Element) -> Result<Block, ParseError> {
        let name = self.attr(element, "name")?;
        let retvar = self.attr(element, "retvar")?;
        let args: Vec<String> = element
            .children
            .iter()
            .map(|child| {
                if child.name != "arg" {
                    return Err(self.unknown(child, element));
                }
                self.leaf(child, "expr")
            })
            .collect::<Result<_, _>>()?;
        Ok(Block::Call { name, retvar, args })
    }

    /// Required attribute of an element that may not have children.
    fn leaf(&self, element: &Element, attribute: &'static str) -> Result<String, ParseError> {
        self.no_children(element)?;
        self.attr(element, attribute)
    }

    fn attr(&self, element: &Element, attribute: &'static str) -> Result<String, ParseError> {
        self.required(element, attribute).map(str::to_string)
    }

    fn required<'e>(
        &self,
        element: &'e Element,
        attribute: &'static str,
    ) -> Result<&'e str, ParseError> {
        element.attribute(attribute).ok_or_else(|| {
            self.error(
                ErrorKind::MissingAttribute {
                    element: element.name.clone(),
                    attribute,
                },
                element,
            )
        })
    }

    fn no_children(&self, element: &Element) -> Result<(), ParseError> {
        match element.children.first() {
            Some(child) => Err(self.unknown(child, element)),
            None => Ok(()),
        }
    }

    fn within_limit(&self, element: &Element, depth: usize) -> Result<(), ParseError> {
        if depth > MAX_DEPTH {
            return Err(self.error(ErrorKind::TooDeep(MAX_DEPTH), element));
        }
        Ok(())
    }

    fn unknown(&self, element: &Element, parent: &Element) -> ParseError {
        self.error(
            ErrorKind::UnknownTag {
                tag: element.name.clone(),
                parent: parent.name.clone(),
            },
            element,
        )
    }

    fn missing_child(&self, element: &Element, child: &'static str) -> ParseError {
        self.error(
            ErrorKind::MissingChild {
                element: element.name.clone(),
                child,
            },
            element,
        )
    }

    fn duplicate(&self, element: &Element, child: &Element, name: &'static str) -> ParseError {
        self.error(
            ErrorKind::DuplicateChild {
                element: element.name.clone(),
                child: name,
            },
            child,
        )
    }

    fn error(&self, kind: ErrorKind, at: &Element) -> ParseError {
        ParseError::new(kind, at.span.clone(), self.file_id)
    }
}
