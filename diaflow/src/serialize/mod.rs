//! Program -> XML.
//!
//! Statement lists are spliced straight into the element that owns them:
//! a function's `<body>`, the `<then>`/`<else>` of an `<if>`, or the loop and
//! `<case>` elements themselves. There is no separate list wrapper.

use crate::block::Block;
use crate::comp::Comp;
use crate::config::WriteOptions;
use crate::xml::Element;
use crate::{Function, Program};

impl Block {
    /// Append this statement to `parent` as exactly one new child element.
    pub fn write_xml(&self, parent: &mut Element) {
        let element = parent.append_child(self.tag());
        match self {
            Block::Assign { expr }
            | Block::Input { expr }
            | Block::Output { expr, .. }
            | Block::Return { expr } => element.set_attribute("expr", expr),
            Block::Comment { text } => element.set_attribute("comment", text),
            Block::Break | Block::Continue => {}
            Block::If {
                cond,
                then_body,
                else_body,
            } => {
                element.set_attribute("cond", cond);
                then_body.write_xml(element.append_child("then"));
                else_body.write_xml(element.append_child("else"));
            }
            Block::While { cond, body } | Block::DoWhile { cond, body } => {
                element.set_attribute("cond", cond);
                body.write_xml(element);
            }
            Block::For {
                init,
                cond,
                inc,
                body,
            } => {
                element.set_attribute("init", init);
                element.set_attribute("cond", cond);
                element.set_attribute("inc", inc);
                body.write_xml(element);
            }
            Block::Foreach { var, iter, body } => {
                element.set_attribute("var", var);
                element.set_attribute("iter", iter);
                body.write_xml(element);
            }
            Block::Switch { expr, cases } => {
                element.set_attribute("expr", expr);
                for case in cases {
                    let case_element = element.append_child("case");
                    case_element.set_attribute("expr", &case.expr);
                    case.body.write_xml(case_element);
                }
            }
            Block::Call { name, retvar, args } => {
                element.set_attribute("name", name);
                element.set_attribute("retvar", retvar);
                for arg in args {
                    element.append_child("arg").set_attribute("expr", arg);
                }
            }
        }
    }
}

impl Comp {
    /// Append every statement, in order, as children of `parent`.
    pub fn write_xml(&self, parent: &mut Element) {
        for block in self {
            block.write_xml(parent);
        }
    }
}

impl Function {
    pub fn write_xml(&self, name: &str, parent: &mut Element) {
        let element = parent.append_child("func");
        element.set_attribute("name", name);
        for param in &self.params {
            element.append_child("arg").set_attribute("name", param);
        }
        self.body.write_xml(element.append_child("body"));
    }
}

impl Program {
    /// Build the `<prog>` element tree for this program.
    pub fn to_element(&self) -> Element {
        let mut root = Element::new("prog");
        for (name, function) in &self.functions {
            function.write_xml(name, &mut root);
        }
        root
    }

    pub fn to_xml_string(&self) -> String {
        self.to_xml_string_with(&WriteOptions::default())
    }

    pub fn to_xml_string_with(&self, options: &WriteOptions) -> String {
        self.to_element().write_to(options)
    }
}
