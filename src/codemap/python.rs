//! Python symbol extraction using tree-sitter.

use std::collections::VecDeque;

use tree_sitter::Node;

use super::{with_python_parser, CodemapError, Dialect, Symbol};

/// Extract functions, classes and class methods from Python source.
///
/// Statements are visited breadth-first at the depth Python's own syntax
/// tree gives them, so outer definitions come before nested ones and
/// siblings keep source order. Every `def` (nested ones and methods
/// included) yields a function; every `class` yields the class followed by
/// the methods defined directly in its body.
pub fn extract(content: &str) -> Result<Vec<Symbol>, CodemapError> {
    with_python_parser(|parser| -> Result<Vec<Symbol>, CodemapError> {
        let tree = parser.parse(content, None).ok_or(CodemapError::Syntax {
            dialect: Dialect::Python,
        })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(CodemapError::Syntax {
                dialect: Dialect::Python,
            });
        }

        let mut symbols = Vec::new();
        let mut queue = VecDeque::from([root]);

        while let Some(node) = queue.pop_front() {
            match node.kind() {
                "function_definition" => {
                    if let Some(name) = definition_name(node, content) {
                        symbols.push(Symbol::Function(name));
                    }
                }
                "class_definition" => {
                    if let Some(name) = definition_name(node, content) {
                        symbols.push(Symbol::Class(name));
                        symbols.extend(direct_methods(node, content).map(Symbol::Method));
                    }
                }
                _ => {}
            }

            queue.extend(nested_statements(node));
        }

        Ok(symbols)
    })?
}

/// Statement-level nodes one level below `node`, in source order.
///
/// tree-sitter wraps statements in `block`, `decorated_definition` and
/// `else_clause`/`finally_clause` nodes that have no level of their own in
/// Python's tree; those are looked through. An `elif` is a nested `if`, and
/// `except`/`case` clauses are a level of their own.
fn nested_statements(node: Node) -> Vec<Node> {
    let mut nested = Vec::new();

    match node.kind() {
        "module" => push_statements(node, &mut nested),
        "function_definition" | "class_definition" | "with_statement" => {
            push_field_block(node, "body", &mut nested);
        }
        "for_statement" | "while_statement" => {
            push_field_block(node, "body", &mut nested);
            push_alternative(node.child_by_field_name("alternative"), &mut nested);
        }
        "if_statement" => {
            push_field_block(node, "consequence", &mut nested);
            push_alternative(node.child_by_field_name("alternative"), &mut nested);
        }
        "elif_clause" => {
            push_field_block(node, "consequence", &mut nested);
            push_alternative(next_clause(node), &mut nested);
        }
        "try_statement" => {
            push_field_block(node, "body", &mut nested);
            let mut cursor = node.walk();
            for clause in node.named_children(&mut cursor) {
                match clause.kind() {
                    "except_clause" | "except_group_clause" => nested.push(clause),
                    "else_clause" => push_field_block(clause, "body", &mut nested),
                    "finally_clause" => push_inner_block(clause, &mut nested),
                    _ => {}
                }
            }
        }
        "except_clause" | "except_group_clause" => push_inner_block(node, &mut nested),
        "match_statement" => {
            if let Some(body) = node.child_by_field_name("body") {
                let mut cursor = body.walk();
                nested.extend(
                    body.named_children(&mut cursor)
                        .filter(|c| c.kind() == "case_clause"),
                );
            }
        }
        "case_clause" => push_field_block(node, "consequence", &mut nested),
        _ => {}
    }

    nested
}

/// Push the statements of a block, unwrapping decorated definitions.
fn push_statements<'a>(block: Node<'a>, nested: &mut Vec<Node<'a>>) {
    let mut cursor = block.walk();
    for child in block.named_children(&mut cursor) {
        match child.kind() {
            "decorated_definition" => nested.extend(child.child_by_field_name("definition")),
            "comment" => {}
            _ => nested.push(child),
        }
    }
}

fn push_field_block<'a>(node: Node<'a>, field: &str, nested: &mut Vec<Node<'a>>) {
    if let Some(block) = node.child_by_field_name(field) {
        push_statements(block, nested);
    }
}

/// For clauses whose block carries no field name.
fn push_inner_block<'a>(node: Node<'a>, nested: &mut Vec<Node<'a>>) {
    let mut cursor = node.walk();
    let block = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "block");
    if let Some(block) = block {
        push_statements(block, nested);
    }
}

/// The `orelse` part of an `if`/`elif`/`for`/`while`.
fn push_alternative<'a>(clause: Option<Node<'a>>, nested: &mut Vec<Node<'a>>) {
    match clause {
        Some(c) if c.kind() == "elif_clause" => nested.push(c),
        Some(c) if c.kind() == "else_clause" => push_field_block(c, "body", nested),
        _ => {}
    }
}

/// The clause following an `elif`, skipping comments between clauses.
fn next_clause(node: Node) -> Option<Node> {
    let mut next = node.next_named_sibling();
    while let Some(sibling) = next {
        if sibling.kind() != "comment" {
            return Some(sibling);
        }
        next = sibling.next_named_sibling();
    }
    None
}

fn definition_name(node: Node, content: &str) -> Option<String> {
    node.child_by_field_name("name")
        .and_then(|n| n.utf8_text(content.as_bytes()).ok())
        .map(str::to_string)
}

/// Names of functions defined directly in a class body, decorated or not.
fn direct_methods<'a>(class: Node<'a>, content: &'a str) -> impl Iterator<Item = String> + 'a {
    let mut methods = Vec::new();

    if let Some(body) = class.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            let def = match child.kind() {
                "function_definition" => Some(child),
                "decorated_definition" => child
                    .child_by_field_name("definition")
                    .filter(|d| d.kind() == "function_definition"),
                _ => None,
            };
            if let Some(name) = def.and_then(|d| definition_name(d, content)) {
                methods.push(name);
            }
        }
    }

    methods.into_iter()
}
