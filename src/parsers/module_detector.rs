//! Dependency reference collection using the oxc AST visitor

use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};
use std::collections::HashSet;

/// Visitor that records every statically known module reference
///
/// Recognized forms: `require('x')` with a string or plain template
/// argument, `import ... from 'x'`, `export ... from 'x'` and `import('x')`.
/// Type-only imports and exports are skipped.
#[derive(Default)]
pub struct ModuleDetector {
    references: Vec<String>,
    seen: HashSet<String>,
}

impl ModuleDetector {
    /// Collect references from a parsed program, in source order, without duplicates
    pub fn collect(program: &Program<'_>) -> Vec<String> {
        let mut detector = Self::default();
        detector.visit_program(program);
        detector.references
    }

    fn push(&mut self, reference: &str) {
        if reference.is_empty() {
            return;
        }
        if self.seen.insert(reference.to_string()) {
            self.references.push(reference.to_string());
        }
    }
}

/// The string value of an argument when it is known without evaluation
fn static_string<'s>(arg: &'s Argument<'_>) -> Option<&'s str> {
    match arg {
        Argument::StringLiteral(lit) => Some(lit.value.as_str()),
        Argument::TemplateLiteral(tpl) if tpl.expressions.is_empty() => tpl
            .quasis
            .first()
            .and_then(|quasi| quasi.value.cooked.as_ref())
            .map(|cooked| cooked.as_str()),
        _ => None,
    }
}

impl<'a> Visit<'a> for ModuleDetector {
    fn visit_call_expression(&mut self, expr: &CallExpression<'a>) {
        if let Expression::Identifier(ident) = &expr.callee {
            if ident.name == "require" && expr.arguments.len() == 1 {
                if let Some(reference) = expr.arguments.first().and_then(static_string) {
                    self.push(reference);
                }
            }
        }

        walk::walk_call_expression(self, expr);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        if let Expression::StringLiteral(lit) = &expr.source {
            self.push(lit.value.as_str());
        }

        walk::walk_import_expression(self, expr);
    }

    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        if !decl.import_kind.is_type() {
            self.push(decl.source.value.as_str());
        }
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &decl.source {
            if !decl.export_kind.is_type() {
                self.push(source.value.as_str());
            }
        }

        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        if !decl.export_kind.is_type() {
            self.push(decl.source.value.as_str());
        }
    }
}
