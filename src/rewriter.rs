//! Structural rewrite of the AST after the declaration walk.
//!
//! For every statement list, in this order: recurse into each statement and
//! apply its scheduled edit, drop the removed statements, then splice in the
//! re-parsed hoisted code. Removing before splicing keeps the lookup by span
//! limited to original statements.

use std::collections::{HashMap, HashSet};

use oxc_allocator::Vec as ArenaVec;
use oxc_ast::ast::{
    Argument, BlockStatement, ClassType, ExportDefaultDeclarationKind, Expression, FunctionBody,
    FunctionType, Program, Statement, StaticBlock, SwitchCase, TSModuleDeclaration,
};
use oxc_ast::AstBuilder;
use oxc_ast_visit::{walk_mut, VisitMut};
use oxc_span::{GetSpan, Span, SPAN};

use crate::ledger::{RemovalLedger, StatementEdit};
use crate::scope::BodyKey;

pub struct AstRewriter<'r, 'a> {
    ast: AstBuilder<'a>,
    ledger: &'r RemovalLedger,
    wrapped: HashSet<Span>,
    hoisted: HashMap<BodyKey, (usize, ArenaVec<'a, Statement<'a>>)>,
    /// Re-parsed registration calls for default-exported expressions, each
    /// still holding the placeholder expression.
    defaults: HashMap<Span, Statement<'a>>,
    keys: Vec<BodyKey>,
    in_list: bool,
}

impl<'r, 'a> AstRewriter<'r, 'a> {
    pub fn new(ast: AstBuilder<'a>, ledger: &'r RemovalLedger, wrapped: &[Span]) -> Self {
        AstRewriter {
            ast,
            ledger,
            wrapped: wrapped.iter().copied().collect(),
            hoisted: HashMap::new(),
            defaults: HashMap::new(),
            keys: Vec::new(),
            in_list: false,
        }
    }

    pub fn hoist(
        &mut self,
        key: BodyKey,
        insert_index: usize,
        statements: ArenaVec<'a, Statement<'a>>,
    ) {
        self.hoisted.insert(key, (insert_index, statements));
    }

    pub fn default_export(&mut self, span: Span, registration: Statement<'a>) {
        self.defaults.insert(span, registration);
    }

    fn with_key(&mut self, key: BodyKey, walk: impl FnOnce(&mut Self)) {
        self.keys.push(key);
        walk(self);
        self.keys.pop();
    }

    fn rewrite_list(&mut self, key: BodyKey, list: &mut ArenaVec<'a, Statement<'a>>) {
        for stmt in list.iter_mut() {
            self.in_list = true;
            self.visit_statement(stmt);
        }

        let ledger = self.ledger;
        let before = list.len();
        list.retain(|stmt| !ledger.is_removed_from(key, stmt.span()));
        let removed = before - list.len();

        if let Some((index, statements)) = self.hoisted.remove(&key) {
            tracing::trace!(
                container = ?key,
                index,
                count = statements.len(),
                removed,
                "splicing hoisted statements"
            );
            let at = index.min(list.len());
            for (offset, stmt) in statements.into_iter().enumerate() {
                list.insert(at + offset, stmt);
            }
        }
    }

    fn take(&self, stmt: &mut Statement<'a>) -> Statement<'a> {
        std::mem::replace(stmt, self.ast.statement_empty(SPAN))
    }

    fn apply_edit(&mut self, stmt: &mut Statement<'a>) {
        let span = stmt.span();
        let Some(edit) = self.ledger.get(span).map(|entry| entry.edit) else {
            return;
        };
        match edit {
            // Lists drop removed statements themselves.
            StatementEdit::Remove => {}
            StatementEdit::Unwrap => {
                *stmt = match self.take(stmt) {
                    Statement::ExportNamedDeclaration(decl) => match decl.unbox().declaration {
                        Some(declaration) => Statement::from(declaration),
                        None => panic!("export at [{}, {}) has no declaration", span.start, span.end),
                    },
                    Statement::ExportDefaultDeclaration(decl) => match decl.unbox().declaration {
                        ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
                            Statement::FunctionDeclaration(f)
                        }
                        ExportDefaultDeclarationKind::ClassDeclaration(c) => {
                            Statement::ClassDeclaration(c)
                        }
                        _ => panic!(
                            "default export at [{}, {}) is not a declaration",
                            span.start, span.end
                        ),
                    },
                    _ => panic!("cannot unwrap statement at [{}, {})", span.start, span.end),
                };
            }
            StatementEdit::ExportDefaultExpression => {
                let Statement::ExportDefaultDeclaration(decl) = self.take(stmt) else {
                    panic!("expected a default export at [{}, {})", span.start, span.end);
                };
                let expression = match decl.unbox().declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(mut f) => {
                        f.r#type = FunctionType::FunctionExpression;
                        Expression::FunctionExpression(f)
                    }
                    ExportDefaultDeclarationKind::ClassDeclaration(mut c) => {
                        c.r#type = ClassType::ClassExpression;
                        Expression::ClassExpression(c)
                    }
                    kind => kind.into_expression(),
                };
                let registration = self.defaults.remove(&span).unwrap_or_else(|| {
                    panic!(
                        "no registration parsed for default export at [{}, {})",
                        span.start, span.end
                    )
                });
                *stmt = fill_default_registration(registration, expression, span);
            }
        }
    }
}

/// Swap the placeholder in `<register>("default",exports.default=(0));` for the
/// exported expression. Any other shape means the generated code is broken.
fn fill_default_registration<'a>(
    mut registration: Statement<'a>,
    expression: Expression<'a>,
    span: Span,
) -> Statement<'a> {
    let Statement::ExpressionStatement(es) = &mut registration else {
        panic!("default registration is not an expression statement");
    };
    es.span = span;
    let Expression::CallExpression(call) = &mut es.expression else {
        panic!("default registration is not a call");
    };
    let Some(Argument::AssignmentExpression(assign)) = call.arguments.get_mut(1) else {
        panic!("default registration has no assignment argument");
    };
    match &mut assign.right {
        Expression::ParenthesizedExpression(paren) => paren.expression = expression,
        right => *right = expression,
    }
    registration
}

impl<'a> VisitMut<'a> for AstRewriter<'_, 'a> {
    fn visit_program(&mut self, program: &mut Program<'a>) {
        self.with_key(BodyKey::Program, |r| walk_mut::walk_program(r, program));
    }

    fn visit_block_statement(&mut self, block: &mut BlockStatement<'a>) {
        let key = BodyKey::Block(block.span);
        self.with_key(key, |r| walk_mut::walk_block_statement(r, block));
    }

    fn visit_function_body(&mut self, body: &mut FunctionBody<'a>) {
        let key = BodyKey::FunctionBody(body.span);
        self.with_key(key, |r| walk_mut::walk_function_body(r, body));
    }

    fn visit_static_block(&mut self, block: &mut StaticBlock<'a>) {
        let key = BodyKey::StaticBlock(block.span);
        self.with_key(key, |r| walk_mut::walk_static_block(r, block));
    }

    fn visit_switch_case(&mut self, case: &mut SwitchCase<'a>) {
        let key = BodyKey::SwitchCase(case.span);
        self.with_key(key, |r| walk_mut::walk_switch_case(r, case));
    }

    fn visit_ts_module_declaration(&mut self, _decl: &mut TSModuleDeclaration<'a>) {}

    fn visit_statements(&mut self, stmts: &mut ArenaVec<'a, Statement<'a>>) {
        let Some(&key) = self.keys.last() else {
            panic!("statement list visited outside of a container");
        };
        self.rewrite_list(key, stmts);
    }

    fn visit_statement(&mut self, stmt: &mut Statement<'a>) {
        let in_list = std::mem::replace(&mut self.in_list, false);
        let span = stmt.span();

        if !in_list && self.wrapped.contains(&span) {
            tracing::trace!(start = span.start, end = span.end, "wrapping slot in a block");
            let original = self.take(stmt);
            let mut body = self.ast.vec1(original);
            self.rewrite_list(BodyKey::Wrapped(span), &mut body);
            *stmt = self.ast.statement_block(SPAN, body);
            return;
        }

        walk_mut::walk_statement(self, stmt);
        self.apply_edit(stmt);
    }
}
