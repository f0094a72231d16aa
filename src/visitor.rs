//! The declaration walk.
//!
//! A read-only traversal that keeps a stack of statement-list frames, so every
//! module declaration knows which list it belongs to, or that it sits alone in
//! a single-statement slot. Each declaration is compiled exactly once. The
//! walk still descends into exported declarations and default-exported
//! expressions, because function bodies and blocks inside them host their
//! own hoisted code.

use oxc_allocator::Vec as ArenaVec;
use oxc_ast::ast::{
    BlockStatement, FunctionBody, Program, Statement, StaticBlock, SwitchCase,
    TSModuleDeclaration,
};
use oxc_ast_visit::{walk, Visit};
use oxc_span::GetSpan;

use crate::declarations::ModuleDecl;
use crate::scope::{BodyFrame, BodySite};
use crate::transform::ModuleTransformer;

pub struct DeclarationVisitor<'t, 's> {
    pass: &'t mut ModuleTransformer<'s>,
    frames: Vec<BodyFrame>,
    /// Set while the next statement is an item of the innermost list.
    in_list: bool,
    compiled: usize,
}

impl<'t, 's> DeclarationVisitor<'t, 's> {
    pub fn new(pass: &'t mut ModuleTransformer<'s>) -> Self {
        DeclarationVisitor {
            pass,
            frames: Vec::new(),
            in_list: false,
            compiled: 0,
        }
    }

    /// Number of module declarations compiled so far.
    pub fn compiled(&self) -> usize {
        self.compiled
    }

    fn source(&self) -> Option<&'s str> {
        self.pass.editor.source()
    }

    fn with_frame(&mut self, frame: BodyFrame, walk: impl FnOnce(&mut Self)) {
        self.frames.push(frame);
        walk(self);
        self.frames.pop();
    }
}

impl<'a> Visit<'a> for DeclarationVisitor<'_, '_> {
    fn visit_program(&mut self, program: &Program<'a>) {
        let frame = BodyFrame::program(program, self.source());
        self.with_frame(frame, |v| walk::walk_program(v, program));
    }

    fn visit_block_statement(&mut self, block: &BlockStatement<'a>) {
        let frame = BodyFrame::block(block, self.source());
        self.with_frame(frame, |v| walk::walk_block_statement(v, block));
    }

    fn visit_function_body(&mut self, body: &FunctionBody<'a>) {
        let frame = BodyFrame::function_body(body, self.source());
        self.with_frame(frame, |v| walk::walk_function_body(v, body));
    }

    fn visit_static_block(&mut self, block: &StaticBlock<'a>) {
        let frame = BodyFrame::static_block(block, self.source());
        self.with_frame(frame, |v| walk::walk_static_block(v, block));
    }

    fn visit_switch_case(&mut self, case: &SwitchCase<'a>) {
        let frame = BodyFrame::switch_case(case, self.source());
        self.with_frame(frame, |v| walk::walk_switch_case(v, case));
    }

    // Namespace bodies follow TypeScript's own export rules.
    fn visit_ts_module_declaration(&mut self, _decl: &TSModuleDeclaration<'a>) {}

    fn visit_statements(&mut self, stmts: &ArenaVec<'a, Statement<'a>>) {
        for stmt in stmts {
            self.in_list = true;
            self.visit_statement(stmt);
        }
    }

    fn visit_statement(&mut self, stmt: &Statement<'a>) {
        let in_list = std::mem::replace(&mut self.in_list, false);

        if let Some(decl) = ModuleDecl::classify(stmt) {
            let site = match self.frames.last() {
                Some(frame) if in_list => BodySite::List(*frame),
                _ => BodySite::Slot(stmt.span()),
            };
            self.pass.compile(decl, site);
            self.compiled += 1;
        }

        walk::walk_statement(self, stmt);
    }
}
