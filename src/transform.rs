//! The module transform pass and its entry points.

use indexmap::IndexSet;
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_ast::AstBuilder;
use oxc_ast_visit::{Visit, VisitMut};
use oxc_codegen::Codegen;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::codegen;
use crate::error::TransformError;
use crate::finalize::HoistPlan;
use crate::ledger::RemovalLedger;
use crate::options::TransformOptions;
use crate::parse::{module_source_type, parse_module, OxcSnippetParser, SnippetParser};
use crate::rewriter::AstRewriter;
use crate::scope::BodyRegistry;
use crate::text::{SpanEdit, TextEditor};
use crate::visitor::DeclarationVisitor;

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    /// Edited source, absent when no source text was tracked.
    pub code: Option<String>,
    pub edits: Vec<SpanEdit>,
    /// Printed AST, only in `ast` mode of [`transform_module`].
    pub ast_code: Option<String>,
    /// Locals exported by this module, for the live-binding rewrite.
    pub exported_local_names: Vec<String>,
    pub keys_assigned: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSource {
    pub file: String,
    pub source: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS
// ═══════════════════════════════════════════════════════════════════════════════

/// One compilation unit's worth of transform state. Reset it before reusing
/// it for another module.
pub struct ModuleTransformer<'s> {
    pub(crate) options: TransformOptions,
    pub(crate) editor: TextEditor<'s>,
    pub(crate) bodies: BodyRegistry,
    pub(crate) ledger: RemovalLedger,
    pub(crate) exported_local_names: IndexSet<String>,
    pub(crate) next_key: u32,
}

impl<'s> ModuleTransformer<'s> {
    /// A pass with no tracked source; call [`reset`](Self::reset) to enable
    /// text output.
    pub fn new(options: TransformOptions) -> Self {
        ModuleTransformer {
            options,
            editor: TextEditor::new(None),
            bodies: BodyRegistry::new(),
            ledger: RemovalLedger::new(),
            exported_local_names: IndexSet::new(),
            next_key: 0,
        }
    }

    pub fn reset(&mut self, source: Option<&'s str>) {
        self.editor = TextEditor::new(source);
        self.bodies.clear();
        self.ledger.clear();
        self.exported_local_names.clear();
        self.next_key = 0;
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    pub fn exported_local_names(&self) -> &IndexSet<String> {
        &self.exported_local_names
    }

    /// The key the next load call would receive; equals the number assigned.
    pub fn next_key(&self) -> u32 {
        self.next_key
    }

    /// Lower every module declaration of `program`. With the `ast` option the
    /// program itself is rewritten too, using `parser` for generated code.
    pub fn transform<'a>(
        &mut self,
        program: &mut Program<'a>,
        parser: Option<&dyn SnippetParser<'a>>,
    ) -> Result<TransformOutput, TransformError> {
        self.options.validate()?;
        let parser = match (self.options.ast, parser) {
            (true, None) => return Err(TransformError::MissingParser),
            (true, parser) => parser,
            (false, _) => None,
        };

        let mut visitor = DeclarationVisitor::new(self);
        visitor.visit_program(program);
        let compiled = visitor.compiled();

        let plan = self.finalize();
        let rewritten = match parser {
            Some(parser) => self.rewrite_ast(program, parser, &plan),
            None => Ok(()),
        };
        self.ledger.clear();
        rewritten?;

        tracing::debug!(
            declarations = compiled,
            keys = self.next_key,
            exported = self.exported_local_names.len(),
            "transformed module"
        );
        Ok(self.output())
    }

    fn rewrite_ast<'a>(
        &self,
        program: &mut Program<'a>,
        parser: &dyn SnippetParser<'a>,
        plan: &HoistPlan,
    ) -> Result<(), TransformError> {
        let mut rewriter =
            AstRewriter::new(AstBuilder::new(parser.allocator()), &self.ledger, &plan.wrapped);

        for body in &plan.bodies {
            rewriter.hoist(body.key, body.insert_index, parser.parse_statements(&body.code)?);
        }

        let registration = format!(
            "{}{}{}",
            codegen::export_default_prefix(&self.options),
            codegen::EXPORT_DEFAULT_PLACEHOLDER,
            codegen::EXPORT_DEFAULT_SUFFIX
        );
        for span in self.ledger.default_expressions() {
            let mut statements = parser.parse_statements(&registration)?;
            assert_eq!(
                statements.len(),
                1,
                "default registration parsed into {} statements",
                statements.len()
            );
            let Some(stmt) = statements.pop() else {
                unreachable!("length checked above");
            };
            rewriter.default_export(span, stmt);
        }

        rewriter.visit_program(program);
        Ok(())
    }

    fn output(&self) -> TransformOutput {
        TransformOutput {
            code: self.editor.render(),
            edits: self.editor.edits(),
            ast_code: None,
            exported_local_names: self.exported_local_names.iter().cloned().collect(),
            keys_assigned: self.next_key,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse `source` as a module, lower it and render the result. In `ast` mode
/// the rewritten program is printed into `ast_code` as well.
pub fn transform_module(
    source: &str,
    options: &TransformOptions,
) -> Result<TransformOutput, TransformError> {
    transform_file("module.mjs", source, options)
}

/// Transform independent modules in parallel. Results keep input order.
pub fn transform_modules(
    modules: &[ModuleSource],
    options: &TransformOptions,
) -> Vec<Result<TransformOutput, TransformError>> {
    modules
        .par_iter()
        .map(|module| transform_file(&module.file, &module.source, options))
        .collect()
}

fn transform_file(
    file: &str,
    source: &str,
    options: &TransformOptions,
) -> Result<TransformOutput, TransformError> {
    options.validate()?;
    let allocator = Allocator::default();
    let mut program = parse_module(&allocator, file, source)?;

    let mut pass = ModuleTransformer::new(options.clone());
    pass.reset(Some(source));

    if !options.ast {
        return pass.transform(&mut program, None);
    }

    let parser = OxcSnippetParser::new(&allocator).with_source_type(module_source_type(file));
    let parser: &dyn SnippetParser = &parser;
    let mut output = pass.transform(&mut program, Some(parser))?;
    output.ast_code = Some(Codegen::new().build(&program).code);
    Ok(output)
}
