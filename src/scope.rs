//! Body-scope resolution and per-scope hoisting accumulators.
//!
//! Accumulators live in a side table keyed by [`BodyKey`], never on the AST.
//! A key is the container kind plus its span, which is stable for the whole
//! pass because containers themselves are never rewritten.

use std::collections::HashMap;

use oxc_ast::ast::{
    BlockStatement, Directive, Expression, FunctionBody, Program, Statement, StaticBlock,
    SwitchCase,
};
use oxc_span::{GetSpan, Span};

use crate::codegen;
use crate::options::TransformOptions;
use crate::specifier::SpecifierMap;
use crate::text::TextEditor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKey {
    Program,
    Block(Span),
    FunctionBody(Span),
    StaticBlock(Span),
    SwitchCase(Span),
    /// A single-statement slot that gets a synthesized `{ }` around it.
    Wrapped(Span),
}

/// Where generated code goes inside one statement list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyFrame {
    pub key: BodyKey,
    pub insert_offset: u32,
    pub insert_index: usize,
    /// The prologue ends without a `;`, so inserted text needs one first.
    pub needs_separator: bool,
}

impl BodyFrame {
    /// Hoisted code goes after a hashbang line, never on it.
    pub fn program(program: &Program, source: Option<&str>) -> Self {
        let start = match (&program.hashbang, source) {
            (Some(hashbang), Some(text)) => {
                let rest = text.get(hashbang.span.end as usize..).unwrap_or("");
                let line_break = if rest.starts_with("\r\n") {
                    2
                } else if rest.starts_with(['\r', '\n']) {
                    1
                } else {
                    0
                };
                hashbang.span.end + line_break
            }
            (Some(hashbang), None) => hashbang.span.end,
            (None, _) => program.span.start,
        };
        Self::after_prologue(
            BodyKey::Program,
            start,
            &program.directives,
            &program.body,
            source,
        )
    }

    pub fn block(block: &BlockStatement, source: Option<&str>) -> Self {
        let start = offset_after_brace(block.span, &block.body, source);
        Self::after_prologue(BodyKey::Block(block.span), start, &[], &block.body, source)
    }

    pub fn function_body(body: &FunctionBody, source: Option<&str>) -> Self {
        let start = offset_after_brace(body.span, &body.statements, source);
        Self::after_prologue(
            BodyKey::FunctionBody(body.span),
            start,
            &body.directives,
            &body.statements,
            source,
        )
    }

    pub fn static_block(block: &StaticBlock, source: Option<&str>) -> Self {
        let start = offset_after_brace(block.span, &block.body, source);
        Self::after_prologue(
            BodyKey::StaticBlock(block.span),
            start,
            &[],
            &block.body,
            source,
        )
    }

    pub fn switch_case(case: &SwitchCase, source: Option<&str>) -> Self {
        let start = case
            .consequent
            .first()
            .map_or(case.span.end, |stmt| stmt.span().start);
        Self::after_prologue(
            BodyKey::SwitchCase(case.span),
            start,
            &[],
            &case.consequent,
            source,
        )
    }

    pub fn wrapped(span: Span) -> Self {
        BodyFrame {
            key: BodyKey::Wrapped(span),
            insert_offset: span.start,
            insert_index: 0,
            needs_separator: false,
        }
    }

    /// Skip directives and leading string-literal statements; generated code
    /// must not displace a `"use strict"` prologue.
    fn after_prologue(
        key: BodyKey,
        start: u32,
        directives: &[Directive],
        body: &[Statement],
        source: Option<&str>,
    ) -> Self {
        let mut insert_offset = start;
        let mut prologue_end = None;
        if let Some(last) = directives.last() {
            insert_offset = insert_offset.max(last.span.end);
            prologue_end = Some(last.span.end);
        }
        let mut insert_index = 0;
        for stmt in body {
            match stmt {
                Statement::ExpressionStatement(es)
                    if matches!(es.expression, Expression::StringLiteral(_)) =>
                {
                    insert_offset = es.span.end;
                    insert_index += 1;
                    prologue_end = Some(es.span.end);
                }
                _ => break,
            }
        }
        let needs_separator = source.is_some()
            && prologue_end.is_some_and(|end| !ends_with_semicolon(source, end));
        BodyFrame {
            key,
            insert_offset,
            insert_index,
            needs_separator,
        }
    }
}

/// Whether the text ending at `end` ends with a `;`.
pub(crate) fn ends_with_semicolon(source: Option<&str>, end: u32) -> bool {
    end > 0
        && source
            .and_then(|text| text.as_bytes().get(end as usize - 1))
            .is_some_and(|&byte| byte == b';')
}

/// First offset after the opening brace, or the first statement's offset when
/// no source text is tracked.
fn offset_after_brace(span: Span, body: &[Statement], source: Option<&str>) -> u32 {
    if let Some(text) = source {
        if let Some(rel) = text
            .get(span.start as usize..span.end as usize)
            .and_then(|inner| inner.find('{'))
        {
            return span.start + rel as u32 + 1;
        }
    }
    body.first().map_or(span.start, |stmt| stmt.span().start)
}

/// How a declaration reaches its statement list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySite {
    /// The declaration is an item of an existing statement list.
    List(BodyFrame),
    /// The declaration occupies a single-statement slot.
    Slot(Span),
}

impl BodySite {
    pub fn container_key(&self) -> BodyKey {
        match self {
            BodySite::List(frame) => frame.key,
            BodySite::Slot(span) => BodyKey::Wrapped(*span),
        }
    }
}

/// Hoisting accumulator for one statement list.
#[derive(Debug, Clone)]
pub struct BodyInfo {
    pub key: BodyKey,
    pub insert_offset: u32,
    pub insert_index: usize,
    pub needs_separator: bool,
    pub exports: SpecifierMap,
    pub exports_code: String,
    pub imports_code: String,
}

impl BodyInfo {
    fn new(frame: BodyFrame) -> Self {
        BodyInfo {
            key: frame.key,
            insert_offset: frame.insert_offset,
            insert_index: frame.insert_index,
            needs_separator: frame.needs_separator,
            exports: SpecifierMap::new(),
            exports_code: String::new(),
            imports_code: String::new(),
        }
    }

    /// Export registration, then raw export code, then import code.
    pub fn hoisted_code(&self, options: &TransformOptions) -> String {
        let mut code = codegen::module_export(options, &self.exports);
        code.push_str(&self.exports_code);
        code.push_str(&self.imports_code);
        code
    }
}

#[derive(Debug, Default)]
pub struct BodyRegistry {
    infos: Vec<BodyInfo>,
    by_key: HashMap<BodyKey, usize>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        BodyRegistry::default()
    }

    /// Accumulator for the declaration's statement list, created on first use.
    /// A slot is wrapped in a synthesized block the first time it is resolved.
    pub fn resolve(&mut self, site: BodySite, editor: &mut TextEditor) -> &mut BodyInfo {
        let frame = match site {
            BodySite::List(frame) => frame,
            BodySite::Slot(span) => {
                let frame = BodyFrame::wrapped(span);
                if !self.by_key.contains_key(&frame.key) {
                    tracing::debug!(start = span.start, end = span.end, "wrapping statement in a block");
                    editor.insert(span.start, "{", false);
                    editor.insert(span.end, "}", true);
                }
                frame
            }
        };

        if let Some(&index) = self.by_key.get(&frame.key) {
            let info = &mut self.infos[index];
            assert!(
                info.key == frame.key && info.insert_offset == frame.insert_offset,
                "body accumulator {:?} does not belong to {:?}",
                info.key,
                frame.key
            );
            return info;
        }

        let index = self.infos.len();
        self.by_key.insert(frame.key, index);
        self.infos.push(BodyInfo::new(frame));
        &mut self.infos[index]
    }

    /// Accumulators in registration order.
    pub fn infos(&self) -> &[BodyInfo] {
        &self.infos
    }

    pub fn clear(&mut self) {
        self.infos.clear();
        self.by_key.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    #[test]
    fn test_program_frame_skips_directives() {
        let source = "\"use strict\";\nimport a from \"a\";";
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
        let frame = BodyFrame::program(&ret.program, Some(source));
        assert_eq!(frame.key, BodyKey::Program);
        assert_eq!(frame.insert_offset, source.find('\n').unwrap() as u32);
        assert_eq!(frame.insert_index, 0);
        assert!(!frame.needs_separator);
    }

    #[test]
    fn test_unterminated_directive_needs_separator() {
        let source = "\"use strict\"\nimport a from \"a\";";
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
        let frame = BodyFrame::program(&ret.program, Some(source));
        assert_eq!(frame.insert_offset, source.find('\n').unwrap() as u32);
        assert!(frame.needs_separator);
        assert!(!BodyFrame::program(&ret.program, None).needs_separator);
    }

    #[test]
    fn test_program_frame_starts_below_hashbang() {
        let source = "#!/usr/bin/env node\nimport a from \"a\";";
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
        let frame = BodyFrame::program(&ret.program, Some(source));
        assert_eq!(frame.insert_offset, source.find('\n').unwrap() as u32 + 1);
    }

    #[test]
    fn test_block_frame_skips_string_statements() {
        let source = "{ \"hint\"; import a from \"a\"; }";
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
        let Statement::BlockStatement(block) = &ret.program.body[0] else {
            panic!("Expected block");
        };
        let frame = BodyFrame::block(block, Some(source));
        assert_eq!(frame.insert_offset, source.find(';').unwrap() as u32 + 1);
        assert_eq!(frame.insert_index, 1);

        let textless = BodyFrame::block(block, None);
        assert_eq!(textless.insert_index, 1);
    }

    #[test]
    fn test_block_frame_without_prologue_starts_after_brace() {
        let source = "{ let x; }";
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
        let Statement::BlockStatement(block) = &ret.program.body[0] else {
            panic!("Expected block");
        };
        assert_eq!(BodyFrame::block(block, Some(source)).insert_offset, 1);
        assert_eq!(BodyFrame::block(block, None).insert_offset, 2);
    }

    #[test]
    fn test_resolve_reuses_accumulator() {
        let mut registry = BodyRegistry::new();
        let mut editor = TextEditor::new(None);
        let frame = BodyFrame {
            key: BodyKey::Program,
            insert_offset: 0,
            insert_index: 0,
            needs_separator: false,
        };
        registry
            .resolve(BodySite::List(frame), &mut editor)
            .imports_code
            .push_str("a;");
        registry
            .resolve(BodySite::List(frame), &mut editor)
            .imports_code
            .push_str("b;");
        assert_eq!(registry.infos().len(), 1);
        assert_eq!(registry.infos()[0].imports_code, "a;b;");
    }

    #[test]
    fn test_slot_is_wrapped_once() {
        let source = "if (x) y;";
        let mut registry = BodyRegistry::new();
        let mut editor = TextEditor::new(Some(source));
        let span = Span::new(7, 9);
        registry.resolve(BodySite::Slot(span), &mut editor);
        registry.resolve(BodySite::Slot(span), &mut editor);
        assert_eq!(registry.infos().len(), 1);
        assert_eq!(registry.infos()[0].key, BodyKey::Wrapped(span));
        assert_eq!(editor.render().unwrap(), "if (x) {y;}");
    }
}
