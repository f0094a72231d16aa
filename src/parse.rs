//! Parsing entry points: whole modules and generated snippets.

use oxc_allocator::{Allocator, Vec as ArenaVec};
use oxc_ast::ast::{Program, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::error::TransformError;

/// Turns generated source text into statements living in the same arena as
/// the program being rewritten.
pub trait SnippetParser<'a> {
    fn allocator(&self) -> &'a Allocator;

    fn parse_statements(&self, code: &str) -> Result<ArenaVec<'a, Statement<'a>>, TransformError>;
}

pub struct OxcSnippetParser<'a> {
    allocator: &'a Allocator,
    source_type: SourceType,
}

impl<'a> OxcSnippetParser<'a> {
    pub fn new(allocator: &'a Allocator) -> Self {
        Self {
            allocator,
            source_type: SourceType::mjs(),
        }
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }
}

impl<'a> SnippetParser<'a> for OxcSnippetParser<'a> {
    fn allocator(&self) -> &'a Allocator {
        self.allocator
    }

    fn parse_statements(&self, code: &str) -> Result<ArenaVec<'a, Statement<'a>>, TransformError> {
        // The parsed nodes borrow their text, so it must outlive this call.
        let code: &'a str = self.allocator.alloc_str(code);
        let ret = Parser::new(self.allocator, code, self.source_type).parse();
        if ret.panicked || !ret.errors.is_empty() {
            return Err(TransformError::SnippetParse {
                snippet: code.to_string(),
                message: ret
                    .errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            });
        }
        tracing::trace!(statements = ret.program.body.len(), "parsed snippet");
        Ok(ret.program.body)
    }
}

/// Source type for a module file: the extension decides TypeScript/JSX, and
/// the file is always parsed as a module.
pub fn module_source_type(file: &str) -> SourceType {
    SourceType::from_path(file)
        .unwrap_or_else(|_| SourceType::mjs())
        .with_module(true)
}

pub fn parse_module<'a>(
    allocator: &'a Allocator,
    file: &str,
    source: &'a str,
) -> Result<Program<'a>, TransformError> {
    let ret = Parser::new(allocator, source, module_source_type(file)).parse();
    if ret.panicked || !ret.errors.is_empty() {
        let messages = ret.errors.iter().map(|e| e.to_string()).collect();
        return Err(TransformError::parse(file, messages));
    }
    Ok(ret.program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_statements() {
        let allocator = Allocator::default();
        let parser = OxcSnippetParser::new(&allocator);
        let body = parser
            .parse_statements("var a;module.importSync(\"m\",{a:(v)=>{a=v}},0);")
            .unwrap();
        assert_eq!(body.len(), 2);
        assert!(matches!(body[0], Statement::VariableDeclaration(_)));
    }

    #[test]
    fn test_broken_snippet_is_an_error() {
        let allocator = Allocator::default();
        let parser = OxcSnippetParser::new(&allocator);
        assert!(matches!(
            parser.parse_statements("module.export({a:()=>});"),
            Err(TransformError::SnippetParse { .. })
        ));
    }

    #[test]
    fn test_parse_module_reports_file() {
        let allocator = Allocator::default();
        let err = parse_module(&allocator, "broken.mjs", "import { from 'x';").unwrap_err();
        match err {
            TransformError::Parse { file, messages } => {
                assert_eq!(file, "broken.mjs");
                assert!(!messages.is_empty());
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_typescript_extension() {
        assert!(module_source_type("a.ts").is_typescript());
        assert!(module_source_type("a.js").is_module());
        assert!(module_source_type("noext").is_module());
    }
}
