//! Compilers for the five module declaration shapes.
//!
//! Each compiler edits the declaration's own text in place, hands generated
//! code to the accumulator of the enclosing statement list and records the
//! structural edit the rewriter will apply later.

use oxc_ast::ast::{
    BindingPattern, Declaration, ExportAllDeclaration, ExportDefaultDeclaration,
    ExportDefaultDeclarationKind, ExportNamedDeclaration, ImportDeclaration, Statement,
    TSModuleDeclarationName,
};
use oxc_span::{GetSpan, Span};

use crate::codegen;
use crate::scope::{ends_with_semicolon, BodySite};
use crate::specifier::{
    exports_member, export_specifier_map, import_specifier_map, module_export_name,
    SpecifierMap, DEFAULT, NAMESPACE,
};
use crate::transform::ModuleTransformer;

/// One module declaration, classified by shape.
#[derive(Debug, Clone, Copy)]
pub enum ModuleDecl<'n, 'a> {
    Import(&'n ImportDeclaration<'a>),
    ExportAll(&'n ExportAllDeclaration<'a>),
    ExportDefault(&'n ExportDefaultDeclaration<'a>),
    ExportDeclaration(&'n ExportNamedDeclaration<'a>, &'n Declaration<'a>),
    ExportSpecifiers(&'n ExportNamedDeclaration<'a>),
}

impl<'n, 'a> ModuleDecl<'n, 'a> {
    /// `export =` and `export as namespace` are not module declarations here.
    pub fn classify(stmt: &'n Statement<'a>) -> Option<Self> {
        match stmt {
            Statement::ImportDeclaration(decl) => Some(ModuleDecl::Import(decl)),
            Statement::ExportAllDeclaration(decl) => Some(ModuleDecl::ExportAll(decl)),
            Statement::ExportDefaultDeclaration(decl) => Some(ModuleDecl::ExportDefault(decl)),
            Statement::ExportNamedDeclaration(decl) => Some(match &decl.declaration {
                Some(declaration) => ModuleDecl::ExportDeclaration(decl, declaration),
                None => ModuleDecl::ExportSpecifiers(decl),
            }),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModuleDecl::Import(_) => "import",
            ModuleDecl::ExportAll(_) => "export-all",
            ModuleDecl::ExportDefault(_) => "export-default",
            ModuleDecl::ExportDeclaration(..) => "export-declaration",
            ModuleDecl::ExportSpecifiers(_) => "export-specifiers",
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ModuleDecl::Import(decl) => decl.span,
            ModuleDecl::ExportAll(decl) => decl.span,
            ModuleDecl::ExportDefault(decl) => decl.span,
            ModuleDecl::ExportDeclaration(decl, _) => decl.span,
            ModuleDecl::ExportSpecifiers(decl) => decl.span,
        }
    }
}

impl<'s> ModuleTransformer<'s> {
    pub(crate) fn compile(&mut self, decl: ModuleDecl<'_, '_>, site: BodySite) {
        let span = decl.span();
        tracing::debug!(
            kind = decl.kind(),
            start = span.start,
            end = span.end,
            container = ?site.container_key(),
            "compiling module declaration"
        );
        match decl {
            ModuleDecl::Import(decl) => self.compile_import(decl, site),
            ModuleDecl::ExportAll(decl) => self.compile_export_all(decl, site),
            ModuleDecl::ExportDefault(decl) => self.compile_export_default(decl, site),
            ModuleDecl::ExportDeclaration(decl, declaration) => {
                self.compile_export_declaration(decl, declaration, site)
            }
            ModuleDecl::ExportSpecifiers(decl) => self.compile_export_specifiers(decl, site),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // IMPORTS
    // ═══════════════════════════════════════════════════════════════════════════

    fn compile_import(&mut self, decl: &ImportDeclaration<'_>, site: BodySite) {
        self.remove_declaration(decl.span, site);
        if decl.import_kind.is_type() {
            tracing::debug!(start = decl.span.start, "dropping type-only import");
            return;
        }

        let map = match &decl.specifiers {
            None => SpecifierMap::new(),
            Some(specifiers) => import_specifier_map(specifiers).unwrap_or_else(|_| {
                tracing::debug!(start = decl.span.start, "unmappable import specifiers");
                SpecifierMap::new()
            }),
        };

        let key = self.take_key();
        let source = codegen::source_literal(self.editor.source(), &decl.source);
        let mut code = codegen::local_declarations(&map, &self.options);
        code.push_str(&codegen::module_import(&self.options, &source, &map, key));
        tracing::debug!(key, source = source.as_str(), "hoisting import");

        self.bodies
            .resolve(site, &mut self.editor)
            .imports_code
            .push_str(&code);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // RE-EXPORTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Re-exports are loads, but they hoist with the exports.
    fn compile_export_all(&mut self, decl: &ExportAllDeclaration<'_>, site: BodySite) {
        self.remove_declaration(decl.span, site);
        if decl.export_kind.is_type() {
            return;
        }

        let key = self.take_key();
        let source = codegen::source_literal(self.editor.source(), &decl.source);
        let code = match &decl.exported {
            None => codegen::export_all(&self.options, &source, key),
            Some(name) => {
                let target = exports_member(module_export_name(name));
                let mut map = SpecifierMap::new();
                map.add(NAMESPACE, &target);
                format!(
                    "{}={{}};{}",
                    target,
                    codegen::module_import(&self.options, &source, &map, key)
                )
            }
        };

        self.bodies
            .resolve(site, &mut self.editor)
            .exports_code
            .push_str(&code);
    }

    fn compile_export_specifiers(&mut self, decl: &ExportNamedDeclaration<'_>, site: BodySite) {
        self.remove_declaration(decl.span, site);
        if decl.export_kind.is_type() {
            return;
        }

        let Ok(map) = export_specifier_map(&decl.specifiers, decl.source.is_some()) else {
            tracing::debug!(start = decl.span.start, "unmappable export specifiers");
            return;
        };

        match &decl.source {
            Some(source) => {
                let key = self.take_key();
                let source = codegen::source_literal(self.editor.source(), source);
                let code = codegen::module_import(
                    &self.options,
                    &source,
                    &map.to_reexport_targets(),
                    key,
                );
                self.bodies
                    .resolve(site, &mut self.editor)
                    .exports_code
                    .push_str(&code);
            }
            None => {
                for (_, locals) in map.iter() {
                    for local in locals {
                        self.exported_local_names.insert(local.clone());
                    }
                }
                self.bodies
                    .resolve(site, &mut self.editor)
                    .exports
                    .merge(&map);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LOCAL EXPORTS
    // ═══════════════════════════════════════════════════════════════════════════

    fn compile_export_declaration(
        &mut self,
        decl: &ExportNamedDeclaration<'_>,
        declaration: &Declaration<'_>,
        site: BodySite,
    ) {
        if decl.export_kind.is_type() || is_type_only(declaration) {
            self.remove_declaration(decl.span, site);
            return;
        }

        let mut names = Vec::new();
        declared_names(declaration, &mut names);
        self.strip_export_wrapper(decl.span, declaration.span(), site);

        let mut map = SpecifierMap::new();
        for name in &names {
            map.add(name, name);
            self.exported_local_names.insert(name.clone());
        }
        self.bodies
            .resolve(site, &mut self.editor)
            .exports
            .merge(&map);
    }

    fn compile_export_default(&mut self, decl: &ExportDefaultDeclaration<'_>, site: BodySite) {
        let named = match &decl.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
                f.id.as_ref().map(|id| (f.span, id.name.as_str()))
            }
            ExportDefaultDeclarationKind::ClassDeclaration(c) => {
                c.id.as_ref().map(|id| (c.span, id.name.as_str()))
            }
            ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => {
                self.remove_declaration(decl.span, site);
                return;
            }
            _ => None,
        };

        if let Some((inner, name)) = named {
            // The declaration stays where it is so its name stays bound.
            self.strip_export_wrapper(decl.span, inner, site);
            self.exported_local_names.insert(name.to_string());
            self.bodies
                .resolve(site, &mut self.editor)
                .exports
                .add(DEFAULT, name);
            return;
        }

        let inner = decl.declaration.span();
        let prefix = codegen::export_default_prefix(&self.options);
        self.editor.overwrite(decl.span.start, inner.start, &prefix, false);
        // Text between the expression and the `;` (comments) is kept.
        let keeps_semicolon = inner.end < decl.span.end
            && ends_with_semicolon(self.editor.source(), decl.span.end);
        let suffix = if keeps_semicolon {
            codegen::EXPORT_DEFAULT_CLOSE
        } else {
            codegen::EXPORT_DEFAULT_SUFFIX
        };
        self.editor.insert(inner.end, suffix, true);
        self.ledger.rewrite_default(site.container_key(), decl.span);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // HELPERS
    // ═══════════════════════════════════════════════════════════════════════════

    pub(crate) fn take_key(&mut self) -> u32 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    /// Blank out the whole declaration and schedule its removal. A declaration
    /// in a single-statement slot gets its wrapping block first, so the slot
    /// never ends up empty.
    fn remove_declaration(&mut self, span: Span, site: BodySite) {
        if let BodySite::Slot(_) = site {
            self.bodies.resolve(site, &mut self.editor);
        }
        self.editor.overwrite(span.start, span.end, "", false);
        self.ledger.remove(site.container_key(), span);
    }

    /// Drop the `export`/`export default` text in front of an inner
    /// declaration. Anything after it is at most a `;` and stays.
    fn strip_export_wrapper(&mut self, outer: Span, inner: Span, site: BodySite) {
        if outer.start < inner.start {
            self.editor.overwrite(outer.start, inner.start, "", false);
        }
        self.ledger.unwrap_declaration(site.container_key(), outer);
    }
}

/// Declarations that vanish when types are erased.
fn is_type_only(declaration: &Declaration<'_>) -> bool {
    match declaration {
        Declaration::VariableDeclaration(v) => v.declare,
        Declaration::FunctionDeclaration(f) => f.declare,
        Declaration::ClassDeclaration(c) => c.declare,
        Declaration::TSEnumDeclaration(e) => e.declare,
        // `declare module "m"` and ambient namespaces have no value.
        Declaration::TSModuleDeclaration(m) => {
            m.declare || !matches!(m.id, TSModuleDeclarationName::Identifier(_))
        }
        Declaration::TSImportEqualsDeclaration(i) => i.import_kind.is_type(),
        _ => true,
    }
}

fn declared_names(declaration: &Declaration<'_>, names: &mut Vec<String>) {
    match declaration {
        Declaration::VariableDeclaration(v) => {
            for declarator in &v.declarations {
                pattern_names(&declarator.id, names);
            }
        }
        Declaration::FunctionDeclaration(f) => {
            if let Some(id) = &f.id {
                names.push(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(c) => {
            if let Some(id) = &c.id {
                names.push(id.name.to_string());
            }
        }
        Declaration::TSEnumDeclaration(e) => names.push(e.id.name.to_string()),
        Declaration::TSModuleDeclaration(m) => {
            if let TSModuleDeclarationName::Identifier(id) = &m.id {
                names.push(id.name.to_string());
            }
        }
        Declaration::TSImportEqualsDeclaration(i) => names.push(i.id.name.to_string()),
        _ => {}
    }
}

fn pattern_names(pattern: &BindingPattern<'_>, names: &mut Vec<String>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => names.push(id.name.to_string()),
        BindingPattern::ObjectPattern(obj) => {
            for prop in &obj.properties {
                pattern_names(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                pattern_names(&rest.argument, names);
            }
        }
        BindingPattern::ArrayPattern(arr) => {
            for elem in arr.elements.iter().flatten() {
                pattern_names(elem, names);
            }
            if let Some(rest) = &arr.rest {
                pattern_names(&rest.argument, names);
            }
        }
        BindingPattern::AssignmentPattern(assign) => pattern_names(&assign.left, names),
    }
}
