//! External-name → local-names maps built from declaration specifier lists.

use indexmap::IndexMap;
use oxc_ast::ast::{ExportSpecifier, ImportDeclarationSpecifier, ModuleExportName};

use crate::options::is_identifier_name;

pub const DEFAULT: &str = "default";
pub const NAMESPACE: &str = "*";

/// Ordered mapping from an external (module-visible) name to the local names
/// bound to it. Locals keep insertion order and are never duplicated; an
/// external name never maps to zero locals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecifierMap {
    entries: IndexMap<String, Vec<String>>,
}

/// A specifier whose external or local name cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unmappable;

impl SpecifierMap {
    pub fn new() -> Self {
        SpecifierMap::default()
    }

    pub fn add(&mut self, external: &str, local: &str) {
        let locals = self.entries.entry(external.to_string()).or_default();
        if !locals.iter().any(|l| l == local) {
            locals.push(local.to_string());
        }
    }

    pub fn merge(&mut self, other: &SpecifierMap) {
        for (external, locals) in other.iter() {
            for local in locals {
                self.add(external, local);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, external: &str) -> Option<&[String]> {
        self.entries.get(external).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(external, locals)| (external.as_str(), locals.as_slice()))
    }

    /// Distinct locals bound to named or default externals, in order.
    pub fn value_locals(&self) -> Vec<&str> {
        self.distinct_locals(|external| external != NAMESPACE)
    }

    /// Distinct locals bound to the namespace entry.
    pub fn namespace_locals(&self) -> Vec<&str> {
        self.distinct_locals(|external| external == NAMESPACE)
    }

    fn distinct_locals(&self, keep: impl Fn(&str) -> bool) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for (external, locals) in self.iter() {
            if !keep(external) {
                continue;
            }
            for local in locals {
                if !out.contains(&local.as_str()) {
                    out.push(local);
                }
            }
        }
        out
    }

    /// Turn an `exported → [imported]` map of a re-export into the
    /// `imported → [exports.<exported>]` shape the load call expects, so the
    /// value flows straight into this module's export object.
    pub fn to_reexport_targets(&self) -> SpecifierMap {
        let mut targets = SpecifierMap::new();
        for (exported, imported) in self.iter() {
            for name in imported {
                targets.add(name, &exports_member(exported));
            }
        }
        targets
    }
}

/// `exports.name`, or `exports["name"]` when the name is not an identifier.
pub fn exports_member(name: &str) -> String {
    if is_identifier_name(name) {
        format!("exports.{}", name)
    } else {
        format!("exports[{}]", json_quote(name))
    }
}

pub(crate) fn json_quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

pub fn module_export_name<'a>(name: &ModuleExportName<'a>) -> &'a str {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.as_str(),
        ModuleExportName::IdentifierReference(id) => id.name.as_str(),
        ModuleExportName::StringLiteral(s) => s.value.as_str(),
    }
}

/// Type-only specifiers (`import { type T }`) bind nothing at runtime and are
/// left out of the map.
pub fn import_specifier_map(
    specifiers: &[ImportDeclarationSpecifier],
) -> Result<SpecifierMap, Unmappable> {
    let mut map = SpecifierMap::new();
    for specifier in specifiers {
        let (external, local) = match specifier {
            ImportDeclarationSpecifier::ImportSpecifier(s) if s.import_kind.is_type() => continue,
            ImportDeclarationSpecifier::ImportSpecifier(s) => {
                (module_export_name(&s.imported), s.local.name.as_str())
            }
            ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => (DEFAULT, s.local.name.as_str()),
            ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                (NAMESPACE, s.local.name.as_str())
            }
        };
        if external.is_empty() || local.is_empty() {
            return Err(Unmappable);
        }
        map.add(external, local);
    }
    Ok(map)
}

/// Map `exported → [local]`. Without a `from` clause the local side must name
/// a binding of this module, so a string-literal local is unmappable.
pub fn export_specifier_map(
    specifiers: &[ExportSpecifier],
    has_source: bool,
) -> Result<SpecifierMap, Unmappable> {
    let mut map = SpecifierMap::new();
    for specifier in specifiers {
        if specifier.export_kind.is_type() {
            continue;
        }
        if !has_source && matches!(specifier.local, ModuleExportName::StringLiteral(_)) {
            return Err(Unmappable);
        }
        let local = module_export_name(&specifier.local);
        let exported = module_export_name(&specifier.exported);
        if local.is_empty() || exported.is_empty() {
            return Err(Unmappable);
        }
        map.add(exported, local);
    }
    Ok(map)
}
