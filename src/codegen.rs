//! Code synthesis for lowered module declarations.
//!
//! Generated code never contains newlines, so hoisting it onto the first line
//! of a scope leaves every original line where it was.
//!
//! Runtime call shapes:
//! - `<alias>.importSync(<source>,{<name>:(v)=>{<local>=v},...},<key>);`
//! - `<alias>.export({<name>:()=><local>,...});`
//!
//! A namespace (`*`) setter may be called once per delivered property and
//! receives the property name as a second parameter.

use oxc_ast::ast::StringLiteral;

use crate::options::{is_identifier_name, TransformOptions};
use crate::specifier::{json_quote, SpecifierMap, NAMESPACE};

// ═══════════════════════════════════════════════════════════════════════════════
// NAMES AND LITERALS
// ═══════════════════════════════════════════════════════════════════════════════

/// Prefix `param` with underscores until it collides with none of `locals`.
pub fn safe_param(param: &str, locals: &[&str]) -> String {
    let mut candidate = param.to_string();
    while locals.contains(&candidate.as_str()) {
        candidate.insert(0, '_');
    }
    candidate
}

/// Object-literal key for an external name.
pub fn property_key(name: &str) -> String {
    if is_identifier_name(name) {
        name.to_string()
    } else {
        json_quote(name)
    }
}

/// The source specifier as written in the original text when available,
/// otherwise re-quoted from the parsed value.
pub fn source_literal(source: Option<&str>, literal: &StringLiteral) -> String {
    if let Some(text) = source {
        let (start, end) = (literal.span.start as usize, literal.span.end as usize);
        if end <= text.len() && start < end {
            return text[start..end].to_string();
        }
    }
    json_quote(literal.value.as_str())
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// One declaration statement per binding group: value bindings start out
/// undefined, namespace bindings start as empty objects the setter fills in.
pub fn local_declarations(map: &SpecifierMap, options: &TransformOptions) -> String {
    let mut code = String::new();

    let values = map.value_locals();
    if !values.is_empty() {
        let keyword = if options.generate_let_declarations {
            "let"
        } else {
            "var"
        };
        code.push_str(&format!("{} {};", keyword, values.join(",")));
    }

    let namespaces = map.namespace_locals();
    if !namespaces.is_empty() {
        let keyword = if options.generate_let_declarations {
            "const"
        } else {
            "var"
        };
        let inits: Vec<String> = namespaces.iter().map(|ns| format!("{}={{}}", ns)).collect();
        code.push_str(&format!("{} {};", keyword, inits.join(",")));
    }

    code
}

/// Load call with one setter per imported name. Several locals bound to one
/// name become a compound assignment.
pub fn module_import(
    options: &TransformOptions,
    source_literal: &str,
    map: &SpecifierMap,
    key: u32,
) -> String {
    let mut setters = Vec::with_capacity(map.len());
    for (imported, locals) in map.iter() {
        let local_refs: Vec<&str> = locals.iter().map(String::as_str).collect();
        let value = safe_param("v", &local_refs);

        let setter = if imported == NAMESPACE {
            let mut taken = local_refs.clone();
            taken.push(&value);
            let name = safe_param("n", &taken);
            let targets: Vec<String> = locals
                .iter()
                .map(|local| format!("{}[{}]", local, name))
                .collect();
            format!("({},{})=>{{{}={}}}", value, name, targets.join("="), value)
        } else {
            format!("({})=>{{{}={}}}", value, locals.join("="), value)
        };
        setters.push(format!("{}:{}", property_key(imported), setter));
    }

    format!(
        "{}({},{{{}}},{});",
        options.load_callee(),
        source_literal,
        setters.join(","),
        key
    )
}

/// `export * from "m"`: every delivered property is copied onto `exports`.
pub fn export_all(options: &TransformOptions, source_literal: &str, key: u32) -> String {
    let mut map = SpecifierMap::new();
    map.add(NAMESPACE, "exports");
    module_import(options, source_literal, &map, key)
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Getter-map registration. Each exported name must resolve to exactly one
/// local; anything else is a bug upstream of finalize.
pub fn module_export(options: &TransformOptions, map: &SpecifierMap) -> String {
    if map.is_empty() {
        return String::new();
    }
    let getters: Vec<String> = map
        .iter()
        .map(|(exported, locals)| {
            assert_eq!(
                locals.len(),
                1,
                "exported name \"{}\" resolves to {} locals: {:?}",
                exported,
                locals.len(),
                locals
            );
            format!("{}:()=>{}", property_key(exported), locals[0])
        })
        .collect();
    format!("{}({{{}}});", options.register_callee(), getters.join(","))
}

/// Text placed before a default-exported expression.
pub fn export_default_prefix(options: &TransformOptions) -> String {
    format!(
        "{}(\"default\",exports.default=(",
        options.register_callee()
    )
}

/// Text placed after a default-exported expression.
pub const EXPORT_DEFAULT_SUFFIX: &str = "));";

/// Closing parens only, for a statement that keeps its own `;`.
pub const EXPORT_DEFAULT_CLOSE: &str = "))";

/// Stand-in expression used when rebuilding the statement structurally.
pub const EXPORT_DEFAULT_PLACEHOLDER: &str = "0";

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
