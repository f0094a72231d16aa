//! # ESM Lowering
//!
//! Rewrites `import`/`export` declarations into calls on a runtime module
//! object, so the output runs on hosts without native module syntax while
//! keeping live bindings and tolerating circular imports.
//!
//! ## Output Invariants
//!
//! 1. **Loads**: every import, `export *` and re-export becomes
//!    `module.importSync(<source>, {<name>: (v) => {<local> = v}}, <key>)`.
//!    Keys start at 0 and grow by one per load call within a module.
//!
//! 2. **Registration**: local exports become one
//!    `module.export({<name>: () => <local>})` getter map per statement list.
//!
//! 3. **Order**: within a statement list, hoisted code follows the directive
//!    prologue and precedes every other statement; export code precedes
//!    import code.
//!
//! 4. **Lines**: text edits never change the number of lines of the span they
//!    replace, so positions of untouched code stay valid.
//!
//! 5. **Default expressions**: `export default <expr>` is rewritten in place to
//!    `module.export("default", exports.default = (<expr>));` and is not
//!    hoisted.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod codegen;
mod declarations;
mod error;
mod finalize;
mod ledger;
mod options;
mod parse;
mod rewriter;
mod scope;
mod specifier;
mod text;
mod transform;
mod visitor;

#[cfg(test)]
mod ast_tests;

pub use error::TransformError;
pub use options::TransformOptions;
pub use parse::{parse_module, OxcSnippetParser, SnippetParser};
pub use text::{Placement, SpanEdit};
pub use transform::{
    transform_module, transform_modules, ModuleSource, ModuleTransformer, TransformOutput,
};

/// Node entry point: transform one module and return the output as JSON.
#[cfg(feature = "napi")]
#[napi]
pub fn transform_module_native(
    source: String,
    options_json: Option<String>,
) -> napi::Result<serde_json::Value> {
    let options = match options_json {
        Some(json) => TransformOptions::from_json(&json)?,
        None => TransformOptions::default(),
    };
    let output = transform_module(&source, &options)?;
    serde_json::to_value(output).map_err(|e| napi::Error::from_reason(e.to_string()))
}
