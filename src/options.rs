//! Transform configuration.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TransformError;

lazy_static! {
    /// Plain ECMAScript identifier names (ASCII subset).
    pub static ref IDENTIFIER_NAME_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

pub fn is_identifier_name(name: &str) -> bool {
    IDENTIFIER_NAME_RE.is_match(name)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TransformOptions {
    /// Emit `let`/`const` instead of `var` for generated import bindings.
    pub generate_let_declarations: bool,
    /// Also rewrite the AST in place. Requires a snippet parser.
    pub ast: bool,
    /// Runtime object providing `importSync` and `export`.
    pub module_alias: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            generate_let_declarations: false,
            ast: false,
            module_alias: "module".to_string(),
        }
    }
}

impl TransformOptions {
    pub fn from_json(json: &str) -> Result<Self, TransformError> {
        let options: TransformOptions = serde_json::from_str(json)
            .map_err(|e| TransformError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), TransformError> {
        if !is_identifier_name(&self.module_alias) {
            return Err(TransformError::InvalidOptions(format!(
                "moduleAlias \"{}\" is not an identifier",
                self.module_alias
            )));
        }
        Ok(())
    }

    pub(crate) fn load_callee(&self) -> String {
        format!("{}.importSync", self.module_alias)
    }

    pub(crate) fn register_callee(&self) -> String {
        format!("{}.export", self.module_alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let options = TransformOptions::from_json("{}").unwrap();
        assert_eq!(options, TransformOptions::default());
        assert_eq!(options.load_callee(), "module.importSync");
    }

    #[test]
    fn test_camel_case_keys() {
        let options =
            TransformOptions::from_json(r#"{"generateLetDeclarations":true,"moduleAlias":"m"}"#)
                .unwrap();
        assert!(options.generate_let_declarations);
        assert_eq!(options.register_callee(), "m.export");
    }

    #[test]
    fn test_rejects_bad_alias_and_unknown_keys() {
        assert!(matches!(
            TransformOptions::from_json(r#"{"moduleAlias":"a.b"}"#),
            Err(TransformError::InvalidOptions(_))
        ));
        assert!(matches!(
            TransformOptions::from_json(r#"{"parse":true}"#),
            Err(TransformError::InvalidOptions(_))
        ));
    }
}
