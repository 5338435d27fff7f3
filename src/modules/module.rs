//! Loaded handler modules and their entry points.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::handler::SharedHandler;

/// One named export of a module.
#[derive(Clone)]
pub enum Export {
    Handler(SharedHandler),
    Value(Value),
}

impl Export {
    fn kind(&self) -> &'static str {
        match self {
            Export::Handler(_) => "handler",
            Export::Value(value) => value_kind(value),
        }
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Export::Handler(_) => f.write_str("Handler(..)"),
            Export::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// A loaded handler module.
///
/// Two shapes are valid entry points: the module is itself a handler, or it
/// exports a handler as `default`. Anything else is caught by
/// [`HandlerModule::entry_point`].
#[derive(Clone)]
pub enum HandlerModule {
    Callable(SharedHandler),
    Exports(BTreeMap<String, Export>),
    Value(Value),
}

/// Name of the export used as a module's entry point.
pub const DEFAULT_EXPORT: &str = "default";

/// A module that cannot be invoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("module has no `default` export (exports: {exports:?})")]
    MissingDefault { exports: Vec<String> },
    #[error("`default` export is a {kind}, not a handler")]
    DefaultNotCallable { kind: &'static str },
    #[error("module evaluated to a {kind}, not a handler or export table")]
    NotCallable { kind: &'static str },
}

impl HandlerModule {
    /// Module that is itself the handler.
    pub fn callable(handler: SharedHandler) -> Self {
        HandlerModule::Callable(handler)
    }

    /// Module exporting `handler` as its `default`.
    pub fn with_default(handler: SharedHandler) -> Self {
        let mut exports = BTreeMap::new();
        exports.insert(DEFAULT_EXPORT.to_string(), Export::Handler(handler));
        HandlerModule::Exports(exports)
    }

    /// The handler to invoke for this module.
    pub fn entry_point(&self) -> Result<SharedHandler, ShapeError> {
        match self {
            HandlerModule::Callable(handler) => Ok(handler.clone()),
            HandlerModule::Exports(exports) => match exports.get(DEFAULT_EXPORT) {
                Some(Export::Handler(handler)) => Ok(handler.clone()),
                Some(other) => Err(ShapeError::DefaultNotCallable { kind: other.kind() }),
                None => Err(ShapeError::MissingDefault {
                    exports: exports.keys().cloned().collect(),
                }),
            },
            HandlerModule::Value(value) => Err(ShapeError::NotCallable {
                kind: value_kind(value),
            }),
        }
    }

    /// Short label for logs and the admin API.
    pub fn shape(&self) -> &'static str {
        match self {
            HandlerModule::Callable(_) => "callable",
            HandlerModule::Exports(_) => "exports",
            HandlerModule::Value(_) => "value",
        }
    }
}

impl fmt::Debug for HandlerModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerModule::Callable(_) => f.write_str("Callable(..)"),
            HandlerModule::Exports(exports) => f.debug_tuple("Exports").field(exports).finish(),
            HandlerModule::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}
