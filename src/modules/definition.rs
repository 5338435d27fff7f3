//! Handler file documents → [`HandlerModule`].
//!
//! A handler file (TOML or JSON) is parsed into a JSON document and compiled
//! here. A *callable definition* is a table with either
//!
//! - `handler = "<name>"`: a native handler from the registry, or
//! - `respond = { status, headers, body }`: a fixed response.
//!
//! A document that is itself a callable definition compiles to
//! [`HandlerModule::Callable`]; any other table compiles to
//! [`HandlerModule::Exports`], one export per key. Non-table documents become
//! [`HandlerModule::Value`] and are refused later, at dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::handler::static_response::StaticBody;
use crate::handler::{HandlerRegistry, SharedHandler, StaticHandler};
use crate::modules::module::{Export, HandlerModule};

const HANDLER_KEY: &str = "handler";
const RESPOND_KEY: &str = "respond";

/// A handler file that parsed but does not describe a usable handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("no native handler named {0:?} is registered")]
    UnknownHandler(String),
    #[error("`handler` must be a string")]
    HandlerNotString,
    #[error("`handler` and `respond` cannot both be set")]
    Ambiguous,
    #[error("`respond` must be a table")]
    RespondNotTable,
    #[error("invalid status {0}")]
    InvalidStatus(String),
    #[error("invalid header {0:?}")]
    InvalidHeader(String),
}

/// Compile a parsed handler document into a module.
pub fn compile(
    document: Value,
    registry: &HandlerRegistry,
) -> Result<HandlerModule, DefinitionError> {
    match document {
        Value::Object(table) if is_callable(&table) => {
            Ok(HandlerModule::Callable(compile_callable(&table, registry)?))
        }
        Value::Object(table) => {
            let mut exports = BTreeMap::new();
            for (name, value) in table {
                let export = match value {
                    Value::Object(inner) if is_callable(&inner) => {
                        Export::Handler(compile_callable(&inner, registry)?)
                    }
                    other => Export::Value(other),
                };
                exports.insert(name, export);
            }
            Ok(HandlerModule::Exports(exports))
        }
        other => Ok(HandlerModule::Value(other)),
    }
}

fn is_callable(table: &Map<String, Value>) -> bool {
    table.contains_key(HANDLER_KEY) || table.contains_key(RESPOND_KEY)
}

fn compile_callable(
    table: &Map<String, Value>,
    registry: &HandlerRegistry,
) -> Result<SharedHandler, DefinitionError> {
    match (table.get(HANDLER_KEY), table.get(RESPOND_KEY)) {
        (Some(_), Some(_)) => Err(DefinitionError::Ambiguous),
        (Some(Value::String(name)), None) => registry
            .get(name)
            .ok_or_else(|| DefinitionError::UnknownHandler(name.clone())),
        (Some(_), None) => Err(DefinitionError::HandlerNotString),
        (None, Some(Value::Object(respond))) => Ok(Arc::new(compile_respond(respond)?)),
        (None, Some(_)) => Err(DefinitionError::RespondNotTable),
        (None, None) => unreachable!("is_callable checked one of the keys"),
    }
}

fn compile_respond(respond: &Map<String, Value>) -> Result<StaticHandler, DefinitionError> {
    let status = match respond.get("status") {
        None => StatusCode::OK,
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|code| u16::try_from(code).ok())
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or_else(|| DefinitionError::InvalidStatus(n.to_string()))?,
        Some(other) => return Err(DefinitionError::InvalidStatus(other.to_string())),
    };

    let mut headers = HeaderMap::new();
    if let Some(declared) = respond.get("headers") {
        let Value::Object(declared) = declared else {
            return Err(DefinitionError::InvalidHeader("headers".to_string()));
        };
        for (name, value) in declared {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| DefinitionError::InvalidHeader(name.clone()))?;
            let header_value = value
                .as_str()
                .and_then(|v| HeaderValue::from_str(v).ok())
                .ok_or_else(|| DefinitionError::InvalidHeader(name.clone()))?;
            headers.insert(header_name, header_value);
        }
    }

    let body = match respond.get("body") {
        None | Some(Value::Null) => StaticBody::Empty,
        Some(Value::String(text)) => StaticBody::Text(text.clone()),
        Some(value) => StaticBody::Json(value.clone()),
    };

    Ok(StaticHandler::new(status, headers, body))
}
