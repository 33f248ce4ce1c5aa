//! Typed operation arguments.
//!
//! Argument maps arrive as loose JSON. Everything is checked here, before any
//! storage or cache call: a request that fails parsing never reaches the
//! entity store.

use serde_json::{Map, Value};

use super::ResolverError;
use crate::store::{NewStore, StorePatch};

pub const STORE: &str = "store";
pub const STORES: &str = "stores";
pub const CREATE_STORE: &str = "createStore";
pub const UPDATE_STORE: &str = "updateStore";
pub const DELETE_STORE: &str = "deleteStore";

const INVALID_ID: &str = "invalid id";
const CREATE_REQUIRED: &str = "invalid arguments: name and revenue are required";

/// A validated CRUD operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Store { id: i64 },
    Stores,
    CreateStore(NewStore),
    UpdateStore { id: i64, patch: StorePatch },
    DeleteStore { id: i64 },
}

impl Operation {
    pub fn parse(name: &str, args: &Map<String, Value>) -> Result<Self, ResolverError> {
        match name {
            STORE => Ok(Operation::Store { id: required_id(args)? }),
            STORES => Ok(Operation::Stores),
            CREATE_STORE => parse_create(args).map(Operation::CreateStore),
            UPDATE_STORE => {
                let id = required_id(args)?;
                Ok(Operation::UpdateStore {
                    id,
                    patch: parse_patch(args)?,
                })
            }
            DELETE_STORE => Ok(Operation::DeleteStore { id: required_id(args)? }),
            other => Err(ResolverError::Validation(format!(
                "unknown operation: {other}"
            ))),
        }
    }

    /// Operation name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Store { .. } => STORE,
            Operation::Stores => STORES,
            Operation::CreateStore(_) => CREATE_STORE,
            Operation::UpdateStore { .. } => UPDATE_STORE,
            Operation::DeleteStore { .. } => DELETE_STORE,
        }
    }
}

/// Look up `key`, treating explicit `null` as absent.
fn present<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    args.get(key).filter(|value| !value.is_null())
}

fn required_id(args: &Map<String, Value>) -> Result<i64, ResolverError> {
    present(args, "id")
        .and_then(Value::as_i64)
        .ok_or_else(|| ResolverError::Validation(INVALID_ID.to_string()))
}

fn parse_create(args: &Map<String, Value>) -> Result<NewStore, ResolverError> {
    let name = present(args, "name").and_then(Value::as_str);
    let revenue = present(args, "revenue").and_then(Value::as_f64);
    let (Some(name), Some(revenue)) = (name, revenue) else {
        return Err(ResolverError::Validation(CREATE_REQUIRED.to_string()));
    };

    let active = match present(args, "active") {
        None => true,
        Some(value) => value.as_bool().ok_or_else(|| invalid("active"))?,
    };

    // `total_orders` is accepted and ignored: new stores start at zero.
    Ok(NewStore {
        name: name.to_string(),
        revenue,
        active,
    })
}

fn parse_patch(args: &Map<String, Value>) -> Result<StorePatch, ResolverError> {
    Ok(StorePatch {
        name: optional(args, "name", |v| v.as_str().map(str::to_string))?,
        revenue: optional(args, "revenue", Value::as_f64)?,
        total_orders: optional(args, "total_orders", Value::as_i64)?,
        active: optional(args, "active", Value::as_bool)?,
    })
}

fn optional<T>(
    args: &Map<String, Value>,
    field: &'static str,
    convert: impl Fn(&Value) -> Option<T>,
) -> Result<Option<T>, ResolverError> {
    match present(args, field) {
        None => Ok(None),
        Some(value) => convert(value).map(Some).ok_or_else(|| invalid(field)),
    }
}

fn invalid(field: &str) -> ResolverError {
    ResolverError::Validation(format!("invalid {field}"))
}
