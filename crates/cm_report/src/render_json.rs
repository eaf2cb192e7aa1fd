//! render_json.rs: the report model as a JSON value.
//!
//! Field order follows the struct layout; canonical ordering for files is the
//! writer's concern (`cm_io::canonical_json`).

use serde_json::Value;

use crate::structure::ReportModel;
use crate::ReportError;

pub fn render_json(model: &ReportModel) -> Result<Value, ReportError> {
    serde_json::to_value(model).map_err(|e| ReportError::Json(e.to_string()))
}
