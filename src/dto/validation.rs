//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::match_state::TableId;

/// Validates that a raw table identifier would be accepted by [`TableId::parse`].
///
/// # Examples
///
/// ```ignore
/// validate_table_id("1")       // Ok
/// validate_table_id("table-2") // Ok
/// validate_table_id("")        // Err - empty
/// validate_table_id("1/2")     // Err - separator
/// ```
pub fn validate_table_id(id: &str) -> Result<(), ValidationError> {
    TableId::parse(id).map(|_| ()).map_err(|err| {
        let mut error = ValidationError::new("table_id_format");
        error.message = Some(err.to_string().into());
        error
    })
}
