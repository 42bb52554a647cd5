//! Athena column type normalization.
//!
//! Athena reports Presto/Trino type names (`varchar`, `bigint`, ...).
//! Downstream consumers expect a smaller vocabulary, so every vendor type
//! is mapped through a fixed table.

use crate::error::AthenaError;
use crate::result::ColumnMeta;

/// Vendor type to normalized type.
const TYPE_MAP: [(&str, &str); 9] = [
    ("char", "character"),
    ("varchar", "character"),
    ("integer", "int"),
    ("bigint", "long"),
    ("date", "date"),
    ("timestamp", "datetime"),
    ("boolean", "boolean"),
    ("float", "float"),
    ("double", "double"),
];

/// Look up the normalized name for an Athena type, or `None` if unmapped.
pub fn normalize_type(athena_type: &str) -> Option<&'static str> {
    TYPE_MAP
        .iter()
        .find(|(vendor, _)| *vendor == athena_type)
        .map(|(_, normalized)| *normalized)
}

/// Rewrite column types in place.
///
/// With `return_raw_types` the vendor strings are kept untouched. Otherwise
/// the first unmapped type aborts with [`AthenaError::UnknownType`].
pub fn normalize_columns(
    columns: Vec<ColumnMeta>,
    return_raw_types: bool,
) -> Result<Vec<ColumnMeta>, AthenaError> {
    if return_raw_types {
        return Ok(columns);
    }

    columns
        .into_iter()
        .map(|col| match normalize_type(&col.data_type) {
            Some(normalized) => Ok(ColumnMeta {
                name: col.name,
                data_type: normalized.to_string(),
            }),
            None => Err(AthenaError::UnknownType {
                column: col.name,
                data_type: col.data_type,
            }),
        })
        .collect()
}
