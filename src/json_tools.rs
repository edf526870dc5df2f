use serde_json::Value;

pub(crate) fn read_string_field(value: &Value, field: &str) -> Option<String> {
    value.as_object()?.get(field)?.as_str().map(str::to_string)
}

pub(crate) fn read_metadata_string_field(value: &Value, field: &str) -> Option<String> {
    read_string_field(value.as_object()?.get("metadata")?, field)
}
