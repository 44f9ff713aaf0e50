use serde::Serialize;

pub const FACILITY_TABLE: &str = "parking_lot";
pub const AVAILABILITY_TABLE: &str = "time_parking_availability";

/// Server-side wait per call, in milliseconds.
const QUERY_TIMEOUT_MS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ParameterType {
    #[serde(rename = "type")]
    param_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ParameterValue {
    value: String,
}

/// A named scalar query parameter (`@name` in the SQL text).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParameter {
    name: String,
    parameter_type: ParameterType,
    parameter_value: ParameterValue,
}

impl QueryParameter {
    pub fn string(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            parameter_type: ParameterType {
                param_type: "STRING",
            },
            parameter_value: ParameterValue {
                value: value.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormatOptions {
    use_int64_timestamp: bool,
}

/// Body of a `jobs.query` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    query: String,
    use_legacy_sql: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameter_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    query_parameters: Vec<QueryParameter>,
    timeout_ms: u32,
    format_options: FormatOptions,
}

impl QueryRequest {
    pub fn new(query: String) -> Self {
        Self {
            query,
            use_legacy_sql: false,
            parameter_mode: None,
            query_parameters: Vec::new(),
            timeout_ms: QUERY_TIMEOUT_MS,
            format_options: FormatOptions {
                use_int64_timestamp: true,
            },
        }
    }

    pub fn with_parameter(mut self, parameter: QueryParameter) -> Self {
        self.parameter_mode = Some("NAMED");
        self.query_parameters.push(parameter);
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Fully-qualified table name. An empty dataset yields `.table`, which the
/// warehouse rejects or resolves to nothing; it never fails here.
pub fn table_id(dataset: &str, table: &str) -> String {
    format!("{dataset}.{table}")
}

/// Every catalog row.
pub fn facilities_query(dataset: &str) -> QueryRequest {
    QueryRequest::new(format!(
        "SELECT * FROM `{}`",
        table_id(dataset, FACILITY_TABLE)
    ))
}

/// The full reading history of one facility, newest first.
pub fn availability_query(dataset: &str, official_id: &str, county: &str) -> QueryRequest {
    QueryRequest::new(format!(
        "SELECT * FROM `{}` WHERE official_id = @official_id AND county = @county ORDER BY time DESC",
        table_id(dataset, AVAILABILITY_TABLE)
    ))
    .with_parameter(QueryParameter::string("official_id", official_id))
    .with_parameter(QueryParameter::string("county", county))
}
