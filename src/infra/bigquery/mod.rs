mod client;
mod query;

pub use client::BigQueryClient;
pub use query::{QueryParameter, QueryRequest, availability_query, facilities_query, table_id};
