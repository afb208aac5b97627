//! LanceDB connection and table helpers.
use arrow_array::RecordBatchIterator;
use arrow_schema::Schema;
use lancedb::{connect, Connection, Table};
use std::sync::Arc;

use docchat_core::error::{Error, Result};

pub async fn open_db(uri: &str) -> Result<Connection> {
	connect(uri).execute().await.map_err(Error::retrieval)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
	let names = conn.table_names().execute().await.map_err(Error::retrieval)?;
	Ok(names.iter().any(|n| n == name))
}

/// Open `name`, or `None` when it has not been created yet.
pub async fn open_table(conn: &Connection, name: &str) -> Result<Option<Table>> {
	if !table_exists(conn, name).await? { return Ok(None); }
	conn.open_table(name).execute().await.map(Some).map_err(Error::retrieval)
}

pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<Schema>) -> Result<Table> {
	if let Some(table) = open_table(conn, name).await? { return Ok(table); }
	// create empty table with 0 rows
	let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
	conn.create_table(name, Box::new(iter)).execute().await.map_err(Error::retrieval)
}

/// Quote a string literal for a LanceDB SQL predicate.
pub fn sql_literal(value: &str) -> String { format!("'{}'", value.replace('\'', "''")) }

pub fn namespace_predicate(namespace: &str) -> String { format!("namespace = {}", sql_literal(namespace)) }
