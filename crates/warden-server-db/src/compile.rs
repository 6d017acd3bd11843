// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Query and mutation compilation against the `records` table.
//!
//! Authorization-relevant fields map to typed columns; everything else lives in
//! the JSON `data` document and is addressed through `json_extract`. Field names
//! are validated before they reach SQL text, values are always bound.

use chrono::Utc;
use serde_json::Value;
use warden_authz::{fields, Direction, Mutation, Predicate, Query, Selection};

use crate::error::{DbError, Result};
use crate::statement::{SqlValue, Statement};

pub(crate) const RECORD_COLUMNS: &str = "id, entity_type, owner_id, system_owned, data, created_at, updated_at, created_by, updated_by, deleted_at, deleted_by";

/// Column expression for a field name.
fn column(field: &str) -> Result<String> {
	if fields::is_typed_column(field) {
		return Ok(field.to_string());
	}
	let valid = !field.is_empty()
		&& field
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '_');
	if !valid {
		return Err(DbError::InvalidField(field.to_string()));
	}
	Ok(format!("json_extract(data, '$.{field}')"))
}

fn placeholders(n: usize) -> String {
	vec!["?"; n].join(", ")
}

/// `WHERE` clause (without the keyword) shared by every selection.
fn where_clause(query: &Query, stmt: &mut Statement) -> Result<String> {
	let mut clauses = vec!["entity_type = ?".to_string()];
	stmt.push_param(query.entity_type.as_str());
	if !query.include_deleted {
		clauses.push("deleted_at IS NULL".to_string());
	}

	for predicate in &query.predicates {
		let clause = match predicate {
			Predicate::Eq { field, value } if value.is_null() => {
				format!("{} IS NULL", column(field)?)
			}
			Predicate::Eq { field, value } => {
				stmt.push_param(SqlValue::from_json(value));
				format!("{} = ?", column(field)?)
			}
			Predicate::In { field, values } => {
				if values.is_empty() {
					"0 = 1".to_string()
				} else {
					let col = column(field)?;
					for value in values {
						stmt.push_param(SqlValue::from_json(value));
					}
					format!("{col} IN ({})", placeholders(values.len()))
				}
			}
			Predicate::IdIn(ids) => {
				if ids.is_empty() {
					"0 = 1".to_string()
				} else {
					for id in ids {
						stmt.push_param(id.as_str());
					}
					format!("id IN ({})", placeholders(ids.len()))
				}
			}
			Predicate::IsNull(field) => format!("{} IS NULL", column(field)?),
			Predicate::NotNull(field) => format!("{} IS NOT NULL", column(field)?),
			Predicate::Unsatisfiable => "0 = 1".to_string(),
		};
		clauses.push(clause);
	}

	Ok(clauses.join(" AND "))
}

pub(crate) fn compile_query(query: &Query) -> Result<Statement> {
	let mut stmt = Statement::default();
	let filter = where_clause(query, &mut stmt)?;

	let mut sql = match query.selection {
		Selection::Records => format!("SELECT {RECORD_COLUMNS} FROM records WHERE {filter}"),
		Selection::IdsOnly => format!("SELECT id FROM records WHERE {filter}"),
		Selection::Count => format!("SELECT COUNT(*) AS n FROM records WHERE {filter}"),
		Selection::Exists => {
			stmt.sql = format!("SELECT EXISTS (SELECT 1 FROM records WHERE {filter}) AS n");
			return Ok(stmt);
		}
	};

	if query.selection != Selection::Count {
		if query.order_by.is_empty() {
			sql.push_str(" ORDER BY created_at, id");
		} else {
			let order = query
				.order_by
				.iter()
				.map(|o| {
					let dir = match o.direction {
						Direction::Asc => "ASC",
						Direction::Desc => "DESC",
					};
					column(&o.field).map(|c| format!("{c} {dir}"))
				})
				.collect::<Result<Vec<_>>>()?;
			sql.push_str(" ORDER BY ");
			sql.push_str(&order.join(", "));
		}

		match (query.limit, query.offset) {
			(Some(limit), offset) => {
				sql.push_str(" LIMIT ? OFFSET ?");
				stmt.push_param(limit as i64);
				stmt.push_param(offset.unwrap_or(0) as i64);
			}
			(None, Some(offset)) => {
				sql.push_str(" LIMIT -1 OFFSET ?");
				stmt.push_param(offset as i64);
			}
			(None, None) => {}
		}
	}

	stmt.sql = sql;
	Ok(stmt)
}

fn typed_value(field: &str, value: &Value) -> SqlValue {
	if field == fields::SYSTEM_OWNED {
		return SqlValue::Integer(i64::from(value.as_bool().unwrap_or(false)));
	}
	match value {
		Value::Null => SqlValue::Null,
		Value::String(s) => SqlValue::Text(s.clone()),
		other => SqlValue::Text(other.to_string()),
	}
}

fn id_filter(mutation: &Mutation, stmt: &mut Statement) -> Result<String> {
	if mutation.ids.is_empty() {
		return Err(DbError::Internal(format!(
			"{} {:?} without target ids",
			mutation.entity_type, mutation.op
		)));
	}
	stmt.push_param(mutation.entity_type.as_str());
	for id in &mutation.ids {
		stmt.push_param(id.as_str());
	}
	Ok(format!(
		"entity_type = ? AND id IN ({})",
		placeholders(mutation.ids.len())
	))
}

/// INSERT for a create. Returns the statement and the new record's id.
pub(crate) fn compile_insert(mutation: &Mutation) -> Result<(Statement, String)> {
	let now = Utc::now().to_rfc3339();
	let id = match mutation.field(fields::ID).and_then(Value::as_str) {
		Some(id) => id.to_string(),
		None => mutation
			.ids
			.first()
			.cloned()
			.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
	};

	let mut data = serde_json::Map::new();
	let mut columns = vec!["id", "entity_type", "created_at", "updated_at"];
	let mut stmt = Statement::default()
		.bind(id.as_str())
		.bind(mutation.entity_type.as_str())
		.bind(now.as_str())
		.bind(now.as_str());

	if let Some(owner) = &mutation.owner_id {
		columns.push(fields::OWNER_ID);
		stmt.push_param(owner.as_str());
	}
	for (field, value) in &mutation.fields {
		let skip = matches!(
			field.as_str(),
			fields::ID | fields::CREATED_AT | fields::UPDATED_AT
		) || (field == fields::OWNER_ID && mutation.owner_id.is_some());
		if skip {
			continue;
		}
		if fields::is_typed_column(field) {
			columns.push(field.as_str());
			stmt.push_param(typed_value(field, value));
		} else {
			column(field)?;
			data.insert(field.clone(), value.clone());
		}
	}
	columns.push("data");
	stmt.push_param(serde_json::to_string(&data)?);

	stmt.sql = format!(
		"INSERT INTO records ({}) VALUES ({})",
		columns.join(", "),
		placeholders(columns.len())
	);
	Ok((stmt, id))
}

/// UPDATE for an update (including rewritten soft deletes).
pub(crate) fn compile_update(mutation: &Mutation) -> Result<Statement> {
	let mut sets = vec!["updated_at = ?".to_string()];
	let mut stmt = Statement::default().bind(Utc::now().to_rfc3339());

	let mut data_expr = "data".to_string();
	let mut data_params = Vec::new();
	for (field, value) in &mutation.fields {
		if field == fields::ID || field == fields::UPDATED_AT {
			continue;
		}
		if fields::is_typed_column(field) {
			sets.push(format!("{field} = ?"));
			stmt.push_param(typed_value(field, value));
		} else {
			column(field)?;
			data_expr = format!("json_set({data_expr}, '$.{field}', json(?))");
			data_params.push(SqlValue::Text(serde_json::to_string(value)?));
		}
	}
	for field in &mutation.cleared {
		if fields::is_typed_column(field) {
			if field != fields::ID {
				sets.push(format!("{field} = NULL"));
			}
		} else {
			column(field)?;
			data_expr = format!("json_remove({data_expr}, '$.{field}')");
		}
	}
	if data_expr != "data" {
		sets.push(format!("data = {data_expr}"));
		stmt.params.extend(data_params);
	}

	let filter = id_filter(mutation, &mut stmt)?;
	stmt.sql = format!(
		"UPDATE records SET {} WHERE {filter} AND deleted_at IS NULL",
		sets.join(", ")
	);
	Ok(stmt)
}

/// DELETE for a hard delete.
pub(crate) fn compile_delete(mutation: &Mutation) -> Result<Statement> {
	let mut stmt = Statement::default();
	let filter = id_filter(mutation, &mut stmt)?;
	stmt.sql = format!("DELETE FROM records WHERE {filter}");
	Ok(stmt)
}
