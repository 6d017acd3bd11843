// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Generic record repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use warden_authz::{EntityType, Mutation, MutationOp, OrgId, Query, Selection};
use warden_rebac::{HasObjectId, MembershipRow};

use crate::compile::{compile_delete, compile_insert, compile_query, compile_update, RECORD_COLUMNS};
use crate::driver::{MutationTx, StorageDriver};
use crate::error::{DbError, Result};
use crate::statement::Statement;

/// One stored entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
	pub id: String,
	pub entity_type: String,
	pub owner_id: Option<String>,
	pub system_owned: bool,
	pub data: Map<String, Value>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub created_by: Option<String>,
	pub updated_by: Option<String>,
	pub deleted_at: Option<DateTime<Utc>>,
	pub deleted_by: Option<String>,
}

impl Record {
	pub fn get(&self, field: &str) -> Option<&Value> {
		self.data.get(field)
	}

	pub fn is_deleted(&self) -> bool {
		self.deleted_at.is_some()
	}

	fn from_row(row: &SqliteRow) -> Result<Self> {
		let data: String = row.try_get("data")?;
		let data: Map<String, Value> = serde_json::from_str(&data)?;
		Ok(Self {
			id: row.try_get("id")?,
			entity_type: row.try_get("entity_type")?,
			owner_id: row.try_get("owner_id")?,
			system_owned: row.try_get::<i64, _>("system_owned")? != 0,
			data,
			created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
			updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?)?,
			created_by: row.try_get("created_by")?,
			updated_by: row.try_get("updated_by")?,
			deleted_at: row
				.try_get::<Option<String>, _>("deleted_at")?
				.map(|s| parse_timestamp(&s))
				.transpose()?,
			deleted_by: row.try_get("deleted_by")?,
		})
	}
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(s)
		.map(|d| d.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("bad timestamp '{s}': {e}")))
}

impl HasObjectId for Record {
	fn object_id(&self) -> &str {
		&self.id
	}
}

/// Membership rows name their member in `data.user_id`.
impl MembershipRow for Record {
	fn subject_key(&self) -> &str {
		self.get("user_id")
			.and_then(Value::as_str)
			.unwrap_or(&self.id)
	}

	fn tenant_id(&self) -> &str {
		self.owner_id.as_deref().unwrap_or_default()
	}
}

/// The result of a read, shaped by the query's [`Selection`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
	Records(Vec<Record>),
	Ids(Vec<String>),
	Exists(bool),
	Count(u64),
}

impl QueryOutput {
	/// The empty answer for a selection, used when a query is known to match nothing.
	pub fn empty(selection: Selection) -> Self {
		match selection {
			Selection::Records => QueryOutput::Records(Vec::new()),
			Selection::IdsOnly => QueryOutput::Ids(Vec::new()),
			Selection::Exists => QueryOutput::Exists(false),
			Selection::Count => QueryOutput::Count(0),
		}
	}

	pub fn into_records(self) -> Vec<Record> {
		match self {
			QueryOutput::Records(records) => records,
			_ => Vec::new(),
		}
	}
}

/// Repository over the `records` table.
#[derive(Clone)]
pub struct RecordRepository {
	driver: Arc<dyn StorageDriver>,
}

impl RecordRepository {
	pub fn new(driver: Arc<dyn StorageDriver>) -> Self {
		Self { driver }
	}

	/// Run a read through the driver.
	#[tracing::instrument(skip(self, query), fields(entity_type = %query.entity_type, selection = ?query.selection))]
	pub async fn query(&self, query: &Query) -> Result<QueryOutput> {
		let stmt = compile_query(query)?;
		let rows = self.driver.fetch(&stmt).await?;
		match query.selection {
			Selection::Records => rows
				.iter()
				.map(Record::from_row)
				.collect::<Result<Vec<_>>>()
				.map(QueryOutput::Records),
			Selection::IdsOnly => rows
				.iter()
				.map(|r| r.try_get::<String, _>("id").map_err(DbError::from))
				.collect::<Result<Vec<_>>>()
				.map(QueryOutput::Ids),
			Selection::Exists => Ok(QueryOutput::Exists(first_count(&rows)? > 0)),
			Selection::Count => Ok(QueryOutput::Count(first_count(&rows)? as u64)),
		}
	}

	/// Fetch one record by id, including soft-deleted ones when asked.
	pub async fn get(
		&self,
		entity_type: EntityType,
		id: &str,
		include_deleted: bool,
	) -> Result<Option<Record>> {
		let mut query = Query::new(entity_type).eq("id", id);
		query.include_deleted = include_deleted;
		Ok(self.query(&query).await?.into_records().into_iter().next())
	}

	/// Apply a mutation inside `tx`, returning the ids it touched.
	#[tracing::instrument(skip(tx, mutation), fields(entity_type = %mutation.entity_type, op = ?mutation.op))]
	pub async fn apply(tx: &mut MutationTx, mutation: &Mutation) -> Result<Vec<String>> {
		match mutation.op {
			MutationOp::Create => {
				let (stmt, id) = compile_insert(mutation)?;
				tx.execute(&stmt).await.map_err(|e| match e {
					DbError::Sqlx(sqlx::Error::Database(db)) if db.is_unique_violation() => {
						DbError::Conflict(format!("{} {id} already exists", mutation.entity_type))
					}
					other => other,
				})?;
				Ok(vec![id])
			}
			MutationOp::Update | MutationOp::Delete => {
				let live = Self::live_ids(tx, mutation).await?;
				let stmt = match mutation.op {
					MutationOp::Update => compile_update(mutation)?,
					_ => compile_delete(mutation)?,
				};
				tx.execute(&stmt).await?;
				Ok(live)
			}
		}
	}

	/// Owner of each live target of `mutation`, read inside `tx`.
	pub async fn owners(tx: &mut MutationTx, mutation: &Mutation) -> Result<Vec<(String, Option<OrgId>)>> {
		if mutation.ids.is_empty() {
			return Ok(Vec::new());
		}
		let mut stmt = Statement::new(format!(
			"SELECT id, owner_id FROM records WHERE entity_type = ? AND deleted_at IS NULL AND id IN ({})",
			vec!["?"; mutation.ids.len()].join(", ")
		))
		.bind(mutation.entity_type.as_str());
		for id in &mutation.ids {
			stmt.push_param(id.as_str());
		}
		tx.fetch(&stmt)
			.await?
			.iter()
			.map(|row| -> Result<(String, Option<OrgId>)> {
				let id: String = row.try_get("id")?;
				let owner: Option<String> = row.try_get("owner_id")?;
				Ok((id, owner.map(OrgId::new)))
			})
			.collect()
	}

	async fn live_ids(tx: &mut MutationTx, mutation: &Mutation) -> Result<Vec<String>> {
		Ok(Self::owners(tx, mutation)
			.await?
			.into_iter()
			.map(|(id, _)| id)
			.collect())
	}

	/// Read a record inside `tx`.
	pub async fn get_in(tx: &mut MutationTx, entity_type: EntityType, id: &str) -> Result<Option<Record>> {
		let stmt = Statement::new(format!(
			"SELECT {RECORD_COLUMNS} FROM records WHERE entity_type = ? AND id = ?"
		))
		.bind(entity_type.as_str())
		.bind(id);
		tx.fetch(&stmt)
			.await?
			.first()
			.map(Record::from_row)
			.transpose()
	}
}

fn first_count(rows: &[SqliteRow]) -> Result<i64> {
	match rows.first() {
		Some(row) => Ok(row.try_get("n")?),
		None => Ok(0),
	}
}
