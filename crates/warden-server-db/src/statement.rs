// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqliteArguments};

/// A bindable SQLite value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
	Null,
	Integer(i64),
	Real(f64),
	Text(String),
}

impl SqlValue {
	/// Map a JSON scalar to the value SQLite's `json_extract` would yield for it.
	///
	/// Arrays and objects bind as their JSON text.
	pub fn from_json(value: &Value) -> Self {
		match value {
			Value::Null => SqlValue::Null,
			Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
			Value::Number(n) => match n.as_i64() {
				Some(i) => SqlValue::Integer(i),
				None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
			},
			Value::String(s) => SqlValue::Text(s.clone()),
			other => SqlValue::Text(other.to_string()),
		}
	}
}

impl From<&str> for SqlValue {
	fn from(s: &str) -> Self {
		SqlValue::Text(s.to_string())
	}
}

impl From<String> for SqlValue {
	fn from(s: String) -> Self {
		SqlValue::Text(s)
	}
}

impl From<i64> for SqlValue {
	fn from(i: i64) -> Self {
		SqlValue::Integer(i)
	}
}

impl From<bool> for SqlValue {
	fn from(b: bool) -> Self {
		SqlValue::Integer(i64::from(b))
	}
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
	fn from(v: Option<T>) -> Self {
		v.map(Into::into).unwrap_or(SqlValue::Null)
	}
}

/// SQL text with positional parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
	pub sql: String,
	pub params: Vec<SqlValue>,
}

impl Statement {
	pub fn new(sql: impl Into<String>) -> Self {
		Self {
			sql: sql.into(),
			params: Vec::new(),
		}
	}

	pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
		self.params.push(value.into());
		self
	}

	pub fn push_param(&mut self, value: impl Into<SqlValue>) {
		self.params.push(value.into());
	}

	pub(crate) fn to_query(&self) -> sqlx::query::Query<'_, Sqlite, SqliteArguments<'_>> {
		let mut query = sqlx::query(&self.sql);
		for param in &self.params {
			query = match param {
				SqlValue::Null => query.bind(None::<String>),
				SqlValue::Integer(i) => query.bind(*i),
				SqlValue::Real(f) => query.bind(*f),
				SqlValue::Text(s) => query.bind(s.as_str()),
			};
		}
		query
	}
}
