// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::Path;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use warden_authz::{AuthorizationContext, DenyIfNotAuthenticated, EntityType, Mutation, OrgId, Query};
use warden_server::{bootstrap, EntityCategory, EntitySchema, SchemaRegistry, WardenConfig};
use warden_server_config::{load_from_sources, ConfigSource, DefaultsSource, TomlSource};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::support::{ids, member_of, DOCUMENT, ORG_A};

fn schemas() -> SchemaRegistry {
	SchemaRegistry::builder()
		.pre(DenyIfNotAuthenticated)
		.register(EntitySchema::new(
			EntityType::ORGANIZATION,
			EntityCategory::Organization,
		))
		.register(EntitySchema::new(DOCUMENT, EntityCategory::Relationship))
		.build()
		.unwrap()
}

fn load(dir: &Path, extra: &str) -> WardenConfig {
	let file = dir.join("server.toml");
	let db = dir.join("warden.db");
	let content = format!(
		"[database]\nurl = \"sqlite:{}\"\nmax_connections = 2\n\n[shutdown]\npoll_interval_ms = 10\ngrace_period_secs = 3\n\n{extra}",
		db.display()
	);
	std::fs::write(&file, content).unwrap();

	let sources: Vec<Box<dyn ConfigSource>> =
		vec![Box::new(DefaultsSource), Box::new(TomlSource::new(file))];
	load_from_sources(sources).unwrap()
}

async fn seed_documents(store: &warden_server::AuthorizedStore) {
	for id in ["d1", "d2"] {
		store
			.mutate(
				&AuthorizationContext::internal(),
				Mutation::create(DOCUMENT)
					.set("id", id)
					.with_owner(OrgId::new(ORG_A)),
			)
			.await
			.unwrap();
	}
}

#[tokio::test]
async fn configured_store_filters_through_the_relationship_service() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/stores/store-1/list-objects"))
		.and(body_partial_json(json!({
			"type": "document",
			"relation": "can_view",
			"user": "user:alice",
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"objects": ["document:d1"],
		})))
		.mount(&server)
		.await;

	let dir = TempDir::new().unwrap();
	let config = load(
		dir.path(),
		&format!(
			"[rebac]\nurl = \"{}\"\nstore_id = \"store-1\"\nmax_attempts = 1\n",
			server.uri()
		),
	);
	assert!(config.rebac.is_some());

	let store = bootstrap(&config, schemas()).await.unwrap();
	seed_documents(&store).await;

	let records = store
		.query(&member_of("alice", ORG_A), Query::new(DOCUMENT))
		.await
		.unwrap()
		.into_records();
	assert_eq!(ids(&records), vec!["d1"]);
}

#[tokio::test]
async fn store_without_relationship_service_hides_relationship_rows() {
	let dir = TempDir::new().unwrap();
	let config = load(dir.path(), "");
	assert!(config.rebac.is_none());

	let store = bootstrap(&config, schemas()).await.unwrap();
	assert_eq!(store.lifecycle().grace_period(), Duration::from_secs(3));
	seed_documents(&store).await;

	let records = store
		.query(&member_of("alice", ORG_A), Query::new(DOCUMENT))
		.await
		.unwrap()
		.into_records();
	assert!(records.is_empty());

	let everything = store
		.query(&AuthorizationContext::internal(), Query::new(DOCUMENT))
		.await
		.unwrap()
		.into_records();
	assert_eq!(everything.len(), 2);
}
