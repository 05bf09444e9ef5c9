//! Integration tests for import, export, reset and sequence reconciliation

mod common;

use common::{SqlMigrator, TestDb, DOCS_DDL, FAMILY_DDL, PLANS_DDL};
use nutrition_sync::error::SyncError;
use nutrition_sync::models::ModelRegistry;
use nutrition_sync::services::{
    Bootstrapper, PlanSource, ResetService, SchemaIntrospector, SequenceOutcome,
    SequenceReconciler, SkipReason,
};
use nutrition_sync_shared::LoadOrder;
use serde_json::json;
use tempfile::TempDir;

const PARENTS_CSV: &str = "id,name\n1,Ada\n3,Grace\n";
const CHILDREN_CSV: &str = "id,parent_id,name\n1,1,Lin\n3,3,Kim\n7,3,Max\n";

async fn family_db(name: &str) -> TestDb {
    let test_db = TestDb::new(name).await;
    test_db.execute(FAMILY_DDL).await;
    test_db
}

fn family_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    common::write_csv(dir.path(), "parents", PARENTS_CSV);
    common::write_csv(dir.path(), "children", CHILDREN_CSV);
    dir
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_import_loads_parents_before_children() {
    let test_db = family_db("import_order").await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, FAMILY_DDL);
    let dir = family_dir();

    let summary = test_db
        .service(&registry, &migrator)
        .import(dir.path())
        .await
        .unwrap();

    assert_eq!(summary.rows_for("parents"), Some(2));
    assert_eq!(summary.rows_for("children"), Some(3));
    assert_eq!(
        summary.processed.iter().map(|c| c.table.as_str()).collect::<Vec<_>>(),
        vec!["parents", "children"]
    );

    let orphans: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM \"{0}\".children c \
         LEFT JOIN \"{0}\".parents p ON p.id = c.parent_id WHERE p.id IS NULL",
        test_db.schema
    ))
    .fetch_one(test_db.pool())
    .await
    .unwrap();
    assert_eq!(orphans, 0);
    assert_eq!(migrator.runs(), 0);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_sequence_continues_after_highest_id() {
    let test_db = family_db("sequence_max").await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, FAMILY_DDL);
    let dir = family_dir();

    let summary = test_db
        .service(&registry, &migrator)
        .import(dir.path())
        .await
        .unwrap();

    let children = summary
        .sequences
        .iter()
        .find(|(table, _)| table == "children")
        .map(|(_, outcome)| outcome.clone());
    assert!(matches!(
        children,
        Some(SequenceOutcome::Reset { next_value: 8, .. })
    ));

    let next: i64 = sqlx::query_scalar(&format!(
        "SELECT nextval(pg_get_serial_sequence('\"{}\".\"children\"', 'id'))",
        test_db.schema
    ))
    .fetch_one(test_db.pool())
    .await
    .unwrap();
    assert_eq!(next, 8);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_empty_table_sequence_restarts() {
    let test_db = family_db("sequence_empty").await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, FAMILY_DDL);
    let dir = TempDir::new().unwrap();
    common::write_csv(dir.path(), "parents", PARENTS_CSV);
    common::write_csv(dir.path(), "children", "id,parent_id,name\n");

    let summary = test_db
        .service(&registry, &migrator)
        .import(dir.path())
        .await
        .unwrap();

    assert_eq!(summary.rows_for("children"), Some(0));
    let children = summary
        .sequences
        .iter()
        .find(|(table, _)| table == "children")
        .map(|(_, outcome)| outcome.clone());
    assert!(matches!(
        children,
        Some(SequenceOutcome::Reset { next_value: 1, .. })
    ));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_import_twice_is_idempotent() {
    let test_db = family_db("idempotent").await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, FAMILY_DDL);
    let dir = family_dir();
    let service = test_db.service(&registry, &migrator);

    service.import(dir.path()).await.unwrap();
    service.import(dir.path()).await.unwrap();

    assert_eq!(test_db.count("parents").await, 2);
    assert_eq!(test_db.count("children").await, 3);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_missing_csv_is_skipped() {
    let test_db = family_db("missing_csv").await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, FAMILY_DDL);
    let dir = TempDir::new().unwrap();
    common::write_csv(dir.path(), "parents", PARENTS_CSV);

    let summary = test_db
        .service(&registry, &migrator)
        .import(dir.path())
        .await
        .unwrap();

    assert_eq!(
        summary.skipped,
        vec![("children".to_string(), SkipReason::MissingCsv)]
    );
    assert_eq!(test_db.count("parents").await, 2);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_failed_table_rolls_back_and_stops() {
    let test_db = family_db("rollback").await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, FAMILY_DDL);
    let dir = TempDir::new().unwrap();
    common::write_csv(dir.path(), "parents", PARENTS_CSV);
    // parent 9 does not exist
    common::write_csv(dir.path(), "children", "id,parent_id,name\n1,1,Lin\n2,9,Kim\n");

    let err = test_db
        .service(&registry, &migrator)
        .import(dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Insert { ref table, .. } if table == "children"));
    assert_eq!(test_db.count("children").await, 0);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_export_then_import_round_trips() {
    let test_db = family_db("round_trip").await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, FAMILY_DDL);
    let service = test_db.service(&registry, &migrator);

    service.import(family_dir().path()).await.unwrap();

    let out = TempDir::new().unwrap();
    let summary = service.export(out.path()).await.unwrap();
    assert_eq!(summary.total_rows(), 5);

    let children = std::fs::read_to_string(out.path().join("children.csv")).unwrap();
    assert_eq!(children, CHILDREN_CSV);

    service.import(out.path()).await.unwrap();
    assert_eq!(test_db.count("parents").await, 2);
    assert_eq!(test_db.count("children").await, 3);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_json_column_round_trips() {
    let test_db = TestDb::new("json_round_trip").await;
    test_db.execute(DOCS_DDL).await;
    let registry = common::docs_registry();
    let migrator = SqlMigrator::new(&test_db, DOCS_DDL);
    let service = test_db.service(&registry, &migrator);

    let dir = TempDir::new().unwrap();
    common::write_csv(
        dir.path(),
        "docs",
        "id,payload,created_at\n\
         1,\"{\"\"b\"\": [1, 2], \"\"a\"\": 1}\",2024-01-01T00:00:00Z\n\
         2,,2024-01-02T00:00:00Z\n",
    );
    service.import(dir.path()).await.unwrap();

    let payload: serde_json::Value = sqlx::query_scalar(&format!(
        "SELECT payload FROM \"{}\".docs WHERE id = 1",
        test_db.schema
    ))
    .fetch_one(test_db.pool())
    .await
    .unwrap();
    assert_eq!(payload, json!({"a": 1, "b": [1, 2]}));

    let out = TempDir::new().unwrap();
    service.export(out.path()).await.unwrap();
    let exported = std::fs::read_to_string(out.path().join("docs.csv")).unwrap();
    assert_eq!(
        exported,
        "id,payload,created_at\n\
         1,\"{\"\"a\"\": 1, \"\"b\"\": [1, 2]}\",2024-01-01T00:00:00Z\n\
         2,,2024-01-02T00:00:00Z\n"
    );

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_cycle_fails_before_touching_data() {
    let test_db = TestDb::new("cycle").await;
    test_db
        .execute(
            r#"
            CREATE TABLE "{schema}".a (id SERIAL PRIMARY KEY, b_id INTEGER);
            CREATE TABLE "{schema}".b (id SERIAL PRIMARY KEY, a_id INTEGER REFERENCES "{schema}".a(id));
            ALTER TABLE "{schema}".a ADD FOREIGN KEY (b_id) REFERENCES "{schema}".b(id);
            INSERT INTO "{schema}".a (id) VALUES (1);
            "#,
        )
        .await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, "SELECT 1;");
    let dir = TempDir::new().unwrap();

    let err = test_db
        .service(&registry, &migrator)
        .import(dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Graph(_)));
    let message = err.to_string();
    assert!(message.contains("a, b"));
    assert_eq!(test_db.count("a").await, 1);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_truncate_with_empty_order_is_noop() {
    let test_db = family_db("empty_reset").await;
    ResetService::truncate_all(&test_db.db, &LoadOrder::default())
        .await
        .unwrap();
    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_empty_schema_is_migrated_then_loaded() {
    let test_db = TestDb::new("bootstrap").await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, FAMILY_DDL);

    let excluded = vec!["alembic_version".to_string()];
    let introspector = SchemaIntrospector::new(&test_db.db, &registry, &excluded);
    let plan = Bootstrapper::new(&introspector, &migrator, &[])
        .plan()
        .await
        .unwrap();

    assert_eq!(plan.source, PlanSource::Migrated);
    assert_eq!(plan.order.tables(), ["parents".to_string(), "children".to_string()]);
    assert_eq!(migrator.runs(), 1);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_fallback_without_tables_fails() {
    let test_db = TestDb::new("fallback").await;
    let registry = common::family_registry();
    // migrations that create nothing leave introspection empty
    let migrator = SqlMigrator::new(&test_db, "SELECT 1;");
    let fallback = vec!["parents".to_string(), "children".to_string()];

    let excluded: Vec<String> = vec![];
    let introspector = SchemaIntrospector::new(&test_db.db, &registry, &excluded);
    let err = Bootstrapper::new(&introspector, &migrator, &fallback)
        .plan()
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NoTables));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_rebuild_recreates_schema_and_loads() {
    let test_db = family_db("rebuild").await;
    test_db
        .execute("INSERT INTO \"{schema}\".parents (id, name) VALUES (42, 'stale');")
        .await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, FAMILY_DDL);

    let summary = test_db
        .service(&registry, &migrator)
        .rebuild(family_dir().path())
        .await
        .unwrap();

    assert_eq!(summary.total_rows(), 5);
    assert_eq!(migrator.runs(), 1);
    assert_eq!(test_db.count("parents").await, 2);

    test_db.cleanup().await;
}

const EXTRAS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS "{schema}".extras (
    id SERIAL PRIMARY KEY,
    note TEXT
);
"#;

#[tokio::test]
#[ignore = "requires database"]
async fn test_empty_required_json_cell_is_rejected() {
    let test_db = TestDb::new("required_json").await;
    test_db.execute(PLANS_DDL).await;
    let registry = common::plans_registry();
    let migrator = SqlMigrator::new(&test_db, PLANS_DDL);
    let dir = TempDir::new().unwrap();
    common::write_csv(
        dir.path(),
        "plans",
        "id,label,payload,created_at,updated_at\n\
         1,Cut,,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n",
    );

    let err = test_db
        .service(&registry, &migrator)
        .import(dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::InvalidValue { ref column, .. } if column == "payload"));
    assert!(err.to_string().contains("plans.payload"));
    let literal_nulls: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM \"{}\".plans WHERE payload::text = 'null'",
        test_db.schema
    ))
    .fetch_one(test_db.pool())
    .await
    .unwrap();
    assert_eq!(literal_nulls, 0);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_empty_string_in_required_text_round_trips() {
    let test_db = family_db("empty_string").await;
    test_db
        .execute("INSERT INTO \"{schema}\".parents (id, name) VALUES (1, '');")
        .await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, FAMILY_DDL);
    let service = test_db.service(&registry, &migrator);

    let out = TempDir::new().unwrap();
    service.export(out.path()).await.unwrap();
    let parents = std::fs::read_to_string(out.path().join("parents.csv")).unwrap();
    assert_eq!(parents, "id,name\n1,\n");

    service.import(out.path()).await.unwrap();
    let name: String = sqlx::query_scalar(&format!(
        "SELECT name FROM \"{}\".parents WHERE id = 1",
        test_db.schema
    ))
    .fetch_one(test_db.pool())
    .await
    .unwrap();
    assert_eq!(name, "");

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_export_skips_unmapped_table() {
    let test_db = family_db("export_unmapped").await;
    test_db.execute(EXTRAS_DDL).await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, FAMILY_DDL);
    let service = test_db.service(&registry, &migrator);
    service.import(family_dir().path()).await.unwrap();

    let out = TempDir::new().unwrap();
    let summary = service.export(out.path()).await.unwrap();

    assert!(summary
        .skipped
        .contains(&("extras".to_string(), SkipReason::Unmapped)));
    assert_eq!(summary.total_rows(), 5);
    assert!(!out.path().join("extras.csv").exists());
    assert!(out.path().join("children.csv").exists());

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_unmapped_table_with_csv_fails_before_truncate() {
    let test_db = family_db("import_unmapped").await;
    test_db.execute(EXTRAS_DDL).await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, FAMILY_DDL);
    let service = test_db.service(&registry, &migrator);
    service.import(family_dir().path()).await.unwrap();

    let dir = family_dir();
    common::write_csv(dir.path(), "extras", "id,note\n1,hello\n");
    let err = service.import(dir.path()).await.unwrap_err();

    assert!(matches!(err, SyncError::UnmappedTable(ref table) if table == "extras"));
    assert_eq!(test_db.count("parents").await, 2);
    assert_eq!(test_db.count("children").await, 3);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_unknown_header_fails_before_truncate() {
    let test_db = family_db("import_bad_header").await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, FAMILY_DDL);
    let service = test_db.service(&registry, &migrator);
    service.import(family_dir().path()).await.unwrap();

    let dir = TempDir::new().unwrap();
    common::write_csv(dir.path(), "parents", PARENTS_CSV);
    common::write_csv(dir.path(), "children", "id,parent_id,nickname\n1,1,Lin\n");
    let err = service.import(dir.path()).await.unwrap_err();

    assert!(matches!(err, SyncError::UnknownColumn { ref column, .. } if column == "nickname"));
    assert_eq!(test_db.count("children").await, 3);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_fallback_keeps_existing_subset() {
    let test_db = TestDb::new("fallback_subset").await;
    test_db
        .execute(r#"CREATE TABLE "{schema}".parents (id SERIAL PRIMARY KEY, name TEXT NOT NULL);"#)
        .await;
    let registry = common::family_registry();
    let migrator = SqlMigrator::new(&test_db, "SELECT 1;");
    let fallback = vec!["parents".to_string(), "children".to_string()];

    // hidden from introspection, still visible to the existence check
    let excluded = vec!["parents".to_string()];
    let introspector = SchemaIntrospector::new(&test_db.db, &registry, &excluded);
    let plan = Bootstrapper::new(&introspector, &migrator, &fallback)
        .plan()
        .await
        .unwrap();

    assert_eq!(plan.source, PlanSource::Fallback);
    assert_eq!(plan.order.tables(), ["parents".to_string()]);
    assert_eq!(
        plan.table("parents").map(|t| t.columns.clone()),
        Some(vec!["id".to_string(), "name".to_string()])
    );
    assert_eq!(migrator.runs(), 1);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_sequence_failure_does_not_stop_other_tables() {
    let test_db = TestDb::new("sequence_outcomes").await;
    test_db
        .execute(
            r#"
            CREATE TABLE "{schema}".capped (id SERIAL PRIMARY KEY);
            ALTER SEQUENCE "{schema}".capped_id_seq MAXVALUE 5;
            INSERT INTO "{schema}".capped (id) VALUES (9);
            CREATE TABLE "{schema}".manual (id INTEGER PRIMARY KEY);
            CREATE TABLE "{schema}".counted (id SERIAL PRIMARY KEY);
            INSERT INTO "{schema}".counted (id) VALUES (4);
            CREATE TABLE "{schema}".untracked (name TEXT);
            "#,
        )
        .await;
    let registry = ModelRegistry::empty();
    let excluded: Vec<String> = vec![];
    let snapshot = SchemaIntrospector::new(&test_db.db, &registry, &excluded)
        .snapshot()
        .await
        .unwrap();
    let tables = ["capped", "manual", "counted", "untracked"]
        .into_iter()
        .map(|name| snapshot.table(name).unwrap());

    let outcomes = SequenceReconciler::new(&test_db.db)
        .reconcile_all(tables)
        .await;

    let names: Vec<&str> = outcomes.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(names, ["capped", "manual", "counted", "untracked"]);
    assert!(matches!(outcomes[0].1, SequenceOutcome::Failed(_)));
    assert!(matches!(outcomes[1].1, SequenceOutcome::NotSequenceBacked));
    assert!(matches!(
        outcomes[2].1,
        SequenceOutcome::Reset { next_value: 5, .. }
    ));
    assert!(matches!(outcomes[3].1, SequenceOutcome::NoIdentity));

    test_db.cleanup().await;
}
