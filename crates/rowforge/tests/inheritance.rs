//! Table-per-type inheritance scenarios: one row per level, base rows
//! written first, derived rows deleted first.

mod common;

use common::MockConnection;
use rowforge::prelude::*;
use std::sync::Arc;

fn person_type() -> Arc<EntityType> {
    Arc::new(
        EntityType::new("Person", "People")
            .query_name("People")
            .key(DataProperty::new("id"))
            .property(DataProperty::new("name")),
    )
}

fn student_type() -> Arc<EntityType> {
    Arc::new(
        EntityType::new("Student", "Students")
            .query_name("Students")
            .property(DataProperty::new("grade"))
            .base(person_type()),
    )
}

#[test]
fn derived_insert_writes_base_row_first_with_shared_key() {
    let mut bags = vec![EntityBag::added(
        0,
        DynamicEntity::new()
            .with("id", 7i64)
            .with("name", "Ada")
            .with("grade", "A"),
        student_type(),
    )];

    let mut engine = SaveEngine::new(DatabaseKind::SqlServer);
    let mut conn = MockConnection::new().opened();

    let result = engine.save(&mut conn, &mut bags, SaveContext::new()).unwrap();

    // One row per level of the hierarchy.
    assert_eq!(result.affected_count(), 2);
    assert_eq!(
        conn.sql(),
        vec![
            "insert into [People] ([id], [name]) values (@id, @name)",
            "insert into [Students] ([grade], [id]) values (@grade, @id)",
        ]
    );
    // Both rows share the key value.
    assert_eq!(conn.bound(0, "id"), Some(&Value::BigInt(7)));
    assert_eq!(conn.bound(1, "id"), Some(&Value::BigInt(7)));
}

#[test]
fn derived_delete_removes_derived_row_first() {
    let mut bags = vec![EntityBag::deleted(
        0,
        DynamicEntity::new().with("id", 7i64),
        student_type(),
    )];

    let mut engine = SaveEngine::new(DatabaseKind::SqlServer);
    let mut conn = MockConnection::new().opened();

    let result = engine.save(&mut conn, &mut bags, SaveContext::new()).unwrap();

    assert_eq!(result.affected_count(), 2);
    assert_eq!(
        conn.sql(),
        vec![
            "delete from [Students] where [id] = @id",
            "delete from [People] where [id] = @id",
        ]
    );
}

#[test]
fn derived_update_touches_each_declaring_level() {
    let mut originals = std::collections::BTreeMap::new();
    originals.insert("name".to_string(), Value::Text("Ada".to_string()));
    originals.insert("grade".to_string(), Value::Text("B".to_string()));

    let mut bags = vec![EntityBag::modified(
        0,
        DynamicEntity::new()
            .with("id", 7i64)
            .with("name", "Ada L.")
            .with("grade", "A"),
        student_type(),
        originals,
    )];

    let mut engine = SaveEngine::new(DatabaseKind::SqlServer);
    let mut conn = MockConnection::new().opened();

    let result = engine.save(&mut conn, &mut bags, SaveContext::new()).unwrap();

    // The base level owns `name`, the derived level owns `grade`; base first.
    assert_eq!(result.affected_count(), 2);
    assert_eq!(
        conn.sql(),
        vec![
            "update [People] set [name] = @name where [id] = @id",
            "update [Students] set [grade] = @grade where [id] = @id",
        ]
    );
}

#[test]
fn derived_row_failure_rolls_back_base_insert() {
    let mut bags = vec![EntityBag::added(
        0,
        DynamicEntity::new()
            .with("id", 7i64)
            .with("name", "Ada")
            .with("grade", "A"),
        student_type(),
    )];

    let mut engine = SaveEngine::new(DatabaseKind::SqlServer);
    // The derived-table insert reports zero affected rows.
    let mut conn = MockConnection::new().opened().script_execute(1).script_execute(0);

    let err = engine
        .save(&mut conn, &mut bags, SaveContext::new())
        .unwrap_err();

    match err {
        Error::RowCount(e) => assert_eq!(e.table, "Students"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(conn.events, vec!["begin", "rollback"]);
}
