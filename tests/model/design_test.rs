use hda::model::{
    Aggregate, AggregateType, Cardinality, Column, ColumnType, Design, EntityKind, JoinKind,
    ModelError,
};

const GITFLIX: &str = include_str!("../fixtures/gitflix.design.json");

fn gitflix() -> Design {
    Design::from_json(GITFLIX).expect("fixture design loads")
}

#[test]
fn test_design_structure() {
    let design = gitflix();

    assert_eq!(design.name, "users");
    assert_eq!(design.tables().len(), 3);
    assert_eq!(design.joins().count(), 2);

    let table = design.get_table("streams").unwrap();
    assert_eq!(table.name, "streams");

    let join = design.get_join("episodes").unwrap();
    assert_eq!(join.name, "episodes");
    assert_eq!(join.relationship, Cardinality::ManyToOne);
    assert_eq!(join.kind, JoinKind::Left);
}

#[test]
fn test_tables_base_first() {
    let design = gitflix();
    let names: Vec<&str> = design.tables().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["users", "streams", "episodes"]);
}

#[test]
fn test_joins_in_declaration_order() {
    let design = Design::from_json(
        r#"{
        "name": "users",
        "table": {"name": "users", "columns": [{"name": "id"}]},
        "joins": [
            {"name": "zeta", "on": [{"left": "users.id", "right": "user_id"}],
             "table": {"name": "zeta", "columns": [{"name": "user_id"}]}},
            {"name": "alpha", "on": [{"left": "users.id", "right": "user_id"}],
             "table": {"name": "alpha", "columns": [{"name": "user_id"}]}}
        ]
    }"#,
    )
    .unwrap();

    let joins: Vec<&str> = design.joins().map(|j| j.name.as_str()).collect();
    assert_eq!(joins, vec!["zeta", "alpha"]);
}

#[test]
fn test_table_columns() {
    let design = gitflix();
    let mut table = design.get_table("streams").unwrap().clone();

    let keys: Vec<&str> = table
        .primary_keys()
        .unwrap()
        .iter()
        .map(|c| c.column_name())
        .collect();
    assert!(keys.contains(&"id"));
    assert!(table.columns().any(|c| c.alias() == "streams.month"));

    assert_eq!(table.columns().count(), 6);
    let month = table.get_column("month").unwrap().clone();
    let mut quarter = Column::new("streams", "quarter");
    quarter.copy_metadata(&month);
    table.add_column(quarter).unwrap();

    assert_eq!(table.columns().count(), 7);
    assert_eq!(
        table.get_column("quarter").unwrap().column_type,
        table.get_column("month").unwrap().column_type
    );
    assert_eq!(table.get_column("quarter").unwrap().column_type, ColumnType::Number);
}

#[test]
fn test_table_aggregates() {
    let design = gitflix();
    let mut table = design.get_table("streams").unwrap().clone();

    assert!(table.aggregates().any(|a| a.source_column() == "minutes"));
    assert!(table.aggregates().any(|a| a.column_alias() == "streams.id"));
    assert!(table.aggregates().any(|a| a.alias() == "streams.sum_minutes"));
    assert!(table.aggregates().any(|a| a.alias() == "streams.count_days"));
    assert!(table.aggregates().any(|a| a.column_name() == "sum_minutes"));

    assert_eq!(table.aggregates().count(), 3);
    let mut avg_price = Aggregate::new("streams", "avg_price", AggregateType::Avg);
    avg_price.label = "AVG Price".to_string();
    avg_price.description = Some("Average Price".to_string());
    avg_price.sql = "{{table}}.price".into();
    table.add_aggregate(avg_price).unwrap();
    assert_eq!(table.aggregates().count(), 4);
    assert_eq!(table.get_aggregate("avg_price").unwrap().source_column(), "price");
}

#[test]
fn test_duplicate_column_rejected() {
    let design = gitflix();
    let mut table = design.get_table("users").unwrap().clone();
    let err = table.add_column(Column::new("users", "gender")).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Duplicate {
            kind: EntityKind::Column,
            ..
        }
    ));
}

#[test]
fn test_unknown_names() {
    let design = gitflix();

    let err = design.get_table("ratings").unwrap_err();
    assert_eq!(err.to_string(), "table 'ratings' not found in design 'users'");

    let err = design.get_join("ratings").unwrap_err();
    assert!(matches!(
        err,
        ModelError::NotFound {
            kind: EntityKind::Join,
            ..
        }
    ));

    let users = design.base_table();
    assert!(users.get_column("email").is_err());
    assert!(users.get_aggregate("sum_minutes").is_err());
}

#[test]
fn test_labels() {
    let design = gitflix();
    let users = design.base_table();

    assert_eq!(users.get_aggregate("avg_age").unwrap().label, "Average Age");
    assert_eq!(users.get_column("gender").unwrap().label, "Gender");
    assert_eq!(
        design
            .get_table("episodes")
            .unwrap()
            .get_aggregate("avg_rating")
            .unwrap()
            .label,
        "Avg Rating"
    );
}

#[test]
fn test_physical_table_names() {
    let design = gitflix();
    let streams = design.get_table("streams").unwrap();
    assert_eq!(streams.sql_table_name.as_deref(), Some("gitflix.streams"));

    let table_ref = streams.table_ref();
    assert_eq!(table_ref.schema.as_deref(), Some("gitflix"));
    assert_eq!(table_ref.reference_name(), "streams");
}

#[test]
fn test_key_columns() {
    let design = gitflix();
    let join = design.get_join("episodes").unwrap();
    let keys = design.key_columns(join).unwrap();

    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].0.alias(), "streams.episode_id");
    assert_eq!(keys[0].1.alias(), "episodes.id");
}

#[test]
fn test_invalid_join_key_rejected() {
    let broken = GITFLIX.replace("\"right\": \"user_id\"", "\"right\": \"owner_id\"");
    let err = Design::from_json(&broken).unwrap_err();
    assert!(matches!(err, ModelError::Invalid { .. }));
    assert!(err.to_string().contains("streams"));
}

#[test]
fn test_malformed_document() {
    let err = Design::from_json("{\"name\": \"users\"}").unwrap_err();
    assert!(matches!(err, ModelError::Parse(_)));
}
