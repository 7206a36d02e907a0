use hda::error::{HdaError, StructuralError, ValidationError};
use hda::model::{Design, EntityKind};
use hda::query::{JoinRequest, Query, QueryRequest};
use hda::sql::SortDir;

const GITFLIX: &str = include_str!("../fixtures/gitflix.design.json");

const PAYLOAD: &str = r#"
{
 "run":true,
 "table":"users",
 "columns":["gender"],
 "aggregates":["count", "avg_age", "sum_clv"],
 "timeframes":[],
 "joins":[
  {"name":"streams","columns":["day", "month", "year"],"aggregates":["count", "sum_minutes", "count_days"]},
  {"name":"episodes","columns":["tv_series"],"aggregates":["count", "avg_rating"]}
 ],
 "order":null,
 "limit":"50",
 "filters":{}
}
"#;

fn gitflix() -> Design {
    Design::from_json(GITFLIX).expect("fixture design loads")
}

#[test]
fn test_join_order_follows_payload() {
    let design = gitflix();
    let request = QueryRequest::from_json(PAYLOAD).unwrap();
    let query = Query::new(&design, &request).unwrap();

    assert_eq!(query.design.name, "users");
    assert_eq!(query.tables.len(), 3);
    assert_eq!(query.join_order.len(), 3);
    assert_eq!(query.join_order[0].table, "users");
    assert!(query.join_order[0].is_base());
    assert_eq!(query.join_order[1].table, "streams");
    assert_eq!(query.join_order[2].table, "episodes");
    assert_eq!(query.limit, Some(50));
    assert!(query.order.is_none());
    assert!(query.fans_out());
}

#[test]
fn test_tables_parallel_to_join_order() {
    let design = gitflix();
    let request = QueryRequest::new("users")
        .with_columns(&["gender"])
        .with_join(JoinRequest::new("streams"))
        .with_join(JoinRequest::new("episodes").with_columns(&["title"]));
    let query = Query::new(&design, &request).unwrap();

    for (table, entry) in query.tables.iter().zip(&query.join_order) {
        assert_eq!(table.name, entry.table);
    }
    assert!(query.join_order[1].columns.is_empty());
    assert_eq!(query.join_order[2].columns[0].alias(), "episodes.title");
}

#[test]
fn test_repeated_names_dropped() {
    let design = gitflix();
    let request = QueryRequest::new("users")
        .with_columns(&["gender", "gender"])
        .with_aggregates(&["count", "count"]);
    let query = Query::new(&design, &request).unwrap();

    assert_eq!(query.base().columns.len(), 1);
    assert_eq!(query.base().aggregates.len(), 1);
}

#[test]
fn test_timeframe_periods() {
    let design = gitflix();
    let request = QueryRequest::from_json(
        r#"{"table": "users", "timeframes": [{"name": "created_at", "periods": ["month", "year"]}]}"#,
    )
    .unwrap();
    let query = Query::new(&design, &request).unwrap();

    let names: Vec<&str> = query.dimensions().map(|c| c.column_name()).collect();
    assert_eq!(names, vec!["created_at_month", "created_at_year"]);
    assert_eq!(query.base().columns[0].label, "Created At Month");
}

#[test]
fn test_timeframe_without_periods_is_raw() {
    let design = gitflix();
    let request =
        QueryRequest::from_json(r#"{"table": "users", "timeframes": [{"name": "created_at"}]}"#)
            .unwrap();
    let query = Query::new(&design, &request).unwrap();

    let column = &query.base().columns[0];
    assert_eq!(column.alias(), "users.created_at");
    assert!(column.period.is_none());
}

#[test]
fn test_unsupported_period() {
    let design = gitflix();
    let request = QueryRequest::from_json(
        r#"{"table": "users", "timeframes": [{"name": "created_at", "periods": ["hour"]}]}"#,
    )
    .unwrap();
    let err = Query::new(&design, &request).unwrap_err();
    assert!(matches!(
        err,
        HdaError::NotFound {
            kind: EntityKind::Period,
            ..
        }
    ));
}

#[test]
fn test_wrong_base_table() {
    let design = gitflix();
    let request = QueryRequest::new("streams").with_columns(&["day"]);
    let err = Query::new(&design, &request).unwrap_err();
    assert!(matches!(
        err,
        HdaError::NotFound {
            kind: EntityKind::Table,
            ref name,
            ..
        } if name == "streams"
    ));
}

#[test]
fn test_unknown_join() {
    let design = gitflix();
    let request = QueryRequest::new("users")
        .with_columns(&["gender"])
        .with_join(JoinRequest::new("ratings"));
    let err = Query::new(&design, &request).unwrap_err();
    assert_eq!(err.to_string(), "join 'ratings' not found in design 'users'");
}

#[test]
fn test_unknown_column_and_aggregate() {
    let design = gitflix();

    let request = QueryRequest::new("users").with_columns(&["email"]);
    let err = Query::new(&design, &request).unwrap_err();
    assert!(matches!(
        err,
        HdaError::NotFound {
            kind: EntityKind::Column,
            ..
        }
    ));

    let request = QueryRequest::new("users")
        .with_join(JoinRequest::new("streams").with_aggregates(&["avg_rating"]));
    let err = Query::new(&design, &request).unwrap_err();
    assert!(matches!(
        err,
        HdaError::NotFound {
            kind: EntityKind::Aggregate,
            ..
        }
    ));
}

#[test]
fn test_empty_request() {
    let design = gitflix();
    let request = QueryRequest::new("users").with_join(JoinRequest::new("streams"));
    let err = Query::new(&design, &request).unwrap_err();
    assert!(matches!(
        err,
        HdaError::Validation(ValidationError::EmptyRequest)
    ));
}

#[test]
fn test_duplicate_join() {
    let design = gitflix();
    let request = QueryRequest::new("users")
        .with_columns(&["gender"])
        .with_join(JoinRequest::new("streams"))
        .with_join(JoinRequest::new("streams"));
    let err = Query::new(&design, &request).unwrap_err();
    assert!(matches!(
        err,
        HdaError::Validation(ValidationError::DuplicateJoin(ref name)) if name == "streams"
    ));
}

#[test]
fn test_join_out_of_order() {
    let design = gitflix();
    let request = QueryRequest::new("users")
        .with_columns(&["gender"])
        .with_join(JoinRequest::new("episodes"))
        .with_join(JoinRequest::new("streams"));
    let err = Query::new(&design, &request).unwrap_err();
    assert!(matches!(
        err,
        HdaError::Structural(StructuralError::JoinOutOfOrder { ref join, ref requires })
            if join == "episodes" && requires == "streams"
    ));
}

#[test]
fn test_order_resolution() {
    let design = gitflix();

    // bare names search the base table first
    let request = QueryRequest::from_json(
        r#"{"table": "users", "aggregates": ["count"],
            "joins": [{"name": "streams", "aggregates": ["count"]}],
            "order": "count"}"#,
    )
    .unwrap();
    let query = Query::new(&design, &request).unwrap();
    let order = query.order.unwrap();
    assert_eq!(order.alias, "users.count");
    assert_eq!(order.direction, SortDir::Asc);

    let request = QueryRequest::from_json(
        r#"{"table": "users", "aggregates": ["count"],
            "joins": [{"name": "streams", "aggregates": ["count"]}],
            "order": {"column": "streams.count", "direction": "desc"}}"#,
    )
    .unwrap();
    let query = Query::new(&design, &request).unwrap();
    let order = query.order.unwrap();
    assert_eq!(order.alias, "streams.count");
    assert_eq!(order.direction, SortDir::Desc);
}

#[test]
fn test_unknown_order() {
    let design = gitflix();
    let request =
        QueryRequest::from_json(r#"{"table": "users", "columns": ["gender"], "order": "age"}"#)
            .unwrap();
    let err = Query::new(&design, &request).unwrap_err();
    assert!(matches!(
        err,
        HdaError::Validation(ValidationError::UnknownOrder(ref name)) if name == "age"
    ));
}

#[test]
fn test_invalid_limit() {
    let design = gitflix();
    for limit in [r#""fifty""#, "0", "-3"] {
        let json = format!(
            r#"{{"table": "users", "columns": ["gender"], "limit": {}}}"#,
            limit
        );
        let request = QueryRequest::from_json(&json).unwrap();
        let err = Query::new(&design, &request).unwrap_err();
        assert!(
            matches!(err, HdaError::Validation(ValidationError::InvalidLimit(_))),
            "limit {} should be rejected",
            limit
        );
    }
}

#[test]
fn test_filter_outside_query() {
    let design = gitflix();
    let request = QueryRequest::from_json(
        r#"{"table": "users", "columns": ["gender"],
            "filters": {"columns": [
                {"table_name": "episodes", "key": "title", "expression": "equal_to", "value": "Pilot"}
            ]}}"#,
    )
    .unwrap();
    let err = Query::new(&design, &request).unwrap_err();
    assert!(matches!(
        err,
        HdaError::Validation(ValidationError::FilterOutsideQuery { ref table }) if table == "episodes"
    ));
}

#[test]
fn test_filter_on_unrequested_aggregate() {
    let design = gitflix();
    let request = QueryRequest::from_json(
        r#"{"table": "users", "columns": ["gender"], "aggregates": ["count"],
            "filters": {"aggregates": [
                {"table_name": "users", "key": "sum_clv", "expression": "greater_than", "value": 10}
            ]}}"#,
    )
    .unwrap();
    let err = Query::new(&design, &request).unwrap_err();
    assert!(matches!(
        err,
        HdaError::Validation(ValidationError::UnrequestedAggregate(ref alias)) if alias == "users.sum_clv"
    ));
}

#[test]
fn test_filters_resolved() {
    let design = gitflix();
    let request = QueryRequest::from_json(
        r#"{"table": "users", "columns": ["gender"], "aggregates": ["count"],
            "filters": {
                "columns": [{"table_name": "users", "key": "age", "expression": "greater_or_equal_than", "value": 18}],
                "aggregates": [{"table_name": "users", "key": "count", "expression": "greater_than", "value": 5}]
            }}"#,
    )
    .unwrap();
    let query = Query::new(&design, &request).unwrap();
    assert_eq!(query.column_filters.len(), 1);
    assert_eq!(query.aggregate_filters.len(), 1);
}
