use hda::compile::{compile, CompileOptions};
use hda::error::{HdaError, StructuralError};
use hda::model::Design;
use hda::planner::HdaPlanner;
use hda::query::{JoinRequest, Query, QueryRequest};
use hda::sql::validate::validate_sql;
use hda::sql::Dialect;

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

fn compile_request(design: &Design, json: &str) -> hda::HdaOutput {
    let request = QueryRequest::from_json(json).unwrap();
    compile(design, &request, &CompileOptions::default()).unwrap()
}

#[test]
fn test_hda_query() {
    let design = gitflix();
    let request = QueryRequest::from_json(PAYLOAD).unwrap();
    let query = Query::new(&design, &request).unwrap();

    assert_eq!(query.design.name, "users");
    assert_eq!(query.tables.len(), 3);
    assert_eq!(query.join_order.len(), 3);
    assert_eq!(query.join_order[2].table, "episodes");

    let output = query.hda_query().unwrap();
    assert!(output.column_headers.contains(&"Average Age".to_string()));
    assert!(output.column_names.contains(&"sum_minutes".to_string()));
    assert!(output.aggregate_columns.contains(&"users.sum_clv".to_string()));

    let sql = &output.sql;
    assert!(sql.contains("WITH base_join AS (SELECT"));
    assert!(sql.contains("base_streams AS (SELECT DISTINCT"));
    assert!(sql.contains("users_stats AS ("));
    assert!(sql.contains(r#"COALESCE(AVG("episodes.rating"),0)"#));
    assert!(sql.contains(r#"COALESCE(COUNT("users.id"),0)"#));
    assert!(sql.contains(r#"COALESCE(SUM("users.clv"),0)"#));
    assert!(sql.contains(r#"SELECT * FROM "result""#));
}

#[test]
fn test_shared_attribute_fetched_once() {
    // streams.day is both a dimension and the input of count_days
    let design = gitflix();
    let output = compile_request(&design, PAYLOAD);

    assert_eq!(output.sql.matches(r#""streams"."day" "streams.day""#).count(), 1);
    assert!(output.sql.contains(r#"COALESCE(COUNT("streams.day"),0) "streams.count_days""#));
}

#[test]
fn test_result_columns() {
    let design = gitflix();
    let output = compile_request(&design, PAYLOAD);

    assert_eq!(
        output.column_names,
        vec![
            "gender",
            "day",
            "month",
            "year",
            "tv_series",
            "count",
            "avg_age",
            "sum_clv",
            "count",
            "sum_minutes",
            "count_days",
            "count",
            "avg_rating",
        ]
    );
    assert_eq!(output.column_headers.len(), output.column_names.len());
    assert_eq!(output.column_headers[4], "TV Series");
    assert_eq!(output.column_headers[9], "Minutes Watched");
    assert_eq!(
        output.aggregate_columns,
        vec![
            "users.count",
            "users.avg_age",
            "users.sum_clv",
            "streams.count",
            "streams.sum_minutes",
            "streams.count_days",
            "episodes.count",
            "episodes.avg_rating",
        ]
    );
}

#[test]
fn test_stage_order() {
    let design = gitflix();
    let request = QueryRequest::from_json(PAYLOAD).unwrap();
    let query = Query::new(&design, &request).unwrap();
    let options = CompileOptions::default();
    let statement = HdaPlanner::new(&query, &options).plan().unwrap();

    let stages: Vec<&str> = statement.cte_names().collect();
    assert_eq!(
        stages,
        vec![
            "base_join",
            "base_users",
            "base_streams",
            "base_episodes",
            "users_stats",
            "streams_stats",
            "episodes_stats",
            "result",
        ]
    );
}

#[test]
fn test_base_join_shape() {
    let design = gitflix();
    let output = compile_request(&design, PAYLOAD);
    let sql = &output.sql;

    assert!(sql.contains(
        r#"FROM "gitflix"."users" "users" LEFT JOIN "gitflix"."streams" "streams" ON "users"."id" = "streams"."user_id" LEFT JOIN "gitflix"."episodes" "episodes" ON "streams"."episode_id" = "episodes"."id""#
    ));
    assert_eq!(sql.matches(r#""users"."id" "users.id""#).count(), 1);
    assert!(sql.contains(r#""streams"."minutes" "streams.minutes""#));
}

#[test]
fn test_staging_keeps_identity() {
    let design = gitflix();
    let output = compile_request(&design, PAYLOAD);

    assert!(output.sql.contains(
        r#"base_users AS (SELECT DISTINCT "users.gender","streams.day","streams.month","streams.year","episodes.tv_series","users.id","users.age","users.clv" FROM "base_join")"#
    ));
    assert!(output.sql.contains(
        r#"base_streams AS (SELECT DISTINCT "users.gender","streams.day","streams.month","streams.year","episodes.tv_series","streams.id","streams.minutes","streams.user_id","streams.episode_id" FROM "base_join")"#
    ));
}

#[test]
fn test_result_joins_on_dimensions() {
    let design = gitflix();
    let output = compile_request(
        &design,
        r#"{"table": "users", "columns": ["gender"], "aggregates": ["count"],
            "joins": [{"name": "streams", "aggregates": ["sum_minutes"]}]}"#,
    );

    assert!(output.sql.contains(
        r#"result AS (SELECT "users_stats"."users.gender" "users.gender","users_stats"."users.count" "users.count","streams_stats"."streams.sum_minutes" "streams.sum_minutes" FROM "users_stats" INNER JOIN "streams_stats" ON "users_stats"."users.gender" IS NOT DISTINCT FROM "streams_stats"."users.gender")"#
    ));
}

#[test]
fn test_single_table_snapshot() {
    let design = gitflix();
    let output = compile_request(
        &design,
        r#"{"table": "users", "columns": ["gender"], "aggregates": ["count"]}"#,
    );

    insta::assert_snapshot!(output.sql, @r#"
    WITH base_join AS (SELECT "users"."gender" "users.gender","users"."id" "users.id" FROM "gitflix"."users" "users"),
    users_stats AS (SELECT "users.gender",COALESCE(COUNT("users.id"),0) "users.count" FROM "base_join" GROUP BY "users.gender"),
    result AS (SELECT "users_stats"."users.gender" "users.gender","users_stats"."users.count" "users.count" FROM "users_stats")
    SELECT * FROM "result"
    "#);
}

#[test]
fn test_aggregates_without_dimensions() {
    let design = gitflix();
    let output = compile_request(
        &design,
        r#"{"table": "users", "aggregates": ["count"],
            "joins": [{"name": "streams", "aggregates": ["count"]}]}"#,
    );

    assert!(output.sql.contains(
        r#"users_stats AS (SELECT COALESCE(COUNT("users.id"),0) "users.count" FROM "base_users")"#
    ));
    assert!(output
        .sql
        .contains(r#"FROM "users_stats" CROSS JOIN "streams_stats")"#));
    assert!(!output.sql.contains("GROUP BY"));
}

#[test]
fn test_dimensions_without_aggregates() {
    let design = gitflix();
    let output = compile_request(
        &design,
        r#"{"table": "users", "columns": ["gender"],
            "joins": [{"name": "streams", "columns": ["day"]}]}"#,
    );

    assert!(output.sql.contains(
        r#"result AS (SELECT "users.gender","streams.day" FROM "base_join" GROUP BY "users.gender","streams.day")"#
    ));
    assert!(!output.sql.contains("_stats"));
    assert!(output.aggregate_columns.is_empty());
}

#[test]
fn test_no_fan_out_skips_staging() {
    let design = gitflix();
    let output = compile_request(
        &design,
        r#"{"table": "users", "columns": ["gender"], "aggregates": ["count", "avg_age"]}"#,
    );

    assert!(!output.sql.contains("SELECT DISTINCT"));
    assert!(output.sql.contains(r#"FROM "base_join" GROUP BY "users.gender""#));
}

#[test]
fn test_many_to_one_target_is_staged() {
    let design = Design::from_json(
        r#"{
        "name": "orders",
        "table": {
            "name": "orders",
            "primary_key": ["id"],
            "columns": [{"name": "id"}, {"name": "customer_id"}, {"name": "status"}],
            "aggregates": [{"name": "total", "type": "sum", "sql": "{{table}}.amount"}]
        },
        "joins": [{
            "name": "customers",
            "relationship": "many_to_one",
            "on": [{"left": "orders.customer_id", "right": "id"}],
            "table": {
                "name": "customers",
                "primary_key": ["id"],
                "columns": [{"name": "id"}, {"name": "country"}],
                "aggregates": [{"name": "count", "type": "count", "sql": "{{table}}.id"}]
            }
        }]
    }"#,
    )
    .unwrap();

    let output = compile_request(
        &design,
        r#"{"table": "orders", "columns": ["status"], "aggregates": ["total"],
            "joins": [{"name": "customers", "aggregates": ["count"]}]}"#,
    );

    assert!(!output.sql.contains("base_orders"));
    assert!(output.sql.contains(r#"orders_stats AS (SELECT "orders.status",COALESCE(SUM("orders.amount"),0) "orders.total" FROM "base_join""#));
    assert!(output.sql.contains(
        r#"base_customers AS (SELECT DISTINCT "orders.status","customers.id" FROM "base_join")"#
    ));
    assert!(output.sql.contains(r#"FROM "base_customers" GROUP BY "orders.status""#));
}

#[test]
fn test_inner_join_kind() {
    let design = Design::from_json(&GITFLIX.replacen("\"kind\": \"left\"", "\"kind\": \"inner\"", 1))
        .unwrap();
    let output = compile_request(
        &design,
        r#"{"table": "users", "columns": ["gender"],
            "joins": [{"name": "streams", "columns": ["day"]}]}"#,
    );

    assert!(output
        .sql
        .contains(r#"INNER JOIN "gitflix"."streams" "streams" ON "users"."id" = "streams"."user_id""#));
}

#[test]
fn test_timeframes() {
    let design = gitflix();
    let output = compile_request(
        &design,
        r#"{"table": "users", "aggregates": ["count"],
            "timeframes": [{"name": "created_at", "periods": ["date", "month"]}]}"#,
    );

    assert!(output.sql.contains(
        r#"CAST("users"."created_at" AS DATE) "users.created_at_date",EXTRACT(MONTH FROM "users"."created_at") "users.created_at_month""#
    ));
    assert_eq!(
        output.column_names,
        vec!["created_at_date", "created_at_month", "count"]
    );
    assert_eq!(
        output.column_headers,
        vec!["Created At Date", "Created At Month", "Count"]
    );
}

#[test]
fn test_filters() {
    let design = gitflix();
    let output = compile_request(
        &design,
        r#"{"table": "users", "columns": ["gender"], "aggregates": ["count"],
            "joins": [{"name": "streams"}, {"name": "episodes", "columns": ["tv_series"]}],
            "filters": {
                "columns": [
                    {"table_name": "users", "key": "age", "expression": "greater_or_equal_than", "value": 18},
                    {"table_name": "episodes", "key": "title", "expression": "like", "value": "O'Brien%"}
                ],
                "aggregates": [
                    {"table_name": "users", "key": "count", "expression": "greater_than", "value": 5}
                ]
            }}"#,
    );

    assert!(output.sql.contains(
        r#"WHERE "users"."age" >= 18 AND "episodes"."title" LIKE 'O''Brien%'),"#
    ));
    assert!(output
        .sql
        .ends_with(r#"SELECT * FROM "result" WHERE "users.count" > 5"#));
}

#[test]
fn test_null_filters() {
    let design = gitflix();
    let output = compile_request(
        &design,
        r#"{"table": "users", "columns": ["gender"],
            "filters": {"columns": [{"table_name": "users", "key": "gender", "expression": "is_not_null"}]}}"#,
    );

    assert!(output.sql.contains(r#"WHERE "users"."gender" IS NOT NULL)"#));
}

#[test]
fn test_order_and_limit() {
    let design = gitflix();
    let request = QueryRequest::from_json(
        r#"{"table": "users", "columns": ["gender"], "aggregates": ["count"],
            "order": {"column": "count", "direction": "desc"}, "limit": 10}"#,
    )
    .unwrap();

    let ansi = compile(&design, &request, &CompileOptions::default()).unwrap();
    assert!(ansi
        .sql
        .ends_with(r#"SELECT * FROM "result" ORDER BY "users.count" DESC FETCH FIRST 10 ROWS ONLY"#));

    let postgres = compile(
        &design,
        &request,
        &CompileOptions::default().with_dialect(Dialect::Postgres),
    )
    .unwrap();
    assert!(postgres
        .sql
        .ends_with(r#"SELECT * FROM "result" ORDER BY "users.count" DESC LIMIT 10"#));
}

#[test]
fn test_limit_capped() {
    let design = gitflix();
    let request = QueryRequest::from_json(PAYLOAD).unwrap();
    let options = CompileOptions::default()
        .with_dialect(Dialect::DuckDb)
        .with_max_limit(20);
    let output = compile(&design, &request, &options).unwrap();
    assert!(output.sql.ends_with(r#"SELECT * FROM "result" LIMIT 20"#));

    let request = QueryRequest::new("users").with_columns(&["gender"]);
    let options = CompileOptions::default()
        .with_dialect(Dialect::DuckDb)
        .with_default_limit(100);
    let output = compile(&design, &request, &options).unwrap();
    assert!(output.sql.ends_with(r#"SELECT * FROM "result" LIMIT 100"#));
}

#[test]
fn test_sql_parses_in_every_dialect() {
    let design = gitflix();
    let requests = [
        PAYLOAD,
        r#"{"table": "users", "aggregates": ["count"],
            "timeframes": [{"name": "created_at", "periods": ["date", "week", "year"]}],
            "joins": [{"name": "streams", "aggregates": ["count"]}],
            "order": "count", "limit": 5}"#,
        r#"{"table": "users", "columns": ["gender"],
            "joins": [{"name": "streams", "columns": ["day"]}],
            "filters": {"columns": [{"table_name": "streams", "key": "year", "expression": "equal_to", "value": 2019}]}}"#,
    ];

    for dialect in Dialect::all() {
        for json in requests {
            let request = QueryRequest::from_json(json).unwrap();
            let options = CompileOptions::default().with_dialect(dialect);
            let output = compile(&design, &request, &options).unwrap();
            if let Err(e) = validate_sql(&output.sql, dialect) {
                panic!("{} SQL does not parse: {}\n{}", dialect, e, output.sql);
            }
        }
    }
}

#[test]
fn test_staged_table_needs_primary_key() {
    let design = Design::from_json(&GITFLIX.replacen("\"primary_key\": [\"id\"],", "", 1)).unwrap();
    let request = QueryRequest::new("users")
        .with_aggregates(&["count"])
        .with_join(JoinRequest::new("streams").with_columns(&["day"]));
    let err = Query::new(&design, &request)
        .unwrap()
        .hda_query()
        .unwrap_err();
    assert!(matches!(
        err,
        HdaError::Structural(StructuralError::MissingPrimaryKey(ref table)) if table == "users"
    ));
}

#[test]
fn test_output_serializes() {
    let design = gitflix();
    let output = compile_request(
        &design,
        r#"{"table": "users", "columns": ["gender"], "aggregates": ["avg_age"]}"#,
    );

    let value = serde_json::to_value(&output).unwrap();
    assert_eq!(value["dialect"], "ansi");
    assert_eq!(value["column_headers"][1], "Average Age");
    assert_eq!(value["aggregate_columns"][0], "users.avg_age");
    assert!(value["sql"].as_str().unwrap().starts_with("WITH base_join AS ("));
}

#[test]
fn test_aggregate_input_shadowed_by_dimension() {
    // the dimension `day` is a cast while `count_days` reads the raw column
    let design = Design::from_json(&GITFLIX.replacen(
        r#"{"name": "day", "type": "number"}"#,
        r#"{"name": "day", "type": "date", "sql": "CAST({{table}}.day AS DATE)"}"#,
        1,
    ))
    .unwrap();
    let output = compile_request(
        &design,
        r#"{"table": "users", "columns": ["gender"],
            "joins": [{"name": "streams", "columns": ["day"], "aggregates": ["count_days"]}]}"#,
    );
    let sql = &output.sql;

    assert!(sql.contains(r#"CAST("streams"."day" AS DATE) "streams.day""#));
    assert!(sql.contains(r#""streams"."day" "streams.count_days_input""#));
    assert!(sql.contains(
        r#"base_streams AS (SELECT DISTINCT "users.gender","streams.day","streams.count_days_input","#
    ));
    assert!(sql.contains(
        r#"COALESCE(COUNT("streams.count_days_input"),0) "streams.count_days" FROM "base_streams""#
    ));
    assert_eq!(output.column_names, vec!["gender", "day", "count_days"]);
    validate_sql(sql, Dialect::Ansi).unwrap();
}

#[test]
fn test_every_aggregate_coalesced() {
    let design = Design::from_json(
        r#"{
        "name": "orders",
        "table": {
            "name": "orders",
            "primary_key": ["id"],
            "columns": [{"name": "id"}, {"name": "status"}, {"name": "customer_id"}],
            "aggregates": [
                {"name": "count", "type": "count", "sql": "{{table}}.id"},
                {"name": "customers", "type": "count_distinct", "sql": "{{table}}.customer_id"},
                {"name": "total", "type": "sum", "sql": "{{table}}.amount"},
                {"name": "average", "type": "avg", "sql": "{{table}}.amount"},
                {"name": "smallest", "type": "min", "sql": "{{table}}.amount"},
                {"name": "largest", "type": "max", "sql": "{{table}}.price * {{table}}.quantity"}
            ]
        },
        "joins": [{
            "name": "items",
            "on": [{"left": "orders.id", "right": "order_id"}],
            "table": {
                "name": "items",
                "primary_key": ["id"],
                "columns": [{"name": "id"}, {"name": "order_id"}],
                "aggregates": [{"name": "count", "type": "count", "sql": "{{table}}.id"}]
            }
        }]
    }"#,
    )
    .unwrap();
    let output = compile_request(
        &design,
        r#"{"table": "orders", "columns": ["status"],
            "aggregates": ["count", "customers", "total", "average", "smallest", "largest"],
            "joins": [{"name": "items", "aggregates": ["count"]}]}"#,
    );
    let sql = &output.sql;

    assert_eq!(output.aggregate_columns.len(), 7);
    for alias in &output.aggregate_columns {
        let item = format!(r#"),0) "{}""#, alias);
        assert_eq!(sql.matches(&item).count(), 1, "{} is not coalesced", alias);
    }
    assert!(sql.contains(r#"COALESCE(COUNT(DISTINCT "orders.customer_id"),0) "orders.customers""#));
    assert!(sql.contains(r#"COALESCE(MIN("orders.amount"),0) "orders.smallest""#));
    assert!(sql.contains(r#"COALESCE(MAX("orders.largest_input"),0) "orders.largest""#));

    for function in ["COUNT(", "SUM(", "AVG(", "MIN(", "MAX("] {
        for (at, _) in sql.match_indices(function) {
            assert!(
                sql[..at].ends_with("COALESCE("),
                "bare {} at byte {}:\n{}",
                function,
                at,
                sql
            );
        }
    }
}
