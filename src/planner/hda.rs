//! HDA generation: one fan-out safe statement built from staged CTEs.
//!
//! ```text
//! base_join     every needed attribute, joined once
//! base_<table>  SELECT DISTINCT per table whose rows a join may repeat
//! <table>_stats aggregates of one table, grouped by every dimension
//! result        stats CTEs joined back together on the dimensions
//! SELECT * FROM "result"
//! ```

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use serde::Serialize;

use crate::compile::CompileOptions;
use crate::error::{HdaResult, StructuralError};
use crate::model::{Aggregate, Cardinality, Column};
use crate::query::attributes::{Attribute, AttributeRole, AttributeSet};
use crate::query::resolve::{JoinOrderEntry, Query};
use crate::sql::dialect::Dialect;
use crate::sql::expr::{and_all, col, table_col, Expr, ExprExt};
use crate::sql::query::{Cte, JoinType, OrderByExpr, Query as SqlQuery, SelectExpr, SortDir, TableRef};

const BASE_JOIN: &str = "base_join";
const RESULT: &str = "result";

/// Compiled statement and the result columns it produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HdaOutput {
    pub sql: String,
    /// Human labels, in result order.
    pub column_headers: Vec<String>,
    /// Machine names, in result order.
    ///
    /// These are bare names, so they repeat when two tables expose the same
    /// one (`count` on every table). `aggregate_columns` and the headers
    /// carry the qualification.
    pub column_names: Vec<String>,
    /// `<table>.<aggregate>` of every aggregate column.
    pub aggregate_columns: Vec<String>,
    pub dialect: Dialect,
}

impl<'d> Query<'d> {
    /// Compile with default options.
    pub fn hda_query(self) -> HdaResult<HdaOutput> {
        self.hda_query_with(&CompileOptions::default())
    }

    /// Compile with explicit dialect and limits.
    pub fn hda_query_with(self, options: &CompileOptions) -> HdaResult<HdaOutput> {
        let statement = HdaPlanner::new(&self, options).plan()?;
        let sql = statement.to_sql(options.dialect);
        debug!(
            "compiled {} CTEs into {} bytes of {} SQL",
            statement.with.len(),
            sql.len(),
            options.dialect
        );

        let dimensions: Vec<&Column> = self.dimensions().collect();
        let aggregates: Vec<&Aggregate> = self.aggregates().collect();
        Ok(HdaOutput {
            sql,
            column_headers: dimensions
                .iter()
                .map(|c| c.label.clone())
                .chain(aggregates.iter().map(|a| a.label.clone()))
                .collect(),
            column_names: dimensions
                .iter()
                .map(|c| c.column_name().to_string())
                .chain(aggregates.iter().map(|a| a.column_name().to_string()))
                .collect(),
            aggregate_columns: aggregates.iter().map(|a| a.alias()).collect(),
            dialect: options.dialect,
        })
    }
}

/// Where a table's stats CTE reads its rows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatsSource {
    BaseJoin,
    Staged,
}

/// Attributes of the base join, and the alias each aggregate reads.
struct BaseAttributes {
    set: AttributeSet,
    /// Aggregate alias to the alias of its raw input.
    sources: HashMap<String, String>,
}

impl BaseAttributes {
    fn source_of(&self, aggregate: &Aggregate) -> String {
        self.sources
            .get(&aggregate.alias())
            .cloned()
            .unwrap_or_else(|| aggregate.column_alias())
    }
}

/// Builds the statement for one resolved query.
pub struct HdaPlanner<'q, 'd> {
    query: &'q Query<'d>,
    options: &'q CompileOptions,
}

impl<'q, 'd> HdaPlanner<'q, 'd> {
    pub fn new(query: &'q Query<'d>, options: &'q CompileOptions) -> Self {
        Self { query, options }
    }

    /// Build the full statement without rendering it.
    pub fn plan(&self) -> HdaResult<SqlQuery> {
        let query = self.query;
        let fans_out = query.fans_out();
        let sources: Vec<(&JoinOrderEntry<'d>, StatsSource)> = query
            .join_order
            .iter()
            .filter(|e| !e.aggregates.is_empty())
            .map(|e| (e, stats_source(e, fans_out)))
            .collect();
        for (entry, source) in &sources {
            debug!("table '{}' aggregates from {:?}", entry.table, source);
        }

        self.check_names(&sources)?;

        let staged: Vec<&str> = sources
            .iter()
            .filter(|(_, s)| *s == StatsSource::Staged)
            .map(|(e, _)| e.table.as_str())
            .collect();
        let attributes = self.attributes(&staged)?;
        debug!("base join fetches {} attributes", attributes.set.len());

        let dimensions: Vec<String> = query.dimensions().map(|c| c.alias()).collect();

        let mut statement = SqlQuery::new().with_cte(Cte::new(BASE_JOIN, self.base_join(&attributes)?));
        for (entry, source) in &sources {
            if *source == StatsSource::Staged {
                statement = statement.with_cte(Cte::new(
                    &staging_name(&entry.table),
                    staging_cte(entry, &dimensions, &attributes),
                ));
            }
        }
        for (entry, source) in &sources {
            statement = statement.with_cte(Cte::new(
                &stats_name(&entry.table),
                stats_cte(entry, *source, &dimensions, &attributes),
            ));
        }
        statement = statement.with_cte(Cte::new(RESULT, result_cte(&sources, &dimensions)));

        statement = statement.select_star().from(TableRef::new(RESULT));
        for predicate in &query.aggregate_filters {
            statement = statement.filter(predicate.clone());
        }
        if let Some(order) = &query.order {
            let expr = col(&order.alias);
            statement = statement.order_by(vec![match order.direction {
                SortDir::Asc => OrderByExpr::asc(expr),
                SortDir::Desc => OrderByExpr::desc(expr),
            }]);
        }
        if let Some(limit) = self.limit() {
            statement = statement.limit(limit);
        }
        Ok(statement)
    }

    /// Requested limit, else the configured default, capped by the maximum.
    fn limit(&self) -> Option<u64> {
        let limit = self.query.limit.or(self.options.default_limit);
        match (limit, self.options.max_limit) {
            (Some(limit), Some(max)) => Some(limit.min(max)),
            (None, Some(max)) => Some(max),
            (limit, None) => limit,
        }
    }

    /// Stage names and result aliases must be unique.
    fn check_names(&self, sources: &[(&JoinOrderEntry<'d>, StatsSource)]) -> HdaResult<()> {
        let mut stages: HashSet<String> = HashSet::from([BASE_JOIN.to_string(), RESULT.to_string()]);
        for (entry, source) in sources {
            let mut names = vec![stats_name(&entry.table)];
            if *source == StatsSource::Staged {
                names.push(staging_name(&entry.table));
            }
            for name in names {
                if !stages.insert(name.clone()) {
                    return Err(StructuralError::StageNameCollision(name).into());
                }
            }
        }

        let mut aliases = HashSet::new();
        let result_aliases = self
            .query
            .dimensions()
            .map(|c| c.alias())
            .chain(self.query.aggregates().map(|a| a.alias()));
        for alias in result_aliases {
            if !aliases.insert(alias.clone()) {
                return Err(StructuralError::DuplicateResultColumn(alias).into());
            }
        }
        Ok(())
    }

    /// Every attribute the base join must fetch, in projection order.
    fn attributes(&self, staged: &[&str]) -> HdaResult<BaseAttributes> {
        let query = self.query;

        let dimensions: Vec<Attribute> = query
            .dimensions()
            .map(|c| Attribute::from_column(c, AttributeRole::Dimension))
            .collect();
        let mut keys = Vec::new();
        for join in query.join_order.iter().filter_map(|e| e.join) {
            for (left, right) in query.design.key_columns(join)? {
                keys.push(Attribute::from_column(left, AttributeRole::JoinKey));
                keys.push(Attribute::from_column(right, AttributeRole::JoinKey));
            }
        }
        let mut identities = Vec::new();
        for (table, entry) in query.tables.iter().zip(&query.join_order) {
            if !staged.contains(&entry.table.as_str()) {
                continue;
            }
            let primary_keys = table.primary_keys()?;
            if primary_keys.is_empty() {
                return Err(StructuralError::MissingPrimaryKey(entry.table.clone()).into());
            }
            for key in primary_keys {
                identities.push(Attribute::from_column(key, AttributeRole::Identity));
            }
        }

        // Aliases owned by declared columns; aggregate inputs never shadow them.
        let bound: HashMap<&str, &Expr> = dimensions
            .iter()
            .chain(&keys)
            .chain(&identities)
            .map(|a| (a.alias.as_str(), &a.expr))
            .collect();

        let mut set = AttributeSet::new();
        let mut sources = HashMap::new();
        for attribute in dimensions.iter().cloned() {
            add_attribute(&mut set, attribute)?;
        }
        for aggregate in query.aggregates() {
            let mut attribute = Attribute::from_aggregate(aggregate);
            let taken = bound
                .get(attribute.alias.as_str())
                .copied()
                .or_else(|| set.get(&attribute.alias).map(|a| &a.expr));
            if taken.is_some_and(|expr| *expr != attribute.expr) {
                attribute.name = format!("{}_input", aggregate.name);
                attribute.alias = format!("{}.{}", aggregate.table, attribute.name);
                debug!(
                    "aggregate '{}' reads its input as '{}'",
                    aggregate.alias(),
                    attribute.alias
                );
            }
            sources.insert(aggregate.alias(), attribute.alias.clone());
            add_attribute(&mut set, attribute)?;
        }
        for attribute in keys.iter().chain(&identities).cloned() {
            add_attribute(&mut set, attribute)?;
        }

        trace!(
            "base join attributes: {}",
            set.iter().map(|a| a.alias.as_str()).collect::<Vec<_>>().join(", ")
        );
        Ok(BaseAttributes { set, sources })
    }

    fn base_join(&self, attributes: &BaseAttributes) -> HdaResult<SqlQuery> {
        let query = self.query;
        let select: Vec<SelectExpr> = attributes
            .set
            .iter()
            .map(|a| SelectExpr::new(a.expr.clone()).with_alias(&a.alias))
            .collect();

        let mut stage = SqlQuery::new()
            .select(select)
            .from(query.design.base_table().table_ref());

        for (table, entry) in query.tables.iter().zip(&query.join_order).skip(1) {
            let Some(join) = entry.join else { continue };
            let on = and_all(
                query
                    .design
                    .key_columns(join)?
                    .into_iter()
                    .map(|(left, right)| left.expr().eq(right.expr())),
            )
            .ok_or_else(|| StructuralError::MissingJoinKey(join.name.clone()))?;
            stage = stage.join(JoinType::from(join.kind), table.table_ref(), on);
        }

        for predicate in &query.column_filters {
            stage = stage.filter(predicate.clone());
        }
        Ok(stage)
    }
}

/// Staging is needed whenever base rows can repeat for this table: any
/// one-to-many join multiplies every table, and a many-to-one target repeats
/// once per referencing row.
fn stats_source(entry: &JoinOrderEntry<'_>, fans_out: bool) -> StatsSource {
    match entry.relationship() {
        _ if fans_out => StatsSource::Staged,
        Some(Cardinality::ManyToOne) => StatsSource::Staged,
        _ => StatsSource::BaseJoin,
    }
}

fn add_attribute(set: &mut AttributeSet, attribute: Attribute) -> HdaResult<()> {
    if let Some(existing) = set.get(&attribute.alias) {
        if existing.expr != attribute.expr {
            return Err(StructuralError::AliasCollision(attribute.alias).into());
        }
    }
    set.insert(attribute);
    Ok(())
}

fn staging_name(table: &str) -> String {
    format!("base_{}", table)
}

fn stats_name(table: &str) -> String {
    format!("{}_stats", table)
}

fn staging_cte(entry: &JoinOrderEntry<'_>, dimensions: &[String], attributes: &BaseAttributes) -> SqlQuery {
    // Sources read by this table's aggregates may belong to no declared column.
    let sources: Vec<String> = entry.aggregates.iter().map(|a| attributes.source_of(a)).collect();

    let mut aliases: Vec<&str> = dimensions.iter().map(String::as_str).collect();
    let own = attributes.set.for_table(&entry.table).filter(|a| {
        a.has_role(AttributeRole::Identity)
            || a.has_role(AttributeRole::JoinKey)
            || a.has_role(AttributeRole::AggregateSource)
    });
    for attribute in own {
        if !aliases.contains(&attribute.alias.as_str()) {
            aliases.push(&attribute.alias);
        }
    }
    for source in &sources {
        if !aliases.contains(&source.as_str()) {
            aliases.push(source);
        }
    }

    SqlQuery::new()
        .select(aliases.into_iter().map(col).collect::<Vec<_>>())
        .distinct()
        .from(TableRef::new(BASE_JOIN))
}

fn stats_cte(
    entry: &JoinOrderEntry<'_>,
    source: StatsSource,
    dimensions: &[String],
    attributes: &BaseAttributes,
) -> SqlQuery {
    let from = match source {
        StatsSource::Staged => staging_name(&entry.table),
        StatsSource::BaseJoin => BASE_JOIN.to_string(),
    };
    let select: Vec<SelectExpr> = dimensions
        .iter()
        .map(|d| SelectExpr::new(col(d)))
        .chain(
            entry
                .aggregates
                .iter()
                .map(|a| SelectExpr::new(a.stats_expr(&attributes.source_of(a))).with_alias(&a.alias())),
        )
        .collect();

    SqlQuery::new()
        .select(select)
        .from(TableRef::new(&from))
        .group_by(dimensions.iter().map(|d| col(d)).collect())
}

fn result_cte(sources: &[(&JoinOrderEntry<'_>, StatsSource)], dimensions: &[String]) -> SqlQuery {
    let Some(((first, _), rest)) = sources.split_first() else {
        let group: Vec<Expr> = dimensions.iter().map(|d| col(d)).collect();
        return SqlQuery::new()
            .select(group.clone())
            .from(TableRef::new(BASE_JOIN))
            .group_by(group);
    };

    let first_stats = stats_name(&first.table);
    let select: Vec<SelectExpr> = dimensions
        .iter()
        .map(|d| table_col(&first_stats, d).alias(d))
        .chain(sources.iter().flat_map(|(entry, _)| {
            let stats = stats_name(&entry.table);
            entry
                .aggregates
                .iter()
                .map(move |a| table_col(&stats, &a.alias()).alias(&a.alias()))
        }))
        .collect();

    let mut stage = SqlQuery::new().select(select).from(TableRef::new(&first_stats));
    for (entry, _) in rest {
        let stats = stats_name(&entry.table);
        let on = and_all(
            dimensions
                .iter()
                .map(|d| table_col(&first_stats, d).is_not_distinct_from(table_col(&stats, d))),
        );
        stage = match on {
            Some(on) => stage.inner_join(TableRef::new(&stats), on),
            None => stage.cross_join(TableRef::new(&stats)),
        };
    }
    stage
}
