//! Join resolution: turn a request into the ordered list of participating
//! tables, with every referenced name checked against the design.

use std::collections::HashSet;

use log::debug;

use super::filter::Filter;
use super::request::{QueryRequest, TimeframeRequest};
use crate::error::{HdaResult, StructuralError, ValidationError};
use crate::model::{Aggregate, Cardinality, Column, Design, EntityKind, Join, ModelError, Table};
use crate::sql::expr::{col, Expr};
use crate::sql::query::SortDir;

/// One participating table and what the request wants from it.
#[derive(Debug, Clone)]
pub struct JoinOrderEntry<'d> {
    /// Table name as referenced in SQL (the join name for joined tables).
    pub table: String,
    /// The join that brings the table in. `None` for the base table.
    pub join: Option<&'d Join>,
    /// Requested dimensions, timeframe period columns included.
    pub columns: Vec<Column>,
    pub aggregates: Vec<&'d Aggregate>,
}

impl JoinOrderEntry<'_> {
    pub fn is_base(&self) -> bool {
        self.join.is_none()
    }

    pub fn relationship(&self) -> Option<Cardinality> {
        self.join.map(|j| j.relationship)
    }
}

/// Result column the final statement is ordered by.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOrder {
    pub alias: String,
    pub direction: SortDir,
}

/// A request resolved against a design.
///
/// Built fresh for every request and consumed by `hda_query()`.
#[derive(Debug, Clone)]
pub struct Query<'d> {
    pub design: &'d Design,
    /// Base table first, then one table per requested join.
    pub tables: Vec<&'d Table>,
    /// Parallel to `tables`.
    pub join_order: Vec<JoinOrderEntry<'d>>,
    /// Predicates on raw columns, applied in the base join.
    pub column_filters: Vec<Expr>,
    /// Predicates on aggregate aliases, applied to the result.
    pub aggregate_filters: Vec<Expr>,
    pub order: Option<ResolvedOrder>,
    /// Requested row limit, before defaults and caps are applied.
    pub limit: Option<u64>,
}

impl<'d> Query<'d> {
    /// Resolve `request` against `design`.
    pub fn new(design: &'d Design, request: &QueryRequest) -> HdaResult<Self> {
        let base = design.base_table();
        if request.table != base.name {
            return Err(ModelError::NotFound {
                kind: EntityKind::Table,
                name: request.table.clone(),
                scope: format!("design '{}'", design.name),
            }
            .into());
        }

        let mut tables = vec![base];
        let mut join_order = vec![resolve_entry(
            base,
            None,
            &request.columns,
            &request.timeframes,
            &request.aggregates,
        )?];

        let mut seen: HashSet<&str> = HashSet::from([base.name.as_str()]);
        for join_request in &request.joins {
            if seen.contains(join_request.name.as_str()) {
                return Err(ValidationError::DuplicateJoin(join_request.name.clone()).into());
            }
            let join = design.get_join(&join_request.name)?;
            if let Some(missing) = join.depends_on().find(|t| !seen.contains(t)) {
                return Err(StructuralError::JoinOutOfOrder {
                    join: join.name.clone(),
                    requires: missing.to_string(),
                }
                .into());
            }
            seen.insert(join.name.as_str());
            tables.push(&join.table);
            join_order.push(resolve_entry(
                &join.table,
                Some(join),
                &join_request.columns,
                &join_request.timeframes,
                &join_request.aggregates,
            )?);
        }

        if join_order
            .iter()
            .all(|e| e.columns.is_empty() && e.aggregates.is_empty())
        {
            return Err(ValidationError::EmptyRequest.into());
        }

        let mut query = Query {
            design,
            tables,
            join_order,
            column_filters: Vec::new(),
            aggregate_filters: Vec::new(),
            order: None,
            limit: request.limit.as_ref().map(|l| l.rows()).transpose()?,
        };

        for filter in &request.filters.columns {
            let predicate = query.column_filter(filter)?;
            query.column_filters.push(predicate);
        }
        for filter in &request.filters.aggregates {
            let predicate = query.aggregate_filter(filter)?;
            query.aggregate_filters.push(predicate);
        }
        if let Some(order) = &request.order {
            let alias = query
                .find_result_alias(order.column())
                .ok_or_else(|| ValidationError::UnknownOrder(order.column().to_string()))?;
            query.order = Some(ResolvedOrder {
                alias,
                direction: order.direction(),
            });
        }

        debug!(
            "resolved join order [{}] for design '{}'",
            query
                .join_order
                .iter()
                .map(|e| e.table.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            design.name
        );
        Ok(query)
    }

    /// The base table entry.
    pub fn base(&self) -> &JoinOrderEntry<'d> {
        &self.join_order[0]
    }

    pub fn entry(&self, table: &str) -> Option<&JoinOrderEntry<'d>> {
        self.join_order.iter().find(|e| e.table == table)
    }

    /// Whether any participating join multiplies base rows.
    pub fn fans_out(&self) -> bool {
        self.join_order
            .iter()
            .any(|e| e.relationship().is_some_and(|r| r.fans_out()))
    }

    /// Requested dimensions of every table, in join order.
    pub fn dimensions(&self) -> impl Iterator<Item = &Column> {
        self.join_order.iter().flat_map(|e| e.columns.iter())
    }

    /// Requested aggregates of every table, in join order.
    pub fn aggregates(&self) -> impl Iterator<Item = &'d Aggregate> + '_ {
        self.join_order.iter().flat_map(|e| e.aggregates.iter().copied())
    }

    /// Find a result column by alias (`users.count`) or bare name (`count`).
    ///
    /// Bare names are looked up table by table in join order, dimensions
    /// before aggregates.
    fn find_result_alias(&self, name: &str) -> Option<String> {
        if name.contains('.') {
            return self
                .dimensions()
                .map(|c| c.alias())
                .chain(self.aggregates().map(|a| a.alias()))
                .find(|alias| alias == name);
        }
        self.join_order.iter().find_map(|entry| {
            entry
                .columns
                .iter()
                .find(|c| c.column_name() == name)
                .map(|c| c.alias())
                .or_else(|| {
                    entry
                        .aggregates
                        .iter()
                        .find(|a| a.column_name() == name)
                        .map(|a| a.alias())
                })
        })
    }

    fn participant(&self, filter: &Filter) -> Result<&'d Table, ValidationError> {
        self.tables
            .iter()
            .copied()
            .find(|t| t.name == filter.table_name)
            .ok_or_else(|| ValidationError::FilterOutsideQuery {
                table: filter.table_name.clone(),
            })
    }

    fn column_filter(&self, filter: &Filter) -> HdaResult<Expr> {
        let column = self.participant(filter)?.get_column(&filter.key)?;
        Ok(filter
            .expression
            .apply(column.expr(), filter.value.as_ref(), &column.alias())?)
    }

    fn aggregate_filter(&self, filter: &Filter) -> HdaResult<Expr> {
        let aggregate = self.participant(filter)?.get_aggregate(&filter.key)?;
        let alias = aggregate.alias();
        if !self.aggregates().any(|a| a.alias() == alias) {
            return Err(ValidationError::UnrequestedAggregate(alias).into());
        }
        Ok(filter
            .expression
            .apply(col(&alias), filter.value.as_ref(), &alias)?)
    }
}

fn resolve_entry<'d>(
    table: &'d Table,
    join: Option<&'d Join>,
    columns: &[String],
    timeframes: &[TimeframeRequest],
    aggregates: &[String],
) -> HdaResult<JoinOrderEntry<'d>> {
    let mut entry = JoinOrderEntry {
        table: table.name.clone(),
        join,
        columns: Vec::new(),
        aggregates: Vec::new(),
    };

    let mut requested = Vec::new();
    for name in columns {
        requested.push(table.get_column(name)?.clone());
    }
    for tf in timeframes {
        let timeframe = table.get_timeframe(&tf.name)?;
        if tf.periods.is_empty() {
            requested.push(timeframe.raw_column());
        }
        for period in &tf.periods {
            requested.push(timeframe.period_column(*period)?);
        }
    }
    for column in requested {
        if entry.columns.iter().any(|c| c.name == column.name) {
            debug!("dropping repeated column '{}'", column.alias());
            continue;
        }
        entry.columns.push(column);
    }

    for name in aggregates {
        let aggregate = table.get_aggregate(name)?;
        if entry.aggregates.iter().any(|a| a.name == aggregate.name) {
            debug!("dropping repeated aggregate '{}'", aggregate.alias());
            continue;
        }
        entry.aggregates.push(aggregate);
    }

    Ok(entry)
}
