//! Software validation report assembly
//!
//! Pulls tallies out of a validation result store and renders the pie and
//! bar charts that accompany them.

use chrono::{DateTime, Utc};

use crate::chart::{render_bar_chart, render_pie_chart, BarChartAttrs, ChartError, PieChartAttrs};
use crate::db::models::{Page, PageRequest};
use crate::db::repository::ValidationResultStore;
use crate::db::DbError;
use crate::model::report::{GroupTally, ReportKind, Tally};
use crate::model::ChartConfig;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Database error: {0}")]
    DbError(#[from] DbError),

    #[error("Chart error: {0}")]
    ChartError(#[from] ChartError),
}

/// Everything shown on one report page
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub kind: ReportKind,
    /// Encoded bar chart of the per-group tallies
    pub bar_chart: String,
    pub aggr: Tally,
    /// Encoded pie chart of the global tally; `None` when there is nothing to plot
    pub visual: Option<String>,
    pub report_last_run: Option<DateTime<Utc>>,
    pub groups: Vec<GroupTally>,
    pub results: Page<GroupTally>,
}

/// Builds reports for one validation result cache
pub struct ReportService<S> {
    store: S,
    kind: ReportKind,
    charts: ChartConfig,
}

impl<S: ValidationResultStore> ReportService<S> {
    pub fn new(store: S, kind: ReportKind, charts: ChartConfig) -> Self {
        Self {
            store,
            kind,
            charts,
        }
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub async fn build(
        &self,
        filter: &S::Filter,
        page: PageRequest,
    ) -> Result<ValidationReport, ReportError> {
        let (report_last_run, counts, groups, results) = futures::try_join!(
            self.store.latest_full_run(),
            self.store.global_counts(filter),
            self.store.group_counts(filter),
            self.store.row_counts(filter, page),
        )?;

        let aggr = Tally::new(self.kind.tally_name(), counts);
        if !aggr.counts.is_consistent() {
            tracing::warn!(
                report = self.kind.tally_name(),
                total = aggr.counts.total,
                valid = aggr.counts.valid,
                invalid = aggr.counts.invalid,
                no_software = aggr.counts.no_software,
                "Inconsistent validation tally"
            );
        }

        let visual = render_pie_chart(Some(&aggr), &PieChartAttrs::validation_split(), &self.charts)?;
        let bar_attrs = BarChartAttrs::validation_split(
            self.kind.group_label(),
            self.kind.ylabel(),
            self.kind.bar_title(),
            &self.charts.colors,
        );
        let bar_chart = render_bar_chart(&groups, &bar_attrs, &self.charts)?;

        tracing::debug!(
            report = self.kind.tally_name(),
            total = aggr.counts.total,
            groups = groups.len(),
            last_run = ?report_last_run,
            "Built validation report"
        );

        Ok(ValidationReport {
            kind: self.kind,
            bar_chart,
            aggr,
            visual,
            report_last_run,
            groups,
            results,
        })
    }
}
