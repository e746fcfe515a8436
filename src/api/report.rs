//! Software validation report endpoints
//!
//! Each report is served as JSON for API consumers and as a standalone HTML
//! page with the charts embedded as data URIs.

use actix_web::{HttpRequest, HttpResponse, get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::error::{ApiError, ErrorResponse};
use crate::chart::data_uri;
use crate::db::models::{Page, PageRequest};
use crate::db::repository::{DeviceResultRepository, InventoryItemResultRepository};
use crate::model::report::{DeviceReportFilter, GroupTally, InventoryItemReportFilter, Tally};
use crate::service::{ReportService, ValidationReport};

pub type DeviceReportService = ReportService<DeviceResultRepository>;
pub type InventoryItemReportService = ReportService<InventoryItemResultRepository>;

/// Device software validation report
#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceReport {
    /// Encoded PNG, valid/invalid/no software per platform
    pub bar_chart: String,
    pub device_aggr: Tally,
    /// Encoded PNG pie chart; `null` when there are no results
    pub device_visual: Option<String>,
    /// Time of the most recent full validation run
    pub report_last_run: Option<DateTime<Utc>>,
    /// Per device type tallies
    pub results: Page<GroupTally>,
}

impl From<ValidationReport> for DeviceReport {
    fn from(report: ValidationReport) -> Self {
        Self {
            bar_chart: report.bar_chart,
            device_aggr: report.aggr,
            device_visual: report.visual,
            report_last_run: report.report_last_run,
            results: report.results,
        }
    }
}

/// Inventory item software validation report
#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryItemReport {
    /// Encoded PNG, valid/invalid/no software per manufacturer
    pub bar_chart: String,
    pub inventory_aggr: Tally,
    pub inventory_visual: Option<String>,
    pub report_last_run: Option<DateTime<Utc>>,
    /// Per inventory item tallies
    pub results: Page<GroupTally>,
}

impl From<ValidationReport> for InventoryItemReport {
    fn from(report: ValidationReport) -> Self {
        Self {
            bar_chart: report.bar_chart,
            inventory_aggr: report.aggr,
            inventory_visual: report.visual,
            report_last_run: report.report_last_run,
            results: report.results,
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/reports/validated-software/devices",
    params(DeviceReportFilter, PageRequest),
    responses(
        (status = 200, description = "Device report built", body = DeviceReport),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "reports"
)]
#[get("/v1/reports/validated-software/devices")]
pub async fn device_report(
    service: web::Data<DeviceReportService>,
    filter: web::Query<DeviceReportFilter>,
    page: web::Query<PageRequest>,
) -> Result<HttpResponse, ApiError> {
    let report = service.build(&filter.into_inner(), page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DeviceReport::from(report)))
}

#[utoipa::path(
    get,
    path = "/v1/reports/validated-software/inventory-items",
    params(InventoryItemReportFilter, PageRequest),
    responses(
        (status = 200, description = "Inventory item report built", body = InventoryItemReport),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "reports"
)]
#[get("/v1/reports/validated-software/inventory-items")]
pub async fn inventory_item_report(
    service: web::Data<InventoryItemReportService>,
    filter: web::Query<InventoryItemReportFilter>,
    page: web::Query<PageRequest>,
) -> Result<HttpResponse, ApiError> {
    let report = service.build(&filter.into_inner(), page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(InventoryItemReport::from(report)))
}

#[utoipa::path(
    get,
    path = "/reports/validated-software/devices",
    params(DeviceReportFilter, PageRequest),
    responses(
        (status = 200, description = "Device report page", content_type = "text/html", body = String)
    ),
    tag = "reports"
)]
#[get("/reports/validated-software/devices")]
pub async fn device_report_page(
    req: HttpRequest,
    service: web::Data<DeviceReportService>,
    filter: web::Query<DeviceReportFilter>,
    page: web::Query<PageRequest>,
) -> Result<HttpResponse, ApiError> {
    let report = service.build(&filter.into_inner(), page.into_inner()).await?;
    Ok(html_response(render_html(&report, req.query_string())))
}

#[utoipa::path(
    get,
    path = "/reports/validated-software/inventory-items",
    params(InventoryItemReportFilter, PageRequest),
    responses(
        (status = 200, description = "Inventory item report page", content_type = "text/html", body = String)
    ),
    tag = "reports"
)]
#[get("/reports/validated-software/inventory-items")]
pub async fn inventory_item_report_page(
    req: HttpRequest,
    service: web::Data<InventoryItemReportService>,
    filter: web::Query<InventoryItemReportFilter>,
    page: web::Query<PageRequest>,
) -> Result<HttpResponse, ApiError> {
    let report = service.build(&filter.into_inner(), page.into_inner()).await?;
    Ok(html_response(render_html(&report, req.query_string())))
}

fn html_response(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// `device_type` -> `Device Type`
fn heading(label: &str) -> String {
    label
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Current query string with `page` replaced
fn page_link(query: &str, page: u32) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if key != "page" {
            serializer.append_pair(&key, &value);
        }
    }
    serializer.append_pair("page", &page.to_string());
    format!("?{}", serializer.finish())
}

fn tally_cells(label: &str, tally: &GroupTally) -> String {
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}%</td></tr>\n",
        escape(label),
        tally.counts.total,
        tally.counts.valid,
        tally.counts.invalid,
        tally.counts.no_software,
        tally.valid_percent,
    )
}

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 2em; }
table { border-collapse: collapse; margin: 1em 0; }
th, td { border: 1px solid #ccc; padding: 4px 10px; text-align: right; }
th:first-child, td:first-child { text-align: left; }
.charts { display: flex; gap: 2em; align-items: flex-start; }
nav a { margin: 0 0.5em; }
"#;

fn render_html(report: &ValidationReport, query: &str) -> String {
    let kind = report.kind;
    let title = format!("{} Software Validation", kind.tally_name());

    let last_run = match report.report_last_run {
        Some(ts) => ts.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => "Never".to_string(),
    };

    let aggr = &report.aggr;
    let summary = format!(
        "<tr><th>Name</th><th>Total</th><th>Valid</th><th>Invalid</th><th>No Software</th><th>Valid %</th></tr>\n\
         <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}%</td></tr>\n",
        escape(&aggr.name),
        aggr.counts.total,
        aggr.counts.valid,
        aggr.counts.invalid,
        aggr.counts.no_software,
        aggr.valid_percent,
    );

    let pie = match &report.visual {
        Some(encoded) => format!(
            r#"<img src="{}" alt="{} validation split">"#,
            data_uri(encoded),
            escape(kind.tally_name())
        ),
        None => "<p>No validation results.</p>".to_string(),
    };
    let bar = format!(
        r#"<img src="{}" alt="{}">"#,
        data_uri(&report.bar_chart),
        escape(kind.bar_title())
    );

    let rows: String = report
        .results
        .results
        .iter()
        .map(|row| tally_cells(row.display_label(), row))
        .collect();

    let results = &report.results;
    let mut nav = String::new();
    if results.page > 1 {
        nav.push_str(&format!(
            r#"<a href="{}">Previous</a>"#,
            escape(&page_link(query, results.page - 1))
        ));
    }
    nav.push_str(&format!(
        "Page {} of {}",
        results.page,
        results.total_pages.max(1)
    ));
    if results.page < results.total_pages {
        nav.push_str(&format!(
            r#"<a href="{}">Next</a>"#,
            escape(&page_link(query, results.page + 1))
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<h1>{title}</h1>
<p>Last full run: {last_run}</p>
<table class="summary">
{summary}</table>
<div class="charts">
{pie}
{bar}
</div>
<table class="results">
<tr><th>{row_heading}</th><th>Total</th><th>Valid</th><th>Invalid</th><th>No Software</th><th>Valid %</th></tr>
{rows}</table>
<nav>{nav}</nav>
</body>
</html>
"#,
        title = escape(&title),
        style = STYLE,
        last_run = escape(&last_run),
        summary = summary,
        pie = pie,
        bar = bar,
        row_heading = escape(&heading(kind.row_label())),
        rows = rows,
        nav = nav,
    )
}

/// Configure report routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(device_report)
        .service(inventory_item_report)
        .service(device_report_page)
        .service(inventory_item_report_page);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::model::report::{Counts, ReportKind};

    fn report(kind: ReportKind, visual: Option<&str>) -> ValidationReport {
        let rows = vec![
            GroupTally::new(Some("<script>".to_string()), Counts::new(2, 2, 0, 0)),
            GroupTally::new(None, Counts::new(1, 0, 0, 1)),
        ];
        ValidationReport {
            kind,
            bar_chart: "YmFy".to_string(),
            aggr: Tally::new(kind.tally_name(), Counts::new(3, 2, 0, 1)),
            visual: visual.map(str::to_string),
            report_last_run: None,
            groups: rows.clone(),
            results: Page::new(rows, PageRequest::default(), 2),
        }
    }

    #[test]
    fn test_device_report_shape() {
        let value =
            serde_json::to_value(DeviceReport::from(report(ReportKind::Device, None))).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 5, "unexpected keys {:?}", keys);
        assert_eq!(value["device_aggr"]["name"], "Devices");
        assert_eq!(value["device_aggr"]["total"], 3);
        assert!(value["device_visual"].is_null());
        assert!(value["report_last_run"].is_null());
        assert_eq!(value["bar_chart"], "YmFy");
        assert_eq!(value["results"]["results"][1]["label"], serde_json::Value::Null);
    }

    #[test]
    fn test_inventory_report_shape() {
        let value = serde_json::to_value(InventoryItemReport::from(report(
            ReportKind::InventoryItem,
            Some("cGll"),
        )))
        .unwrap();
        assert_eq!(value["inventory_aggr"]["name"], "Inventory Items");
        assert_eq!(value["inventory_visual"], "cGll");
        assert!(value.get("device_aggr").is_none());
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_heading() {
        assert_eq!(heading("device_type"), "Device Type");
        assert_eq!(heading("inventory_item"), "Inventory Item");
    }

    #[test]
    fn test_page_link_keeps_filters() {
        assert_eq!(
            page_link("platform=cisco_ios&page=2&page_size=10", 3),
            "?platform=cisco_ios&page_size=10&page=3"
        );
        assert_eq!(page_link("", 1), "?page=1");
    }

    #[test]
    fn test_html_escapes_labels() {
        let html = render_html(&report(ReportKind::Device, Some("cGll")), "");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<td>Unassigned</td>"));
        assert!(html.contains("data:image/png;base64,cGll"));
        assert!(html.contains("data:image/png;base64,YmFy"));
        assert!(html.contains("<th>Device Type</th>"));
        assert!(html.contains("Last full run: Never"));
    }

    #[test]
    fn test_html_without_pie() {
        let mut empty = report(ReportKind::InventoryItem, None);
        empty.report_last_run = Some(Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap());
        let html = render_html(&empty, "");
        assert!(html.contains("No validation results."));
        assert!(html.contains("Last full run: 2024-05-01 06:30 UTC"));
        assert!(html.contains("Page 1 of 1"));
        assert!(!html.contains("Next"));
    }
}
