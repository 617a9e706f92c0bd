use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{ProjectionParams, ProjectionSummary, YearResult, project, summarize};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const MAX_PROJECTION_YEARS: u32 = 120;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    payment_term: Option<u32>,
    payout_start: Option<u32>,
    payout_end: Option<u32>,
    payout_amount: Option<f64>,
    lumpsum: Option<f64>,
    lumpsum_year: Option<u32>,
    nps_investment: Option<f64>,
    total_investment_per_year: Option<f64>,
    years: Option<u32>,
    #[serde(alias = "annualReturnPct")]
    annual_return: Option<f64>,
    per_year_payouts: Option<BTreeMap<u32, f64>>,
}

#[derive(Parser, Debug)]
#[command(
    name = "nps_dashboard",
    about = "NPS investment projection dashboard (compound growth + payout and lumpsum schedules)"
)]
struct Cli {
    #[arg(long, default_value_t = 12, help = "Years of regular contributions")]
    payment_term: u32,
    #[arg(
        long,
        default_value_t = 0,
        help = "First year (1-based) of the flat payout window"
    )]
    payout_start: u32,
    #[arg(
        long,
        default_value_t = 0,
        help = "Last year (1-based) of the flat payout window, inclusive"
    )]
    payout_end: u32,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Amount applied each year inside the payout window"
    )]
    payout_amount: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "One-time amount applied at --lumpsum-year; ignored unless > 0"
    )]
    lumpsum: f64,
    #[arg(long, default_value_t = 0, help = "Year (1-based) the lumpsum lands")]
    lumpsum_year: u32,
    #[arg(long, default_value_t = 40_000.0, help = "Recurring annual contribution")]
    nps_investment: f64,
    #[arg(
        long,
        help = "Total yearly outlay including components outside the modeled contribution; defaults to --nps-investment"
    )]
    total_investment_per_year: Option<f64>,
    #[arg(long, default_value_t = 42, help = "Simulated years after year 0")]
    years: u32,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Annual return in percent, e.g. 10"
    )]
    annual_return: f64,
    #[arg(
        long = "per-year-payout",
        value_name = "YEAR=AMOUNT",
        help = "Explicit payout for one year, overriding the flat window; repeatable"
    )]
    per_year_payout: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ParamsView {
    payment_term: u32,
    payout_start: u32,
    payout_end: u32,
    payout_amount: f64,
    lumpsum: f64,
    lumpsum_year: u32,
    nps_investment: f64,
    total_investment_per_year: Option<f64>,
    years: u32,
    annual_return_pct: f64,
    per_year_payouts: Option<BTreeMap<u32, f64>>,
}

impl From<&ProjectionParams> for ParamsView {
    fn from(params: &ProjectionParams) -> Self {
        ParamsView {
            payment_term: params.payment_term,
            payout_start: params.payout_start,
            payout_end: params.payout_end,
            payout_amount: params.payout_amount,
            lumpsum: params.lumpsum,
            lumpsum_year: params.lumpsum_year,
            nps_investment: params.nps_investment,
            total_investment_per_year: params.total_investment_per_year,
            years: params.years,
            annual_return_pct: params.annual_return * 100.0,
            per_year_payouts: params.per_year_payouts.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    params: ParamsView,
    results: Vec<YearResult>,
    summary: ProjectionSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioResponse {
    title: String,
    color: String,
    secondary_color: String,
    editable: bool,
    params: ParamsView,
    results: Vec<YearResult>,
    summary: ProjectionSummary,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn parse_per_year_payouts(entries: &[String]) -> Result<Option<BTreeMap<u32, f64>>, String> {
    if entries.is_empty() {
        return Ok(None);
    }
    let mut schedule = BTreeMap::new();
    for entry in entries {
        let Some((year, amount)) = entry.split_once('=') else {
            return Err(format!(
                "--per-year-payout entry '{entry}' must be YEAR=AMOUNT"
            ));
        };
        let year: u32 = year
            .trim()
            .parse()
            .map_err(|_| format!("--per-year-payout year '{year}' must be a positive integer"))?;
        if year == 0 {
            return Err("--per-year-payout years are 1-based and must be >= 1".to_string());
        }
        let amount: f64 = amount
            .trim()
            .parse()
            .map_err(|_| format!("--per-year-payout amount '{amount}' must be a number"))?;
        if !amount.is_finite() {
            return Err("--per-year-payout amounts must be finite".to_string());
        }
        schedule.insert(year, amount);
    }
    Ok(Some(schedule))
}

fn build_params(cli: Cli) -> Result<ProjectionParams, String> {
    if cli.years > MAX_PROJECTION_YEARS {
        return Err(format!("--years must be <= {MAX_PROJECTION_YEARS}"));
    }

    for (name, value) in [
        ("--payout-amount", cli.payout_amount),
        ("--lumpsum", cli.lumpsum),
        ("--nps-investment", cli.nps_investment),
        ("--annual-return", cli.annual_return),
    ] {
        if !value.is_finite() {
            return Err(format!("{name} must be a finite number"));
        }
    }

    if cli.nps_investment < 0.0 {
        return Err("--nps-investment must be >= 0".to_string());
    }

    if cli.annual_return <= -100.0 {
        return Err("--annual-return must be > -100".to_string());
    }

    if let Some(total) = cli.total_investment_per_year {
        if !total.is_finite() || total < 0.0 {
            return Err("--total-investment-per-year must be >= 0".to_string());
        }
    }

    if cli.payout_amount != 0.0 && cli.payout_start > cli.payout_end {
        return Err("--payout-start must be <= --payout-end".to_string());
    }

    let per_year_payouts = parse_per_year_payouts(&cli.per_year_payout)?;

    Ok(ProjectionParams {
        payment_term: cli.payment_term,
        payout_start: cli.payout_start,
        payout_end: cli.payout_end,
        payout_amount: cli.payout_amount,
        lumpsum: cli.lumpsum,
        lumpsum_year: cli.lumpsum_year,
        nps_investment: cli.nps_investment,
        total_investment_per_year: cli.total_investment_per_year,
        years: cli.years,
        annual_return: cli.annual_return / 100.0,
        per_year_payouts,
    })
}

#[cfg(test)]
fn params_from_json(json: &str) -> Result<ProjectionParams, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    params_from_payload(payload)
}

fn params_from_payload(payload: ProjectPayload) -> Result<ProjectionParams, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.payment_term {
        cli.payment_term = v;
    }
    if let Some(v) = payload.payout_start {
        cli.payout_start = v;
    }
    if let Some(v) = payload.payout_end {
        cli.payout_end = v;
    }
    if let Some(v) = payload.payout_amount {
        cli.payout_amount = v;
    }
    if let Some(v) = payload.lumpsum {
        cli.lumpsum = v;
    }
    if let Some(v) = payload.lumpsum_year {
        cli.lumpsum_year = v;
    }
    if let Some(v) = payload.nps_investment {
        cli.nps_investment = v;
    }
    if let Some(v) = payload.total_investment_per_year {
        cli.total_investment_per_year = Some(v);
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.annual_return {
        cli.annual_return = v;
    }

    let mut params = build_params(cli)?;

    if let Some(schedule) = payload.per_year_payouts {
        if schedule.contains_key(&0) {
            return Err("perYearPayouts years are 1-based and must be >= 1".to_string());
        }
        if schedule.values().any(|amount| !amount.is_finite()) {
            return Err("perYearPayouts amounts must be finite".to_string());
        }
        params.per_year_payouts = Some(schedule);
    }

    Ok(params)
}

fn default_cli_for_api() -> Cli {
    Cli {
        payment_term: 12,
        payout_start: 0,
        payout_end: 0,
        payout_amount: 0.0,
        lumpsum: 0.0,
        lumpsum_year: 0,
        nps_investment: 40_000.0,
        total_investment_per_year: None,
        years: 42,
        annual_return: 10.0,
        per_year_payout: Vec::new(),
    }
}

struct Scenario {
    title: &'static str,
    color: &'static str,
    secondary_color: &'static str,
    editable: bool,
    params: ProjectionParams,
}

fn preset_scenarios() -> Vec<Scenario> {
    let base = ProjectionParams {
        payment_term: 12,
        payout_start: 0,
        payout_end: 0,
        payout_amount: 0.0,
        lumpsum: 0.0,
        lumpsum_year: 0,
        nps_investment: 0.0,
        total_investment_per_year: None,
        years: 42,
        annual_return: 0.10,
        per_year_payouts: None,
    };

    // UPLI pays an escalating benefit ladder instead of a flat amount; the
    // 1..=10 zero entries fall through to a flat window that only starts at
    // year 11, so nothing is paid early.
    let upli_schedule: BTreeMap<u32, f64> = (1..=10)
        .map(|year| (year, 0.0))
        .chain([
            (11, 204_752.0),
            (12, 210_854.0),
            (13, 216_659.0),
            (14, 222_353.0),
            (15, 227_526.0),
            (16, 232_792.0),
            (17, 238_149.0),
            (18, 243_585.0),
            (19, 249_085.0),
            (20, 254_625.0),
            (21, 260_199.0),
            (22, 265_912.0),
            (23, 271_769.0),
            (24, 277_772.0),
            (25, 283_926.0),
            (26, 290_234.0),
        ])
        .collect();

    vec![
        Scenario {
            title: "NPS 60K",
            color: "#667eea",
            secondary_color: "#FCD34D",
            editable: false,
            params: ProjectionParams {
                nps_investment: 60_000.0,
                ..base.clone()
            },
        },
        Scenario {
            title: "NPS 100K",
            color: "#10b981",
            secondary_color: "#FCD34D",
            editable: false,
            params: ProjectionParams {
                nps_investment: 100_000.0,
                ..base.clone()
            },
        },
        Scenario {
            title: "ABSLI 60 + NPS 40",
            color: "#ef4444",
            secondary_color: "#FCD34D",
            editable: false,
            params: ProjectionParams {
                payout_start: 1,
                payout_end: 37,
                payout_amount: 21_210.0,
                lumpsum: 792_000.0,
                lumpsum_year: 37,
                nps_investment: 40_000.0,
                total_investment_per_year: Some(100_000.0),
                years: 37,
                ..base.clone()
            },
        },
        Scenario {
            title: "ABSLI 100",
            color: "#8b5cf6",
            secondary_color: "#FCD34D",
            editable: false,
            params: ProjectionParams {
                payout_start: 14,
                payout_end: 25,
                payout_amount: 130_338.0,
                lumpsum: 1_440_000.0,
                lumpsum_year: 39,
                nps_investment: 0.0,
                total_investment_per_year: Some(100_000.0),
                ..base.clone()
            },
        },
        Scenario {
            title: "UPLI + NPS",
            color: "#fb923c",
            secondary_color: "#FCD34D",
            editable: true,
            params: ProjectionParams {
                payment_term: 10,
                payout_start: 11,
                payout_end: 24,
                payout_amount: 210_854.0,
                lumpsum: 3_153_682.0,
                lumpsum_year: 26,
                nps_investment: 0.0,
                total_investment_per_year: Some(100_000.0),
                per_year_payouts: Some(upli_schedule),
                ..base
            },
        },
    ]
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/scenarios", get(scenarios_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("NPS dashboard listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    let params = match params_from_payload(payload) {
        Ok(params) => params,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    json_response(StatusCode::OK, build_project_response(&params))
}

async fn scenarios_handler() -> Response {
    let scenarios = preset_scenarios()
        .into_iter()
        .map(|scenario| {
            let results = project(&scenario.params);
            let summary = summarize(&scenario.params, &results);
            ScenarioResponse {
                title: scenario.title.to_string(),
                color: scenario.color.to_string(),
                secondary_color: scenario.secondary_color.to_string(),
                editable: scenario.editable,
                params: ParamsView::from(&scenario.params),
                results,
                summary,
            }
        })
        .collect::<Vec<_>>();

    json_response(StatusCode::OK, scenarios)
}

fn build_project_response(params: &ProjectionParams) -> ProjectResponse {
    let results = project(params);
    let summary = summarize(params, &results);
    ProjectResponse {
        params: ParamsView::from(params),
        results,
        summary,
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
