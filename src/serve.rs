//! HTTP server for the interactive dashboard
//!
//! `pricegrid serve data.xlsx` → starts server, opens browser, shows the
//! pickers. Every picker change is a plain GET that recomputes the pivot
//! from the cached table.

use crate::buckets::AgeScale;
use crate::error::LoadError;
use crate::report::{self, html};
use crate::selection::Selection;
use crate::table::TableCache;
use serde::Deserialize;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response, Server};

/// One selectable statistics file (a data-quality tier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub label: String,
    pub path: PathBuf,
}

impl FromStr for Dataset {
    type Err = String;

    /// `LABEL=PATH`, or just `PATH` (labelled by its file stem).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // An `=` after a path separator belongs to the path
        let labelled = s
            .split_once('=')
            .filter(|(label, _)| !label.contains(|c| c == '/' || c == '\\'));
        let (label, path) = match labelled {
            Some((label, path)) if !label.trim().is_empty() && !path.trim().is_empty() => {
                (label.trim().to_string(), PathBuf::from(path.trim()))
            }
            Some(_) => return Err(format!("invalid dataset '{}' (expected LABEL=PATH)", s)),
            None => {
                let path = PathBuf::from(s.trim());
                let label = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
                    .ok_or_else(|| format!("invalid dataset path '{}'", s))?;
                (label, path)
            }
        };
        Ok(Self { label, path })
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub datasets: Vec<Dataset>,
    pub port: u16,
    pub open_browser: bool,
    pub age_scale: AgeScale,
}

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("No datasets configured")]
    NoDatasets,

    #[error("{0}")]
    Load(#[from] LoadError),
}

/// Query string of `/` and `/reset`. Empty values count as unset.
#[derive(Deserialize, Debug, Default)]
pub struct DashboardParams {
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub measure: Option<String>,
    #[serde(default)]
    pub maker: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub fuel: Option<String>,
    /// Maker and model the page was rendered with, echoed by the form.
    #[serde(default)]
    pub prev_maker: Option<String>,
    #[serde(default)]
    pub prev_model: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl DashboardParams {
    /// The selection this request asks for.
    ///
    /// Without a previous maker the query is taken as-is. Otherwise the
    /// submitted values are applied on top of the previous page's choices,
    /// so a changed maker drops model and fuel and a changed model drops
    /// fuel, even when the stale values are still valid.
    pub fn selection(&self) -> Selection {
        let maker = non_empty(&self.maker);
        let model = non_empty(&self.model);
        let fuel = non_empty(&self.fuel);

        let previous = Selection {
            maker: non_empty(&self.prev_maker),
            model: non_empty(&self.prev_model),
            fuel: None,
        };
        if previous.maker.is_none() {
            return Selection { maker, model, fuel };
        }

        let Some(maker) = maker else {
            return Selection::default();
        };
        let selection = previous.clone().with_maker(maker);
        if selection.maker != previous.maker {
            return selection;
        }

        let Some(model) = model else {
            return Selection {
                model: None,
                fuel: None,
                ..selection
            };
        };
        let selection = selection.with_model(model);
        match fuel {
            Some(fuel) if selection.model == previous.model => selection.with_fuel(fuel),
            _ => selection,
        }
    }
}

/// What to send back for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub location: Option<String>,
}

impl Reply {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body,
            location: None,
        }
    }

    fn redirect(location: String) -> Self {
        Self {
            status: 303,
            content_type: "text/plain; charset=utf-8",
            body: String::new(),
            location: Some(location),
        }
    }

    fn not_found() -> Self {
        Self {
            status: 404,
            content_type: "text/plain; charset=utf-8",
            body: "Not found".to_string(),
            location: None,
        }
    }
}

/// Server state: configuration plus the table cache.
pub struct Dashboard {
    config: DashboardConfig,
    cache: TableCache,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            cache: TableCache::with_bucket_check(config.age_scale),
            config,
        }
    }

    /// Load every configured file once so a bad file stops the server
    /// before it starts listening.
    pub fn preload(&self) -> Result<(), ServeError> {
        if self.config.datasets.is_empty() {
            return Err(ServeError::NoDatasets);
        }
        for dataset in &self.config.datasets {
            self.cache.get_or_load(&dataset.path)?;
        }
        Ok(())
    }

    fn tier(&self, params: &DashboardParams) -> usize {
        params
            .tier
            .as_deref()
            .and_then(|t| t.trim().parse::<usize>().ok())
            .filter(|i| *i < self.config.datasets.len())
            .unwrap_or(0)
    }

    /// Render the dashboard page for one query.
    pub fn render(&self, params: &DashboardParams) -> Result<String, ServeError> {
        let tier = self.tier(params);
        let dataset = self.config.datasets.get(tier).ok_or(ServeError::NoDatasets)?;
        let table = self.cache.get_or_load(&dataset.path)?;

        let measure = params.measure.as_deref().and_then(|m| m.parse().ok());
        let labels = self.config.datasets.iter().map(|d| d.label.clone()).collect();
        let view = report::build_view(&table, params.selection(), measure, self.config.age_scale)
            .with_datasets(labels, tier)
            .interactive();

        Ok(html::page(&view))
    }

    /// Map a request line to a reply. No I/O beyond the table cache.
    pub fn route(&self, method: &Method, url: &str) -> Reply {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        if *method != Method::Get {
            return Reply::not_found();
        }

        let params = match serde_urlencoded::from_str::<DashboardParams>(query) {
            Ok(params) => params,
            Err(e) => {
                log::warn!("Ignoring malformed query '{}': {}", query, e);
                DashboardParams::default()
            }
        };

        match path {
            "/" => match self.render(&params) {
                Ok(page) => Reply::html(200, page),
                Err(e) => {
                    log::error!("{}", e);
                    Reply::html(500, error_page(&e))
                }
            },

            // Clear maker/model/fuel, keep tier and measure
            "/reset" => {
                let tier = self.tier(&params).to_string();
                let measure = non_empty(&params.measure).unwrap_or_default();
                let query = serde_urlencoded::to_string([("tier", tier), ("measure", measure)])
                    .unwrap_or_default();
                Reply::redirect(format!("/?{}", query))
            }

            _ => Reply::not_found(),
        }
    }
}

fn error_page(err: &ServeError) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ko">
<head><meta charset="UTF-8"><title>{title}</title></head>
<body>
    <h1>{title}</h1>
    <p>데이터를 불러오지 못했습니다.</p>
    <pre>{error}</pre>
</body>
</html>
"#,
        title = html::TITLE,
        error = html::escape(&err.to_string()),
    )
}

/// Start server, open browser, serve the dashboard
pub fn start(config: DashboardConfig) -> io::Result<()> {
    let dashboard = Dashboard::new(config);
    dashboard
        .preload()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let addr = format!("127.0.0.1:{}", dashboard.config.port);
    let server = Server::http(&addr)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", dashboard.config.port);
    eprintln!("\n\x1b[1;32m🚘 pricegrid\x1b[0m");
    eprintln!("   {}", url);
    for dataset in &dashboard.config.datasets {
        eprintln!("   {}: {}", dataset.label, dataset.path.display());
    }
    eprintln!();

    if dashboard.config.open_browser {
        if let Err(e) = open::that(&url) {
            log::warn!("Could not open browser: {}", e);
        }
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &dashboard) {
            log::error!("Error: {}", e);
        }
    }

    Ok(())
}

fn header(name: &str, value: &str) -> io::Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, format!("invalid header {}", name)))
}

fn handle_request(request: Request, dashboard: &Dashboard) -> io::Result<()> {
    let url = request.url().to_string();
    let method = request.method().clone();

    let reply = dashboard.route(&method, &url);
    log::info!("{} {} → {}", method, url, reply.status);

    let mut response = Response::from_string(reply.body)
        .with_status_code(reply.status)
        .with_header(header("Content-Type", reply.content_type)?);
    if let Some(location) = &reply.location {
        response = response.with_header(header("Location", location)?);
    }
    request.respond(response)
}
