//! HTTP server exposing the widgets for README embedding.

mod response;
mod routes;

pub use routes::{Login, Route, WidgetQuery, resolve_route, split_target};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tiny_http::{Method, Request, Server};
use tracing::{info, warn};

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::error::SourceError;
use crate::layout::container_height;
use crate::raster::rasterize;
use crate::render::{WidgetKind, badge, render_error_with, render_widget};
use crate::source::StudentSource;

/// Everything a request handler needs, shared across workers.
pub struct AppState {
    pub config: Config,
    pub source: Box<dyn StudentSource>,
    pub responses: ResponseCache,
}

impl AppState {
    pub fn new(config: Config, source: Box<dyn StudentSource>) -> Self {
        let responses = ResponseCache::new(&config.serve.cache_dir, config.serve.cache_max_age());
        Self {
            config,
            source,
            responses,
        }
    }
}

pub struct BoundServer {
    server: Server,
    addr: SocketAddr,
    state: Arc<AppState>,
}

pub fn bind_server(state: AppState) -> Result<BoundServer> {
    let addr: SocketAddr = format!("{}:{}", state.config.serve.host, state.config.serve.port)
        .parse()
        .with_context(|| format!("invalid listen address {}", state.config.serve.host))?;
    let server = Server::http(addr).map_err(|e| anyhow!("failed to bind {addr}: {e}"))?;
    let addr = server.server_addr().to_ip().unwrap_or(addr);
    info!("listening on http://{addr}");
    Ok(BoundServer {
        server,
        addr,
        state: Arc::new(state),
    })
}

impl BoundServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Runs the request loop on a worker pool (blocking).
    pub fn run(self) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.state.config.serve.workers.max(1))
            .build()
            .context("failed to create worker pool")?;

        for request in self.server.incoming_requests() {
            let state = Arc::clone(&self.state);
            pool.spawn(move || {
                let started = Instant::now();
                let method = request.method().clone();
                let url = request.url().to_string();
                match handle_request(request, &state) {
                    Ok(status) => info!(%method, %url, status, elapsed_ms = started.elapsed().as_millis() as u64, "request"),
                    Err(err) => warn!(%method, %url, error = %err, "request failed"),
                }
            });
        }
        Ok(())
    }
}

pub fn handle_request(request: Request, state: &AppState) -> Result<u16> {
    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::send_error(request, 405, "Method not allowed", "Only GET is supported".to_string());
    }
    let target = request.url().to_string();
    let (path, query) = split_target(&target);
    let query = WidgetQuery::parse(query);

    match resolve_route(path) {
        Route::Widget { kind, login } => serve_widget(request, state, kind, &login, &query),
        Route::PngWidget { kind, login } => serve_png(request, state, kind, &login, &query),
        Route::Student { login } => serve_student(request, state, &login),
        Route::Badge { login } => serve_badge(request, state, &login, &query),
        Route::NotFound => response::send_error(request, 404, "Not found", format!("No route for {path}")),
    }
}

fn fetch(state: &AppState, login: &Login) -> Result<crate::profile::StudentProfile, SourceError> {
    match login {
        Login::Valid(login) => state.source.fetch_student_data(login),
        Login::Invalid(raw) => Err(SourceError::NotFound(raw.clone())),
    }
}

fn widget_options(state: &AppState, query: &WidgetQuery) -> crate::render::WidgetOptions {
    let now = Utc::now();
    let mut options = query.options(&state.config.widget);
    options.as_of = Some(now);
    options.footer_note = Some(format!("updated {}", now.format("%b %-d, %Y")));
    options
}

fn error_command(kind: WidgetKind) -> &'static str {
    match kind {
        WidgetKind::Skills => crate::render::error::SKILLS_COMMAND,
        WidgetKind::Projects => crate::render::error::PROJECTS_COMMAND,
        WidgetKind::Student | WidgetKind::Badge => crate::render::error::STUDENT_COMMAND,
    }
}

fn serve_widget(
    request: Request,
    state: &AppState,
    kind: WidgetKind,
    login: &Login,
    query: &WidgetQuery,
) -> Result<u16> {
    let theme = state.config.theme(query.theme.as_deref());
    let svg = match fetch(state, login) {
        Ok(profile) => render_widget(kind, &profile, &theme, &widget_options(state, query)),
        Err(err) => render_error_with(&err.to_string(), &theme, error_command(kind)),
    };
    response::send_svg(request, svg)
}

fn serve_png(
    request: Request,
    state: &AppState,
    kind: WidgetKind,
    login: &Login,
    query: &WidgetQuery,
) -> Result<u16> {
    let theme_name = query.theme.as_deref().unwrap_or(&state.config.theme_name);
    let params = json!({
        "type": kind.as_str(),
        "username": login.raw(),
        "theme": theme_name,
        "width": query.width,
        "maxSkills": query.max_skills,
        "maxProjects": query.max_projects,
        "includePiscine": query.include_piscine,
    });
    let max_age = state.config.serve.cache_max_age_secs;
    if let Some(png) = state.responses.get(&params) {
        return response::send_png(request, png, max_age);
    }

    let rendered = fetch(state, login)
        .map_err(anyhow::Error::from)
        .and_then(|profile| {
            let theme = state.config.theme(Some(theme_name));
            let options = widget_options(state, query);
            let svg = render_widget(kind, &profile, &theme, &options);
            let (width, height) = match kind {
                WidgetKind::Badge => (badge::badge_width(&profile.login), badge::BADGE_HEIGHT),
                _ => (options.width, container_height(kind, &profile)),
            };
            Ok(rasterize(&svg, width, height, state.config.render.scale)?)
        });
    match rendered {
        Ok(png) => {
            info!(kind = %kind, login = login.raw(), bytes = png.len(), "rendered png");
            state.responses.put(&params, &png);
            response::send_png(request, png, max_age)
        }
        Err(err) => response::send_error(request, 500, "Failed to generate PNG", err.to_string()),
    }
}

fn serve_student(request: Request, state: &AppState, login: &Login) -> Result<u16> {
    match fetch(state, login) {
        Ok(profile) => response::send_json(request, 200, &profile),
        Err(err) => {
            let status = match &err {
                SourceError::NotFound(_) => 404,
                SourceError::RateLimited => 429,
                SourceError::ServiceUnavailable(_) => 503,
                SourceError::Malformed(_) | SourceError::Io(_) => 500,
            };
            response::send_error(request, status, "Failed to fetch student data", err.to_string())
        }
    }
}

fn serve_badge(request: Request, state: &AppState, login: &Login, query: &WidgetQuery) -> Result<u16> {
    let theme = state.config.theme(query.theme.as_deref());
    let svg = match fetch(state, login) {
        Ok(profile) => badge::render_badge(&profile, &theme, None),
        Err(err) => {
            warn!(login = login.raw(), error = %err, "badge falls back to level 0");
            badge::draw_badge(login.raw(), 0.0, &theme)
        }
    };
    response::send_svg(request, svg)
}
