use std::net::SocketAddr;

use axum::{
    http::header::CONTENT_TYPE,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::extractors::MaybeUser;
use crate::state::AppState;
use crate::{auth, ledger, reports, reset};

const INDEX_HTML: &str = include_str!("../static/index.html");
const APP_JS: &str = include_str!("../static/app.js");

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/static/app.js", get(app_js))
        .route("/health", get(|| async { "ok" }))
        .merge(auth::router())
        .merge(reset::router())
        .merge(ledger::router())
        .merge(reports::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

/// Index page with the username escaped for both the attribute and the text slot.
pub fn render_index(username: Option<&str>) -> String {
    let (attr, text) = username
        .map(|u| {
            (
                html_escape::encode_double_quoted_attribute(u).into_owned(),
                html_escape::encode_text(u).into_owned(),
            )
        })
        .unwrap_or_default();
    INDEX_HTML
        .replace("{{user_attr}}", &attr)
        .replace("{{user}}", &text)
}

async fn index(MaybeUser(user): MaybeUser) -> Html<String> {
    Html(render_index(user.as_ref().map(|u| u.username.as_str())))
}

async fn app_js() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/javascript; charset=utf-8")], APP_JS)
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
