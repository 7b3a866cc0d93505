//! One log line per served request
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use http::header::CONTENT_TYPE;
use http_body::Body as _;

/// Logs `METHOD /path -- 200 OK [1.2 kb of text/html, in 1.5ms]` once the response is ready.
pub async fn log_request(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let res = next.run(req).await;

    let duration = start.elapsed();
    let status = res.status();
    let size = res.body().size_hint().exact().unwrap_or_default();
    let ctype = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(media_type)
        .unwrap_or_default();

    tracing::info!(
        "{} {} -- {} {} [{} of {}, in {:?}]",
        method,
        path,
        status.as_u16(),
        status.canonical_reason().unwrap_or_default(),
        humanize_size(size),
        ctype,
        duration,
    );
    res
}

/// Strips the parameters off a content type
fn media_type(ctype: &str) -> &str {
    ctype.split_once(';').map_or(ctype, |(media, _)| media)
}

fn humanize_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{} bytes", bytes);
    }
    let (mut div, mut exp) = (UNIT, 0);
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let unit = "kmgtpe".as_bytes()[exp] as char;
    format!("{:.1} {}b", bytes as f64 / div as f64, unit)
}
