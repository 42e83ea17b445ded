//! OpenAPI 3.0 document generation from request records.

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};
use url::Url;

use crate::curl::{self, RequestRecord};
use crate::errors::{Result, WebtrailError};
use crate::store::Store;

/// How the `servers` list is filled
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServerMode {
    /// One server per distinct origin, in first-seen order
    #[default]
    PerOrigin,
    /// Only the first origin seen
    Single,
    /// Exactly these base URLs
    Explicit(Vec<String>),
}

fn origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Distinct origins of the records in first-seen order
pub fn origins(records: &[RequestRecord]) -> Vec<String> {
    let mut seen = Vec::new();
    for record in records {
        if let Ok(url) = Url::parse(&record.url) {
            let origin = origin(&url);
            if !seen.contains(&origin) {
                seen.push(origin);
            }
        }
    }
    seen
}

fn servers(records: &[RequestRecord], mode: &ServerMode) -> Vec<Value> {
    let urls = match mode {
        ServerMode::Explicit(urls) => urls.clone(),
        ServerMode::PerOrigin => origins(records),
        ServerMode::Single => origins(records).into_iter().take(1).collect(),
    };
    urls.into_iter().map(|url| json!({ "url": url })).collect()
}

fn parameters(record: &RequestRecord, url: &Url) -> Vec<Value> {
    let headers = record.headers.iter().map(|(name, value)| {
        json!({
            "name": name,
            "in": "header",
            "schema": { "type": "string", "example": value }
        })
    });
    let query = url.query_pairs().map(|(name, value)| {
        json!({
            "name": name,
            "in": "query",
            "schema": { "type": "string" },
            "example": value
        })
    });
    headers.chain(query).collect()
}

/// Request body schema keyed by content type, `None` for bodiless requests
fn request_body(record: &RequestRecord) -> Option<Value> {
    if !record.sends_body() {
        return None;
    }
    let content_type = record.content_type()?;
    let body = record.body_text().unwrap_or_default();

    let content = if content_type.contains("application/json") {
        let example = match &record.data {
            Some(Value::String(s)) => serde_json::from_str(s).unwrap_or_else(|_| json!(s)),
            Some(value) => value.clone(),
            None => json!({}),
        };
        json!({
            "application/json": {
                "schema": { "type": "object", "example": example }
            }
        })
    } else if content_type.contains("application/x-www-form-urlencoded") {
        let properties: Map<String, Value> = url::form_urlencoded::parse(body.as_bytes())
            .map(|(key, value)| {
                (
                    key.into_owned(),
                    json!({ "type": "string", "example": value }),
                )
            })
            .collect();
        json!({
            "application/x-www-form-urlencoded": {
                "schema": { "type": "object", "properties": properties }
            }
        })
    } else if content_type.contains("multipart/form-data") {
        json!({
            "multipart/form-data": {
                "schema": {
                    "type": "object",
                    "properties": { "file": { "type": "string", "format": "binary" } }
                }
            }
        })
    } else {
        json!({
            "text/plain": {
                "schema": { "type": "string", "example": body }
            }
        })
    };

    Some(json!({ "content": content }))
}

/// Security requirement implied by the request's credentials
fn security(record: &RequestRecord) -> Value {
    let scheme = match record.header("authorization") {
        Some(auth) if auth.starts_with("Bearer ") => Some("BearerAuth"),
        Some(auth) if auth.starts_with("Basic ") => Some("BasicAuth"),
        Some(_) => Some("ApiKeyAuth"),
        None => record.auth.as_ref().map(|_| "BasicAuth"),
    };
    match scheme {
        Some(name) => {
            let mut requirement = Map::new();
            requirement.insert(name.to_string(), json!([]));
            json!([requirement])
        }
        None => json!([]),
    }
}

fn operation(record: &RequestRecord, url: &Url) -> Value {
    let curl = record.to_curl();
    let mut op = json!({
        "summary": "Converted from cURL",
        "description": format!("Original cURL Command: \n`{}`", curl),
        "x-curl-command": curl,
        "parameters": parameters(record, url),
        "responses": { "200": { "description": "Successful response" } },
        "security": security(record),
    });
    if let Some(body) = request_body(record) {
        op["requestBody"] = body;
    }
    op
}

fn security_schemes() -> Value {
    json!({
        "BearerAuth": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" },
        "BasicAuth": { "type": "http", "scheme": "basic" },
        "ApiKeyAuth": { "type": "apiKey", "in": "header", "name": "Authorization" }
    })
}

/// Build the OpenAPI document
///
/// Methods on the same path share one path item; a later record with the
/// same path and method replaces the earlier operation.
pub fn generate(records: &[RequestRecord], mode: &ServerMode) -> Value {
    let mut paths = Map::new();

    for record in records {
        let url = match Url::parse(&record.url) {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping request with invalid URL '{}': {}", record.url, e);
                continue;
            }
        };
        let item = paths
            .entry(url.path().to_string())
            .or_insert_with(|| json!({}));
        item[record.method.to_lowercase()] = operation(record, &url);
    }

    json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Combined Swagger Specification",
            "version": "1.0.0"
        },
        "servers": servers(records, mode),
        "paths": paths,
        "components": { "securitySchemes": security_schemes() }
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenApiSummary {
    pub output: String,
    pub paths: usize,
    pub operations: usize,
}

/// Read request records under `input` and write the document under `output`
pub fn write_document(
    store: &dyn Store,
    input: &str,
    output: &str,
    mode: &ServerMode,
) -> Result<OpenApiSummary> {
    let records = curl::load_records(store, input)?;
    let document = generate(&records, mode);

    let paths = document["paths"].as_object().map(Map::len).unwrap_or(0);
    let operations = document["paths"]
        .as_object()
        .map(|p| p.values().filter_map(Value::as_object).map(Map::len).sum())
        .unwrap_or(0);

    let json = serde_json::to_string_pretty(&document)
        .map_err(|e| WebtrailError::serialization("openapi document", e))?;
    store.write(output, &json)?;
    info!("Swagger JSON output saved to {}", store.locate(output));

    Ok(OpenApiSummary {
        output: store.locate(output),
        paths,
        operations,
    })
}

#[cfg(test)]
#[path = "openapi_test.rs"]
mod openapi_test;
