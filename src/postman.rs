//! Postman v2.1 collection and environment generation from request records.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use url::Url;

use crate::curl::{self, RequestRecord};
use crate::errors::{Result, WebtrailError};
use crate::store::Store;

pub const COLLECTION_SCHEMA: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// Base URL variable assigned to one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostVariable {
    pub host: String,
    /// `BASE_URL_<n>`
    pub key: String,
    /// Origin of the first request seen for the host
    pub value: String,
}

impl HostVariable {
    pub fn placeholder(&self) -> String {
        format!("{{{{{}}}}}", self.key)
    }
}

/// Number every distinct host in first-seen order
pub fn host_variables(records: &[RequestRecord]) -> Vec<HostVariable> {
    let mut vars: Vec<HostVariable> = Vec::new();
    for record in records {
        let Ok(url) = Url::parse(&record.url) else {
            continue;
        };
        let host = host_of(&url);
        if vars.iter().any(|v| v.host == host) {
            continue;
        }
        vars.push(HostVariable {
            key: format!("BASE_URL_{}", vars.len() + 1),
            value: url.origin().ascii_serialization(),
            host,
        });
    }
    vars
}

fn host_of(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

fn item(record: &RequestRecord, url: &Url, var: &str) -> Value {
    let path = url.path();
    let path_and_query = match url.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    let headers: Vec<Value> = record
        .headers
        .iter()
        .map(|(key, value)| json!({ "key": key, "value": value }))
        .collect();
    let query: Vec<Value> = url
        .query_pairs()
        .map(|(key, value)| {
            json!({ "key": key, "value": value, "description": "", "disabled": false })
        })
        .collect();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut request = json!({
        "method": record.method.to_uppercase(),
        "header": headers,
        "url": {
            "raw": format!("{}{}", var, path_and_query),
            "host": [var],
            "path": segments,
            "query": query
        },
        "description": format!("Converted from cURL command: {}", record.to_curl())
    });

    if record.method != "get"
        && let Some(body) = record.body_text()
    {
        request["body"] = json!({
            "mode": "raw",
            "raw": body,
            "options": { "raw": { "language": "json" } }
        });
    }

    json!({ "name": path, "request": request })
}

/// Build the collection document
pub fn collection(records: &[RequestRecord], vars: &[HostVariable], name: &str) -> Value {
    let items: Vec<Value> = records
        .iter()
        .filter_map(|record| {
            let url = match Url::parse(&record.url) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Skipping request with invalid URL '{}': {}", record.url, e);
                    return None;
                }
            };
            let host = host_of(&url);
            let var = vars
                .iter()
                .find(|v| v.host == host)
                .map(HostVariable::placeholder)
                .unwrap_or_else(|| "{{BASE_URL}}".to_string());
            Some(item(record, &url, &var))
        })
        .collect();

    json!({
        "info": {
            "_postman_id": uuid::Uuid::new_v4().to_string(),
            "name": name,
            "schema": COLLECTION_SCHEMA
        },
        "item": items
    })
}

/// Build the environment holding one value per host variable
pub fn environment(vars: &[HostVariable], name: &str) -> Value {
    let values: Vec<Value> = vars
        .iter()
        .map(|v| json!({ "key": v.key, "value": v.value, "enabled": true }))
        .collect();
    json!({ "name": name, "values": values })
}

#[derive(Debug, Clone)]
pub struct PostmanFiles {
    pub collection: String,
    pub environment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostmanSummary {
    pub collection: String,
    pub environment: String,
    pub requests: usize,
    pub hosts: usize,
}

/// Read request records under `input` and write collection and environment
pub fn write_documents(
    store: &dyn Store,
    input: &str,
    files: &PostmanFiles,
    name: &str,
) -> Result<PostmanSummary> {
    let records = curl::load_records(store, input)?;
    let vars = host_variables(&records);
    let collection = collection(&records, &vars, name);
    let environment = environment(&vars, &format!("{} Environment", name));

    let requests = collection["item"].as_array().map(Vec::len).unwrap_or(0);
    for (key, doc) in [
        (&files.collection, &collection),
        (&files.environment, &environment),
    ] {
        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| WebtrailError::serialization("postman document", e))?;
        store.write(key, &json)?;
        info!("Postman output saved to {}", store.locate(key));
    }

    Ok(PostmanSummary {
        collection: store.locate(&files.collection),
        environment: store.locate(&files.environment),
        requests,
        hosts: vars.len(),
    })
}

#[cfg(test)]
#[path = "postman_test.rs"]
mod postman_test;
