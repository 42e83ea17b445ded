// Unit tests for OpenAPI generation

use super::*;
use crate::store::MemoryStore;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn record(method: &str, url: &str, headers: &[(&str, &str)], data: Option<Value>) -> RequestRecord {
    RequestRecord {
        url: url.to_string(),
        method: method.to_string(),
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
        data,
        auth: None,
    }
}

#[test]
fn test_methods_on_same_path_are_merged() {
    let records = vec![
        record("get", "https://api.example.com/items?page=1", &[], None),
        record(
            "post",
            "https://api.example.com/items",
            &[("content-type", "application/json")],
            Some(json!({"name": "pen"})),
        ),
    ];

    let doc = generate(&records, &ServerMode::PerOrigin);
    let item = doc["paths"]["/items"].as_object().unwrap();
    assert_eq!(item.keys().collect::<Vec<_>>(), vec!["get", "post"]);

    assert!(item["get"].get("requestBody").is_none());
    assert_eq!(
        item["get"]["parameters"],
        json!([{ "name": "page", "in": "query", "schema": { "type": "string" }, "example": "1" }])
    );
    assert_eq!(
        item["post"]["requestBody"]["content"]["application/json"]["schema"]["example"],
        json!({"name": "pen"})
    );
}

#[test]
fn test_later_record_replaces_same_operation() {
    let records = vec![
        record("get", "https://api.example.com/me", &[("x-v", "1")], None),
        record("get", "https://api.example.com/me", &[("x-v", "2")], None),
    ];

    let doc = generate(&records, &ServerMode::PerOrigin);
    assert_eq!(
        doc["paths"]["/me"]["get"]["parameters"][0]["schema"]["example"],
        json!("2")
    );
}

#[test]
fn test_security_detection() {
    let bearer = record("get", "https://x.test/a", &[("Authorization", "Bearer t")], None);
    let basic = record("get", "https://x.test/b", &[("authorization", "Basic YTpi")], None);
    let key = record("get", "https://x.test/c", &[("Authorization", "token123")], None);
    let mut creds = record("get", "https://x.test/d", &[], None);
    creds.auth = Some(crate::curl::Credentials {
        user: "ada".into(),
        password: String::new(),
    });
    let none = record("get", "https://x.test/e", &[], None);

    let doc = generate(&[bearer, basic, key, creds, none], &ServerMode::PerOrigin);
    assert_eq!(doc["paths"]["/a"]["get"]["security"], json!([{ "BearerAuth": [] }]));
    assert_eq!(doc["paths"]["/b"]["get"]["security"], json!([{ "BasicAuth": [] }]));
    assert_eq!(doc["paths"]["/c"]["get"]["security"], json!([{ "ApiKeyAuth": [] }]));
    assert_eq!(doc["paths"]["/d"]["get"]["security"], json!([{ "BasicAuth": [] }]));
    assert_eq!(doc["paths"]["/e"]["get"]["security"], json!([]));

    let schemes = doc["components"]["securitySchemes"].as_object().unwrap();
    assert_eq!(schemes.len(), 3);
}

#[test]
fn test_request_body_by_content_type() {
    let form = record(
        "post",
        "https://x.test/login",
        &[("Content-Type", "application/x-www-form-urlencoded")],
        Some(json!("user=ada&lang=en")),
    );
    let upload = record(
        "put",
        "https://x.test/upload",
        &[("content-type", "multipart/form-data; boundary=x")],
        Some(json!("...")),
    );
    let text = record(
        "post",
        "https://x.test/note",
        &[("content-type", "text/csv")],
        Some(json!("a,b")),
    );
    let untyped = record("post", "https://x.test/raw", &[], Some(json!("x")));

    let doc = generate(&[form, upload, text, untyped], &ServerMode::PerOrigin);
    assert_eq!(
        doc["paths"]["/login"]["post"]["requestBody"]["content"]["application/x-www-form-urlencoded"]
            ["schema"]["properties"]["user"],
        json!({ "type": "string", "example": "ada" })
    );
    assert_eq!(
        doc["paths"]["/upload"]["put"]["requestBody"]["content"]["multipart/form-data"]["schema"]
            ["properties"]["file"]["format"],
        json!("binary")
    );
    assert_eq!(
        doc["paths"]["/note"]["post"]["requestBody"]["content"]["text/plain"]["schema"]["example"],
        json!("a,b")
    );
    assert!(doc["paths"]["/raw"]["post"].get("requestBody").is_none());
}

#[test]
fn test_server_modes() {
    let records = vec![
        record("get", "https://b.example.com/x", &[], None),
        record("get", "https://a.example.com:8443/y", &[], None),
        record("get", "https://b.example.com/z", &[], None),
    ];

    assert_eq!(
        generate(&records, &ServerMode::PerOrigin)["servers"],
        json!([{ "url": "https://b.example.com" }, { "url": "https://a.example.com:8443" }])
    );
    assert_eq!(
        generate(&records, &ServerMode::Single)["servers"],
        json!([{ "url": "https://b.example.com" }])
    );
    assert_eq!(
        generate(&records, &ServerMode::Explicit(vec!["https://api.test".into()]))["servers"],
        json!([{ "url": "https://api.test" }])
    );
}

#[test]
fn test_operation_carries_rebuilt_curl() {
    let doc = generate(
        &[record("delete", "https://x.test/items/1", &[("accept", "*/*")], None)],
        &ServerMode::PerOrigin,
    );
    let op = &doc["paths"]["/items/1"]["delete"];
    let curl = r#"curl -X DELETE "https://x.test/items/1" -H "accept: */*""#;
    assert_eq!(op["x-curl-command"], json!(curl));
    assert_eq!(
        op["description"],
        json!(format!("Original cURL Command: \n`{}`", curl))
    );
    assert_eq!(op["responses"]["200"]["description"], json!("Successful response"));
}

#[test]
fn test_invalid_url_is_skipped() {
    let doc = generate(
        &[record("get", "not a url", &[], None)],
        &ServerMode::PerOrigin,
    );
    assert_eq!(doc["paths"], json!({}));
    assert_eq!(doc["servers"], json!([]));
}

#[test]
fn test_write_document_counts() {
    let store = MemoryStore::new();
    let records = vec![
        record("get", "https://x.test/a", &[], None),
        record("put", "https://x.test/a", &[], None),
        record("get", "https://x.test/b", &[], None),
    ];
    store
        .write("curl-to-json.json", &serde_json::to_string(&records).unwrap())
        .unwrap();

    let summary =
        write_document(&store, "curl-to-json.json", "swagger.json", &ServerMode::PerOrigin).unwrap();
    assert_eq!(summary.paths, 2);
    assert_eq!(summary.operations, 3);

    let written: Value = serde_json::from_str(&store.read("swagger.json").unwrap().unwrap()).unwrap();
    assert_eq!(written["openapi"], json!("3.0.0"));
}
