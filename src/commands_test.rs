// Unit tests for the file-only command handlers

use super::convert::{handle_convert, handle_openapi, handle_postman};
use std::fs;
use tempfile::TempDir;
use webtrail::config::{DirectoryArgs, ServerArgs};

const CURLS: &str = "curl 'https://api.shop.test/cart?id=7' -H 'accept: application/json'\n\
curl 'https://api.shop.test/cart' -H 'content-type: application/json' --data '{\"sku\":\"A1\"}'\n\
curl 'https://cdn.shop.test/v2/prices' -X PUT\n";

fn run_dir() -> (TempDir, DirectoryArgs) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("curl_commands.txt"), CURLS).unwrap();
    let args = DirectoryArgs {
        directory: Some(dir.path().to_path_buf()),
    };
    (dir, args)
}

fn read_json(dir: &TempDir, name: &str) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(dir.path().join(name)).unwrap()).unwrap()
}

#[test]
fn test_convert_writes_records() {
    let (dir, args) = run_dir();
    handle_convert(args).unwrap();

    let records = read_json(&dir, "curl-to-json.json");
    assert_eq!(records.as_array().unwrap().len(), 3);
    assert_eq!(records[1]["method"], "post");
    assert_eq!(records[1]["data"]["sku"], "A1");
}

#[test]
fn test_openapi_writes_swagger() {
    let (dir, args) = run_dir();
    handle_openapi(
        args,
        ServerArgs {
            servers: vec![],
            single_server: false,
        },
    )
    .unwrap();

    let doc = read_json(&dir, "swagger.json");
    assert!(doc["paths"]["/cart"]["get"].is_object());
    assert!(doc["paths"]["/cart"]["post"]["requestBody"].is_object());
    assert_eq!(doc["servers"].as_array().unwrap().len(), 2);
}

#[test]
fn test_postman_writes_both_documents() {
    let (dir, args) = run_dir();
    handle_postman(args, "Shop".to_string()).unwrap();

    let collection = read_json(&dir, "postman_collection.json");
    assert_eq!(collection["info"]["name"], "Shop");
    assert_eq!(collection["item"].as_array().unwrap().len(), 3);
    assert_eq!(collection["item"][2]["request"]["url"]["host"][0], "{{BASE_URL_2}}");

    let environment = read_json(&dir, "postman_environment.json");
    assert_eq!(environment["values"][0]["value"], "https://api.shop.test");
}

#[test]
fn test_convert_without_capture_fails() {
    let dir = TempDir::new().unwrap();
    let err = handle_convert(DirectoryArgs {
        directory: Some(dir.path().to_path_buf()),
    })
    .unwrap_err();
    assert_eq!(webtrail::WebtrailError::from_anyhow(err).exit_code(), 2);
}
