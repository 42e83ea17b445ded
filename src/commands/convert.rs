use anyhow::Result;
use serde_json::json;

use crate::commands::utils;
use webtrail::config::{CURL_COMMANDS_FILE, CURL_JSON_FILE, DirectoryArgs, RunPaths, SWAGGER_FILE, ServerArgs};
use webtrail::curl::{self, ConversionSummary};
use webtrail::store::FileStore;
use webtrail::{openapi, postman};

fn convert(store: &FileStore) -> Result<ConversionSummary> {
    let summary = curl::convert_file(store, CURL_COMMANDS_FILE, CURL_JSON_FILE)?;
    for skipped in &summary.skipped {
        eprintln!("Skipped line {}: {}", skipped.line, skipped.reason);
    }
    Ok(summary)
}

pub fn handle_convert(directory: DirectoryArgs) -> Result<()> {
    let store = utils::open_store(&directory.paths()?)?;
    let summary = convert(&store)?;
    utils::print_json(&summary)
}

pub fn handle_openapi(directory: DirectoryArgs, servers: ServerArgs) -> Result<()> {
    let store = utils::open_store(&directory.paths()?)?;
    let conversion = convert(&store)?;
    let document = openapi::write_document(store.as_ref(), CURL_JSON_FILE, SWAGGER_FILE, &servers.mode())?;
    utils::print_json(&json!({
        "conversion": conversion,
        "openapi": document,
    }))
}

pub fn handle_postman(directory: DirectoryArgs, name: String) -> Result<()> {
    let store = utils::open_store(&directory.paths()?)?;
    let conversion = convert(&store)?;
    let documents =
        postman::write_documents(store.as_ref(), CURL_JSON_FILE, &RunPaths::postman_files(), &name)?;
    utils::print_json(&json!({
        "conversion": conversion,
        "postman": documents,
    }))
}
