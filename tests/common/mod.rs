// Common test utilities and fixtures

use serde_json::Value;
use std::path::Path;
use std::process::Command;

/// Run webtrail with `args`, returning parsed stdout JSON and the exit code
pub fn run_command(args: &[&str]) -> (Value, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_webtrail"))
        .args(args)
        .env("RUST_LOG", "webtrail=warn")
        .output()
        .expect("Failed to run webtrail");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let exit_code = output.status.code().unwrap_or(-1);

    let json = serde_json::from_str(&stdout).unwrap_or_else(|_| {
        serde_json::json!({
            "error": exit_code != 0,
            "message": stdout.to_string(),
            "exit_code": exit_code
        })
    });
    (json, exit_code)
}

/// Read a JSON file written by a run
#[allow(dead_code)]
pub fn read_json(path: &Path) -> Value {
    let text = std::fs::read_to_string(path).expect("missing output file");
    serde_json::from_str(&text).expect("output is not JSON")
}

/// Captured traffic from a small shop front end
pub mod fixtures {
    pub const CURL_COMMANDS: &str = concat!(
        "curl 'https://api.shop.test/v1/products?category=books&page=2' -H 'accept: application/json' -H 'authorization: Bearer eyJhbGciOi'\n",
        "curl 'https://api.shop.test/v1/cart' -H 'content-type: application/json' -H 'authorization: Bearer eyJhbGciOi' --data '{\"sku\":\"B-42\",\"qty\":1}'\n",
        "curl 'https://api.shop.test/v1/cart/B-42' -X DELETE -H 'authorization: Bearer eyJhbGciOi'\n",
        "curl 'https://auth.shop.test/session' -H 'content-type: application/x-www-form-urlencoded' --data 'user=ada&remember=1'\n",
        "this line is not a curl command\n",
    );
}
