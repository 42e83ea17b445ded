//! curl command parsing into request records.
//!
//! Understands the subset of curl that browsers emit when copying a request
//! and that [`crate::capture`] writes: URL, method, headers, cookies, basic
//! credentials and request bodies. Anything else is accepted and ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::errors::{Result, WebtrailError};
use crate::store::Store;

/// One HTTP request reconstructed from a curl command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub url: String,
    /// Lower-case HTTP method
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Body, parsed as JSON when it is JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Credentials>,
}

fn default_method() -> String {
    "get".to_string()
}

/// `-u user:password`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl RequestRecord {
    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Whether the method is allowed to carry a body
    pub fn sends_body(&self) -> bool {
        !matches!(self.method.as_str(), "get" | "head")
    }

    /// Body as the text that went over the wire
    pub fn body_text(&self) -> Option<String> {
        match self.data.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Rebuild an equivalent curl command for documentation
    pub fn to_curl(&self) -> String {
        let mut curl = format!("curl -X {} \"{}\"", self.method.to_uppercase(), self.url);
        for (name, value) in &self.headers {
            curl.push_str(&format!(" -H \"{}: {}\"", name, value.replace('"', "\\\"")));
        }
        if self.sends_body()
            && let Some(body) = self.body_text()
        {
            let form = self
                .content_type()
                .is_some_and(|ct| ct.contains("application/x-www-form-urlencoded"));
            if form {
                curl.push_str(&format!(" --data \"{}\"", body));
            } else {
                curl.push_str(&format!(" --data '{}'", body.replace('\'', r"'\''")));
            }
        }
        curl
    }
}

/// Split a command line into words the way a POSIX shell would
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => word.push(c),
                        None => return Err(WebtrailError::Parse("unterminated single quote".into())),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => word.push(c),
                            Some('\n') => {}
                            Some(c) => {
                                word.push('\\');
                                word.push(c);
                            }
                            None => return Err(WebtrailError::Parse("unterminated double quote".into())),
                        },
                        Some(c) => word.push(c),
                        None => return Err(WebtrailError::Parse("unterminated double quote".into())),
                    }
                }
            }
            '$' if chars.peek() == Some(&'\'') => {
                chars.next();
                in_word = true;
                ansi_c_quoted(&mut chars, &mut word)?;
            }
            '\\' => match chars.next() {
                // line continuation
                Some('\n') => {}
                Some(c) => {
                    in_word = true;
                    word.push(c);
                }
                None => {}
            },
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }

    if in_word {
        words.push(word);
    }
    Ok(words)
}

fn ansi_c_quoted(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    word: &mut String,
) -> Result<()> {
    loop {
        match chars.next() {
            Some('\'') => return Ok(()),
            Some('\\') => match chars.next() {
                Some('n') => word.push('\n'),
                Some('t') => word.push('\t'),
                Some('r') => word.push('\r'),
                Some('0') => word.push('\0'),
                Some('x') => {
                    let hex: String = std::iter::from_fn(|| chars.next_if(|c| c.is_ascii_hexdigit()))
                        .take(2)
                        .collect();
                    let code = u32::from_str_radix(&hex, 16)
                        .map_err(|_| WebtrailError::Parse(format!("bad \\x escape '{}'", hex)))?;
                    word.extend(char::from_u32(code));
                }
                Some('u') => {
                    let hex: String = std::iter::from_fn(|| chars.next_if(|c| c.is_ascii_hexdigit()))
                        .take(4)
                        .collect();
                    let code = u32::from_str_radix(&hex, 16)
                        .map_err(|_| WebtrailError::Parse(format!("bad \\u escape '{}'", hex)))?;
                    word.extend(char::from_u32(code));
                }
                Some(c) => word.push(c),
                None => break,
            },
            Some(c) => word.push(c),
            None => break,
        }
    }
    Err(WebtrailError::Parse("unterminated $'' quote".into()))
}

/// Options that take a value and are otherwise ignored
const IGNORED_WITH_VALUE: &[&str] = &[
    "-o",
    "--output",
    "-m",
    "--max-time",
    "--connect-timeout",
    "-x",
    "--proxy",
    "--retry",
    "-w",
    "--write-out",
    "--cacert",
    "--cert",
    "--key",
    "-F",
    "--form",
];

/// Parse one curl command
pub fn parse_command(line: &str) -> Result<RequestRecord> {
    let words = tokenize(line)?;
    let mut args = words.into_iter();

    match args.next() {
        Some(first) if first == "curl" => {}
        other => {
            return Err(WebtrailError::Parse(format!(
                "not a curl command: {}",
                other.unwrap_or_default()
            )));
        }
    }

    let mut url = None;
    let mut method: Option<String> = None;
    let mut headers = BTreeMap::new();
    let mut data: Vec<String> = Vec::new();
    let mut auth = None;
    let mut get = false;

    while let Some(arg) = args.next() {
        // --flag=value
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if arg.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let take = |args: &mut std::vec::IntoIter<String>| match inline.clone() {
            Some(value) => Ok(value),
            None => args
                .next()
                .ok_or_else(|| WebtrailError::Parse(format!("option {} needs a value", flag))),
        };

        match flag.as_str() {
            "-X" | "--request" => method = Some(take(&mut args)?.to_lowercase()),
            "-H" | "--header" => {
                let header = take(&mut args)?;
                match header.split_once(':') {
                    Some((name, value)) => {
                        headers.insert(name.trim().to_string(), value.trim().to_string());
                    }
                    None => warn!("Ignoring malformed header '{}'", header),
                }
            }
            "-d" | "--data" | "--data-raw" | "--data-binary" | "--data-ascii"
            | "--data-urlencode" => data.push(take(&mut args)?),
            "-b" | "--cookie" => {
                headers.insert("Cookie".to_string(), take(&mut args)?);
            }
            "-A" | "--user-agent" => {
                headers.insert("User-Agent".to_string(), take(&mut args)?);
            }
            "-e" | "--referer" => {
                headers.insert("Referer".to_string(), take(&mut args)?);
            }
            "-u" | "--user" => {
                let value = take(&mut args)?;
                let (user, password) = value.split_once(':').unwrap_or((value.as_str(), ""));
                auth = Some(Credentials {
                    user: user.to_string(),
                    password: password.to_string(),
                });
            }
            "--url" => url = Some(take(&mut args)?),
            "-G" | "--get" => get = true,
            f if IGNORED_WITH_VALUE.contains(&f) => {
                take(&mut args)?;
            }
            f if f.starts_with('-') && f.len() > 1 => {}
            _ => {
                if url.is_none() {
                    url = Some(arg);
                }
            }
        }
    }

    let mut url = url.ok_or_else(|| WebtrailError::Parse("curl command has no URL".into()))?;
    let body = (!data.is_empty()).then(|| data.join("&"));

    let (method, body) = if get {
        if let Some(query) = body {
            let sep = if url.contains('?') { '&' } else { '?' };
            url = format!("{}{}{}", url, sep, query);
        }
        (method.unwrap_or_else(|| "get".to_string()), None)
    } else {
        let inferred = if body.is_some() { "post" } else { "get" };
        (method.unwrap_or_else(|| inferred.to_string()), body)
    };

    Ok(RequestRecord {
        url,
        method,
        headers,
        data: body.map(|b| serde_json::from_str(&b).unwrap_or(Value::String(b))),
        auth,
    })
}

/// Line that could not be converted
#[derive(Debug, Clone, Serialize)]
pub struct SkippedLine {
    /// 1-based line number in the input
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionSummary {
    pub input: String,
    pub output: String,
    pub converted: usize,
    pub skipped: Vec<SkippedLine>,
}

/// Parse every non-blank line, reporting the ones that fail
pub fn parse_lines(text: &str) -> (Vec<RequestRecord>, Vec<SkippedLine>) {
    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("Skipping curl command on line {}: {}", index + 1, e);
                skipped.push(SkippedLine {
                    line: index + 1,
                    reason: e.to_string(),
                });
            }
        }
    }
    (records, skipped)
}

/// Convert the curl log under `input` into a JSON array under `output`
pub fn convert_file(store: &dyn Store, input: &str, output: &str) -> Result<ConversionSummary> {
    let text = store
        .read(input)?
        .ok_or_else(|| WebtrailError::LogMissing(store.locate(input).into()))?;

    let (records, skipped) = parse_lines(&text);
    let json = serde_json::to_string_pretty(&records)
        .map_err(|e| WebtrailError::serialization("request records", e))?;
    store.write(output, &json)?;
    info!("JSON output saved to {}", store.locate(output));

    Ok(ConversionSummary {
        input: store.locate(input),
        output: store.locate(output),
        converted: records.len(),
        skipped,
    })
}

/// Read request records written by [`convert_file`]
pub fn load_records(store: &dyn Store, key: &str) -> Result<Vec<RequestRecord>> {
    let json = store
        .read(key)?
        .ok_or_else(|| WebtrailError::LogMissing(store.locate(key).into()))?;
    serde_json::from_str(&json).map_err(|e| WebtrailError::serialization(store.locate(key), e))
}

#[cfg(test)]
#[path = "curl_test.rs"]
mod curl_test;
