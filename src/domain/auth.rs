use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub const DEFAULT_X_ORIGIN: &str = "https://music.youtube.com";

// Field order here is the field order of the emitted JSON.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AuthPayload {
    #[serde(rename = "Accept")]
    pub accept: String,

    #[serde(rename = "Authorization")]
    pub authorization: String,

    #[serde(rename = "Content-Type")]
    pub content_type: String,

    #[serde(rename = "X-Goog-AuthUser")]
    pub x_goog_authuser: String,

    #[serde(rename = "x-origin")]
    pub x_origin: String,

    #[serde(rename = "Cookie")]
    pub cookie: String,
}

#[derive(Debug, Error)]
pub enum BuildAuthPayloadError {
    #[error("missing required headers: {}", .0.join(", "))]
    MissingHeaders(Vec<&'static str>),
}

// Collects header name -> value from a Chrome "Copy as cURL (bash)" capture.
// Names are lowercased; `-b`/`--cookie` values land under `cookie`. An
// unparsable capture yields an empty map.
pub fn parse_curl_headers(text: &str) -> BTreeMap<String, String> {
    let normalized = text.replace("\\\r\n", " ").replace("\\\n", " ");
    let Some(tokens) = split_shell_words(&normalized) else {
        return BTreeMap::new();
    };

    let mut headers = BTreeMap::new();
    let mut iter = tokens.iter().peekable();
    while let Some(token) = iter.next() {
        let mut header_blob: Option<&str> = None;
        let mut cookie_blob: Option<&str> = None;

        match token.as_str() {
            "-H" | "--header" => {
                header_blob = iter.next().map(|value| value.as_str());
            }
            "-b" | "--cookie" => {
                cookie_blob = iter.next().map(|value| value.as_str());
            }
            other => {
                if let Some(rest) = other.strip_prefix("--header=") {
                    header_blob = Some(rest);
                } else if let Some(rest) = other.strip_prefix("--cookie=") {
                    cookie_blob = Some(rest);
                } else if let Some(rest) = other.strip_prefix("-H") {
                    if !rest.is_empty() {
                        header_blob = Some(rest);
                    }
                }
            }
        }

        if let Some(blob) = header_blob {
            if let Some((name, value)) = blob.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }
        if let Some(blob) = cookie_blob {
            headers.insert("cookie".to_string(), blob.trim().to_string());
        }
    }

    headers
}

pub fn build_auth_payload(
    headers: &BTreeMap<String, String>,
) -> Result<AuthPayload, BuildAuthPayloadError> {
    let get = |name: &str| {
        headers
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
    };

    let authorization = get("authorization");
    let cookie = get("cookie");
    if authorization.is_none() || cookie.is_none() {
        let mut missing = Vec::new();
        if authorization.is_none() {
            missing.push("Authorization");
        }
        if cookie.is_none() {
            missing.push("Cookie");
        }
        return Err(BuildAuthPayloadError::MissingHeaders(missing));
    }

    Ok(AuthPayload {
        accept: get("accept").unwrap_or_else(|| "*/*".to_string()),
        authorization: authorization.unwrap_or_default(),
        content_type: get("content-type").unwrap_or_else(|| "application/json".to_string()),
        x_goog_authuser: get("x-goog-authuser").unwrap_or_else(|| "0".to_string()),
        x_origin: get("x-origin")
            .or_else(|| get("origin"))
            .unwrap_or_else(|| DEFAULT_X_ORIGIN.to_string()),
        cookie: cookie.unwrap_or_default(),
    })
}

// Shell-style word splitting: single quotes are literal, double quotes honor
// backslash escapes for `"` and `\`, a bare backslash escapes the next
// character. An unterminated quote fails the whole split.
fn split_shell_words(text: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(inner) => current.push(inner),
                        None => return None,
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped @ ('"' | '\\' | '$' | '`')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return None,
                        },
                        Some(inner) => current.push(inner),
                        None => return None,
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return None,
                }
            }
            other => {
                in_word = true;
                current.push(other);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Some(words)
}
