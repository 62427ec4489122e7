//! URL templates with `:name` path tokens.
//!
//! Resolving a template against a parameter map substitutes every token that
//! has a non-null value, drops the tokens that do not (collapsing the slash in
//! front of them), and hands every parameter that is not a path token back as
//! query parameters.

use crate::constants;
use crate::error::Error;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// ASCII non-word character class, equivalent to `\W` outside Unicode mode.
const NON_WORD: &str = "[^0-9A-Za-z_]";

static WORD_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NON_WORD).expect("Regex pattern is hardcoded and valid"));

/// `/.` in front of the last path segment, e.g. `/id/.json` or `/id/.json?x`.
static DOT_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/\.([0-9A-Za-z_]+)($|\?)").expect("Regex pattern is hardcoded and valid")
});

/// A resolved template: the final URL plus the parameters left for the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResult {
    pub url: String,
    pub query: Option<Map<String, Value>>,
}

/// Substitutes `params` into `template`.
///
/// # Errors
///
/// Returns [`Error::ReservedParamName`] if the template contains the identifier
/// `hasOwnProperty`.
///
/// # Examples
///
/// ```
/// use resourceful::url_template::resolve;
/// use serde_json::json;
///
/// let params = json!({"id": "5", "page": 2});
/// let resolved = resolve("http://x/posts/:id", params.as_object()).unwrap();
/// assert_eq!(resolved.url, "http://x/posts/5");
/// assert_eq!(resolved.query.unwrap()["page"], 2);
/// ```
pub fn resolve(template: &str, params: Option<&Map<String, Value>>) -> Result<UrlResult, Error> {
    let tokens = path_tokens(template)?;
    let empty = Map::new();
    let params = params.unwrap_or(&empty);

    let mut url = template.replace("\\:", ":");

    for token in &tokens {
        url = match params.get(token) {
            Some(value) if !value.is_null() => {
                substitute_token(&url, token, &encode_uri_segment(&segment_string(value)))?
            }
            _ => remove_token(&url, token)?,
        };
    }

    let trimmed = url.trim_end_matches('/');
    let mut url = if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    };

    url = DOT_SEGMENT
        .replacen(&url, 1, |caps: &Captures| format!(".{}{}", &caps[1], &caps[2]))
        .into_owned();
    url = url.replacen("/\\.", "/.", 1);

    let query: Map<String, Value> = params
        .iter()
        .filter(|(key, _)| !tokens.iter().any(|token| token == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(UrlResult {
        url,
        query: if query.is_empty() { None } else { Some(query) },
    })
}

/// Lists the path tokens of a template in the order they first appear.
///
/// # Errors
///
/// Returns [`Error::ReservedParamName`] for the identifier `hasOwnProperty`.
pub fn path_tokens(template: &str) -> Result<Vec<String>, Error> {
    let mut tokens: Vec<String> = Vec::new();

    for word in WORD_SPLIT.split(template) {
        if word == constants::RESERVED_PARAM_NAME {
            return Err(Error::ReservedParamName {
                name: word.to_string(),
            });
        }
        if word.is_empty()
            || word.bytes().all(|b| b.is_ascii_digit())
            || tokens.iter().any(|token| token == word)
        {
            continue;
        }

        let unescaped = token_regex(&format!(r"(^|[^\\]):{}({NON_WORD}|$)", regex::escape(word)))?;
        if unescaped.is_match(template) {
            tokens.push(word.to_string());
        }
    }

    Ok(tokens)
}

/// Percent-encodes a value for use as a single path segment.
///
/// Everything `encodeURIComponent` encodes is encoded, except `@ : $ , & = +`
/// which stay literal. Spaces become `%20`.
#[must_use]
pub fn encode_uri_segment(value: &str) -> String {
    const LITERALS: [(&str, &str); 12] = [
        ("%40", "@"),
        ("%3A", ":"),
        ("%24", "$"),
        ("%2C", ","),
        ("%26", "&"),
        ("%3D", "="),
        ("%2B", "+"),
        ("%21", "!"),
        ("%27", "'"),
        ("%28", "("),
        ("%29", ")"),
        ("%2A", "*"),
    ];

    LITERALS
        .iter()
        .fold(urlencoding::encode(value).into_owned(), |encoded, (from, to)| {
            encoded.replace(from, to)
        })
}

fn substitute_token(url: &str, token: &str, encoded: &str) -> Result<String, Error> {
    let pattern = token_regex(&format!(":{}({NON_WORD}|$)", regex::escape(token)))?;
    Ok(pattern
        .replace_all(url, |caps: &Captures| format!("{encoded}{}", &caps[1]))
        .into_owned())
}

fn remove_token(url: &str, token: &str) -> Result<String, Error> {
    let pattern = token_regex(&format!("(/?):{}({NON_WORD}|$)", regex::escape(token)))?;
    Ok(pattern
        .replace_all(url, |caps: &Captures| {
            let tail = &caps[2];
            if tail.starts_with('/') {
                tail.to_string()
            } else {
                format!("{}{tail}", &caps[1])
            }
        })
        .into_owned())
}

fn token_regex(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern)
        .map_err(|e| Error::invalid_config(format!("Invalid URL template token pattern: {e}")))
}

/// String form of a parameter value as it appears in a path segment.
fn segment_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => segment_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
