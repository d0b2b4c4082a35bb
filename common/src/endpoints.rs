// Endpoint source loading
// A source is either a JSON object mapping URL to selector, or a
// newline-delimited list of URLs sharing the default selector.

use crate::errors::ConfigError;
use crate::models::EndpointSpec;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Read and parse an endpoint source file.
///
/// Distinguishes "not a file" (including missing paths) from "unreadable",
/// so each maps to its own exit code.
pub fn load_endpoints(path: &Path, default_selector: &str) -> Result<Vec<EndpointSpec>, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::EndpointsNotAFile(path.to_path_buf()));
    }

    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::EndpointsUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let endpoints = parse_endpoints(&contents, default_selector).map_err(|err| match err {
        ParseError::Malformed(reason) => ConfigError::EndpointsUnreadable {
            path: path.to_path_buf(),
            reason,
        },
        ParseError::Invalid { identifier, reason } => {
            ConfigError::InvalidEndpoint { identifier, reason }
        }
    })?;

    if endpoints.is_empty() {
        return Err(ConfigError::NoEndpoints(path.to_path_buf()));
    }

    Ok(endpoints)
}

/// Endpoint parse failure, before a path is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Malformed(String),
    Invalid { identifier: String, reason: String },
}

/// Parse endpoint source text. An empty result is not an error here;
/// the caller decides.
pub fn parse_endpoints(contents: &str, default_selector: &str) -> Result<Vec<EndpointSpec>, ParseError> {
    if contents.trim_start().starts_with('{') {
        parse_selector_map(contents)
    } else {
        Ok(parse_url_list(contents, default_selector))
    }
}

/// Parse a newline-delimited list, dropping blank lines and `#` comments
pub fn parse_url_list(contents: &str, default_selector: &str) -> Vec<EndpointSpec> {
    let mut seen = HashSet::new();

    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| {
            let fresh = seen.insert(line.to_string());
            if !fresh {
                debug!(endpoint = %line, "Skipping duplicate endpoint");
            }
            fresh
        })
        .map(|line| EndpointSpec::new(line, default_selector))
        .collect()
}

fn parse_selector_map(contents: &str) -> Result<Vec<EndpointSpec>, ParseError> {
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(contents)
        .map_err(|e| ParseError::Malformed(format!("invalid JSON endpoint map: {}", e)))?;

    let mut seen = HashSet::new();
    let mut endpoints = Vec::with_capacity(map.len());

    for (url, selector) in map {
        let identifier = url.trim().to_string();
        if identifier.is_empty() {
            return Err(ParseError::Invalid {
                identifier: url,
                reason: "identifier is empty".to_string(),
            });
        }

        let selector = match selector.as_str().map(str::trim) {
            Some(selector) if !selector.is_empty() => selector.to_string(),
            _ => {
                return Err(ParseError::Invalid {
                    identifier,
                    reason: "selector must be a non-empty string".to_string(),
                })
            }
        };

        // Keys that only differ in surrounding whitespace name the same endpoint
        if !seen.insert(identifier.clone()) {
            debug!(endpoint = %identifier, "Skipping duplicate endpoint");
            continue;
        }

        endpoints.push(EndpointSpec::new(identifier, selector));
    }

    Ok(endpoints)
}
