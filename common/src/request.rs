//! The echoed request record shared between the server (which builds it)
//! and the browser client (which reads it back from `window.requestInfo`).

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Snapshot of one inbound HTTP request.
///
/// Fields are private; a record is built once and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    method: String,
    url: String,
    headers: IndexMap<String, String>,
    query: BTreeMap<String, String>,
    pathname: String,
    /// RFC 3339, UTC, millisecond precision.
    timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip: Option<String>,
}

impl RequestRecord {
    /// Start a record for `method` and `url` (path plus query string, as
    /// received on the request line). The pathname is derived from `url`.
    pub fn builder(method: impl Into<String>, url: impl Into<String>) -> RequestRecordBuilder {
        let url = url.into();
        let pathname = url
            .split_once('?')
            .map(|(path, _)| path)
            .unwrap_or(&url)
            .to_string();
        RequestRecordBuilder {
            record: RequestRecord {
                method: method.into(),
                url,
                headers: IndexMap::new(),
                query: BTreeMap::new(),
                pathname,
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                user_agent: None,
                ip: None,
            },
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    /// True for the root page (`/` or an empty path).
    pub fn is_root(&self) -> bool {
        self.pathname.is_empty() || self.pathname == "/"
    }
}

/// Accumulates headers and query parameters before freezing the record.
#[derive(Debug)]
pub struct RequestRecordBuilder {
    record: RequestRecord,
}

impl RequestRecordBuilder {
    /// Add a header. Names are lower-cased; a repeated name keeps its first
    /// position and the values are joined with `", "`, or `"; "` for
    /// `cookie`.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name == "user-agent" && self.record.user_agent.is_none() {
            self.record.user_agent = Some(value.to_string());
        }
        let separator = if name == "cookie" { "; " } else { ", " };
        match self.record.headers.get_mut(&name) {
            Some(existing) => {
                existing.push_str(separator);
                existing.push_str(value);
            }
            None => {
                self.record.headers.insert(name, value.to_string());
            }
        }
        self
    }

    /// Add already-decoded query pairs. The last value for a repeated key wins.
    pub fn query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in pairs {
            self.record.query.insert(k.into(), v.into());
        }
        self
    }

    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.record.ip = Some(ip.into());
        self
    }

    pub fn build(self) -> RequestRecord {
        self.record
    }
}
