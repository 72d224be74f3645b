//! Request view consumed by the dispatcher and apphook views.

use std::sync::Arc;

use url::form_urlencoded;

use crate::content::{Page, Requester};

/// A page request, detached from the HTTP layer.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Request path, e.g. `/en/about/`.
    pub path: String,
    /// Raw query string without `?`.
    pub query_string: String,
    pub query: Vec<(String, String)>,
    pub host: String,
    pub secure: bool,
    /// Active language.
    pub language: String,
    pub requester: Requester,
    /// Page hosting the apphook that is handling the request.
    pub current_page: Option<Arc<Page>>,
    /// Namespace of that apphook instance.
    pub current_app: Option<String>,
}

impl PageRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query_string: String::new(),
            query: Vec::new(),
            host: "localhost".to_string(),
            secure: false,
            language: String::new(),
            requester: Requester::anonymous(),
            current_page: None,
            current_app: None,
        }
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query_string = query.to_string();
        self.query = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_requester(mut self, requester: Requester) -> Self {
        self.requester = requester;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>, secure: bool) -> Self {
        self.host = host.into();
        self.secure = secure;
        self
    }

    /// Whether the query string carries `key`, with or without a value.
    pub fn has_param(&self, key: &str) -> bool {
        self.query.iter().any(|(k, _)| k == key)
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Staff member with the editing toolbar switched on.
    pub fn edit_mode(&self) -> bool {
        self.requester.is_staff && self.has_param("edit")
    }

    /// Drafts are shown in edit mode and to staff asking for them.
    pub fn shows_drafts(&self) -> bool {
        self.requester.is_staff && (self.has_param("edit") || self.has_param("draft"))
    }

    /// Suffix appended to every redirect issued for this request.
    pub fn edit_suffix(&self) -> &'static str {
        if self.has_param("edit") {
            "?edit=1"
        } else if self.has_param("preview") {
            if self.has_param("draft") {
                "?preview=1&draft=1"
            } else {
                "?preview=1"
            }
        } else {
            ""
        }
    }

    /// Path plus query string.
    pub fn full_path(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }

    /// Scheme, host and path.
    pub fn absolute_uri(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}{}", scheme, self.host, self.path)
    }
}
