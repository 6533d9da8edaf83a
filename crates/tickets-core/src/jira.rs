//! Jira REST v2 client.
//!
//! Only two endpoints are used: `GET /rest/api/2/search` to look for an open
//! ticket carrying a content hash, and `POST /rest/api/2/issue` to create
//! one. Authentication is HTTP basic with the account email and an API token.

use crate::error::{Result, TicketsError};
use crate::secrets::JiraSecrets;
use crate::tracker::{NewTicket, TicketRef, Tracker, HASH_MARKER};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

/// Longest error body kept in `TicketsError::Tracker`.
const MAX_ERROR_BODY: usize = 500;

/// Search hits fetched per lookup. Jira's `~` is a fuzzy text match, so more
/// than one candidate is checked for the exact hash marker.
const SEARCH_LIMIT: &str = "10";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<SearchIssue>,
}

#[derive(Debug, Deserialize)]
struct SearchIssue {
    key: String,
    #[serde(default)]
    fields: Option<SearchFields>,
}

#[derive(Debug, Deserialize)]
struct SearchFields {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<StatusField>,
}

#[derive(Debug, Deserialize)]
struct StatusField {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    key: String,
}

pub struct JiraClient {
    http: Client,
    server: String,
    email: String,
    api_token: String,
    project: String,
    issue_type: String,
}

impl JiraClient {
    pub fn new(secrets: &JiraSecrets, issue_type: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tickets/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            server: secrets.server.trim_end_matches('/').to_string(),
            email: secrets.email.clone(),
            api_token: secrets.api_token.clone(),
            project: secrets.project.clone(),
            issue_type: issue_type.to_string(),
        })
    }

    /// JQL matching non-closed tickets in the project whose description
    /// carries `content_hash`.
    pub fn duplicate_jql(&self, content_hash: &str) -> String {
        format!(
            "project = \"{}\" AND description ~ \"{HASH_MARKER} {content_hash}\" AND statusCategory != Done",
            self.project
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server)
    }
}

impl Tracker for JiraClient {
    fn find_open_by_hash(&self, content_hash: &str) -> Result<Option<TicketRef>> {
        let jql = self.duplicate_jql(content_hash);
        let resp = self
            .http
            .get(self.url("/rest/api/2/search"))
            .basic_auth(&self.email, Some(&self.api_token))
            .query(&[
                ("jql", jql.as_str()),
                ("maxResults", SEARCH_LIMIT),
                ("fields", "summary,status,description"),
            ])
            .send()?;
        let found: SearchResponse = check(resp)?.json()?;
        let marker = format!("{HASH_MARKER} {content_hash}");
        Ok(found
            .issues
            .into_iter()
            .filter_map(|issue| {
                let fields = issue.fields?;
                fields
                    .description
                    .as_deref()
                    .is_some_and(|d| d.contains(&marker))
                    .then(|| TicketRef {
                        key: issue.key,
                        status: fields.status.map(|s| s.name),
                    })
            })
            .next())
    }

    fn create(&self, ticket: &NewTicket) -> Result<TicketRef> {
        let body = serde_json::json!({
            "fields": {
                "project": { "key": self.project },
                "summary": ticket.summary,
                "description": ticket.description,
                "issuetype": { "name": self.issue_type },
                "labels": ticket.labels,
            }
        });
        let resp = self
            .http
            .post(self.url("/rest/api/2/issue"))
            .basic_auth(&self.email, Some(&self.api_token))
            .json(&body)
            .send()?;
        let created: CreatedIssue = check(resp)?.json()?;
        if created.key.is_empty() {
            return Err(TicketsError::TrackerResponse(
                "issue created without a key".to_string(),
            ));
        }
        Ok(TicketRef {
            key: created.key,
            status: None,
        })
    }
}

/// Turn non-2xx responses into `TicketsError::Tracker`.
fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let mut body = resp.text().unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(TicketsError::Tracker {
        status: status.as_u16(),
        body,
    })
}
