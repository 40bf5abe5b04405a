//! Mapping of raw source records into [`Record`]s.
//!
//! Categorization is a pure function of the raw record. Events without a
//! locator for an issue, pull request, or comment carry nothing the merged
//! view can show and are skipped.

use serde_json::Value;

use crate::record::{RawEvent, RawSearchItem, Record, RecordKind, SourceKind};
use crate::window::DateWindow;

/// Map one event into a [`Record`].
///
/// Returns `None` for uncategorized event types and for events whose payload
/// lacks the subject's `html_url`.
#[must_use]
pub fn categorize_event(event: &RawEvent) -> Option<Record> {
    let payload = &event.payload;
    let (kind, subject, locator) = match event.event_type.as_str() {
        "IssuesEvent" => {
            let issue = payload.get("issue")?;
            let kind = if issue.get("pull_request").is_some() {
                RecordKind::PullRequest
            } else {
                RecordKind::Issue
            };
            (kind, issue, issue)
        }
        "PullRequestEvent" => {
            let pr = payload.get("pull_request")?;
            (RecordKind::PullRequest, pr, pr)
        }
        "IssueCommentEvent" => (
            RecordKind::Comment,
            payload.get("issue")?,
            payload.get("comment")?,
        ),
        "PullRequestReviewEvent" => (
            RecordKind::Comment,
            payload.get("pull_request")?,
            payload.get("review")?,
        ),
        "PullRequestReviewCommentEvent" => (
            RecordKind::Comment,
            payload.get("pull_request")?,
            payload.get("comment")?,
        ),
        _ => return None,
    };

    let identity = str_field(locator, "html_url")?;

    Some(Record {
        identity,
        timestamp: event.created_at,
        source: SourceKind::Event,
        kind,
        title: str_field(subject, "title").unwrap_or_default(),
        repo: event.repo.as_ref().map(|r| r.name.clone()),
        state: str_field(subject, "state"),
        actor: event.actor.as_ref().map(|a| a.login.clone()),
        labels: label_names(subject),
        payload: payload.clone(),
    })
}

/// Map one search item into a [`Record`]. Never fails.
#[must_use]
pub fn categorize_search_item(item: &RawSearchItem) -> Record {
    let kind = if item.pull_request.is_some() {
        RecordKind::PullRequest
    } else {
        RecordKind::Issue
    };

    Record {
        identity: item.html_url.clone(),
        timestamp: item.updated_at,
        source: SourceKind::Search,
        kind,
        title: item.title.clone(),
        repo: item.repo_name(),
        state: (!item.state.is_empty()).then(|| item.state.clone()),
        actor: item.user.as_ref().map(|u| u.login.clone()),
        labels: item.labels.iter().map(|l| l.name.clone()).collect(),
        payload: serde_json::to_value(item).unwrap_or(Value::Null),
    }
}

/// Window-filter events on `created_at` and categorize them, in input order.
#[must_use]
pub fn process_events(events: &[RawEvent], window: &DateWindow) -> Vec<Record> {
    events
        .iter()
        .filter(|event| window.contains(&event.created_at))
        .filter_map(|event| {
            let record = categorize_event(event);
            if record.is_none() {
                tracing::debug!(
                    id = %event.id,
                    event_type = %event.event_type,
                    "skipping event without a categorizable subject"
                );
            }
            record
        })
        .collect()
}

/// Window-filter search items on `updated_at` and categorize them, in input
/// order.
#[must_use]
pub fn categorize_search_items(items: &[RawSearchItem], window: &DateWindow) -> Vec<Record> {
    items
        .iter()
        .filter(|item| window.contains(&item.updated_at))
        .map(categorize_search_item)
        .collect()
}

fn str_field(value: &Value, field: &str) -> Option<String> {
    value.get(field)?.as_str().map(str::to_string)
}

fn label_names(subject: &Value) -> Vec<String> {
    subject
        .get("labels")
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .filter_map(|label| str_field(label, "name"))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(event_type: &str, created_at: &str, payload: Value) -> RawEvent {
        serde_json::from_value(json!({
            "id": "1",
            "type": event_type,
            "actor": {"login": "octocat"},
            "repo": {"name": "octo/repo"},
            "payload": payload,
            "created_at": created_at,
        }))
        .expect("valid event")
    }

    fn search_item(url: &str, updated_at: &str) -> RawSearchItem {
        serde_json::from_value(json!({
            "id": 9,
            "html_url": url,
            "title": "Fix it",
            "state": "open",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": updated_at,
            "user": {"login": "hubot"},
            "labels": [{"name": "bug"}],
            "repository_url": "https://api.github.com/repos/octo/repo",
        }))
        .expect("valid search item")
    }

    fn march() -> DateWindow {
        DateWindow::parse("2024-03-01", "2024-03-31").expect("window")
    }

    #[test]
    fn issues_event_uses_issue_url() {
        let e = event(
            "IssuesEvent",
            "2024-03-02T00:00:00Z",
            json!({"action": "opened", "issue": {
                "html_url": "https://github.com/octo/repo/issues/1",
                "title": "Broken",
                "state": "open",
                "labels": [{"name": "bug"}, {"name": "p1"}]
            }}),
        );
        let record = categorize_event(&e).expect("categorized");
        assert_eq!(record.identity, "https://github.com/octo/repo/issues/1");
        assert_eq!(record.kind, RecordKind::Issue);
        assert_eq!(record.source, SourceKind::Event);
        assert_eq!(record.title, "Broken");
        assert_eq!(record.labels, vec!["bug".to_string(), "p1".to_string()]);
        assert_eq!(record.actor.as_deref(), Some("octocat"));
        assert_eq!(record.repo.as_deref(), Some("octo/repo"));
    }

    #[test]
    fn issue_on_a_pull_request_is_a_pull_request() {
        let e = event(
            "IssuesEvent",
            "2024-03-02T00:00:00Z",
            json!({"issue": {"html_url": "https://github.com/o/r/pull/2", "pull_request": {}}}),
        );
        assert_eq!(
            categorize_event(&e).map(|r| r.kind),
            Some(RecordKind::PullRequest)
        );
    }

    #[test]
    fn comment_events_use_the_comment_url() {
        let e = event(
            "IssueCommentEvent",
            "2024-03-02T00:00:00Z",
            json!({
                "issue": {"html_url": "https://github.com/o/r/issues/3", "title": "Q"},
                "comment": {"html_url": "https://github.com/o/r/issues/3#issuecomment-7"}
            }),
        );
        let record = categorize_event(&e).expect("categorized");
        assert_eq!(record.kind, RecordKind::Comment);
        assert_eq!(record.identity, "https://github.com/o/r/issues/3#issuecomment-7");
        assert_eq!(record.title, "Q");
    }

    #[test]
    fn uncategorized_and_locatorless_events_are_skipped() {
        let push = event("PushEvent", "2024-03-02T00:00:00Z", json!({"ref": "main"}));
        assert!(categorize_event(&push).is_none());

        let bare = event("PullRequestEvent", "2024-03-02T00:00:00Z", json!({"pull_request": {}}));
        assert!(categorize_event(&bare).is_none());

        let records = process_events(&[push, bare], &march());
        assert!(records.is_empty());
    }

    #[test]
    fn process_events_filters_on_created_at_and_keeps_order() {
        let make = |n: u32, at: &str| {
            event(
                "PullRequestEvent",
                at,
                json!({"pull_request": {"html_url": format!("https://github.com/o/r/pull/{n}")}}),
            )
        };
        let events = vec![
            make(1, "2024-03-05T00:00:00Z"),
            make(2, "2024-04-01T00:00:00Z"),
            make(3, "2024-03-01T00:00:00Z"),
        ];
        let ids: Vec<String> = process_events(&events, &march())
            .into_iter()
            .map(|r| r.identity)
            .collect();
        assert_eq!(
            ids,
            vec![
                "https://github.com/o/r/pull/1".to_string(),
                "https://github.com/o/r/pull/3".to_string(),
            ]
        );
    }

    #[test]
    fn search_items_filter_on_updated_at() {
        let items = vec![
            search_item("https://github.com/o/r/issues/1", "2024-03-10T00:00:00Z"),
            search_item("https://github.com/o/r/issues/2", "2024-02-10T00:00:00Z"),
        ];
        let records = categorize_search_items(&items, &march());
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.source, SourceKind::Search);
        assert_eq!(record.kind, RecordKind::Issue);
        assert_eq!(record.repo.as_deref(), Some("octo/repo"));
        assert_eq!(record.labels, vec!["bug".to_string()]);
        assert_eq!(record.payload["id"], 9);
    }
}
