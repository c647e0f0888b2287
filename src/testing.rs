//! Test doubles for the content API and the queue.

use crate::api::{ContentApi, RawResponse, TransportError};
use crate::error::PublishError;
use crate::publish::MessageQueue;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A [`ContentApi`] that replays a fixed script of responses and records
/// the parameters of every call. `Err` entries become transport errors.
pub struct ScriptedApi {
    script: Mutex<VecDeque<Result<RawResponse, String>>>,
    calls: Mutex<Vec<HashMap<String, String>>>,
}

impl ScriptedApi {
    pub fn new(script: Vec<Result<RawResponse, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<HashMap<String, String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ContentApi for ScriptedApi {
    async fn search(&self, params: &[(&'static str, String)]) -> Result<RawResponse, TransportError> {
        self.calls.lock().unwrap().push(
            params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        );
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(e)) => Err(e.into()),
            None => Err("script exhausted".into()),
        }
    }
}

/// A successful search response for page `current` of `pages`, holding `count`
/// articles with ids `article-<current>-<i>`.
pub fn page_body(current: u32, pages: u32, count: usize) -> RawResponse {
    let results: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "id": format!("article-{current}-{i}"),
                "sectionId": "technology",
                "sectionName": "Technology",
                "webPublicationDate": "2024-01-01T10:00:00Z",
                "webTitle": format!("Article {current}.{i}"),
                "webUrl": format!("https://www.theguardian.com/article-{current}-{i}"),
                "fields": {"bodyText": "Test content"}
            })
        })
        .collect();
    let body = json!({
        "response": {
            "status": "ok",
            "total": results.len(),
            "currentPage": current,
            "pages": pages,
            "results": results
        }
    });
    RawResponse {
        status: 200,
        body: body.to_string(),
    }
}

pub fn error_response(status: u16) -> RawResponse {
    RawResponse {
        status,
        body: r#"{"response":{"status":"error","message":"test failure"}}"#.to_string(),
    }
}

/// A [`MessageQueue`] that records every body it is given and rejects the
/// sends whose zero-based index is listed in `reject`.
#[derive(Default)]
pub struct RecordingQueue {
    reject: Vec<usize>,
    sent: Mutex<Vec<String>>,
}

impl RecordingQueue {
    pub fn rejecting(reject: Vec<usize>) -> Self {
        Self {
            reject,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Every body handed to `send`, accepted or not.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl MessageQueue for RecordingQueue {
    async fn send(&self, body: String) -> Result<Option<String>, PublishError> {
        let mut sent = self.sent.lock().unwrap();
        let index = sent.len();
        sent.push(body);
        if self.reject.contains(&index) {
            Err(PublishError::Delivery(format!("rejected message {index}")))
        } else {
            Ok(Some(format!("msg-{index}")))
        }
    }
}
