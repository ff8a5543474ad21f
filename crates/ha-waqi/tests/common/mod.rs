//! Shared helpers for the WAQI flow tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ha_config_entries::ConfigEntries;
use ha_waqi::{Feed, SearchResult, Station, WaqiClient, WaqiClientFactory, WaqiError};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber; `RUST_LOG=ha_waqi=debug` shows flow logs
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config_entries() -> Arc<ConfigEntries> {
    Arc::new(ConfigEntries::new())
}

pub fn station(uid: &str, name: &str) -> SearchResult {
    SearchResult {
        uid: uid.to_string(),
        station: Station {
            name: name.to_string(),
            geo: Vec::new(),
            url: None,
        },
    }
}

pub fn feed(uid: &str) -> Feed {
    Feed {
        uid: uid.to_string(),
        aqi: None,
        city: None,
    }
}

/// A call made against the mock API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Search { api_token: String, keyword: String },
    Feed { api_token: String, station: String },
}

#[derive(Default)]
struct MockState {
    search: Option<Result<Vec<SearchResult>, WaqiError>>,
    feed: Option<Result<Option<Feed>, WaqiError>>,
    calls: Vec<Call>,
}

/// Client factory returning canned responses and recording calls
#[derive(Clone, Default)]
pub struct MockWaqi {
    state: Arc<Mutex<MockState>>,
}

impl MockWaqi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_search(&self, response: Result<Vec<SearchResult>, WaqiError>) {
        self.state.lock().unwrap().search = Some(response);
    }

    pub fn set_feed(&self, response: Result<Option<Feed>, WaqiError>) {
        self.state.lock().unwrap().feed = Some(response);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl WaqiClientFactory for MockWaqi {
    fn create(&self, api_token: &str) -> Box<dyn WaqiClient> {
        Box::new(MockClient {
            api_token: api_token.to_string(),
            state: self.state.clone(),
        })
    }
}

struct MockClient {
    api_token: String,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl WaqiClient for MockClient {
    async fn search(&self, keyword: &str) -> Result<Vec<SearchResult>, WaqiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Search {
            api_token: self.api_token.clone(),
            keyword: keyword.to_string(),
        });
        state.search.clone().unwrap_or(Ok(Vec::new()))
    }

    async fn feed(&self, station_id: &str) -> Result<Option<Feed>, WaqiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Feed {
            api_token: self.api_token.clone(),
            station: station_id.to_string(),
        });
        state.feed.clone().unwrap_or(Ok(None))
    }
}
