use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use growsync_api::models::Datapoint;
use growsync_client::errors::FetchError;
use growsync_client::services::RequestClient;

struct Scripted {
    delay: Duration,
    result: Result<Vec<Datapoint>, FetchError>,
}

/// Answers backlog and latest queries from separate queues and records every URL.
///
/// An empty queue answers with an empty batch.
#[derive(Default)]
pub struct ScriptedClient {
    backlog: Mutex<VecDeque<Scripted>>,
    latest: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn push_backlog(&self, result: Result<Vec<Datapoint>, FetchError>) {
        self.push_backlog_delayed(Duration::ZERO, result);
    }

    pub fn push_backlog_delayed(&self, delay: Duration, result: Result<Vec<Datapoint>, FetchError>) {
        self.backlog.lock().unwrap().push_back(Scripted { delay, result });
    }

    pub fn push_latest(&self, result: Result<Vec<Datapoint>, FetchError>) {
        self.push_latest_delayed(Duration::ZERO, result);
    }

    pub fn push_latest_delayed(&self, delay: Duration, result: Result<Vec<Datapoint>, FetchError>) {
        self.latest.lock().unwrap().push_back(Scripted { delay, result });
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn backlog_calls(&self) -> usize {
        self.calls().iter().filter(|url| is_backlog(url)).count()
    }

    pub fn latest_calls(&self) -> usize {
        self.calls().iter().filter(|url| !is_backlog(url)).count()
    }
}

fn is_backlog(url: &str) -> bool {
    url.contains("/by_timestamp")
}

#[async_trait]
impl RequestClient for ScriptedClient {
    async fn get_datapoints(&self, url: &str) -> Result<Vec<Datapoint>, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        let queue = if is_backlog(url) { &self.backlog } else { &self.latest };
        let scripted = queue.lock().unwrap().pop_front();

        match scripted {
            Some(Scripted { delay, result }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Ok(Vec::new()),
        }
    }
}
