use crossbeam_channel::{Receiver, Sender};
use sky_core::Feed;
use std::thread;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub type FeedBody = Result<String, String>;

/// Blocking HTTP on a worker thread. The frame loop posts due feeds and
/// drains finished bodies; it never waits on the network.
pub struct FeedWorker {
    requests: Sender<(Feed, String)>,
    bodies: Receiver<(Feed, FeedBody)>,
}

fn fetch(client: &reqwest::blocking::Client, url: &str) -> FeedBody {
    client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.text())
        .map_err(|e| e.to_string())
}

impl FeedWorker {
    pub fn spawn() -> anyhow::Result<Self> {
        let (req_tx, req_rx) = crossbeam_channel::unbounded::<(Feed, String)>();
        let (body_tx, body_rx) = crossbeam_channel::unbounded();
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("quantum-sky/", env!("CARGO_PKG_VERSION")))
            .build()?;
        thread::Builder::new()
            .name("feed-fetch".into())
            .spawn(move || {
                for (feed, url) in req_rx {
                    let body = fetch(&client, &url);
                    if body_tx.send((feed, body)).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self {
            requests: req_tx,
            bodies: body_rx,
        })
    }

    pub fn request(&self, feed: Feed, url: String) {
        if self.requests.send((feed, url)).is_err() {
            log::warn!("[world] fetch worker gone, {} not requested", feed);
        }
    }

    pub fn finished(&self) -> impl Iterator<Item = (Feed, FeedBody)> + '_ {
        self.bodies.try_iter()
    }
}
