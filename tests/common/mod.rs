//! Test utilities and fakes for the tablescrape test suite

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tablescrape::acquisition::AcquisitionContext;
use tablescrape::diagnostics::DiagnosticSink;
use tablescrape::fetch::{FetchError, FetchRequest, FetchResponse, FetchResult, Fetcher, RetryPolicy};
use tablescrape::render::load_more::LoadMoreConfig;
use tablescrape::render::{ActionHandle, ActionLocator, RenderSession, Renderer, SessionOptions};

/// Builds an HTTP 200 response with the given content type
#[allow(dead_code)]
pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> FetchResult<FetchResponse> {
    Ok(FetchResponse {
        status: 200,
        headers: vec![("Content-Type".to_string(), content_type.to_string())],
        body: body.into(),
        final_url: None,
    })
}

/// HTML response served from `final_url` after a redirect
#[allow(dead_code)]
pub fn redirected(final_url: &str, body: &str) -> FetchResult<FetchResponse> {
    html(body).map(|response| FetchResponse {
        final_url: Some(final_url.to_string()),
        ..response
    })
}

#[allow(dead_code)]
pub fn html(body: &str) -> FetchResult<FetchResponse> {
    ok("text/html; charset=utf-8", body)
}

#[allow(dead_code)]
pub fn transient() -> FetchResult<FetchResponse> {
    Err(FetchError::Network("connection reset by peer".to_string()))
}

/// Fetcher answering from per-URL scripts.
///
/// Each URL holds a queue of responses; the last one repeats once the queue
/// is down to it. Unknown URLs answer 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<FetchResult<FetchResponse>>>>,
    calls: Mutex<Vec<FetchRequest>>,
}

#[allow(dead_code)]
impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, url: &str, responses: Vec<FetchResult<FetchResponse>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), responses.into());
        self
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|r| r.url == url).count()
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchResponse> {
        self.calls.lock().unwrap().push(request.clone());
        let mut scripts = self.scripts.lock().unwrap();
        let Some(queue) = scripts.get_mut(&request.url) else {
            return Ok(FetchResponse {
                status: 404,
                ..FetchResponse::default()
            });
        };
        match queue.len() {
            0 => Ok(FetchResponse {
                status: 404,
                ..FetchResponse::default()
            }),
            1 => queue[0].clone(),
            _ => queue.pop_front().unwrap(),
        }
    }
}

/// Sink keeping every snapshot in memory
#[derive(Default)]
pub struct CapturingSink {
    pub snapshots: Mutex<Vec<(String, String, Vec<u8>)>>,
}

#[allow(dead_code)]
impl CapturingSink {
    pub fn suffixes(&self) -> Vec<String> {
        self.snapshots
            .lock()
            .unwrap()
            .iter()
            .map(|(_, suffix, _)| suffix.clone())
            .collect()
    }
}

#[async_trait]
impl DiagnosticSink for CapturingSink {
    async fn record(&self, category: &str, suffix: &str, content: &[u8]) {
        self.snapshots
            .lock()
            .unwrap()
            .push((category.to_string(), suffix.to_string(), content.to_vec()));
    }
}

/// Observable state of a simulated browser page
#[derive(Debug, Default)]
pub struct PageState {
    pub rows: usize,
    /// Rows added by each successive click; once exhausted clicks add nothing
    pub growth: VecDeque<usize>,
    pub has_control: bool,
    pub clicks: u32,
    pub navigated_to: Option<String>,
    /// Where the page ends up after navigation, when it redirects
    pub landed_on: Option<String>,
    pub closed: bool,
}

/// Render session over a `PageState`, rendering its rows as a ranking table
pub struct SimulatedSession {
    pub state: Arc<Mutex<PageState>>,
}

#[async_trait]
impl RenderSession for SimulatedSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.state.lock().unwrap().navigated_to = Some(url.to_string());
        Ok(())
    }

    async fn current_url(&mut self) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.landed_on.clone().or_else(|| state.navigated_to.clone()))
    }

    async fn current_html(&mut self) -> Result<String> {
        let state = self.state.lock().unwrap();
        if state.closed {
            bail!("session closed");
        }
        Ok(ranking_page(state.rows))
    }

    async fn find_clickable(&mut self, locators: &[ActionLocator]) -> Result<Option<ActionHandle>> {
        let state = self.state.lock().unwrap();
        Ok((state.has_control && !locators.is_empty()).then(|| ActionHandle {
            locator: locators[0].clone(),
        }))
    }

    async fn click(&mut self, _handle: &ActionHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.clicks += 1;
        let added = state.growth.pop_front().unwrap_or(0);
        state.rows += added;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// Renderer handing out sessions over one shared page state
pub struct SimulatedRenderer {
    pub state: Arc<Mutex<PageState>>,
}

#[allow(dead_code)]
impl SimulatedRenderer {
    pub fn new(rows: usize, growth: Vec<usize>) -> Self {
        Self {
            state: Arc::new(Mutex::new(PageState {
                rows,
                growth: growth.into(),
                has_control: true,
                ..PageState::default()
            })),
        }
    }
}

#[async_trait]
impl Renderer for SimulatedRenderer {
    async fn open_session(&self, _options: &SessionOptions) -> Result<Box<dyn RenderSession>> {
        Ok(Box::new(SimulatedSession {
            state: Arc::clone(&self.state),
        }))
    }
}

/// Ranking page with a `table.classement` container and `rows` data rows
#[allow(dead_code)]
pub fn ranking_page(rows: usize) -> String {
    let body: String = (1..=rows)
        .map(|i| {
            format!(
                r#"<tr><td>{i}</td><td><a href="/fr/cheval/{i}">Cheval {i}</a></td><td>{i} 000</td></tr>"#
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head><meta charset="utf-8"><title>Classement</title></head>
<body>
  <div id="table.classement">
    <table>
      <thead><tr><th>Rang</th><th>Nom</th><th>Gains</th></tr></thead>
      <tbody>{body}</tbody>
    </table>
  </div>
</body>
</html>"#
    )
}

/// Semicolon-separated export with `rows` data rows and French numbers
#[allow(dead_code)]
pub fn ranking_csv(rows: usize) -> String {
    let mut csv = String::from("Rang;Nom;Gains\n");
    for i in 1..=rows {
        csv.push_str(&format!("{i};Cheval {i};\"{i} 250,50\"\n"));
    }
    csv
}

/// Context over `fetcher` that never sleeps
#[allow(dead_code)]
pub fn fast_context(fetcher: Arc<dyn Fetcher>) -> AcquisitionContext {
    let mut ctx = AcquisitionContext::new(fetcher);
    ctx.retry = RetryPolicy::immediate(3);
    ctx.request_timeout = Duration::from_secs(5);
    ctx.session.table_wait = Duration::ZERO;
    ctx.load_more = LoadMoreConfig {
        settle_interval: Duration::ZERO,
        ..LoadMoreConfig::default()
    };
    ctx
}
