use admitnote_engine::traits::ConnectivityProbe;
use anyhow::Context;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(1500);
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    host: String,
    port: u16,
    timeout: Duration,
}

impl Target {
    async fn reachable(&self) -> bool {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                log::debug!("connectivity: {}:{} unreachable: {e}", self.host, self.port);
                false
            }
            Err(_) => {
                log::debug!("connectivity: {}:{} timed out", self.host, self.port);
                false
            }
        }
    }
}

/// Online means a TCP connection to the service host succeeds.
///
/// `is_online()` only reads the last result. Checks run on the tokio runtime,
/// either on demand through `refresh()` or periodically once `spawn_refresher`
/// is called. Until the first check completes the host is assumed reachable;
/// a real outage then surfaces as a retryable transport failure.
#[derive(Debug)]
pub struct TcpConnectivityProbe {
    target: Target,
    online: Arc<AtomicBool>,
    refresher: Option<JoinHandle<()>>,
}

impl TcpConnectivityProbe {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            target: Target {
                host: host.into(),
                port,
                timeout: CONNECT_TIMEOUT,
            },
            online: Arc::new(AtomicBool::new(true)),
            refresher: None,
        }
    }

    pub fn for_base_url(base_url: &str) -> anyhow::Result<Self> {
        let url =
            url::Url::parse(base_url).with_context(|| format!("parse base url: {base_url}"))?;
        let host = url.host_str().context("base url has no host")?;
        let port = url.port_or_known_default().context("base url has no port")?;
        Ok(Self::new(host, port))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.target.timeout = timeout;
        self
    }

    /// Checks once and stores the result.
    pub async fn refresh(&self) -> bool {
        let ok = self.target.reachable().await;
        self.online.store(ok, Ordering::Relaxed);
        ok
    }

    /// Keeps the cached state fresh from a background task until dropped.
    pub fn spawn_refresher(mut self, every: Duration) -> anyhow::Result<Self> {
        let handle = tokio::runtime::Handle::try_current()
            .context("connectivity refresher needs a tokio runtime")?;

        let target = self.target.clone();
        let online = self.online.clone();
        self.refresher = Some(handle.spawn(async move {
            loop {
                let ok = target.reachable().await;
                if online.swap(ok, Ordering::Relaxed) != ok {
                    log::info!(
                        "connectivity: {}:{} now {}",
                        target.host,
                        target.port,
                        if ok { "online" } else { "offline" }
                    );
                }
                tokio::time::sleep(every).await;
            }
        }));
        Ok(self)
    }
}

impl ConnectivityProbe for TcpConnectivityProbe {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }
}

impl Drop for TcpConnectivityProbe {
    fn drop(&mut self) {
        if let Some(task) = self.refresher.take() {
            task.abort();
        }
    }
}
