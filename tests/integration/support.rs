//! Shared fixtures: a scriptable fake network and journal shell deploys

use async_trait::async_trait;
use shellcache::cache::{CacheStorage, CachedEntry, MemoryStorage};
use shellcache::config::schema::ManifestConfig;
use shellcache::controller::{AssetManifest, CacheController, Deployment, Settings};
use shellcache::http::{Request, Response};
use shellcache::network::Fetcher;
use shellcache::{ShellcacheError, ShellcacheResult};
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use url::Url;

pub const ORIGIN: &str = "https://journal.test/";

/// In-memory origin with per-path routes, an offline switch and a gate that
/// holds requests until released.
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, Response>>,
    calls: Mutex<Vec<String>>,
    online: AtomicBool,
    gate: watch::Sender<bool>,
}

impl FakeNetwork {
    pub fn new() -> Arc<Self> {
        let (gate, _) = watch::channel(true);
        Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(vec![]),
            online: AtomicBool::new(true),
            gate,
        })
    }

    pub fn serve(&self, path: &str, body: impl Into<Vec<u8>>) {
        self.route(path, Response::new(200, body));
    }

    pub fn route(&self, path: &str, response: Response) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
    }

    pub fn remove(&self, path: &str) {
        self.routes.lock().unwrap().remove(path);
    }

    /// Serve every asset of the journal shell, tagged with `version`
    pub fn serve_shell(&self, version: &str) {
        let index = format!("<html><body>Diario {}</body></html>", version);
        self.serve("/", index.clone());
        self.serve("/index.html", index);
        self.serve("/style.css", format!("body {{ /* {} */ }}", version));
        self.serve("/script.js", format!("// {}", version));
        self.serve("/manifest.json", format!("{{\"version\":\"{}\"}}", version));
        self.serve("/icons/icon-192x192.png", vec![137u8, 80, 78, 71, 1]);
        self.serve("/icons/icon-512x512.png", vec![137u8, 80, 78, 71, 2]);
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Hold every request until [`resume`](Self::resume)
    pub fn pause(&self) {
        self.gate.send_replace(false);
    }

    pub fn resume(&self) {
        self.gate.send_replace(true);
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }
}

#[async_trait]
impl Fetcher for FakeNetwork {
    async fn fetch(&self, request: &Request) -> ShellcacheResult<Response> {
        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let path = request.url.path().to_string();
        self.calls.lock().unwrap().push(path.clone());

        if !self.online.load(Ordering::SeqCst) {
            return Err(ShellcacheError::network(request.url.as_str(), "offline"));
        }

        let response = self.routes.lock().unwrap().get(&path).cloned();
        Ok(response.unwrap_or_else(|| Response::new(404, "Not Found")))
    }

    fn fetcher_name(&self) -> &'static str {
        "fake"
    }
}

/// Memory storage that refuses to delete anything
#[derive(Default)]
pub struct StickyStorage {
    inner: MemoryStorage,
}

#[async_trait]
impl CacheStorage for StickyStorage {
    async fn open(&self, name: &str) -> ShellcacheResult<()> {
        self.inner.open(name).await
    }

    async fn has(&self, name: &str) -> ShellcacheResult<bool> {
        self.inner.has(name).await
    }

    async fn keys(&self) -> ShellcacheResult<Vec<String>> {
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> ShellcacheResult<bool> {
        Err(ShellcacheError::storage(name, "permission denied"))
    }

    async fn match_request(
        &self,
        name: &str,
        request: &Request,
    ) -> ShellcacheResult<Option<CachedEntry>> {
        self.inner.match_request(name, request).await
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> ShellcacheResult<()> {
        self.inner.put(name, request, response).await
    }

    async fn entries(&self, name: &str) -> ShellcacheResult<Vec<String>> {
        self.inner.entries(name).await
    }

    fn backend_name(&self) -> &'static str {
        "sticky"
    }
}

pub fn settings() -> Settings {
    Settings::new(Url::parse(ORIGIN).unwrap())
}

pub fn controller_with(
    settings: Settings,
    storage: Arc<dyn CacheStorage>,
    network: &Arc<FakeNetwork>,
) -> CacheController {
    let fetcher: Arc<dyn Fetcher> = network.clone();
    CacheController::new(settings, storage, fetcher)
}

/// Controller over fresh memory storage
pub fn controller(network: &Arc<FakeNetwork>) -> (CacheController, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let controller = controller_with(settings(), storage.clone(), network);
    (controller, storage)
}

/// Deployment of the journal shell with the stock manifest
pub fn deployment(version: &str) -> Deployment {
    let manifest = ManifestConfig::default();
    Deployment::new(
        version,
        AssetManifest::new(manifest.required, manifest.best_effort),
    )
    .unwrap()
}

pub fn get(path: &str) -> Request {
    Request::get(Url::parse(ORIGIN).unwrap().join(path).unwrap())
}

pub fn navigate(path: &str) -> Request {
    get(path).with_header("Accept", "text/html,application/xhtml+xml")
}

/// Log sink for asserting on emitted warnings
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route this thread's logs into a buffer until the guard drops
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
