//! Headless Chrome as the embedded context for the viewer document.

use crate::viewer::document::BOUNDS_GLOBAL;
use crate::viewer::protocol::OUTBOX_GLOBAL;
use crate::viewer::{Aabb, ModelViewer, Normalization, ViewerState, TARGET_SIZE};
use anyhow::{Context, Result};
use glam::Vec3;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long to watch a mounted viewer, and what to keep afterwards
#[derive(Debug, Clone)]
pub struct HostOptions {
    /// Directory the rendered document is written to
    pub document_dir: PathBuf,
    /// How long to relay messages before tearing the tab down
    pub watch: Duration,
    pub poll_interval: Duration,
    /// Save a PNG of the page here before teardown
    pub screenshot: Option<PathBuf>,
}

impl HostOptions {
    pub fn new(document_dir: impl Into<PathBuf>) -> Self {
        Self {
            document_dir: document_dir.into(),
            watch: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
            screenshot: None,
        }
    }
}

/// What happened while the viewer was hosted
#[derive(Debug, Clone)]
pub struct HostReport {
    pub state: ViewerState,
    pub messages: usize,
    pub document_path: Option<PathBuf>,
    pub screenshot: Option<PathBuf>,
    /// How the page fitted the model, if it loaded one
    pub fit: Option<Normalization>,
}

/// Browser-backed host for viewer documents
pub struct HeadlessHost {
    browser: Browser,
}

impl HeadlessHost {
    /// Launch a headless Chrome instance
    pub fn launch() -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(true)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        Ok(Self { browser })
    }

    /// Load the viewer's document in a fresh tab, relay its messages into the
    /// viewer for `options.watch`, then close the tab. Closing the tab is
    /// what stops the document's render loop.
    pub fn host(
        &self,
        viewer: &mut ModelViewer,
        name: &str,
        options: &HostOptions,
    ) -> Result<HostReport> {
        let Some(html) = viewer.document() else {
            info!("No 3D model, showing placeholder");
            return Ok(report(viewer, None, None));
        };

        let document_path = write_document(&options.document_dir, name, html)?;
        let url = file_url(&document_path)?;

        let tab = self.browser.new_tab().context("Failed to open tab")?;
        viewer.on_load_start();

        let outcome = watch(&tab, viewer, &url, options);
        if let Err(e) = tab.close(true) {
            warn!("Failed to close viewer tab: {}", e);
        }

        let (screenshot, fit) = outcome?;
        let mut hosted = report(viewer, Some(document_path), screenshot);
        hosted.fit = fit;
        Ok(hosted)
    }
}

/// Everything that happens while the tab is open. The caller closes the tab
/// whatever this returns.
fn watch(
    tab: &Arc<Tab>,
    viewer: &mut ModelViewer,
    url: &str,
    options: &HostOptions,
) -> Result<(Option<PathBuf>, Option<Normalization>)> {
    info!("Opening viewer document {}", url);
    match tab.navigate_to(url).and_then(|tab| tab.wait_until_navigated()) {
        Ok(_) => viewer.on_load_end(),
        Err(e) => {
            warn!("Viewer document failed to load: {}", e);
            viewer.on_load_error(e.to_string());
            return Ok((None, None));
        }
    }

    let deadline = Instant::now() + options.watch;
    while Instant::now() < deadline {
        let drained = tab
            .evaluate(&drain_script(), false)
            .context("Failed to read viewer messages")?;
        for raw in parse_outbox(drained.value) {
            viewer.on_message(&raw);
        }
        if viewer.state().is_terminal() {
            break;
        }
        thread::sleep(options.poll_interval);
    }

    let fit = match tab.evaluate(&bounds_script(), false) {
        Ok(result) => parse_bounds(result.value).map(|bounds| {
            let fit = Normalization::fit(&bounds, TARGET_SIZE);
            debug!("Model bounds {:?} fitted with {:?}", bounds, fit);
            fit
        }),
        Err(e) => {
            warn!("Failed to read model bounds: {}", e);
            None
        }
    };

    let screenshot = match &options.screenshot {
        Some(path) => {
            info!("Capturing screenshot...");
            let png = tab
                .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
                .context("Failed to capture screenshot")?;
            std::fs::write(path, png)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Saved screenshot to {}", path.display());
            Some(path.clone())
        }
        None => None,
    };

    Ok((screenshot, fit))
}

fn report(
    viewer: &ModelViewer,
    document_path: Option<PathBuf>,
    screenshot: Option<PathBuf>,
) -> HostReport {
    HostReport {
        state: viewer.state().clone(),
        messages: viewer.messages_received(),
        document_path,
        screenshot,
        fit: None,
    }
}

/// Write the document to `<dir>/<name>.html`
pub fn write_document(dir: &Path, name: &str, html: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(format!("{}.html", sanitize(name)));
    std::fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Saved viewer document to {} ({} bytes)", path.display(), html.len());
    Ok(path)
}

fn file_url(path: &Path) -> Result<String> {
    let absolute = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    Ok(format!("file://{}", absolute.display()))
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "viewer".to_string()
    } else {
        cleaned
    }
}

/// Empties the outbox and returns its payloads as a JSON array string
fn drain_script() -> String {
    format!(
        "JSON.stringify((window.{0} || []).splice(0))",
        OUTBOX_GLOBAL
    )
}

/// The model's bounding box as a JSON string, or "null" before a model loads
fn bounds_script() -> String {
    format!("JSON.stringify(window.{0} || null)", BOUNDS_GLOBAL)
}

#[derive(Deserialize)]
struct RawBounds {
    min: [f32; 3],
    max: [f32; 3],
}

/// Bounds read back from the page. An empty three.js box stringifies its
/// infinite corners as null and yields nothing here.
fn parse_bounds(value: Option<Value>) -> Option<Aabb> {
    let Some(Value::String(json)) = value else {
        return None;
    };
    match serde_json::from_str::<Option<RawBounds>>(&json) {
        Ok(raw) => raw.map(|b| Aabb::new(Vec3::from_array(b.min), Vec3::from_array(b.max))),
        Err(e) => {
            debug!("No usable model bounds: {}", e);
            None
        }
    }
}

/// Payload strings from the drain script's result
fn parse_outbox(value: Option<Value>) -> Vec<String> {
    let Some(Value::String(json)) = value else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<Value>>(&json) {
        Ok(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(raw) => raw,
                other => other.to_string(),
            })
            .collect(),
        Err(e) => {
            warn!("Unreadable viewer outbox: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_outbox() {
        let drained = Value::String(
            r#"["{\"v\":1,\"type\":\"log\",\"message\":\"hi\"}", 42]"#.to_string(),
        );
        assert_eq!(
            parse_outbox(Some(drained)),
            vec![r#"{"v":1,"type":"log","message":"hi"}"#.to_string(), "42".to_string()]
        );
        assert!(parse_outbox(None).is_empty());
        assert!(parse_outbox(Some(Value::String("nope".into()))).is_empty());
    }

    #[test]
    fn test_relayed_outbox_drives_viewer() {
        let mut viewer = ModelViewer::mount(Some("http://host/a.glb"));
        viewer.on_load_start();
        viewer.on_load_end();
        let drained = Value::String(
            r#"["{\"v\":1,\"type\":\"error\",\"message\":\"Error loading model: 404\"}", "{oops"]"#
                .to_string(),
        );
        for raw in parse_outbox(Some(drained)) {
            viewer.on_message(&raw);
        }
        assert_eq!(viewer.messages_received(), 2);
        assert!(viewer.state().is_terminal());
    }

    #[test]
    fn test_drain_script_targets_outbox() {
        assert_eq!(
            drain_script(),
            "JSON.stringify((window.__flat3dOutbox || []).splice(0))"
        );
    }

    #[test]
    fn test_bounds_read_back_and_fitted() {
        let raw = Value::String(r#"{"min":[0,0,0],"max":[10,2,4]}"#.to_string());
        let bounds = parse_bounds(Some(raw)).unwrap();
        let fit = Normalization::fit(&bounds, TARGET_SIZE);
        assert!((fit.scale - 0.35).abs() < 1e-6);

        assert_eq!(bounds_script(), "JSON.stringify(window.__flat3dBounds || null)");
    }

    #[test]
    fn test_missing_or_empty_bounds() {
        assert!(parse_bounds(None).is_none());
        assert!(parse_bounds(Some(Value::String("null".into()))).is_none());
        // Box3 of an empty scene: Infinity stringifies as null
        let empty = Value::String(
            r#"{"min":[null,null,null],"max":[null,null,null]}"#.to_string(),
        );
        assert!(parse_bounds(Some(empty)).is_none());
    }

    #[test]
    fn test_zero_size_bounds_keep_unit_scale() {
        let raw = Value::String(r#"{"min":[1,1,1],"max":[1,1,1]}"#.to_string());
        let fit = Normalization::fit(&parse_bounds(Some(raw)).unwrap(), TARGET_SIZE);
        assert_eq!(fit.scale, crate::viewer::bounds::FALLBACK_SCALE);
        assert_eq!(fit.apply(Vec3::ONE), Vec3::ZERO);
    }

    #[test]
    fn test_write_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_document(dir.path(), "12/../x", "<html></html>").unwrap();
        assert_eq!(path.file_name().unwrap(), "12____x.html");
        assert!(file_url(&path).unwrap().starts_with("file:///"));
    }

    #[test]
    fn test_sanitize_empty_name() {
        assert_eq!(sanitize(""), "viewer");
    }
}
