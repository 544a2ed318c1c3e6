//! Lightbox integration tests: shallow navigation, deep links, keyboard
//! controls, and scroll restoration in a real browser.
//!
//! The site is generated offline from `fixtures/catalog.json`, served over a
//! local HTTP server (permalinks are directories, `pushState` needs an
//! origin), and driven with headless Chrome. Image requests to the media
//! service fail offline; nothing here depends on them.
//!
//! Run with: `cargo test --test browser_lightbox -- --ignored`

use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::io::{Read as _, Write as _};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

/// Photos in `fixtures/catalog.json`.
const PHOTO_COUNT: u64 = 6;

// ===========================================================================
// Minimal static file server
// ===========================================================================

struct TestServer {
    port: u16,
    _stop: std::sync::mpsc::Sender<()>,
}

impl TestServer {
    fn start(root: PathBuf) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = std::sync::mpsc::channel::<()>();

        thread::spawn(move || {
            listener.set_nonblocking(true).unwrap();
            loop {
                if rx.try_recv().is_ok() {
                    break;
                }
                match listener.accept() {
                    Ok((stream, _)) => {
                        let root = root.clone();
                        thread::spawn(move || serve_request(stream, &root));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Self { port, _stop: tx }
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }
}

fn serve_request(mut stream: std::net::TcpStream, root: &Path) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut buf = [0u8; 4096];
    let n = match stream.read(&mut buf) {
        Ok(n) if n > 0 => n,
        _ => return,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let target = request.split_whitespace().nth(1).unwrap_or("/");
    let path = target.split(['?', '#']).next().unwrap_or("/");
    let mut file_path = root.join(path.trim_start_matches('/'));
    if file_path.is_dir() {
        file_path = file_path.join("index.html");
    }

    let (status, body, ct) = if file_path.is_file() {
        let body = std::fs::read(&file_path).unwrap_or_default();
        let ext = file_path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let ct = match ext {
            "html" => "text/html; charset=utf-8",
            "ico" => "image/x-icon",
            _ => "application/octet-stream",
        };
        ("200 OK", body, ct)
    } else {
        ("404 Not Found", b"Not Found".to_vec(), "text/plain")
    };

    let header = format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: {ct}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&body);
}

// ===========================================================================
// Setup helpers
// ===========================================================================

fn generated_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("browser-lightbox")
}

fn ensure_site_generated() {
    static BUILT: OnceLock<()> = OnceLock::new();
    BUILT.get_or_init(|| {
        let bin = env!("CARGO_BIN_EXE_cloud-gal");
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let status = Command::new(bin)
            .env_remove("CLOUDINARY_CLOUD_NAME")
            .env_remove("CLOUDINARY_FOLDER")
            .args([
                "generate",
                "--project",
                root.join("fixtures/project").to_str().unwrap(),
                "--temp-dir",
                root.join("fixtures").to_str().unwrap(),
                "--output",
                generated_dir().to_str().unwrap(),
            ])
            .status()
            .expect("failed to run cloud-gal");
        assert!(status.success(), "site generation failed");
    });
}

fn browser() -> &'static Browser {
    static B: OnceLock<Browser> = OnceLock::new();
    B.get_or_init(|| {
        Browser::new(LaunchOptions {
            window_size: Some((1280, 800)),
            ..Default::default()
        })
        .expect("failed to launch Chrome")
    })
}

fn start_server() -> TestServer {
    ensure_site_generated();
    TestServer::start(generated_dir())
}

fn open(server: &TestServer, path: &str) -> Arc<Tab> {
    let tab = browser().new_tab().unwrap();
    tab.navigate_to(&server.url(path))
        .unwrap()
        .wait_until_navigated()
        .unwrap();
    tab
}

fn eval(tab: &Tab, js: &str) -> Value {
    tab.evaluate(js, false)
        .unwrap()
        .value
        .unwrap_or(Value::Null)
}

fn eval_async(tab: &Tab, js: &str) -> Value {
    tab.evaluate(js, true)
        .unwrap()
        .value
        .unwrap_or(Value::Null)
}

fn pathname(tab: &Tab) -> String {
    eval(tab, "location.pathname").as_str().unwrap().to_string()
}

fn lightbox_hidden(tab: &Tab) -> bool {
    eval(tab, "document.getElementById('lightbox').hidden")
        .as_bool()
        .unwrap()
}

fn counter(tab: &Tab) -> String {
    eval(tab, "document.querySelector('.lightbox-counter').textContent")
        .as_str()
        .unwrap()
        .to_string()
}

fn press(tab: &Tab, key: &str) {
    eval(
        tab,
        &format!("document.dispatchEvent(new KeyboardEvent('keydown', {{ key: '{key}' }}))"),
    );
}

fn last_viewed(tab: &Tab) -> Value {
    eval(tab, "sessionStorage.getItem('cloud-gal:last-viewed')")
}

// ===========================================================================
// Gallery
// ===========================================================================

#[test]
#[ignore]
fn gallery_lists_every_photo_in_order() {
    let server = start_server();
    let tab = open(&server, "/");

    let ids = eval(
        &tab,
        "JSON.stringify([...document.querySelectorAll('.photo-link')].map(a => a.dataset.id))",
    );
    let ids: Vec<String> = serde_json::from_str(ids.as_str().unwrap()).unwrap();
    let expected: Vec<String> = (0..PHOTO_COUNT).map(|i| i.to_string()).collect();
    assert_eq!(ids, expected);
    assert!(lightbox_hidden(&tab));
}

#[test]
#[ignore]
fn clicking_thumbnail_opens_lightbox_without_reload() {
    let server = start_server();
    let tab = open(&server, "/");
    eval(&tab, "window.__marker = 'same-document'");

    eval(&tab, "document.querySelector('.photo-link[data-id=\"1\"]').click()");

    assert_eq!(pathname(&tab), "/p/1/");
    assert!(!lightbox_hidden(&tab));
    assert_eq!(counter(&tab), format!("2 / {PHOTO_COUNT}"));
    assert_eq!(eval(&tab, "window.__marker"), Value::from("same-document"));
    assert_eq!(eval(&tab, "history.length"), Value::from(2));
}

#[test]
#[ignore]
fn arrow_keys_step_and_stop_at_ends() {
    let server = start_server();
    let tab = open(&server, "/");
    eval(&tab, "document.querySelector('.photo-link[data-id=\"0\"]').click()");

    press(&tab, "ArrowLeft");
    assert_eq!(pathname(&tab), "/p/0/");

    press(&tab, "ArrowRight");
    assert_eq!(pathname(&tab), "/p/1/");
    assert_eq!(
        eval(&tab, "document.querySelector('.lightbox-prev').hidden"),
        Value::from(false)
    );
}

#[test]
#[ignore]
fn escape_closes_and_restores_scroll_target() {
    let server = start_server();
    let tab = open(&server, "/");
    eval(&tab, "document.querySelector('.photo-link[data-id=\"4\"]').click()");

    press(&tab, "Escape");

    assert_eq!(pathname(&tab), "/");
    assert!(lightbox_hidden(&tab));
    // Consumed by the closed render.
    assert_eq!(last_viewed(&tab), Value::Null);
    assert_eq!(eval(&tab, "document.activeElement.dataset.id"), Value::from("4"));
}

#[test]
#[ignore]
fn back_button_closes_lightbox() {
    let server = start_server();
    let tab = open(&server, "/");
    eval(&tab, "document.querySelector('.photo-link[data-id=\"2\"]').click()");

    eval_async(
        &tab,
        r#"new Promise((resolve) => {
            window.addEventListener('popstate', () => resolve(true), { once: true });
            history.back();
        })"#,
    );

    assert_eq!(pathname(&tab), "/");
    assert!(lightbox_hidden(&tab));
}

#[test]
#[ignore]
fn stale_last_viewed_is_cleared_without_scrolling() {
    let server = start_server();
    let tab = open(&server, "/");
    eval(&tab, "sessionStorage.setItem('cloud-gal:last-viewed', '99')");

    tab.navigate_to(&server.url("/"))
        .unwrap()
        .wait_until_navigated()
        .unwrap();

    assert_eq!(last_viewed(&tab), Value::Null);
    assert_eq!(eval(&tab, "window.scrollY"), Value::from(0));
    assert!(lightbox_hidden(&tab));
    assert_eq!(pathname(&tab), "/");
}

// ===========================================================================
// Deep links
// ===========================================================================

#[test]
#[ignore]
fn query_param_deep_link_opens_lightbox() {
    let server = start_server();
    let tab = open(&server, "/?photoId=3");

    assert!(!lightbox_hidden(&tab));
    assert_eq!(counter(&tab), format!("4 / {PHOTO_COUNT}"));
}

#[test]
#[ignore]
fn stale_query_param_leaves_lightbox_closed() {
    let server = start_server();
    let tab = open(&server, "/?photoId=99");

    assert!(lightbox_hidden(&tab));
}

#[test]
#[ignore]
fn permalink_page_renders_lightbox_server_side() {
    let server = start_server();
    let tab = open(&server, "/p/0/");

    assert_eq!(eval(&tab, "document.body.dataset.page"), Value::from("photo"));
    assert_eq!(counter(&tab), format!("1 / {PHOTO_COUNT}"));
    assert_eq!(
        eval(&tab, "document.querySelector('.lightbox-prev') === null"),
        Value::from(true)
    );
    assert_eq!(
        eval(&tab, "new URL(document.querySelector('.lightbox-next').href).pathname"),
        Value::from("/p/1/")
    );
}

#[test]
#[ignore]
fn closing_permalink_page_scrolls_gallery_to_photo() {
    let server = start_server();
    let tab = open(&server, "/p/5/");

    tab.wait_for_element(".lightbox-close").unwrap().click().unwrap();
    tab.wait_until_navigated().unwrap();
    tab.wait_for_element(".photo-grid").unwrap();

    assert_eq!(pathname(&tab), "/");
    assert!(lightbox_hidden(&tab));
    assert_eq!(last_viewed(&tab), Value::Null);
    assert_eq!(eval(&tab, "document.activeElement.dataset.id"), Value::from("5"));
}
