//! HTTP response handlers.

use std::{fs, path::Path};

use anyhow::Result;
use tiny_http::{Header, Request, Response, StatusCode};

use crate::reload::RELOAD_JS;
use crate::utils::mime;

/// Respond with a static file, optionally injecting the reload script.
///
/// A file that resolved but cannot be read (deleted between resolution
/// and read, permissions) gets a 404 response; the request is never
/// dropped without an answer.
pub fn respond_file(request: Request, path: &Path, ws_port: Option<u16>) -> Result<()> {
    let content_type = mime::from_path(path);

    let body = match fs::read(path) {
        Ok(body) => body,
        Err(e) => {
            crate::debug!("serve"; "read failed for {}: {}", path.display(), e);
            return respond_not_found(request);
        }
    };
    let body = maybe_inject_reload(body, content_type, ws_port);

    send_body(request, 200, content_type, body)
}

/// Respond with 404 plain text.
pub fn respond_not_found(request: Request) -> Result<()> {
    send_body(request, 404, mime::types::PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(
        request,
        503,
        mime::types::PLAIN,
        b"503 Service Unavailable".to_vec(),
    )
}

/// Respond with reload.js from memory.
pub fn respond_reload_js(request: Request, ws_port: u16) -> Result<()> {
    let body = RELOAD_JS.replace("{{WS_PORT}}", &ws_port.to_string());
    send_body(request, 200, mime::types::JAVASCRIPT, body.into_bytes())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    // Static key/value pairs are always valid header bytes.
    Header::from_bytes(key, value).unwrap_or_else(|()| unreachable!())
}

/// Inject the reload script if the content is HTML and a ws port is set.
pub fn maybe_inject_reload(body: Vec<u8>, content_type: &str, ws_port: Option<u16>) -> Vec<u8> {
    match (content_type.starts_with("text/html"), ws_port) {
        (true, Some(port)) => inject_reload_script(&body, port),
        _ => body,
    }
}

/// Inject the reload script tag before `</body>` (last occurrence,
/// case-insensitive). Appends when no closing tag exists.
fn inject_reload_script(content: &[u8], ws_port: u16) -> Vec<u8> {
    let script = format!(
        "<script src=\"{}?port={}\"></script>",
        super::RELOAD_JS_URL,
        ws_port
    );
    let script_bytes = script.as_bytes();

    const PATTERN: &[u8] = b"</body>";

    if let Some(pos) = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        let mut result = Vec::with_capacity(content.len() + script_bytes.len());
        result.extend_from_slice(&content[..pos]);
        result.extend_from_slice(script_bytes);
        result.extend_from_slice(&content[pos..]);
        return result;
    }

    let mut result = Vec::with_capacity(content.len() + script_bytes.len());
    result.extend_from_slice(content);
    result.extend_from_slice(script_bytes);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_respond_file_unreadable_path_is_404() {
        use std::io::{Read, Write};

        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();

        let handle = std::thread::spawn(move || {
            let request = server.recv().unwrap();
            respond_file(request, Path::new("/nonexistent/gone.html"), None).unwrap();
        });

        let mut stream = std::net::TcpStream::connect(addr).unwrap();
        write!(
            stream,
            "GET /gone.html HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();

        assert!(response.starts_with("HTTP/1.1 404"), "got: {response}");
        handle.join().unwrap();
    }

    #[test]
    fn test_inject_before_closing_body() {
        let html = b"<html><body>hi</body></html>".to_vec();
        let out = maybe_inject_reload(html, mime::types::HTML, Some(35729));
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("<script src=\"/__gantry/reload.js?port=35729\"></script></body>"));
    }

    #[test]
    fn test_inject_case_insensitive() {
        let html = b"<HTML><BODY>hi</BODY></HTML>".to_vec();
        let out = maybe_inject_reload(html, mime::types::HTML, Some(35729));
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("</script></BODY>"));
    }

    #[test]
    fn test_no_injection_without_port() {
        let html = b"<html><body>hi</body></html>".to_vec();
        let out = maybe_inject_reload(html.clone(), mime::types::HTML, None);
        assert_eq!(out, html);
    }

    #[test]
    fn test_no_injection_for_css() {
        let css = b"body { color: red; }".to_vec();
        let out = maybe_inject_reload(css.clone(), mime::types::CSS, Some(35729));
        assert_eq!(out, css);
    }

    #[test]
    fn test_append_when_no_body_tag() {
        let html = b"<p>fragment</p>".to_vec();
        let out = maybe_inject_reload(html, mime::types::HTML, Some(35729));
        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("</script>"));
    }
}
