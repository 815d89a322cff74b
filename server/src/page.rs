//! Root-page templating and static asset helpers.

use std::path::{Component, Path, PathBuf};

use probe_common::RequestRecord;
use tracing::warn;

const HEAD_CLOSE: &str = "</head>";

/// JavaScript glue of the browser client, relative to the static directory.
/// Produced by `cargo leptos build`; see `[[workspace.metadata.leptos]]`.
pub const CLIENT_MODULE: &str = "pkg/probe_web.js";

/// Whether the built client is present below `static_dir`.
pub fn client_built(static_dir: &Path) -> bool {
    static_dir.join(CLIENT_MODULE).is_file()
}

/// Insert `record` as `window.requestInfo` immediately before the first
/// `</head>`. A template without a head is returned unchanged.
pub fn inject_request_info(html: &str, record: &RequestRecord) -> serde_json::Result<String> {
    let Some(at) = html.find(HEAD_CLOSE) else {
        warn!("template has no {HEAD_CLOSE}; request info not embedded");
        return Ok(html.to_string());
    };

    // `<\/` keeps header values from terminating the script element and is
    // still the same string once parsed.
    let json = serde_json::to_string_pretty(record)?.replace("</", "<\\/");
    let script = format!("<script>\nwindow.requestInfo = {json};\n</script>\n");

    let mut out = String::with_capacity(html.len() + script.len());
    out.push_str(&html[..at]);
    out.push_str(&script);
    out.push_str(&html[at..]);
    Ok(out)
}

/// Content type by file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        _ => "text/plain",
    }
}

/// Resolve a path below `/static/` inside `root`. Anything that could leave
/// `root` (parent components, absolute paths, backslashes) yields `None`.
pub fn resolve_asset(root: &Path, rel: &str) -> Option<PathBuf> {
    if rel.is_empty() || rel.contains('\\') {
        return None;
    }
    let rel = Path::new(rel);
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(root.join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RequestRecord {
        RequestRecord::builder("GET", "/?a=1")
            .header("Host", "localhost:3000")
            .header("X-Evil", "</script><b>")
            .query([("a", "1")])
            .build()
    }

    #[test]
    fn test_inject_before_head_close() {
        let html = "<html><head><title>t</title></head><body></body></html>";
        let out = inject_request_info(html, &record()).unwrap();
        assert_eq!(out.matches("window.requestInfo").count(), 1);
        let script_at = out.find("<script>").unwrap();
        let head_at = out.find("</head>").unwrap();
        assert!(script_at < head_at);
        assert!(out[..head_at].ends_with("</script>\n"));
        assert!(out.starts_with("<html><head><title>t</title>"));
    }

    #[test]
    fn test_inject_only_first_head_close() {
        let html = "<head></head><template></head></template>";
        let out = inject_request_info(html, &record()).unwrap();
        assert_eq!(out.matches("window.requestInfo").count(), 1);
        assert!(out.ends_with("</head><template></head></template>"));
    }

    #[test]
    fn test_embedded_json_is_verbatim() {
        let original = record();
        let out = inject_request_info("<head></head>", &original).unwrap();
        let start = out.find("window.requestInfo = ").unwrap() + "window.requestInfo = ".len();
        let end = out.find(";\n</script>").unwrap();
        let json = out[start..end].replace("<\\/", "</");
        let parsed: RequestRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
        assert!(!out.contains("</script><b>"));
    }

    #[test]
    fn test_template_without_head() {
        let html = "<p>no head</p>";
        assert_eq!(inject_request_info(html, &record()).unwrap(), html);
    }

    #[test]
    fn test_content_types() {
        let cases = [
            ("a.css", "text/css"),
            ("a.js", "application/javascript"),
            ("manifest.json", "application/json"),
            ("icon.png", "image/png"),
            ("favicon.ico", "image/x-icon"),
            ("pkg/probe_web.wasm", "application/wasm"),
            ("notes.txt", "text/plain"),
            ("noext", "text/plain"),
        ];
        for (file, ct) in cases {
            assert_eq!(content_type_for(Path::new(file)), ct, "{file}");
        }
    }

    #[test]
    fn test_page_loads_client_from_build_output() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
        let index = std::fs::read_to_string(root.join("static/index.html")).unwrap();
        assert!(index.contains(&format!("\"/static/{CLIENT_MODULE}\"")));

        let manifest = std::fs::read_to_string(root.join("Cargo.toml")).unwrap();
        for line in [
            r#"output-name = "probe_web""#,
            r#"site-root = "static""#,
            r#"site-pkg-dir = "pkg""#,
            r#"lib-package = "probe-web""#,
        ] {
            assert!(manifest.contains(line), "missing `{line}`");
        }
    }

    #[test]
    fn test_client_built() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!client_built(dir.path()));
        std::fs::create_dir(dir.path().join("pkg")).unwrap();
        std::fs::write(dir.path().join(CLIENT_MODULE), "export default null;").unwrap();
        assert!(client_built(dir.path()));
    }

    #[test]
    fn test_resolve_asset() {
        let root = Path::new("/srv/static");
        assert_eq!(
            resolve_asset(root, "pkg/probe_web.js"),
            Some(PathBuf::from("/srv/static/pkg/probe_web.js"))
        );
        assert_eq!(resolve_asset(root, "../secret"), None);
        assert_eq!(resolve_asset(root, "a/../../b"), None);
        assert_eq!(resolve_asset(root, "/etc/passwd"), None);
        assert_eq!(resolve_asset(root, "a\\b"), None);
        assert_eq!(resolve_asset(root, ""), None);
    }
}
