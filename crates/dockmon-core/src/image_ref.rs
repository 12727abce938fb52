// ── Image reference helpers ──
//
// Turn an image reference like `lscr.io/linuxserver/sonarr:latest` into a
// project link and a short display label. Pure string work, no I/O.

/// Split `ref` into `(repository path, ":tag" suffix)`.
///
/// A colon only starts a tag when no `/` follows it, so registry ports
/// (`localhost:5000/app`) stay part of the path. Digests are dropped.
fn split_ref(image_ref: &str) -> Option<(&str, &str)> {
    let mut reference = image_ref.trim();
    if let Some(inner) = reference
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
    {
        reference = inner.trim();
    }
    if let Some(at) = reference.find('@') {
        reference = &reference[..at];
    }
    if reference.is_empty() {
        return None;
    }
    match reference.rfind(':') {
        Some(idx) if !reference[idx..].contains('/') => {
            Some((&reference[..idx], &reference[idx..]))
        }
        _ => Some((reference, "")),
    }
}

/// Best guess at a human-browsable page for the image's project.
///
/// GHCR images map to GitHub, linuxserver.io images to their
/// `docker-<name>` repository, Docker Hub images to the Hub. Anything
/// hosted elsewhere falls back to a web search.
pub fn repo_link(image_ref: &str) -> Option<String> {
    let (path, _) = split_ref(image_ref)?;

    if let Some(rest) = path.strip_prefix("ghcr.io/") {
        return Some(format!("https://github.com/{rest}"));
    }
    if path.starts_with("lscr.io/linuxserver/") {
        let name = path.rsplit('/').next().unwrap_or(path);
        return Some(format!("https://github.com/linuxserver/docker-{name}"));
    }
    if !path.contains('/') {
        return Some(format!("https://hub.docker.com/_/{path}"));
    }
    let first = path.split('/').next().unwrap_or_default();
    if !first.contains('.') && !first.contains(':') {
        return Some(format!("https://hub.docker.com/r/{path}"));
    }
    let query: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    Some(format!("https://www.google.com/search?q={query}+docker"))
}

/// Short label: well-known registry and `library/` prefixes removed,
/// original tag kept.
pub fn repo_label(image_ref: &str) -> Option<String> {
    let (mut path, tag) = split_ref(image_ref)?;
    for prefix in ["ghcr.io/", "lscr.io/", "registry-1.docker.io/", "library/"] {
        path = path.strip_prefix(prefix).unwrap_or(path);
    }
    Some(format!("{path}{tag}"))
}
