//! POSIX-style path joining for project paths.
//!
//! Project paths are workspace-internal strings (`/services/api`), not host
//! filesystem paths, so they are always joined with `/` regardless of platform.

/// Join path segments with `/` and normalize the result.
///
/// Empty segments are ignored. The result is normalized: `.` segments are
/// dropped, `..` pops the previous segment, and repeated separators collapse.
/// A trailing separator on the last non-empty segment is preserved. Joining
/// nothing yields `.`.
pub fn join<I, S>(segments: I) -> String
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let joined = segments
    .into_iter()
    .filter(|s| !s.as_ref().is_empty())
    .map(|s| s.as_ref().to_string())
    .collect::<Vec<_>>()
    .join("/");

  normalize(&joined)
}

/// Normalize a `/`-separated path.
pub fn normalize(path: &str) -> String {
  if path.is_empty() {
    return ".".to_string();
  }

  let absolute = path.starts_with('/');
  let trailing = path.ends_with('/');

  let mut parts: Vec<&str> = Vec::new();
  for part in path.split('/') {
    match part {
      "" | "." => {}
      ".." => {
        if parts.last().is_some_and(|p| *p != "..") {
          parts.pop();
        } else if !absolute {
          parts.push("..");
        }
      }
      other => parts.push(other),
    }
  }

  let mut out = parts.join("/");
  if absolute {
    out.insert(0, '/');
  }
  if out.is_empty() {
    return ".".to_string();
  }
  if trailing && !out.ends_with('/') {
    out.push('/');
  }
  out
}
