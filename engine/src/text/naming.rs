//! Project directory naming.

use sdk::errors::EngineError;
use std::path::Path;

use crate::storage::BlobStore;

pub const DEFAULT_PROJECT_NAME: &str = "Project";

/// Turn a model-proposed name into a folder-safe project name.
///
/// Keeps alphanumerics, `_` and `-`; falls back to `Project` when nothing is
/// left; prefixes `Project` when the name does not start with a letter; caps
/// the result at `max_len` characters. Applying it to its own output is a
/// no-op.
pub fn sanitize_project_name(raw: &str, max_len: usize) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    let named = match kept.chars().next() {
        None => DEFAULT_PROJECT_NAME.to_string(),
        Some(first) if !first.is_alphabetic() => format!("{}{}", DEFAULT_PROJECT_NAME, kept),
        Some(_) => kept,
    };

    named.chars().take(max_len.max(1)).collect()
}

/// First free name among `name`, `name_1`, `name_2`, ... under `parent`.
///
/// Not safe against two runs racing on the same name.
pub async fn unique_dir_name(
    store: &dyn BlobStore,
    parent: &Path,
    name: &str,
) -> Result<String, EngineError> {
    if !store.exists(&parent.join(name)).await? {
        return Ok(name.to_string());
    }

    let mut counter = 1usize;
    loop {
        let candidate = format!("{}_{}", name, counter);
        if !store.exists(&parent.join(&candidate)).await? {
            return Ok(candidate);
        }
        counter += 1;
    }
}
