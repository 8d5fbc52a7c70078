use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

static SEMVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("semver pattern is valid"));

static VERSION_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^(\s+"version"\s*:\s*")([^"]+)(",\r?)$"#)
        .expect("version field pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestPatchError {
    #[error("need a MAJOR.MINOR.PATCH version string, {version:?} given")]
    Validation { version: String },
    #[error("expected exactly one \"version\" field in manifest, found {found}")]
    Format { found: usize },
}

/// Replace the single `"version": "..."` field of a JSON manifest.
///
/// The rest of the text is returned byte-for-byte unchanged.
pub fn patch_manifest_version(text: &str, new_version: &str) -> Result<String, ManifestPatchError> {
    if !SEMVER.is_match(new_version) {
        return Err(ManifestPatchError::Validation {
            version: new_version.to_string(),
        });
    }

    let found = VERSION_FIELD.find_iter(text).count();
    if found != 1 {
        return Err(ManifestPatchError::Format { found });
    }

    let patched = VERSION_FIELD.replace(text, |caps: &Captures| {
        format!("{}{}{}", &caps[1], new_version, &caps[3])
    });
    Ok(patched.into_owned())
}
