//! Per-file URLs inside a signed container.

use reality_core::{RealityResult, ValidationError};
use url::Url;

/// Compose the URL of `relative_path` inside `container_url`.
///
/// The container's query string is the access signature; it is carried over
/// verbatim after the inserted path. With no `relative_path` the container
/// URL is returned unchanged.
///
/// `relative_path` is a raw blob name: each `/`-separated segment is
/// percent-encoded, so `#`, `?` and `%` stay part of the path. Empty segments
/// are skipped, so slashes are never doubled.
///
/// # Errors
/// * `ValidationError::InvalidValue` - a `.` or `..` segment, or a container
///   URL that cannot carry a path
pub fn compose_blob_url(container_url: &Url, relative_path: Option<&str>) -> RealityResult<Url> {
    let Some(relative_path) = relative_path else {
        return Ok(container_url.clone());
    };

    let segments: Vec<&str> = relative_path.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(dot) = segments.iter().find(|s| matches!(**s, "." | "..")) {
        return Err(ValidationError::InvalidValue {
            field: "relative_path".to_string(),
            reason: format!("'{}' segments may not leave the container", dot),
        }
        .into());
    }

    let mut blob = container_url.clone();
    {
        let mut path = blob
            .path_segments_mut()
            .map_err(|_| ValidationError::InvalidValue {
                field: "container_url".to_string(),
                reason: "URL cannot carry a path".to_string(),
            })?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(blob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reality_core::RealityError;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_signature_preserved_after_inserted_path() {
        let container = url("https://host/container?sig=abc123");
        let blob = compose_blob_url(&container, Some("tileset.json")).unwrap();
        assert_eq!(blob.as_str(), "https://host/container/tileset.json?sig=abc123");
    }

    #[test]
    fn test_no_path_is_identity() {
        let container = url("https://host/container?sig=abc123");
        let blob = compose_blob_url(&container, None).unwrap();
        assert_eq!(blob, container);
    }

    #[test]
    fn test_multi_parameter_signature_keeps_order() {
        let container = url(
            "https://acct.blob.core.windows.net/95d8dccd?skoid=1&sv=2020-08-04&se=2024-03-14T10%3A00%3A00Z&sr=c&sp=rl&sig=Zm9v%2Bbar%3D",
        );
        let blob = compose_blob_url(&container, Some("Data/RootTile.3mx")).unwrap();
        assert_eq!(
            blob.as_str(),
            "https://acct.blob.core.windows.net/95d8dccd/Data/RootTile.3mx?skoid=1&sv=2020-08-04&se=2024-03-14T10%3A00%3A00Z&sr=c&sp=rl&sig=Zm9v%2Bbar%3D"
        );
    }

    #[test]
    fn test_slashes_are_not_doubled() {
        let container = url("https://host/container/?sig=abc");
        let blob = compose_blob_url(&container, Some("/nested/file.las")).unwrap();
        assert_eq!(blob.as_str(), "https://host/container/nested/file.las?sig=abc");
    }

    #[test]
    fn test_container_without_query() {
        let container = url("http://localhost:10000/devstoreaccount1/container");
        let blob = compose_blob_url(&container, Some("a.json")).unwrap();
        assert_eq!(blob.as_str(), "http://localhost:10000/devstoreaccount1/container/a.json");
    }

    #[test]
    fn test_container_at_root() {
        let container = url("https://host?sig=abc");
        let blob = compose_blob_url(&container, Some("a.json")).unwrap();
        assert_eq!(blob.as_str(), "https://host/a.json?sig=abc");
    }

    #[test]
    fn test_hash_in_name_stays_in_path() {
        let container = url("https://host/container?sig=abc123");
        let blob = compose_blob_url(&container, Some("scan#1.las")).unwrap();
        assert_eq!(blob.query(), Some("sig=abc123"));
        assert_eq!(blob.fragment(), None);
        assert_eq!(blob.as_str(), "https://host/container/scan%231.las?sig=abc123");
    }

    #[test]
    fn test_question_mark_in_name_stays_in_path() {
        let container = url("https://host/container?sig=abc123");
        let blob = compose_blob_url(&container, Some("what?.json")).unwrap();
        assert_eq!(blob.query(), Some("sig=abc123"));
        assert_eq!(blob.as_str(), "https://host/container/what%3F.json?sig=abc123");
    }

    #[test]
    fn test_percent_in_name_is_encoded() {
        let container = url("https://host/container?sig=abc123");
        let blob = compose_blob_url(&container, Some("100%/a%2Fb.las")).unwrap();
        assert_eq!(blob.as_str(), "https://host/container/100%25/a%252Fb.las?sig=abc123");
    }

    #[test]
    fn test_dot_segments_are_rejected() {
        let container = url("https://host/container?sig=abc123");
        for path in ["../other/x.json", "a/./b.json", "a/.."] {
            let err = compose_blob_url(&container, Some(path)).unwrap_err();
            assert!(
                matches!(err, RealityError::Validation(ValidationError::InvalidValue { ref field, .. }) if field == "relative_path"),
                "{} -> {:?}",
                path,
                err
            );
        }
        // Dots inside a name are ordinary characters.
        let blob = compose_blob_url(&container, Some("..hidden/v1..2.las")).unwrap();
        assert_eq!(blob.path(), "/container/..hidden/v1..2.las");
    }

    #[test]
    fn test_empty_path_keeps_container() {
        let container = url("https://host/container?sig=abc123");
        let blob = compose_blob_url(&container, Some("/")).unwrap();
        assert_eq!(blob.query(), Some("sig=abc123"));
        assert_eq!(blob.path(), "/container");
    }

    #[test]
    fn test_cannot_be_a_base_container_is_rejected() {
        let container = url("mailto:someone@example.test");
        assert!(compose_blob_url(&container, Some("a.json")).is_err());
    }
}
