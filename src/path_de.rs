use serde::de::DeserializeOwned;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(describe)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(describe)
}

fn describe(err: serde_path_to_error::Error<serde_json::Error>) -> String {
    let path = err.path().to_string();
    format!("at JSON path {path} → {}", err.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;

    #[test]
    fn error_carries_path_prefix() {
        let src = r#"{ "kind": "array", "element": { "kind": "tuple", "elements": [ { "kind": "bogus" } ] } }"#;
        let err = from_str_with_path::<Descriptor>(src).unwrap_err();
        assert!(err.starts_with("at JSON path "), "{err}");
        assert!(err.contains("bogus"), "{err}");
    }

    #[test]
    fn slice_and_str_agree() {
        let src = r#"{ "kind": "scalar", "name": "string" }"#;
        let a: Descriptor = from_str_with_path(src).unwrap();
        let b: Descriptor = from_slice_with_path(src.as_bytes()).unwrap();
        assert_eq!(a, b);
    }
}
