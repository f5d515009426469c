//! Request body encoding shared by the adapters.

use lectern_error::{ProviderError, ProviderErrorKind};
use serde::Serialize;
use serde_json::Value;

/// Encode a provider request body, failing before anything is sent.
#[track_caller]
pub(crate) fn encode_body<T: Serialize>(request: &T) -> Result<Value, ProviderError> {
    serde_json::to_value(request)
        .map_err(|e| ProviderError::new(ProviderErrorKind::InvalidRequest(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn unencodable_body_is_an_invalid_request() {
        let request = BTreeMap::from([(vec![1u8], "non-string key")]);
        let err = encode_body(&request).unwrap_err();
        assert!(matches!(err.kind, ProviderErrorKind::InvalidRequest(_)));
        assert_eq!(err.classification(), "invalid_request");
    }

    #[test]
    fn encodable_body_passes_through() {
        let body = encode_body(&BTreeMap::from([("model", "gpt-4o")])).unwrap();
        assert_eq!(body["model"], "gpt-4o");
    }
}
