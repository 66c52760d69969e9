use crate::domain::ports::{Consumer, Producer};
use crate::utils::error::{ApiError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// A media range from a `Content-Type` or `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaType {
    pub essence: String,
    pub params: Vec<(String, String)>,
    pub quality: f32,
}

impl MediaType {
    pub fn parse(value: &str) -> Self {
        let mut parts = value.split(';');
        let essence = parts.next().unwrap_or_default().trim().to_string();

        let mut params = Vec::new();
        let mut quality = 1.0;
        for param in parts {
            let Some((key, val)) = param.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let val = val.trim().trim_matches('"').to_string();
            if key == "q" {
                quality = val.parse::<f32>().unwrap_or(0.0).clamp(0.0, 1.0);
            } else {
                params.push((key, val));
            }
        }

        Self {
            essence,
            params,
            quality,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.essence == "*/*" || self.essence.ends_with("/*")
    }

    /// `*/*` covers everything, `text/*` covers `text/plain`.
    pub fn covers(&self, mime: &str) -> bool {
        if self.essence == "*/*" {
            return true;
        }
        match self.essence.strip_suffix("/*") {
            Some(kind) => mime
                .split_once('/')
                .map(|(other, _)| other == kind)
                .unwrap_or(false),
            None => self.essence == mime,
        }
    }
}

/// 去除參數後的 MIME 類型 (例如 `application/json; charset=utf-8` → `application/json`)
pub fn base_type(mime: &str) -> &str {
    mime.split(';').next().unwrap_or_default().trim()
}

/// Parses an `Accept` header into media ranges, most preferred first.
/// Entries with `q=0` are dropped; equal weights keep the client's order.
pub fn parse_accept(header: &str) -> Vec<MediaType> {
    let mut ranges: Vec<MediaType> = header
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(MediaType::parse)
        .filter(|range| range.quality > 0.0 && !range.essence.is_empty())
        .collect();
    // sort_by 是穩定排序
    ranges.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    ranges
}

#[derive(Default, Clone)]
pub struct CodecRegistry {
    consumers: HashMap<String, Arc<dyn Consumer>>,
    producers: HashMap<String, Arc<dyn Producer>>,
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut consumers: Vec<_> = self.consumers.keys().collect();
        let mut producers: Vec<_> = self.producers.keys().collect();
        consumers.sort();
        producers.sort();
        f.debug_struct("CodecRegistry")
            .field("consumers", &consumers)
            .field("producers", &producers)
            .finish()
    }
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_consumer(&mut self, mime: &str, consumer: Arc<dyn Consumer>) {
        self.consumers.insert(base_type(mime).to_string(), consumer);
    }

    pub fn register_producer(&mut self, mime: &str, producer: Arc<dyn Producer>) {
        self.producers.insert(base_type(mime).to_string(), producer);
    }

    pub fn consumer_for(&self, mime: &str) -> Result<Arc<dyn Consumer>> {
        let key = base_type(mime);
        self.consumers
            .get(key)
            .cloned()
            .ok_or_else(|| ApiError::UnsupportedMediaType {
                mime: key.to_string(),
            })
    }

    pub fn producer_for(&self, mime: &str) -> Result<Arc<dyn Producer>> {
        let key = base_type(mime);
        self.producers
            .get(key)
            .cloned()
            .ok_or_else(|| ApiError::NotAcceptable {
                accept: key.to_string(),
            })
    }

    pub fn has_consumer(&self, mime: &str) -> bool {
        self.consumers.contains_key(base_type(mime))
    }

    pub fn has_producer(&self, mime: &str) -> bool {
        self.producers.contains_key(base_type(mime))
    }

    pub fn consumer_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.consumers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn producer_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.producers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Picks the producer for a response.
    ///
    /// Concrete entries of the `Accept` header are tried by exact match in
    /// preference order. The default producer is only used when the client
    /// states no preference or sends a wildcard that covers it; a list of
    /// concrete but unregistered types is `NotAcceptable`.
    pub fn negotiate(
        &self,
        accept: Option<&str>,
        default_mime: &str,
    ) -> Result<(String, Arc<dyn Producer>)> {
        let default = || {
            self.producers
                .get(default_mime)
                .map(|producer| (default_mime.to_string(), producer.clone()))
        };

        let Some(header) = accept else {
            return default().ok_or_else(|| ApiError::NotAcceptable {
                accept: default_mime.to_string(),
            });
        };

        let ranges = parse_accept(header);
        if ranges.is_empty() {
            return default().ok_or_else(|| ApiError::NotAcceptable {
                accept: header.to_string(),
            });
        }

        for range in &ranges {
            if range.is_wildcard() {
                if range.covers(default_mime) {
                    if let Some(found) = default() {
                        return Ok(found);
                    }
                }
                continue;
            }
            if let Some(producer) = self.producers.get(&range.essence) {
                return Ok((range.essence.clone(), producer.clone()));
            }
        }

        Err(ApiError::NotAcceptable {
            accept: header.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::codecs::{JsonCodec, StubConsumer, StubProducer};

    fn registry() -> CodecRegistry {
        let mut codecs = CodecRegistry::new();
        codecs.register_consumer("application/json", Arc::new(JsonCodec));
        codecs.register_producer("application/json", Arc::new(JsonCodec));
        codecs.register_producer("text/plain", Arc::new(StubProducer));
        codecs
    }

    #[test]
    fn test_media_type_parsing() {
        let media = MediaType::parse("text/html; charset=UTF-8; q=0.5");
        assert_eq!(media.essence, "text/html");
        assert_eq!(media.params, vec![("charset".to_string(), "UTF-8".to_string())]);
        assert_eq!(media.quality, 0.5);
        assert_eq!(base_type(" application/json ;charset=utf-8"), "application/json");
    }

    #[test]
    fn test_accept_ordering() {
        let ranges = parse_accept("text/plain;q=0.5, application/xml, application/json, image/png;q=0");
        let order: Vec<&str> = ranges.iter().map(|r| r.essence.as_str()).collect();
        assert_eq!(order, vec!["application/xml", "application/json", "text/plain"]);
    }

    #[test]
    fn test_capabilities_are_independent() {
        let mut codecs = registry();
        assert!(codecs.has_producer("text/plain"));
        assert!(!codecs.has_consumer("text/plain"));

        codecs.register_consumer("application/xml", Arc::new(StubConsumer));
        assert!(codecs.has_consumer("application/xml"));
        assert!(!codecs.has_producer("application/xml"));
        assert!(codecs.has_producer("application/json"));
        assert_eq!(codecs.producer_types(), vec!["application/json", "text/plain"]);
    }

    #[test]
    fn test_lookup_ignores_parameters_but_not_case() {
        let codecs = registry();
        assert!(codecs.consumer_for("application/json; charset=utf-8").is_ok());
        assert!(matches!(
            codecs.consumer_for("Application/JSON"),
            Err(ApiError::UnsupportedMediaType { mime }) if mime == "Application/JSON"
        ));
        assert!(matches!(
            codecs.producer_for("application/xml"),
            Err(ApiError::NotAcceptable { accept }) if accept == "application/xml"
        ));
    }

    #[test]
    fn test_negotiate_prefers_client_order() {
        let codecs = registry();
        let (mime, _) = codecs
            .negotiate(Some("application/xml, text/plain, application/json"), "application/json")
            .unwrap();
        assert_eq!(mime, "text/plain");

        let (mime, _) = codecs
            .negotiate(Some("text/plain;q=0.1, application/json"), "application/json")
            .unwrap();
        assert_eq!(mime, "application/json");
    }

    #[test]
    fn test_negotiate_default_fallback() {
        let codecs = registry();
        let (mime, _) = codecs.negotiate(None, "application/json").unwrap();
        assert_eq!(mime, "application/json");

        let (mime, _) = codecs
            .negotiate(Some("application/xml, */*;q=0.1"), "application/json")
            .unwrap();
        assert_eq!(mime, "application/json");

        let (mime, _) = codecs.negotiate(Some("application/*"), "application/json").unwrap();
        assert_eq!(mime, "application/json");

        assert!(codecs.negotiate(Some("image/*"), "application/json").is_err());
    }

    #[test]
    fn test_negotiate_not_acceptable() {
        let codecs = registry();
        assert!(matches!(
            codecs.negotiate(Some("application/xml"), "application/json"),
            Err(ApiError::NotAcceptable { accept }) if accept == "application/xml"
        ));
        assert!(codecs.negotiate(None, "application/x-yaml").is_err());
    }
}
