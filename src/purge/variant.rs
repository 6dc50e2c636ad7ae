//! Stage (draft) variants of URLs.

use url::form_urlencoded;

pub(crate) const DEFAULT_STAGE_PARAM: &str = "stage";
pub(crate) const DEFAULT_STAGE_VALUE: &str = "Stage";

/// Query parameter that selects the draft rendering of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageVariant {
    param: String,
    value: String,
}

impl StageVariant {
    pub fn new(param: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            value: value.into(),
        }
    }

    /// Rewrites `url` so its query selects the stage rendering.
    ///
    /// Existing query pairs keep their order and their original encoding. An
    /// existing stage key is overwritten in place and any repeats of it are
    /// dropped. Fragments are discarded. An empty path still yields
    /// `?stage=Stage`.
    pub fn to_stage_variant(&self, url: &str) -> String {
        let without_fragment = url.split_once('#').map_or(url, |(head, _)| head);
        let (path, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));

        let stage_pair = form_urlencoded::Serializer::new(String::new())
            .append_pair(&self.param, &self.value)
            .finish();

        // Non-stage pairs keep their raw text, including escapes that do not
        // decode to UTF-8.
        let mut segments: Vec<&str> = Vec::new();
        let mut replaced = false;
        for segment in query.split('&').filter(|segment| !segment.is_empty()) {
            if self.is_stage_segment(segment) {
                if !replaced {
                    segments.push(&stage_pair);
                    replaced = true;
                }
                continue;
            }
            segments.push(segment);
        }
        if !replaced {
            segments.push(&stage_pair);
        }

        let query = segments.join("&");
        format!("{path}?{query}")
    }

    fn is_stage_segment(&self, segment: &str) -> bool {
        form_urlencoded::parse(segment.as_bytes())
            .next()
            .is_some_and(|(key, _)| key == self.param.as_str())
    }
}

impl Default for StageVariant {
    fn default() -> Self {
        Self::new(DEFAULT_STAGE_PARAM, DEFAULT_STAGE_VALUE)
    }
}

/// Stage variant with the default `stage=Stage` parameter.
pub fn to_stage_variant(url: &str) -> String {
    StageVariant::default().to_stage_variant(url)
}
