//! Response normalizer — finds the image URL in an upstream body.
//!
//! Providers put the URL in different places depending on API version and
//! protocol, so each known location is an [`ExtractionPath`] and the
//! normalizer probes them in the order given by the protocol's spec.
//! The first non-empty string wins.

use serde_json::Value;
use tracing::{debug, warn};

use imagegate_core::utils::truncate_string;
use imagegate_core::{GenerationResult, ProtocolVariant, UpstreamBody, UpstreamResponse};

use crate::registry::find_by_variant;

// ─────────────────────────────────────────────
// Extraction paths
// ─────────────────────────────────────────────

/// One step into a JSON tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    Key(&'static str),
    Index(usize),
}

/// A candidate location for the image URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractionPath {
    /// Dotted form for logs, e.g. `outputs.images[0].url`.
    pub name: &'static str,
    pub segments: &'static [Segment],
}

impl ExtractionPath {
    /// Walk `body` along this path.
    ///
    /// Missing keys, wrong types, and out-of-range indexes are all "absent".
    /// Only a non-empty string counts as a match.
    pub fn probe<'a>(&self, body: &'a Value) -> Option<&'a str> {
        let mut node = body;
        for segment in self.segments {
            node = match segment {
                Segment::Key(key) => node.as_object()?.get(*key)?,
                Segment::Index(i) => node.as_array()?.get(*i)?,
            };
        }
        node.as_str().filter(|s| !s.is_empty())
    }
}

/// `outputs.image_url` — Foundry scalar output.
pub const OUTPUTS_IMAGE_URL: ExtractionPath = ExtractionPath {
    name: "outputs.image_url",
    segments: &[Segment::Key("outputs"), Segment::Key("image_url")],
};

/// `outputs.images[0].url` — Foundry list of images.
pub const OUTPUTS_IMAGES_URL: ExtractionPath = ExtractionPath {
    name: "outputs.images[0].url",
    segments: &[
        Segment::Key("outputs"),
        Segment::Key("images"),
        Segment::Index(0),
        Segment::Key("url"),
    ],
};

/// `outputs[0].url` — Foundry outputs as a list.
pub const OUTPUTS_LIST_URL: ExtractionPath = ExtractionPath {
    name: "outputs[0].url",
    segments: &[Segment::Key("outputs"), Segment::Index(0), Segment::Key("url")],
};

/// `data[0].url` — OpenAI images API.
pub const DATA_URL: ExtractionPath = ExtractionPath {
    name: "data[0].url",
    segments: &[Segment::Key("data"), Segment::Index(0), Segment::Key("url")],
};

/// `url` — flat top-level shape.
pub const TOP_LEVEL_URL: ExtractionPath = ExtractionPath {
    name: "url",
    segments: &[Segment::Key("url")],
};

// ─────────────────────────────────────────────
// Normalizer
// ─────────────────────────────────────────────

/// Normalize an upstream response using the variant's extraction order.
///
/// The status code never short-circuits extraction: a non-2xx response that
/// still carries a URL is a success.
pub fn normalize(response: &UpstreamResponse, variant: ProtocolVariant) -> GenerationResult {
    normalize_with(response, find_by_variant(variant).extraction_order)
}

/// Normalize with an explicit path order.
pub fn normalize_with(response: &UpstreamResponse, paths: &[ExtractionPath]) -> GenerationResult {
    let body = match &response.body {
        UpstreamBody::Json(body) => body,
        UpstreamBody::Text(text) => {
            warn!(
                status = response.status,
                body = %truncate_string(text, 500),
                "upstream body is not JSON"
            );
            return GenerationResult::no_image_url(Value::String(text.clone()));
        }
    };

    if let Some((path, url)) = extract(body, paths) {
        debug!(
            status = response.status,
            path = path.name,
            "image URL extracted"
        );
        return GenerationResult::success(url);
    }

    warn!(
        status = response.status,
        body = %truncate_string(&body.to_string(), 500),
        "no image URL in upstream response"
    );
    GenerationResult::no_image_url(body.clone())
}

/// First path in `paths` that yields a URL, with the URL.
pub fn extract<'a>(body: &'a Value, paths: &[ExtractionPath]) -> Option<(ExtractionPath, &'a str)> {
    paths
        .iter()
        .find_map(|path| path.probe(body).map(|url| (*path, url)))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
