//! Protocol registry — static specs for the supported upstream conventions.
//!
//! Each `ProtocolSpec` ties together everything that varies by
//! [`ProtocolVariant`]: the route appended to the endpoint, how a static key is
//! carried, and the order in which the normalizer probes response paths.
//! Builder and normalizer both look the variant up here, so they can't disagree.

use imagegate_core::ProtocolVariant;

use crate::normalize::{
    ExtractionPath, DATA_URL, OUTPUTS_IMAGES_URL, OUTPUTS_IMAGE_URL, OUTPUTS_LIST_URL,
    TOP_LEVEL_URL,
};

/// How a static API key is placed on the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPlacement {
    /// `api-key: <secret>`
    ApiKeyHeader,
    /// `Authorization: Bearer <secret>`
    Bearer,
}

/// Static specification for one protocol variant.
#[derive(Clone, Debug)]
pub struct ProtocolSpec {
    pub variant: ProtocolVariant,
    /// Internal name (matches the config value).
    pub name: &'static str,
    /// Human-readable name for logs and status output.
    pub display_name: &'static str,
    /// Path appended to the endpoint. `{deployment}` is substituted.
    pub route: &'static str,
    pub key_placement: KeyPlacement,
    /// Probe order for the normalizer.
    pub extraction_order: &'static [ExtractionPath],
}

/// All supported protocols.
pub static PROTOCOLS: &[ProtocolSpec] = &[
    ProtocolSpec {
        variant: ProtocolVariant::OpenAiRest,
        name: "openai_rest",
        display_name: "OpenAI Images REST",
        route: "/openai/deployments/{deployment}/images/generations",
        key_placement: KeyPlacement::ApiKeyHeader,
        extraction_order: &[
            DATA_URL,
            OUTPUTS_IMAGE_URL,
            OUTPUTS_IMAGES_URL,
            OUTPUTS_LIST_URL,
            TOP_LEVEL_URL,
        ],
    },
    ProtocolSpec {
        variant: ProtocolVariant::FoundryInfer,
        name: "foundry_infer",
        display_name: "Foundry Infer",
        route: "/infer",
        key_placement: KeyPlacement::Bearer,
        extraction_order: &[
            OUTPUTS_IMAGE_URL,
            OUTPUTS_IMAGES_URL,
            OUTPUTS_LIST_URL,
            DATA_URL,
            TOP_LEVEL_URL,
        ],
    },
];

/// The spec for a variant. Every variant has exactly one entry.
pub fn find_by_variant(variant: ProtocolVariant) -> &'static ProtocolSpec {
    match variant {
        ProtocolVariant::OpenAiRest => &PROTOCOLS[0],
        ProtocolVariant::FoundryInfer => &PROTOCOLS[1],
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_variant_matches_entry() {
        for variant in [ProtocolVariant::OpenAiRest, ProtocolVariant::FoundryInfer] {
            assert_eq!(find_by_variant(variant).variant, variant);
            assert_eq!(find_by_variant(variant).name, variant.as_str());
        }
    }

    #[test]
    fn test_key_placement() {
        let foundry = find_by_variant(ProtocolVariant::FoundryInfer);
        assert_eq!(foundry.display_name, "Foundry Infer");
        assert_eq!(foundry.key_placement, KeyPlacement::Bearer);
        assert_eq!(
            find_by_variant(ProtocolVariant::OpenAiRest).key_placement,
            KeyPlacement::ApiKeyHeader
        );
    }

    #[test]
    fn test_foundry_order() {
        let names: Vec<&str> = find_by_variant(ProtocolVariant::FoundryInfer)
            .extraction_order
            .iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(
            names,
            vec!["outputs.image_url", "outputs.images[0].url", "outputs[0].url", "data[0].url", "url"]
        );
    }

    #[test]
    fn test_every_protocol_probes_all_paths() {
        for spec in PROTOCOLS {
            assert_eq!(spec.extraction_order.len(), 5, "{}", spec.name);
            for path in [DATA_URL, OUTPUTS_IMAGE_URL, OUTPUTS_IMAGES_URL, OUTPUTS_LIST_URL, TOP_LEVEL_URL] {
                assert!(spec.extraction_order.contains(&path), "{} misses {}", spec.name, path.name);
            }
        }
    }

    #[test]
    fn test_unique_names() {
        let mut names: Vec<&str> = PROTOCOLS.iter().map(|s| s.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PROTOCOLS.len());
    }
}
