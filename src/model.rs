use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;
use crate::plantnet::{IdentificationCandidate, IdentifyResponse};

pub const BENEFITS: &str = "Plants improve indoor air quality, reduce stress and add natural \
    beauty to any space. Many species also support pollinators and local wildlife.";
pub const WARNINGS: &str = "Some plants can be toxic to pets and children if ingested. Always \
    verify an identification with a local expert before consuming or handling unknown plants.";
pub const DESCRIPTION_UNAVAILABLE: &str = "Description not available";
pub const PLACEHOLDER_NOTE: &str =
    "Plant identification service is currently unavailable. Showing sample data instead.";

/// Caller-facing identification record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationResult {
    pub name: String,
    pub scientific_name: String,
    pub description: String,
    pub benefits: String,
    pub warnings: String,
    pub confidence: f64,
    pub image_url: String,
}

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[serde(rename = "plantnet")]
    Upstream,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    pub result: IdentificationResult,
    pub source: Source,
}

impl Identification {
    pub fn note(&self) -> Option<&'static str> {
        match self.source {
            Source::Upstream => None,
            Source::Placeholder => Some(PLACEHOLDER_NOTE),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == Source::Placeholder
    }
}

struct PlaceholderSpecies {
    name: &'static str,
    scientific_name: &'static str,
    description: &'static str,
    confidence: f64,
}

const PLACEHOLDERS: [PlaceholderSpecies; 3] = [
    PlaceholderSpecies {
        name: "Monstera Deliciosa",
        scientific_name: "Monstera deliciosa",
        description: "A tropical climbing plant with large, glossy, split leaves. Native to \
            the rainforests of Central America and a popular houseplant.",
        confidence: 0.85,
    },
    PlaceholderSpecies {
        name: "Snake Plant",
        scientific_name: "Dracaena trifasciata",
        description: "A hardy succulent with stiff, upright, sword-shaped leaves. Tolerates \
            low light and infrequent watering.",
        confidence: 0.78,
    },
    PlaceholderSpecies {
        name: "Peace Lily",
        scientific_name: "Spathiphyllum wallisii",
        description: "A shade-tolerant flowering plant with dark green leaves and white \
            spathes. Droops visibly when it needs water.",
        confidence: 0.72,
    },
];

/// Sample record served when no real identification is available.
///
/// Selection is `uploaded_bytes % 3`, so uploads of equal size always get the same species.
pub fn placeholder(uploaded_bytes: usize) -> IdentificationResult {
    let species = &PLACEHOLDERS[uploaded_bytes % PLACEHOLDERS.len()];

    IdentificationResult {
        name: species.name.to_string(),
        scientific_name: species.scientific_name.to_string(),
        description: species.description.to_string(),
        benefits: BENEFITS.to_string(),
        warnings: WARNINGS.to_string(),
        confidence: species.confidence,
        image_url: String::new(),
    }
}

impl From<&IdentificationCandidate> for IdentificationResult {
    fn from(candidate: &IdentificationCandidate) -> Self {
        let species = &candidate.species;

        let name = species
            .common_names
            .first()
            .cloned()
            .unwrap_or_else(|| species.scientific_name.clone());

        let description = species
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DESCRIPTION_UNAVAILABLE.to_string());

        let image_url = candidate
            .images
            .first()
            .and_then(|image| image.url.m.clone())
            .unwrap_or_default();

        IdentificationResult {
            name,
            scientific_name: species.scientific_name.clone(),
            description,
            benefits: BENEFITS.to_string(),
            warnings: WARNINGS.to_string(),
            confidence: candidate.score,
            image_url,
        }
    }
}

/// Turns the upstream outcome into a result, falling back to a placeholder on any failure.
pub fn normalize(
    outcome: Result<IdentifyResponse, UpstreamError>,
    uploaded_bytes: usize,
) -> Identification {
    match outcome {
        Ok(response) => match response.results.first() {
            Some(top) => Identification {
                result: top.into(),
                source: Source::Upstream,
            },
            None => {
                tracing::warn!(uploaded_bytes, "PlantNet returned no matches, serving placeholder");
                Identification {
                    result: placeholder(uploaded_bytes),
                    source: Source::Placeholder,
                }
            }
        },
        Err(err) => {
            tracing::warn!(
                error = %err,
                status = ?err.status_code(),
                uploaded_bytes,
                "PlantNet call failed, serving placeholder"
            );
            Identification {
                result: placeholder(uploaded_bytes),
                source: Source::Placeholder,
            }
        }
    }
}
