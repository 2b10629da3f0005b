use memory_graph_schemas::{relations, tags, EntityCandidate, RelationshipCandidate};
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Context window radius around an entity mention, in chars.
const ENTITY_CONTEXT_RADIUS: usize = 30;
/// Context window radius around a relationship mention, in chars.
const RELATION_CONTEXT_RADIUS: usize = 20;

/// Text-analysis collaborator: turns raw text into entity and relationship
/// candidates and scores text similarity.
///
/// Implementations may range from pattern tables to model-backed
/// extraction; the engine depends only on this contract. Candidate order
/// defines tie-break priority for duplicate extraction.
pub trait Annotator: Send + Sync {
    fn extract_entities(&self, text: &str) -> Vec<EntityCandidate>;

    fn extract_relationships(
        &self,
        text: &str,
        known_entities: &[String],
    ) -> Vec<RelationshipCandidate>;

    /// Similarity of two texts in `[0, 1]`.
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Regex-table annotator.
///
/// Entity patterns either capture the name in group 1 (when the match
/// needs disambiguating context, e.g. a capitalized word followed by a
/// verb) or take the whole match. Relationship patterns capture source
/// and target in groups 1 and 2.
pub struct PatternAnnotator {
    entity_patterns: Vec<(&'static str, Vec<Regex>)>,
    relation_patterns: Vec<(&'static str, Vec<Regex>)>,
}

impl Default for PatternAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternAnnotator {
    pub fn new() -> Self {
        Self {
            entity_patterns: vec![
                (
                    tags::PERSON,
                    vec![
                        Regex::new(r"\b([A-Z][a-z]+)\s+(?:works|created|developed|specializes)\b")
                            .unwrap(),
                        Regex::new(r"\b[A-Z][a-z]+\s+[A-Z][a-z]+\b").unwrap(),
                    ],
                ),
                (
                    tags::ORGANIZATION,
                    vec![
                        Regex::new(r"\b(?:Google|Microsoft|Apple|Amazon)\b").unwrap(),
                        Regex::new(r"\b[A-Z][a-z]+\s+(?:Inc|Corp|LLC|Ltd|Company|Organization)\b")
                            .unwrap(),
                    ],
                ),
                (
                    tags::LOCATION,
                    vec![
                        Regex::new(r"\b(?:Mountain View|California|New York)\b").unwrap(),
                        Regex::new(r"\b[A-Z][a-z]+\s+(?:City|State|Country|Street|Avenue|Road)\b")
                            .unwrap(),
                    ],
                ),
                (
                    tags::TECH,
                    vec![
                        Regex::new(
                            r"(?i)\b(?:Python|JavaScript|TensorFlow|API|Database|Server|Cloud|algorithm|machine learning|neural network)\b",
                        )
                        .unwrap(),
                        Regex::new(r"\b(?:AI|ML)\b").unwrap(),
                    ],
                ),
                (
                    tags::CONCEPT,
                    vec![Regex::new(r"(?i)\b(?:research|development|training|framework)\b")
                        .unwrap()],
                ),
            ],
            relation_patterns: vec![
                (
                    relations::WORKS_AT,
                    vec![
                        Regex::new(r"(?i)\b(\w+)\s+works\s+at\s+(\w+)").unwrap(),
                        Regex::new(r"(?i)\b(\w+)\s+is\s+employed\s+(?:by\s+)?(\w+)").unwrap(),
                    ],
                ),
                (
                    relations::LOCATED_IN,
                    vec![
                        Regex::new(
                            r"\b([A-Za-z]+)\s+(?:is\s+)?(?:located\s+)?in\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)",
                        )
                        .unwrap(),
                        Regex::new(
                            r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\s+division\s+is\s+located\s+in\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)",
                        )
                        .unwrap(),
                    ],
                ),
                (
                    relations::CREATED,
                    vec![
                        Regex::new(r"(?i)\b(\w+)\s+(?:created|developed|built)\s+(?:an?\s+)?(\w+(?:\s+\w+){0,2})")
                            .unwrap(),
                        Regex::new(r"(?i)\b(\w+(?:\s+\w+){0,2})\s+was\s+created\s+by\s+(\w+)").unwrap(),
                    ],
                ),
                (
                    relations::USES,
                    vec![
                        Regex::new(r"(?i)\b(\w+)\s+uses\s+(\w+(?:\s+\w+){0,2})").unwrap(),
                        Regex::new(r"(?i)\b(\w+)\s+is\s+(?:built\s+)?(?:with|using)\s+(\w+(?:\s+\w+){0,2})")
                            .unwrap(),
                    ],
                ),
                (
                    relations::SPECIALIZES_IN,
                    vec![
                        Regex::new(r"(?i)\b(\w+)\s+specializes\s+in\s+(\w+(?:\s+\w+){0,2})").unwrap(),
                        Regex::new(r"(?i)\b(\w+)\s+(?:focuses\s+on|works\s+in)\s+(\w+(?:\s+\w+){0,2})")
                            .unwrap(),
                    ],
                ),
                (
                    relations::RELATES_TO,
                    vec![Regex::new(
                        r"(?i)\b(\w+(?:\s+\w+){0,2})\s+(?:relates\s+to|connected\s+to|associated\s+with)\s+(\w+(?:\s+\w+){0,2})",
                    )
                    .unwrap()],
                ),
            ],
        }
    }
}

impl Annotator for PatternAnnotator {
    fn extract_entities(&self, text: &str) -> Vec<EntityCandidate> {
        let mut candidates = Vec::new();

        for (entity_type, patterns) in &self.entity_patterns {
            for pattern in patterns {
                for caps in pattern.captures_iter(text) {
                    let mention = caps.get(1).or_else(|| caps.get(0)).unwrap();
                    let name = mention.as_str().trim();
                    if name.is_empty() {
                        continue;
                    }

                    candidates.push(EntityCandidate {
                        name: name.to_string(),
                        entity_type: (*entity_type).to_string(),
                        context: context_window(
                            text,
                            mention.start(),
                            mention.end(),
                            ENTITY_CONTEXT_RADIUS,
                        ),
                    });
                }
            }
        }

        debug!("Extracted {} entity candidates", candidates.len());
        candidates
    }

    fn extract_relationships(
        &self,
        text: &str,
        known_entities: &[String],
    ) -> Vec<RelationshipCandidate> {
        let mut candidates = Vec::new();

        for (relation_type, patterns) in &self.relation_patterns {
            for pattern in patterns {
                for caps in pattern.captures_iter(text) {
                    let (Some(source), Some(target)) = (caps.get(1), caps.get(2)) else {
                        continue;
                    };
                    let source = source.as_str().trim();
                    let target = target.as_str().trim();
                    if source.is_empty() || target.is_empty() {
                        continue;
                    }

                    let full = caps.get(0).unwrap();
                    candidates.push(RelationshipCandidate {
                        source: source.to_string(),
                        target: target.to_string(),
                        relation_type: (*relation_type).to_string(),
                        context: context_window(
                            text,
                            full.start(),
                            full.end(),
                            RELATION_CONTEXT_RADIUS,
                        ),
                    });
                }
            }
        }

        debug!(
            "Extracted {} relationship candidates ({} known entities)",
            candidates.len(),
            known_entities.len()
        );
        candidates
    }

    fn similarity(&self, a: &str, b: &str) -> f64 {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        let words_a: HashSet<&str> = a.split_whitespace().collect();
        let words_b: HashSet<&str> = b.split_whitespace().collect();

        if words_a.is_empty() || words_b.is_empty() {
            return 0.0;
        }

        let intersection = words_a.intersection(&words_b).count();
        let union = words_a.union(&words_b).count();
        intersection as f64 / union as f64
    }
}

/// Slice a window of `radius` chars around `[start, end)`, clamped to
/// char boundaries.
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let mut lo = start.saturating_sub(radius);
    while lo > 0 && !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + radius).min(text.len());
    while hi < text.len() && !text.is_char_boundary(hi) {
        hi += 1;
    }
    text[lo..hi].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_person_and_organization() {
        let annotator = PatternAnnotator::new();
        let candidates = annotator.extract_entities("John works at Google.");

        let john = candidates
            .iter()
            .find(|c| c.name == "John")
            .expect("John extracted");
        assert_eq!(john.entity_type, tags::PERSON);
        assert!(john.context.contains("John works at Google"));

        let google = candidates
            .iter()
            .find(|c| c.name == "Google")
            .expect("Google extracted");
        assert_eq!(google.entity_type, tags::ORGANIZATION);
    }

    #[test]
    fn test_extracts_works_at_relationship() {
        let annotator = PatternAnnotator::new();
        let candidates =
            annotator.extract_relationships("John works at Google.", &["John".to_string()]);

        let works_at = candidates
            .iter()
            .find(|c| c.relation_type == relations::WORKS_AT)
            .expect("WORKS_AT extracted");
        assert_eq!(works_at.source, "John");
        assert_eq!(works_at.target, "Google");
    }

    #[test]
    fn test_extracts_location_relationship() {
        let annotator = PatternAnnotator::new();
        let candidates = annotator.extract_relationships(
            "Google's AI research division is located in Mountain View, California.",
            &[],
        );

        assert!(candidates
            .iter()
            .any(|c| c.relation_type == relations::LOCATED_IN && c.target == "Mountain View"));
    }

    #[test]
    fn test_similarity_bounds() {
        let annotator = PatternAnnotator::new();

        assert_eq!(annotator.similarity("same words here", "same words here"), 1.0);
        assert_eq!(annotator.similarity("alpha beta", "gamma delta"), 0.0);
        assert_eq!(annotator.similarity("", "anything"), 0.0);
        assert_eq!(annotator.similarity("anything", ""), 0.0);

        // Case does not matter.
        assert_eq!(annotator.similarity("Rust Engine", "rust engine"), 1.0);

        let partial = annotator.similarity("john at google", "john at home");
        assert!(partial > 0.0 && partial < 1.0);
    }

    #[test]
    fn test_context_window_clamps_to_char_boundaries() {
        // Multibyte chars right at the radius edge must not split.
        let text = "ééééééééééééééééééééééééé John works ééééééééééééééééééééééééé";
        let annotator = PatternAnnotator::new();
        let candidates = annotator.extract_entities(text);
        assert!(candidates.iter().any(|c| c.name == "John"));
    }
}
