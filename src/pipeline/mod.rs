pub mod extraction; // Pattern registry, normalizer, field extractor, document pipeline
pub mod batch_extraction; // Bounded worker pool over document sets
pub mod evaluation; // Accuracy against labelled reference data
