use crate::{
    algorithms::ThresholdPreprocessor,
    pipeline::MaskBinarizer,
    traits::ImagePreprocessor,
};

/// Builder for creating mask binarizers with a fluent API
pub struct BinarizerBuilder {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
}

impl BinarizerBuilder {
    /// Create a new binarizer builder
    pub fn new() -> Self {
        Self {
            preprocessors: Vec::new(),
        }
    }

    /// Add a preprocessor to the binarizer
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Add a global threshold step
    pub fn with_threshold(self, threshold: u8) -> Self {
        self.add_preprocessor(ThresholdPreprocessor { threshold })
    }

    /// Build the binarizer, falling back to a threshold at 0 when no
    /// preprocessor was added
    pub fn build(self) -> MaskBinarizer {
        let mut preprocessors = self.preprocessors;
        if preprocessors.is_empty() {
            preprocessors.push(Box::new(ThresholdPreprocessor::default()));
        }
        MaskBinarizer::new(preprocessors)
    }

    /// Build a binarizer with a single threshold step
    pub fn build_simple(threshold: u8) -> MaskBinarizer {
        Self::new().with_threshold(threshold).build()
    }
}

impl Default for BinarizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_defaults_to_zero_threshold() {
        let binarizer = BinarizerBuilder::new().build();
        assert_eq!(binarizer.info(), "MaskBinarizer: 1 preprocessors");
    }

    #[test]
    fn test_chained_preprocessors() {
        let binarizer = BinarizerBuilder::new()
            .with_threshold(10)
            .with_threshold(0)
            .build();
        assert_eq!(binarizer.info(), "MaskBinarizer: 2 preprocessors");
    }
}
