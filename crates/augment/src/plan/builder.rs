use crate::{plan::AugmentationPlan, traits::Augmentation};

/// Builder for augmentation plans with a fluent API
pub struct AugmentationPlanBuilder {
    steps: Vec<(String, Box<dyn Augmentation>)>,
}

impl AugmentationPlanBuilder {
    /// Create a new, empty plan builder
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Register a transform under `suffix`. Registering the same suffix
    /// again replaces the earlier transform in place.
    pub fn add<A>(self, suffix: impl Into<String>, augmentation: A) -> Self
    where
        A: Augmentation + 'static,
    {
        self.add_boxed(suffix, Box::new(augmentation))
    }

    /// Register an already boxed transform under `suffix`
    pub fn add_boxed(mut self, suffix: impl Into<String>, augmentation: Box<dyn Augmentation>) -> Self {
        let suffix = suffix.into();
        match self.steps.iter().position(|(s, _)| *s == suffix) {
            Some(index) => self.steps[index].1 = augmentation,
            None => self.steps.push((suffix, augmentation)),
        }
        self
    }

    /// Whether a transform is already registered under `suffix`
    pub fn contains(&self, suffix: &str) -> bool {
        self.steps.iter().any(|(s, _)| s == suffix)
    }

    pub fn build(self) -> AugmentationPlan {
        AugmentationPlan::new(self.steps)
    }
}

impl Default for AugmentationPlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}
