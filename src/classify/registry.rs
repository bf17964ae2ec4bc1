use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use super::classifier::{Category, Classifier};

/// Thread-safe registry of classifier variants, keyed by category.
///
/// Classifiers are wrapped in `Mutex` because `Classifier::classify` takes
/// `&mut self`. Switching the active category means selecting a different
/// handle from the registry and handing it to the pipeline.
pub struct ClassifierRegistry {
    classifiers: HashMap<Category, Arc<Mutex<dyn Classifier>>>,
    default_category: Option<Category>,
}

impl ClassifierRegistry {
    pub fn new() -> Self {
        Self {
            classifiers: HashMap::new(),
            default_category: None,
        }
    }

    /// Register a classifier under its own category. The first registered
    /// category becomes the default. Registering the same category again
    /// replaces the previous variant.
    pub fn register<C: Classifier + 'static>(&mut self, classifier: C) {
        let category = classifier.category();
        if self.default_category.is_none() {
            self.default_category = Some(category);
        }
        self.classifiers
            .insert(category, Arc::new(Mutex::new(classifier)));
    }

    /// Set the default category.
    pub fn set_default(&mut self, category: Category) -> Result<()> {
        if !self.classifiers.contains_key(&category) {
            return Err(anyhow!("no classifier registered for category {}", category));
        }
        self.default_category = Some(category);
        Ok(())
    }

    /// Get the classifier for a category, if registered.
    pub fn get(&self, category: Category) -> Option<Arc<Mutex<dyn Classifier>>> {
        self.classifiers.get(&category).cloned()
    }

    /// Get the default classifier.
    pub fn default_classifier(&self) -> Option<Arc<Mutex<dyn Classifier>>> {
        self.default_category.and_then(|category| self.get(category))
    }

    /// Select the classifier for a category, failing when none is registered.
    pub fn select(&self, category: Category) -> Result<Arc<Mutex<dyn Classifier>>> {
        self.get(category)
            .ok_or_else(|| anyhow!("no classifier registered for category {}", category))
    }

    /// Registered categories.
    pub fn list(&self) -> Vec<Category> {
        self.classifiers.keys().copied().collect()
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}
