use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::classify::classifier::{Category, Classifier};
use crate::classify::result::Classification;
use crate::frame::Rotation;
use crate::preprocess::PreparedImage;

/// Stub classifier for tests and model-less deployments.
///
/// Hashes the prepared pixels and picks a label from the category's
/// vocabulary, so identical inputs always produce identical results. Stands
/// in for a real model backend without pulling in an inference runtime.
pub struct StubClassifier {
    category: Category,
}

impl StubClassifier {
    pub fn new(category: Category) -> Self {
        Self { category }
    }

    fn vocabulary(category: Category) -> &'static [&'static str] {
        match category {
            Category::Bird => &["robin", "sparrow", "heron", "finch", "owl", "wren"],
            Category::Insect => &["bee", "beetle", "dragonfly", "moth", "ant", "ladybird"],
            Category::Plant => &["rose", "fern", "oak", "daisy", "moss", "tulip"],
            Category::Food => &["apple", "bread", "berry", "mushroom", "cheese", "pasta"],
        }
    }
}

impl Classifier for StubClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn category(&self) -> Category {
        self.category
    }

    fn classify(
        &mut self,
        image: &PreparedImage,
        _rotation: Rotation,
    ) -> Result<Vec<Classification>> {
        let digest: [u8; 32] = Sha256::digest(image.pixels()).into();
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&digest[..8]);
        let seed = u64::from_le_bytes(seed);

        let vocabulary = Self::vocabulary(self.category);
        let label = vocabulary[(seed % vocabulary.len() as u64) as usize];
        let confidence = 0.5 + (seed % 50) as f32 / 100.0;

        Ok(vec![Classification::new(label, confidence)])
    }
}
