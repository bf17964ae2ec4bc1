use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error, Result};
use serde::{Deserialize, Serialize};

use crate::classify::result::Classification;
use crate::frame::Rotation;
use crate::preprocess::PreparedImage;

/// Category a classifier variant is built for.
///
/// Selecting a different category reconstructs or replaces the classifier
/// capability; the pipeline itself never interprets category semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bird,
    Insect,
    Plant,
    Food,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Bird,
        Category::Insect,
        Category::Plant,
        Category::Food,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Bird => "bird",
            Category::Insect => "insect",
            Category::Plant => "plant",
            Category::Food => "food",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bird" => Ok(Category::Bird),
            "insect" => Ok(Category::Insect),
            "plant" => Ok(Category::Plant),
            "food" => Ok(Category::Food),
            other => Err(anyhow!(
                "unknown category '{}' (expected bird/insect/plant/food)",
                other
            )),
        }
    }
}

/// Classifier capability trait.
///
/// The pipeline hands each accepted frame's prepared image to exactly one
/// classifier. Implementations must treat the image as read-only and must
/// not retain it beyond the call; the borrow enforces both. `rotation` is
/// the correction that was already applied to `image`.
///
/// Results are ordered by descending confidence. A failed call is local to
/// that frame: the pipeline logs it and moves on, so implementations should
/// return errors rather than panic.
pub trait Classifier: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Category this classifier variant serves.
    fn category(&self) -> Category;

    /// Classify one prepared image.
    fn classify(
        &mut self,
        image: &PreparedImage,
        rotation: Rotation,
    ) -> Result<Vec<Classification>>;

    /// Optional warm-up hook (model load checks, first-run allocation).
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_strings() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!("PLANT".parse::<Category>().unwrap(), Category::Plant);
        assert_eq!(" Bird ".parse::<Category>().unwrap(), Category::Bird);
        assert!("fungus".parse::<Category>().is_err());
    }
}
