mod backends;
mod classifier;
mod registry;
mod result;

pub use backends::StubClassifier;
pub use classifier::{Category, Classifier};
pub use registry::ClassifierRegistry;
pub use result::Classification;

#[cfg(feature = "backend-tract")]
pub use backends::TractClassifier;
