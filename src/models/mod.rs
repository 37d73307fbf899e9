pub mod distilbert;

pub use distilbert::{DistilBertClassifier, DistilBertForSequenceClassification, DistilBertModel};
