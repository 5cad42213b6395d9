use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// A product specification document as loaded from the catalog directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDocument {
    pub designation: String,
    pub source_path: PathBuf,
    pub document: Value,
    /// File contents as read, so key order and formatting survive.
    pub raw: String,
}

impl ProductDocument {
    pub fn raw_json(&self) -> &str {
        &self.raw
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub product: Option<String>,
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValueResult {
    pub value: Option<String>,
}

/// Every way a single question can end, successful or not.
///
/// All variants render to plain text through [`QueryOutcome::message`]; the
/// caller sees no difference between an answer and an explanation of why
/// there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    NotConfigured,
    EmptyQuestion,
    Cached(String),
    UnparseableExtraction,
    InvalidProduct,
    MissingAttribute,
    ProductNotInCatalog {
        product: String,
    },
    AttributeNotFound {
        product: String,
        attribute: String,
    },
    Answered {
        product: String,
        attribute: String,
        value: String,
    },
}

impl QueryOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::NotConfigured => "OpenAI not configured.".to_string(),
            Self::EmptyQuestion => "Empty question.".to_string(),
            Self::Cached(answer) => answer.clone(),
            Self::UnparseableExtraction => "I could not parse the model response.".to_string(),
            Self::InvalidProduct => "Invalid Product.".to_string(),
            Self::MissingAttribute => "Attribute value is missing.".to_string(),
            Self::ProductNotInCatalog { product } => {
                format!("No Json File Available for the product {product}")
            }
            Self::AttributeNotFound { product, attribute } => {
                format!("I can't find that attribute {attribute} for the product {product}.")
            }
            Self::Answered {
                product,
                attribute,
                value,
            } => format!("The {attribute} of the {product} bearing is {value}."),
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Answered { .. } | Self::Cached(_))
    }
}

impl std::fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::QueryOutcome;

    #[test]
    fn answered_message_reads_as_sentence() {
        let outcome = QueryOutcome::Answered {
            product: "6205".to_string(),
            attribute: "tolerance class".to_string(),
            value: "P0".to_string(),
        };

        assert_eq!(
            outcome.message(),
            "The tolerance class of the 6205 bearing is P0."
        );
        assert!(outcome.is_answer());
    }

    #[test]
    fn failure_messages_name_product_and_attribute() {
        let missing = QueryOutcome::ProductNotInCatalog {
            product: "6205 LP".to_string(),
        };
        assert_eq!(
            missing.to_string(),
            "No Json File Available for the product 6205 LP"
        );

        let not_found = QueryOutcome::AttributeNotFound {
            product: "6205".to_string(),
            attribute: "colour".to_string(),
        };
        assert_eq!(
            not_found.to_string(),
            "I can't find that attribute colour for the product 6205."
        );
        assert!(!not_found.is_answer());
    }
}
