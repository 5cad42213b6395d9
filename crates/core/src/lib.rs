pub mod cache;
pub mod catalog;
pub mod completion;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod stores;
pub mod traits;

pub use cache::{cache_key, CacheGateway, ANSWER_TTL};
pub use catalog::{
    discover_json_files, load_product_document, CatalogIndex, CatalogSnapshot, ReloadReport,
    SkippedFile,
};
pub use completion::{AzureOpenAiClient, AzureOpenAiConfig};
pub use error::{CacheError, CatalogError, CompletionError, QueryError, ResponseParseError};
pub use models::{AttributeValueResult, ExtractionResult, ProductDocument, QueryOutcome};
pub use parser::{parse_attribute_value, parse_extraction};
pub use pipeline::QueryPipeline;
pub use prompts::{build_attribute_value_prompt, build_extraction_prompt};
pub use stores::{MemoryCache, RedisCache};
pub use traits::{AnswerCache, ChatCompletion};
