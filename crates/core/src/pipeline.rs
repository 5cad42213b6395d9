use crate::cache::{cache_key, CacheGateway};
use crate::catalog::CatalogIndex;
use crate::parser::{parse_attribute_value, parse_extraction};
use crate::prompts::{build_attribute_value_prompt, build_extraction_prompt};
use crate::traits::ChatCompletion;
use crate::{ProductDocument, QueryError, QueryOutcome};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Answers one free-text question per call.
///
/// Stages run in a fixed order and every stage can end the call with a
/// [`QueryOutcome`]: configuration, input validation, cache lookup, product
/// and attribute extraction, catalog refresh and lookup, value extraction and
/// formatting. Successful answers are written back to the cache without
/// waiting for the write.
///
/// Only a failing first model call or cancellation surface as [`QueryError`].
pub struct QueryPipeline<C>
where
    C: ChatCompletion,
{
    completion: Option<C>,
    catalog: Arc<CatalogIndex>,
    cache: CacheGateway,
}

impl<C> QueryPipeline<C>
where
    C: ChatCompletion + Send + Sync,
{
    pub fn new(completion: Option<C>, catalog: Arc<CatalogIndex>, cache: CacheGateway) -> Self {
        Self {
            completion,
            catalog,
            cache,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.completion.is_some()
    }

    pub async fn answer(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome, QueryError> {
        let Some(completion) = self.completion.as_ref() else {
            return Ok(QueryOutcome::NotConfigured);
        };

        if question.trim().is_empty() {
            return Ok(QueryOutcome::EmptyQuestion);
        }

        let key = cache_key(question);
        if let Some(answer) = guarded(cancel, self.cache.read(&key)).await? {
            debug!(key = %key, "answer served from cache");
            return Ok(QueryOutcome::Cached(answer));
        }

        let prompt = build_extraction_prompt(&self.catalog.designations(), question);
        let raw = guarded(cancel, completion.complete(&prompt)).await??;
        let extraction = match parse_extraction(&raw) {
            Ok(extraction) => extraction,
            Err(error) => {
                warn!(%error, "extraction response rejected");
                return Ok(QueryOutcome::UnparseableExtraction);
            }
        };
        debug!(
            product = ?extraction.product,
            attribute = ?extraction.attribute,
            "extraction parsed"
        );

        let Some(product) = non_blank(extraction.product.as_deref()) else {
            return Ok(QueryOutcome::InvalidProduct);
        };

        self.refresh_catalog(cancel).await?;

        let Some(attribute) = non_blank(extraction.attribute.as_deref()) else {
            return Ok(QueryOutcome::MissingAttribute);
        };

        let Some(document) = self.catalog.lookup(&product) else {
            debug!(product = %product, "extracted product has no catalog entry");
            return Ok(QueryOutcome::ProductNotInCatalog { product });
        };

        let Some(value) = self
            .extract_value(completion, &attribute, &document, cancel)
            .await?
        else {
            return Ok(QueryOutcome::AttributeNotFound { product, attribute });
        };

        let outcome = QueryOutcome::Answered {
            product,
            attribute,
            value,
        };
        self.cache.write_detached(key, outcome.message());
        Ok(outcome)
    }

    /// [`QueryPipeline::answer`] rendered as the plain-text reply.
    pub async fn answer_text(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<String, QueryError> {
        Ok(self.answer(question, cancel).await?.message())
    }

    async fn refresh_catalog(&self, cancel: &CancellationToken) -> Result<(), QueryError> {
        let catalog = Arc::clone(&self.catalog);
        let reload = tokio::task::spawn_blocking(move || catalog.reload());
        let report = guarded(cancel, reload).await??;
        debug!(
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "catalog refreshed before lookup"
        );
        Ok(())
    }

    /// Second model call. Transport faults and unusable replies both mean
    /// "no value"; only cancellation escapes.
    async fn extract_value(
        &self,
        completion: &C,
        attribute: &str,
        document: &ProductDocument,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, QueryError> {
        let prompt = build_attribute_value_prompt(attribute, document.raw_json());

        let raw = match guarded(cancel, completion.complete(&prompt)).await? {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, attribute, "attribute value completion failed");
                return Ok(None);
            }
        };

        match parse_attribute_value(&raw) {
            Ok(parsed) => Ok(non_blank(parsed.value.as_deref())),
            Err(error) => {
                debug!(%error, attribute, "attribute value response rejected");
                Ok(None)
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Races `future` against cancellation; cancellation wins ties.
async fn guarded<F>(cancel: &CancellationToken, future: F) -> Result<F::Output, QueryError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(QueryError::Cancelled),
        output = future => Ok(output),
    }
}
