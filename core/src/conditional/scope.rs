// galley/src/conditional/scope.rs

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::GalleyError;
use crate::pipeline::definition::Pipeline;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{event, instrument, Level};

pub(crate) type ScopeExtractor<TData, SData> =
  Arc<dyn Fn(ContextData<TData>) -> Result<ContextData<SData>, GalleyError> + Send + Sync + 'static>;

pub(crate) type ScopeCondition<TData> = Arc<dyn Fn(ContextData<TData>) -> bool + Send + Sync + 'static>;

/// One execution path of a conditional step.
pub(crate) struct ConditionalScope<TData, SData, Err>
where
  TData: 'static + Send + Sync,
  SData: 'static + Send + Sync,
  Err: std::error::Error + From<GalleyError> + Send + Sync + 'static,
{
  pub(crate) step_name: String,
  pub(crate) pipeline: Arc<Pipeline<SData, Err>>,
  pub(crate) extractor: ScopeExtractor<TData, SData>,
  pub(crate) condition: ScopeCondition<TData>,
}

/// Erases `SData` so scopes over different sub-contexts can share a step.
#[async_trait]
pub(crate) trait AnyConditionalScope<TData, Err>: Send + Sync
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<GalleyError> + Send + Sync + 'static,
{
  fn is_condition_met(&self, main_ctx_data: ContextData<TData>) -> bool;

  async fn execute_scoped_pipeline(&self, main_ctx_data: ContextData<TData>) -> Result<PipelineControl, Err>;
}

#[async_trait]
impl<TData, SData, Err> AnyConditionalScope<TData, Err> for ConditionalScope<TData, SData, Err>
where
  TData: 'static + Send + Sync,
  SData: 'static + Send + Sync,
  Err: std::error::Error + From<GalleyError> + Send + Sync + 'static,
{
  fn is_condition_met(&self, main_ctx_data: ContextData<TData>) -> bool {
    (self.condition)(main_ctx_data)
  }

  #[instrument(
    name = "ConditionalScope::execute",
    skip_all,
    fields(
      step_name = %self.step_name,
      scoped_context_data_type = %std::any::type_name::<SData>(),
    ),
    err(Display)
  )]
  async fn execute_scoped_pipeline(&self, main_ctx_data: ContextData<TData>) -> Result<PipelineControl, Err> {
    let sub_ctx_data = match (self.extractor)(main_ctx_data) {
      Ok(sub) => sub,
      Err(extract_err) => {
        event!(Level::ERROR, error = %extract_err, "Sub-context extractor failed.");
        let enriched = match extract_err {
          GalleyError::HandlerError { source } | GalleyError::ExtractorFailure { source, .. } => {
            GalleyError::ExtractorFailure {
              step_name: self.step_name.clone(),
              source,
            }
          }
          other => other,
        };
        return Err(Err::from(enriched));
      }
    };

    match self.pipeline.run(sub_ctx_data).await? {
      PipelineResult::Completed => {
        event!(Level::DEBUG, "Scoped pipeline completed.");
        Ok(PipelineControl::Continue)
      }
      PipelineResult::Stopped => {
        event!(Level::INFO, "Scoped pipeline was stopped by one of its handlers.");
        Ok(PipelineControl::Stop)
      }
    }
  }
}
