// galley/src/conditional/builder.rs

//! Fluent API behind `Pipeline::conditional_scopes_for_step`.

use crate::conditional::scope::{AnyConditionalScope, ConditionalScope, ScopeExtractor};
use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use crate::core::handler::Handler;
use crate::error::GalleyError;
use crate::pipeline::definition::Pipeline;
use std::sync::Arc;
use tracing::{event, Level};

/// Collects the scopes of one conditional step. Nothing is registered on the
/// pipeline until `finalize_conditional_step` is called.
pub struct ConditionalScopeBuilder<'pipeline, TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<GalleyError> + Send + Sync + 'static,
{
  pipeline: &'pipeline mut Pipeline<TData, Err>,
  step_name: String,
  collected_scopes: Vec<Arc<dyn AnyConditionalScope<TData, Err>>>,
  on_no_match_behavior: PipelineControl,
}

impl<'pipeline, TData, Err> ConditionalScopeBuilder<'pipeline, TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<GalleyError> + Send + Sync + 'static,
{
  pub(crate) fn new(pipeline: &'pipeline mut Pipeline<TData, Err>, step_name: String) -> Self {
    Self {
      pipeline,
      step_name,
      collected_scopes: Vec::new(),
      on_no_match_behavior: PipelineControl::Continue,
    }
  }

  /// Starts a scope backed by an already-built pipeline. Complete it with `on_condition`.
  pub fn add_static_scope<SData>(
    self,
    static_pipeline: Arc<Pipeline<SData, Err>>,
    extractor_fn: impl Fn(ContextData<TData>) -> Result<ContextData<SData>, GalleyError> + Send + Sync + 'static,
  ) -> ConditionalScopeConfigurator<'pipeline, TData, SData, Err>
  where
    SData: 'static + Send + Sync,
  {
    ConditionalScopeConfigurator {
      builder: self,
      pipeline: static_pipeline,
      extractor: Arc::new(extractor_fn),
    }
  }

  /// What the step signals when no scope condition holds. Defaults to `Continue`.
  pub fn if_no_scope_matches(mut self, behavior: PipelineControl) -> Self {
    self.on_no_match_behavior = behavior;
    self
  }

  /// Installs the routing handler as the step's only `on` handler.
  ///
  /// When `optional_for_main_step` is true, a failing scope is logged and the
  /// parent pipeline continues.
  pub fn finalize_conditional_step(self, optional_for_main_step: bool) {
    let scopes = Arc::new(self.collected_scopes);
    let on_no_match = self.on_no_match_behavior;
    let step_name = self.step_name;
    let step_name_for_handler = step_name.clone();

    let router: Handler<TData, Err> = Box::new(move |main_ctx_data: ContextData<TData>| {
      let scopes = scopes.clone();
      let step_name = step_name_for_handler.clone();

      Box::pin(async move {
        for scope in scopes.iter() {
          if !scope.is_condition_met(main_ctx_data.clone()) {
            continue;
          }
          event!(Level::DEBUG, step_name = %step_name, "Conditional scope matched.");
          return match scope.execute_scoped_pipeline(main_ctx_data.clone()).await {
            Ok(control) => Ok(control),
            Err(e) if optional_for_main_step => {
              event!(Level::WARN, step_name = %step_name, error = %e, "Optional conditional step failed, continuing.");
              Ok(PipelineControl::Continue)
            }
            Err(e) => Err(e),
          };
        }
        event!(Level::DEBUG, step_name = %step_name, behavior = ?on_no_match, "No conditional scope matched.");
        Ok(on_no_match)
      })
    });

    if let Some(step_def) = self.pipeline.steps.iter_mut().find(|s| s.name == step_name) {
      step_def.optional = optional_for_main_step;
    }
    self.pipeline.on.insert(step_name, vec![router]);
  }
}

/// A scope waiting for its condition.
pub struct ConditionalScopeConfigurator<'pipeline, TData, SData, Err>
where
  TData: 'static + Send + Sync,
  SData: 'static + Send + Sync,
  Err: std::error::Error + From<GalleyError> + Send + Sync + 'static,
{
  builder: ConditionalScopeBuilder<'pipeline, TData, Err>,
  pipeline: Arc<Pipeline<SData, Err>>,
  extractor: ScopeExtractor<TData, SData>,
}

impl<'pipeline, TData, SData, Err> ConditionalScopeConfigurator<'pipeline, TData, SData, Err>
where
  TData: 'static + Send + Sync,
  SData: 'static + Send + Sync,
  Err: std::error::Error + From<GalleyError> + Send + Sync + 'static,
{
  /// Scopes are tested in the order they were added; the first match wins.
  pub fn on_condition(
    mut self,
    condition_fn: impl Fn(ContextData<TData>) -> bool + Send + Sync + 'static,
  ) -> ConditionalScopeBuilder<'pipeline, TData, Err> {
    let scope = ConditionalScope::<TData, SData, Err> {
      step_name: self.builder.step_name.clone(),
      pipeline: self.pipeline,
      extractor: self.extractor,
      condition: Arc::new(condition_fn),
    };
    self.builder.collected_scopes.push(Arc::new(scope));
    self.builder
  }
}
