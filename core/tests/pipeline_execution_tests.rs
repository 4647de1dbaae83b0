// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use galley::{ContextData, Pipeline, PipelineControl, PipelineResult};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn steps_run_in_declared_order() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TicketContext, TestError>::new(&[("grill", false, None), ("fry", false, None), ("expo", false, None)]);
  pipeline.on_root("grill", station_handler("grill", "G"));
  pipeline.on_root("fry", station_handler("fry", "F"));
  pipeline.on_root("expo", station_handler("expo", "E"));

  let ctx = ContextData::new(TicketContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.stations_visited, vec!["grill", "fry", "expo"]);
  assert_eq!(guard.notes, "GFE");
}

#[tokio::test]
#[serial]
async fn stop_signal_halts_remaining_steps() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TicketContext, TestError>::new(&[("grill", false, None), ("fry", false, None), ("expo", false, None)]);
  pipeline.on_root("grill", station_handler("grill", "G"));
  pipeline.on_root("fry", station_handler("fry", "F"));
  pipeline.on_root("expo", station_handler("expo", "E"));

  let ctx = ContextData::new(TicketContext {
    stop_at: Some("fry".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  assert_eq!(ctx.read().stations_visited, vec!["grill", "fry"]);
}

#[tokio::test]
#[serial]
async fn before_on_after_phases_run_in_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[("grill", false, None)]);
  pipeline.after_root("grill", station_handler("after", "3"));
  pipeline.on_root("grill", station_handler("on", "2"));
  pipeline.before_root("grill", station_handler("before", "1"));

  let ctx = ContextData::new(TicketContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().notes, "123");
}

#[tokio::test]
#[serial]
async fn skip_condition_bypasses_step() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[
    ("grill", false, None),
    (
      "fry",
      false,
      Some(Arc::new(|ctx: ContextData<TicketContext>| !ctx.read().stations_visited.is_empty())),
    ),
    ("expo", false, None),
  ]);
  pipeline.on_root("grill", station_handler("grill", "G"));
  pipeline.on_root("fry", station_handler("fry", "F"));
  pipeline.on_root("expo", station_handler("expo", "E"));

  let ctx = ContextData::new(TicketContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().stations_visited, vec!["grill", "expo"]);
}

#[tokio::test]
#[serial]
async fn optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[("grill", false, None), ("garnish", true, None)]);
  pipeline.on_root("grill", station_handler("grill", "G"));

  let ctx = ContextData::new(TicketContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().stations_visited, vec!["grill"]);
}

#[tokio::test]
#[serial]
async fn inserted_and_removed_steps_change_execution_order() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TicketContext, TestError>::new(&[("grill", false, None), ("expo", false, None)]);
  pipeline.insert_before_step("grill", "prep", false, None);
  pipeline.insert_after_step("grill", "fry", false, None);
  pipeline.on_root("prep", station_handler("prep", "P"));
  pipeline.on_root("grill", station_handler("grill", "G"));
  pipeline.on_root("fry", station_handler("fry", "F"));
  pipeline.on_root("expo", station_handler("expo", "E"));
  assert_eq!(pipeline.step_names(), vec!["prep", "grill", "fry", "expo"]);

  pipeline.remove_step("fry");
  assert_eq!(pipeline.step_names(), vec!["prep", "grill", "expo"]);

  let ctx = ContextData::new(TicketContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().notes, "PGE");
}

#[tokio::test]
#[serial]
async fn handler_with_own_error_type_converts_into_pipeline_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[("grill", false, None)]);
  pipeline.on_root("grill", |_ctx: ContextData<TicketContext>| async move {
    Err::<PipelineControl, galley::GalleyError>(galley::GalleyError::Internal("burner out".to_string()))
  });

  let err = pipeline.run(ContextData::new(TicketContext::default())).await.unwrap_err();
  assert!(matches!(err, TestError::Galley(msg) if msg.contains("burner out")));
}

#[test]
#[should_panic(expected = "Step not found")]
fn registering_handler_for_unknown_step_panics() {
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(&[("grill", false, None)]);
  pipeline.on_root("smoker", station_handler("smoker", "S"));
}
