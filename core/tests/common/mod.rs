// tests/common/mod.rs
#![allow(dead_code)]

use galley::{ContextData, GalleyError, PipelineControl};
use once_cell::sync::Lazy;
use tracing::Level;

/// A kitchen ticket moving through prep stations.
#[derive(Clone, Debug, Default)]
pub struct TicketContext {
  pub stations_visited: Vec<String>,
  pub notes: String,
  pub stop_at: Option<String>,
  pub channel: Option<String>,
  pub courier_ran: bool,
  pub card_ran: bool,
}

#[derive(Clone, Debug, Default)]
pub struct CardPaymentContext {
  pub reference: String,
  pub captured: bool,
}

#[derive(Clone, Debug, Default)]
pub struct CourierContext {
  pub reference: String,
  pub dispatched: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Galley error: {0}")]
  Galley(String),

  #[error("Station failed: {0}")]
  Station(String),
}

impl From<GalleyError> for TestError {
  fn from(ge: GalleyError) -> Self {
    TestError::Galley(format!("{:?}", ge))
  }
}

/// Records the station and appends `note`; stops if the ticket asks to stop here.
pub fn station_handler(station: &'static str, note: &'static str) -> galley::Handler<TicketContext, TestError> {
  Box::new(move |ctx: ContextData<TicketContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.stations_visited.push(station.to_string());
      guard.notes.push_str(note);
      tracing::debug!(target: "test_handlers", station, notes = %guard.notes, "station executed");
      if guard.stop_at.as_deref() == Some(station) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_station(station: &'static str, message: &'static str) -> galley::Handler<TicketContext, TestError> {
  Box::new(move |ctx: ContextData<TicketContext>| {
    Box::pin(async move {
      ctx.write().stations_visited.push(station.to_string());
      Err(TestError::Station(message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
