//! Shared run loop
//!
//! Every flow is the same loop: enumerate work units, dispatch each one,
//! classify the body, hand the outcome to the flow's sink. Exactly one
//! outcome per enumerated unit; a cancelled run stops enumerating but
//! still records the outcome of the unit that tripped the quota.

use std::collections::HashMap;

use async_trait::async_trait;
use bibops_common::auth::TokenFetcher;
use bibops_core::classify;
use bibops_domain::errors::BibopsError;
use bibops_domain::types::{Outcome, OutcomeCategory, WorkUnit};
use tracing::{info, warn};

use super::dispatcher::{Dispatch, DispatchResult, Dispatcher, GiveUpReason};
use super::operations::{prepare, OperationKind, PreparedRequest};

/// Seam between the run loop and the concrete dispatcher.
#[async_trait]
pub trait Dispatching {
    fn is_cancelled(&self) -> bool;
    async fn dispatch(&self, request: &PreparedRequest) -> Dispatch;
}

#[async_trait]
impl<F: TokenFetcher + 'static> Dispatching for Dispatcher<F> {
    fn is_cancelled(&self) -> bool {
        Self::is_cancelled(self)
    }

    async fn dispatch(&self, request: &PreparedRequest) -> Dispatch {
        Self::dispatch(self, request).await
    }
}

/// Receives one outcome per enumerated unit, in order.
pub trait OutcomeSink {
    /// Record a unit's terminal outcome.
    ///
    /// # Errors
    /// Propagates output failures; an unwritable sink aborts the run.
    fn record(&mut self, unit: &WorkUnit, outcome: &Outcome) -> Result<(), BibopsError>;

    /// A unit saw an auth-marker response and was retried. Default: no-op.
    ///
    /// # Errors
    /// Propagates output failures.
    fn note_auth_retry(&mut self, _unit: &WorkUnit) -> Result<(), BibopsError> {
        Ok(())
    }
}

/// Tally of one run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Units handed to the dispatcher (or failed preparation).
    pub enumerated: usize,
    /// Outcomes recorded. Always equals `enumerated`.
    pub outcomes: usize,
    /// Whether the quota marker stopped the run early.
    pub aborted: bool,
    pub counts: HashMap<OutcomeCategory, usize>,
}

impl RunSummary {
    #[must_use]
    pub fn count(&self, category: OutcomeCategory) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }
}

/// Process every unit through the dispatcher, in order.
///
/// # Errors
/// Propagates sink write failures; everything else becomes an outcome.
pub async fn run_units<D, S>(
    dispatcher: &D,
    kind: OperationKind,
    base_url: &str,
    units: &[WorkUnit],
    sink: &mut S,
) -> Result<RunSummary, BibopsError>
where
    D: Dispatching,
    S: OutcomeSink,
{
    let mut summary = RunSummary::default();

    for unit in units {
        if dispatcher.is_cancelled() {
            break;
        }
        summary.enumerated += 1;
        let identifier = unit.display_identifier().to_string();

        let outcome = match prepare(kind, base_url, unit) {
            // Units the operation cannot express fail loudly without a
            // request: one Unknown outcome each.
            Err(e) => {
                warn!(identifier, error = %e, "unit not dispatched");
                Outcome::new(identifier, OutcomeCategory::Unknown, e.to_string())
            }
            Ok(request) => {
                let dispatch = dispatcher.dispatch(&request).await;
                for _ in 0..dispatch.auth_retries {
                    sink.note_auth_retry(unit)?;
                }
                match dispatch.result {
                    DispatchResult::Done(body) => {
                        let category = classify(&body);
                        Outcome::new(identifier, category, body)
                    }
                    DispatchResult::Aborted => {
                        summary.aborted = true;
                        Outcome::new(
                            identifier,
                            OutcomeCategory::RateLimited,
                            "run cancelled by quota marker",
                        )
                    }
                    DispatchResult::GivenUp(GiveUpReason::Timeout) => Outcome::new(
                        identifier,
                        OutcomeCategory::Timeout,
                        format!("gave up after {} timed-out attempts", dispatch.timeouts),
                    ),
                    DispatchResult::GivenUp(GiveUpReason::Error(message)) => {
                        Outcome::new(identifier, OutcomeCategory::Unknown, message)
                    }
                }
            }
        };

        *summary.counts.entry(outcome.category).or_insert(0) += 1;
        sink.record(unit, &outcome)?;
        summary.outcomes += 1;

        if summary.aborted {
            break;
        }
    }

    info!(
        enumerated = summary.enumerated,
        outcomes = summary.outcomes,
        aborted = summary.aborted,
        "run finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    //! Run-loop tests against a scripted stub dispatcher.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    struct ScriptedDispatcher {
        script: Mutex<Vec<DispatchResult>>,
        served: AtomicUsize,
        cancelled: std::sync::atomic::AtomicBool,
    }

    impl ScriptedDispatcher {
        fn new(script: Vec<DispatchResult>) -> Self {
            Self {
                script: Mutex::new(script),
                served: AtomicUsize::new(0),
                cancelled: std::sync::atomic::AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl Dispatching for ScriptedDispatcher {
        fn is_cancelled(&self) -> bool {
            self.cancelled.load(Ordering::SeqCst)
        }

        async fn dispatch(&self, _request: &PreparedRequest) -> Dispatch {
            self.served.fetch_add(1, Ordering::SeqCst);
            let result = {
                let mut script = self.script.lock().unwrap();
                script.remove(0)
            };
            if result == DispatchResult::Aborted {
                self.cancelled.store(true, Ordering::SeqCst);
            }
            Dispatch { result, auth_retries: 0, timeouts: 0 }
        }
    }

    struct CollectingSink {
        outcomes: Vec<Outcome>,
    }

    impl OutcomeSink for CollectingSink {
        fn record(&mut self, _unit: &WorkUnit, outcome: &Outcome) -> Result<(), BibopsError> {
            self.outcomes.push(outcome.clone());
            Ok(())
        }
    }

    fn record(identifier: &str) -> WorkUnit {
        WorkUnit::Record {
            bytes: b"leader\x1e001\x1e".to_vec(),
            identifier: Some(identifier.into()),
        }
    }

    fn marc_body() -> DispatchResult {
        DispatchResult::Done("leader\u{1e}data\u{1e}".into())
    }

    /// Every enumerated unit yields exactly one outcome.
    #[tokio::test]
    async fn test_one_outcome_per_unit() {
        let dispatcher = ScriptedDispatcher::new(vec![
            marc_body(),
            DispatchResult::GivenUp(GiveUpReason::Timeout),
            marc_body(),
        ]);
        let units = vec![record("1"), record("2"), record("3")];
        let mut sink = CollectingSink { outcomes: vec![] };

        let summary = run_units(
            &dispatcher,
            OperationKind::ReplaceBib,
            "https://svc.example/worldcat",
            &units,
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(summary.enumerated, 3);
        assert_eq!(summary.outcomes, 3);
        assert_eq!(summary.outcomes, sink.outcomes.len());
        assert_eq!(summary.count(OutcomeCategory::Success), 2);
        assert_eq!(summary.count(OutcomeCategory::Timeout), 1);
        assert!(!summary.aborted);
    }

    /// An abort records the tripping unit's outcome and stops
    /// enumerating; later units never reach the dispatcher.
    #[tokio::test]
    async fn test_abort_stops_enumeration() {
        let dispatcher =
            ScriptedDispatcher::new(vec![marc_body(), DispatchResult::Aborted, marc_body()]);
        let units = vec![record("1"), record("2"), record("3")];
        let mut sink = CollectingSink { outcomes: vec![] };

        let summary = run_units(
            &dispatcher,
            OperationKind::ReplaceBib,
            "https://svc.example/worldcat",
            &units,
            &mut sink,
        )
        .await
        .unwrap();

        assert!(summary.aborted);
        assert_eq!(summary.enumerated, 2);
        assert_eq!(summary.outcomes, 2);
        assert_eq!(dispatcher.served.load(Ordering::SeqCst), 2);
        assert_eq!(sink.outcomes[1].category, OutcomeCategory::RateLimited);
    }

    /// A record without an identifier fails loudly without a request.
    #[tokio::test]
    async fn test_unit_without_identifier_is_unknown() {
        let dispatcher = ScriptedDispatcher::new(vec![]);
        let units = vec![WorkUnit::Record { bytes: b"broken".to_vec(), identifier: None }];
        let mut sink = CollectingSink { outcomes: vec![] };

        let summary = run_units(
            &dispatcher,
            OperationKind::ReplaceBib,
            "https://svc.example/worldcat",
            &units,
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(summary.outcomes, 1);
        assert_eq!(dispatcher.served.load(Ordering::SeqCst), 0);
        assert_eq!(sink.outcomes[0].category, OutcomeCategory::Unknown);
        assert_eq!(sink.outcomes[0].identifier, "<no identifier>");
    }
}
