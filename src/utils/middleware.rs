use salvo::prelude::*;
use std::time::Instant;
use tracing::debug;

use crate::utils::AppState;

/// Puts the shared [`AppState`] into every request's depot and logs how the
/// request went once the rest of the chain has run.
pub struct StateInjector {
    state: AppState,
}

impl StateInjector {
    pub fn new(state: AppState) -> Self {
        StateInjector { state }
    }
}

#[async_trait]
impl Handler for StateInjector {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        depot.inject(self.state.clone());

        let start = Instant::now();
        ctrl.call_next(req, depot, res).await;
        debug!(
            "{} {} -> {} in {} ms",
            req.method(),
            req.uri().path(),
            res.status_code.unwrap_or(StatusCode::OK),
            start.elapsed().as_millis()
        );
    }
}

pub fn inject_state(state: AppState) -> StateInjector {
    StateInjector::new(state)
}
