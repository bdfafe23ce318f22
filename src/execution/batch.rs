use super::{OrderExecutor, PlacedOrder};
use crate::api::ExchangeApi;
use crate::error::OrderFailure;
use crate::models::OrderRequest;
use serde::Deserialize;

/// What to do with the remaining orders once one fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failed order
    #[default]
    Abort,
    /// Place every order and report all failures at the end
    Continue,
}

/// Outcome of one run over the order list
#[derive(Debug, Default)]
pub struct RunReport {
    pub placed: Vec<PlacedOrder>,
    pub failures: Vec<OrderFailure>,
    /// Orders never attempted because the run was aborted
    pub skipped: usize,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Place `orders` one after another, in order
pub async fn run_orders<C: ExchangeApi>(
    executor: &OrderExecutor<C>,
    orders: &[OrderRequest],
    policy: FailurePolicy,
) -> RunReport {
    let mut report = RunReport::default();

    for (index, order) in orders.iter().enumerate() {
        match executor.place(order).await {
            Ok(placed) => report.placed.push(placed),
            Err(failure) => {
                tracing::error!("{}", failure);
                report.failures.push(failure);

                if policy == FailurePolicy::Abort {
                    report.skipped = orders.len() - index - 1;
                    if report.skipped > 0 {
                        tracing::warn!(
                            "Aborting run, {} remaining order(s) not placed",
                            report.skipped
                        );
                    }
                    break;
                }
            }
        }
    }

    tracing::info!(
        placed = report.placed.len(),
        failed = report.failures.len(),
        skipped = report.skipped,
        "Order run finished"
    );

    report
}
