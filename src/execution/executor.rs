use crate::api::ExchangeApi;
use crate::error::{OrderError, OrderFailure};
use crate::execution::OrderBuilder;
use crate::models::{AddOrderResult, OrderPayload, OrderRequest, PriceSource};
use crate::pricing::extract_price;

/// Steps of a single placement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementState {
    Start,
    PriceResolved,
    PayloadBuilt,
    Submitted,
    Succeeded,
    Failed,
}

/// A successfully submitted order
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub request: OrderRequest,
    pub payload: OrderPayload,
    pub result: AddOrderResult,
}

/// Places one order request at a time against an exchange client
pub struct OrderExecutor<C> {
    client: C,
    price_source: PriceSource,
    builder: OrderBuilder,
}

impl<C: ExchangeApi> OrderExecutor<C> {
    pub fn new(client: C, price_source: PriceSource, builder: OrderBuilder) -> Self {
        Self {
            client,
            price_source,
            builder,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch the price, build the payload, submit it once and classify the answer.
    ///
    /// Every failure is terminal for this request; nothing is retried.
    pub async fn place(&self, request: &OrderRequest) -> Result<PlacedOrder, OrderFailure> {
        tracing::info!("Start placing order {}", request);
        let mut state = PlacementState::Start;

        let fail = |state: PlacementState, error: OrderError| {
            advance(request, state, PlacementState::Failed);
            OrderFailure {
                order: request.description(),
                error,
            }
        };

        let market_data = self
            .client
            .query_market_data(&request.pair, self.price_source)
            .await
            .map_err(|e| fail(state, OrderError::Exchange(vec![format!("{:#}", e)])))?;

        let price = extract_price(&market_data, &request.pair, self.price_source)
            .map_err(|e| fail(state, OrderError::from_price_error(e, request.pair.as_str())))?;
        state = advance(request, state, PlacementState::PriceResolved);
        tracing::info!(pair = %request.pair, %price, source = %self.price_source, "Resolved market price");

        let payload = self
            .builder
            .build_payload(request, price)
            .map_err(|e| fail(state, e))?;
        state = advance(request, state, PlacementState::PayloadBuilt);
        tracing::debug!(
            pair = %payload.pair,
            side = %payload.side,
            order_type = %payload.order_type,
            price = %payload.price,
            volume = %payload.volume,
            "Built order payload"
        );

        let response = self
            .client
            .submit_order(&payload)
            .await
            .map_err(|e| fail(state, OrderError::Exchange(vec![format!("{:#}", e)])))?;
        state = advance(request, state, PlacementState::Submitted);

        if !response.is_success() {
            let error = OrderError::classify_submission(&response.error);
            return Err(fail(state, error));
        }

        // An unexpected result body does not undo a successful submission
        let result: AddOrderResult = serde_json::from_value(response.result).unwrap_or_else(|e| {
            tracing::warn!(pair = %request.pair, "Could not parse AddOrder result: {}", e);
            AddOrderResult::default()
        });
        advance(request, state, PlacementState::Succeeded);

        if let Some(descr) = &result.descr {
            tracing::info!(pair = %request.pair, txid = ?result.txid, "Kraken accepted: {}", descr.order);
        }
        tracing::info!("Placed order: {}", request);

        Ok(PlacedOrder {
            request: request.clone(),
            payload,
            result,
        })
    }
}

fn advance(request: &OrderRequest, from: PlacementState, to: PlacementState) -> PlacementState {
    tracing::debug!(pair = %request.pair, ?from, ?to, "Placement state change");
    to
}
