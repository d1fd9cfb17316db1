use crate::domain::event::{OrderCancelledNotification, OrderCreatedNotification};
use crate::domain::store::{OrderStore, StoreError};
use crate::domain::{DependencyValidator, Order, User, UserIdentifier, ValidationError};
use crate::library::communication::event::{BestEffortPublisher, PublisherSlot};
use crate::library::http::{handle_rejection, json_response, respond, ApiError};
use hyper::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Filter;

const MESSAGE_INVALID_BODY: &str = "userId, items[] and total<number> are required";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderBody {
    user_id: Option<Value>,
    items: Option<Value>,
    total: Option<Value>,
}

struct OrderRequest {
    user_id: UserIdentifier,
    items: Vec<Value>,
    total: f64,
}

fn parse_request(body: &[u8]) -> Result<OrderRequest, ApiError> {
    let invalid = || ApiError::BadRequest(MESSAGE_INVALID_BODY);
    let body: OrderBody = serde_json::from_slice(body).map_err(|_| invalid())?;

    let user_id = match body.user_id {
        Some(Value::String(id)) if !id.is_empty() => id,
        _ => return Err(invalid()),
    };

    let items = match body.items {
        Some(Value::Array(items)) => items,
        _ => return Err(invalid()),
    };

    let total = body
        .total
        .as_ref()
        .and_then(Value::as_f64)
        .ok_or_else(invalid)?;

    Ok(OrderRequest {
        user_id,
        items,
        total,
    })
}

#[derive(Debug, Serialize)]
struct Cancellation {
    message: &'static str,
    id: String,
}

/// Operations of the orders HTTP API
pub struct OrdersContext<S> {
    store: OrderStore,
    validator: DependencyValidator<User>,
    publisher: BestEffortPublisher<S>,
}

impl<S> OrdersContext<S>
where
    S: PublisherSlot + Send + Sync,
{
    /// Creates a new instance from raw parts
    pub fn new(store: OrderStore, validator: DependencyValidator<User>, slot: S) -> Self {
        Self {
            store,
            validator,
            publisher: BestEffortPublisher::new(slot),
        }
    }

    async fn list(&self) -> Result<Vec<Order>, ApiError> {
        self.store
            .list()
            .await
            .map_err(|e| ApiError::internal("could not list orders", e))
    }

    async fn create(&self, body: &[u8]) -> Result<Order, ApiError> {
        let request = parse_request(body)?;

        self.validator
            .validate(&request.user_id)
            .await
            .map_err(|e| match e {
                ValidationError::Invalid => ApiError::BadRequest("invalid user"),
                ValidationError::Unavailable => ApiError::Unavailable(
                    "users service unavailable and user not found in cache",
                ),
            })?;

        let order = Order::new(request.user_id, request.items, request.total);
        self.store
            .insert(&order)
            .await
            .map_err(|e| ApiError::internal("could not create order", e))?;

        info!(id = order.id.as_str(), user = order.user_id.as_str(), "Placed order");
        self.publisher
            .publish(&OrderCreatedNotification(order.clone()))
            .await;

        Ok(order)
    }

    async fn cancel(&self, id: &str) -> Result<Cancellation, ApiError> {
        let order = self.store.remove(id).await.map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound,
            e => ApiError::internal("could not delete order", e),
        })?;

        info!(id, "Cancelled order");
        let id = order.id.clone();
        self.publisher
            .publish(&OrderCancelledNotification(order))
            .await;

        Ok(Cancellation {
            message: "order cancelled",
            id,
        })
    }
}

/// Builds all routes of the orders HTTP API
pub fn routes<S>(context: Arc<OrdersContext<S>>) -> BoxedFilter<(Response,)>
where
    S: PublisherSlot + Send + Sync + 'static,
{
    let with_context = warp::any().map(move || context.clone());

    let health = warp::path!("health").and(warp::get()).map(|| {
        json_response(&json!({ "ok": true, "service": "orders" }), StatusCode::OK)
    });

    let list = warp::path::end()
        .and(warp::get())
        .and(with_context.clone())
        .and_then(|context: Arc<OrdersContext<S>>| async move {
            respond(context.list().await, StatusCode::OK)
        });

    let create = warp::path::end()
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_context.clone())
        .and_then(|body: Bytes, context: Arc<OrdersContext<S>>| async move {
            respond(context.create(&body).await, StatusCode::CREATED)
        });

    let cancel = warp::path!(String)
        .and(warp::delete())
        .and(with_context)
        .and_then(|id: String, context: Arc<OrdersContext<S>>| async move {
            respond(context.cancel(&id).await, StatusCode::OK)
        });

    health
        .or(list)
        .unify()
        .or(create)
        .unify()
        .or(cancel)
        .unify()
        .recover(handle_rejection)
        .unify()
        .boxed()
}
