use crate::domain::event::{UserCreatedNotification, UserUpdatedNotification};
use crate::domain::store::{StoreError, UserStore};
use crate::domain::{User, UserDetails};
use crate::library::communication::event::{BestEffortPublisher, PublisherSlot};
use crate::library::http::{handle_rejection, json_response, respond, ApiError};
use hyper::body::Bytes;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Filter;

const MESSAGE_MISSING_FIELDS: &str = "name and email are required";

#[derive(Debug, Deserialize)]
struct UserBody {
    name: Option<String>,
    email: Option<String>,
}

fn parse_details(body: &[u8]) -> Result<UserDetails, ApiError> {
    let body: UserBody =
        serde_json::from_slice(body).map_err(|_| ApiError::BadRequest(MESSAGE_MISSING_FIELDS))?;

    match (body.name, body.email) {
        (Some(name), Some(email)) if !name.is_empty() && !email.is_empty() => {
            Ok(UserDetails { name, email })
        }
        _ => Err(ApiError::BadRequest(MESSAGE_MISSING_FIELDS)),
    }
}

/// Operations of the users HTTP API
pub struct UsersContext<S> {
    store: UserStore,
    publisher: BestEffortPublisher<S>,
}

impl<S> UsersContext<S>
where
    S: PublisherSlot + Send + Sync,
{
    /// Creates a new instance from raw parts
    pub fn new(store: UserStore, slot: S) -> Self {
        Self {
            store,
            publisher: BestEffortPublisher::new(slot),
        }
    }

    async fn list(&self) -> Result<Vec<User>, ApiError> {
        self.store
            .list()
            .await
            .map_err(|e| ApiError::internal("could not list users", e))
    }

    async fn find(&self, id: &str) -> Result<User, ApiError> {
        self.store.find(id).await.map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound,
            e => ApiError::internal("could not retrieve user", e),
        })
    }

    async fn create(&self, body: &[u8]) -> Result<User, ApiError> {
        let user = User::new(parse_details(body)?);

        self.store.insert(&user).await.map_err(|e| match e {
            StoreError::Conflict => ApiError::Conflict("email already exists"),
            e => ApiError::internal("could not create user", e),
        })?;

        info!(id = user.id.as_str(), "Registered user");
        self.publisher
            .publish(&UserCreatedNotification(user.clone()))
            .await;

        Ok(user)
    }

    async fn update(&self, id: &str, body: &[u8]) -> Result<User, ApiError> {
        let details = parse_details(body)?;

        let user = self.store.update(id, &details).await.map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Conflict => ApiError::Conflict("email already in use by another user"),
            e => ApiError::internal("could not update user", e),
        })?;

        info!(id, "Updated user");
        self.publisher
            .publish(&UserUpdatedNotification(user.clone()))
            .await;

        Ok(user)
    }
}

/// Builds all routes of the users HTTP API
pub fn routes<S>(context: Arc<UsersContext<S>>) -> BoxedFilter<(Response,)>
where
    S: PublisherSlot + Send + Sync + 'static,
{
    let with_context = warp::any().map(move || context.clone());

    let health = warp::path!("health").and(warp::get()).map(|| {
        json_response(&json!({ "ok": true, "service": "users" }), StatusCode::OK)
    });

    let list = warp::path::end()
        .and(warp::get())
        .and(with_context.clone())
        .and_then(|context: Arc<UsersContext<S>>| async move {
            respond(context.list().await, StatusCode::OK)
        });

    let create = warp::path::end()
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_context.clone())
        .and_then(|body: Bytes, context: Arc<UsersContext<S>>| async move {
            respond(context.create(&body).await, StatusCode::CREATED)
        });

    let find = warp::path!(String)
        .and(warp::get())
        .and(with_context.clone())
        .and_then(|id: String, context: Arc<UsersContext<S>>| async move {
            respond(context.find(&id).await, StatusCode::OK)
        });

    let update = warp::path!(String)
        .and(warp::put())
        .and(warp::body::bytes())
        .and(with_context)
        .and_then(
            |id: String, body: Bytes, context: Arc<UsersContext<S>>| async move {
                respond(context.update(&id, &body).await, StatusCode::OK)
            },
        );

    health
        .or(list)
        .unify()
        .or(create)
        .unify()
        .or(find)
        .unify()
        .or(update)
        .unify()
        .recover(handle_rejection)
        .unify()
        .boxed()
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::domain::store::memory_pool;
    use crate::library::communication::implementation::mock::{
        FailingNotificationPublisher, MockNotificationPublisher,
    };
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use warp::test::request;

    async fn store() -> UserStore {
        let store = UserStore::new(memory_pool().await);
        store.setup().await.unwrap();
        store
    }

    async fn api<S>(slot: S) -> (UserStore, BoxedFilter<(Response,)>)
    where
        S: PublisherSlot + Send + Sync + 'static,
    {
        let store = store().await;
        let context = Arc::new(UsersContext::new(store.clone(), slot));

        (store, routes(context))
    }

    fn body(response: &warp::http::Response<Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn report_health() {
        let (_, api) = api(None::<Arc<MockNotificationPublisher>>).await;

        let response = request().path("/health").reply(&api).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response), json!({ "ok": true, "service": "users" }));
    }

    #[tokio::test]
    async fn register_and_announce_users() {
        let publisher = Arc::new(MockNotificationPublisher::ignoring_everything());
        let (store, api) = api(Some(publisher.clone())).await;

        let response = request()
            .method("POST")
            .path("/")
            .json(&json!({ "name": "Ada", "email": "ada@example.com" }))
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let user: User = serde_json::from_slice(response.body()).unwrap();
        assert!(user.id.starts_with("u_"));
        assert_eq!(store.find(&user.id).await.unwrap(), user);
        assert_eq!(publisher.published(), 1);
    }

    #[tokio::test]
    async fn reject_incomplete_bodies() {
        let publisher = Arc::new(MockNotificationPublisher::default());
        let (_, api) = api(Some(publisher.clone())).await;

        let missing = request()
            .method("POST")
            .path("/")
            .json(&json!({ "name": "Ada" }))
            .reply(&api)
            .await;
        let empty = request()
            .method("POST")
            .path("/")
            .json(&json!({ "name": "", "email": "ada@example.com" }))
            .reply(&api)
            .await;
        let garbage = request()
            .method("POST")
            .path("/")
            .body("name=Ada")
            .reply(&api)
            .await;

        for response in [missing, empty, garbage].iter() {
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body(response), json!({ "error": "name and email are required" }));
        }
        assert_eq!(publisher.published(), 0);
    }

    #[tokio::test]
    async fn refuse_duplicate_emails() {
        let (_, api) = api(None::<Arc<MockNotificationPublisher>>).await;
        let user = json!({ "name": "Ada", "email": "ada@example.com" });

        request().method("POST").path("/").json(&user).reply(&api).await;
        let response = request().method("POST").path("/").json(&user).reply(&api).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body(&response), json!({ "error": "email already exists" }));
    }

    #[tokio::test]
    async fn report_unknown_users() {
        let (_, api) = api(None::<Arc<MockNotificationPublisher>>).await;

        let found = request().path("/u_000000").reply(&api).await;
        let updated = request()
            .method("PUT")
            .path("/u_000000")
            .json(&json!({ "name": "Ada", "email": "ada@example.com" }))
            .reply(&api)
            .await;

        assert_eq!(found.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&found), json!({ "error": "not found" }));
        assert_eq!(updated.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn announce_updated_snapshot() {
        let publisher = Arc::new(MockNotificationPublisher::default());
        let (store, api) = api(Some(publisher.clone())).await;

        let user = User::new(UserDetails {
            name: "A".into(),
            email: "a@example.com".into(),
        });
        store.insert(&user).await.unwrap();

        let expected = User {
            name: "B".into(),
            email: "b@example.com".into(),
            ..user.clone()
        };
        publisher.expect(&UserUpdatedNotification(expected.clone()));

        let response = request()
            .method("PUT")
            .path(&format!("/{}", user.id))
            .json(&json!({ "name": "B", "email": "b@example.com" }))
            .reply(&api)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response), serde_json::to_value(&expected).unwrap());
        assert_eq!(publisher.published(), 1);
    }

    #[tokio::test]
    async fn succeed_without_broker() {
        let (_, unavailable) = api(None::<Arc<MockNotificationPublisher>>).await;
        let (_, broken) = api(Some(FailingNotificationPublisher)).await;

        for api in [unavailable, broken].iter() {
            let response = request()
                .method("POST")
                .path("/")
                .json(&json!({ "name": "Ada", "email": "ada@example.com" }))
                .reply(api)
                .await;

            assert_eq!(response.status(), StatusCode::CREATED);
        }
    }
}
