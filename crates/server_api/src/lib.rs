use shared::{
    domain::Operation,
    error::{ApiError, ErrorCode},
    protocol::CounterPayload,
};
use storage::{Storage, StoreError, StoredCounter};
use tracing::debug;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// Returns the counter, creating the zero-valued record on first access.
pub async fn get_counter(ctx: &ApiContext) -> Result<CounterPayload, ApiError> {
    let counter = ctx.storage.get_or_create().await.map_err(store_error)?;
    Ok(payload(counter))
}

/// Applies one operation and returns the persisted record. `updated_at` is
/// stamped with the time of the write, not client time. Store failures pass
/// through unchanged; there is no retry.
pub async fn update_counter(
    ctx: &ApiContext,
    operation: Operation,
) -> Result<CounterPayload, ApiError> {
    let counter = ctx.storage.apply(operation).await.map_err(store_error)?;
    debug!(?operation, value = counter.value, "counter updated");
    Ok(payload(counter))
}

fn payload(counter: StoredCounter) -> CounterPayload {
    CounterPayload {
        id: counter.id,
        value: counter.value,
        updated_at: counter.updated_at,
    }
}

fn store_error(err: StoreError) -> ApiError {
    let code = match &err {
        StoreError::NotFound { .. } => ErrorCode::NotFound,
        StoreError::Unavailable(_) => ErrorCode::Storage,
    };
    ApiError::new(code, err.to_string())
}
