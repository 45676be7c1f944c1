use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::Operation,
    error::{ApiError, ApiException},
    protocol::{CounterPayload, UpdateCounterRequest},
};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Api(#[from] ApiException),
    #[error("unexpected status {0} with non-JSON body")]
    UnexpectedStatus(StatusCode),
}

/// Typed client for the counter server. One instance is cheap to clone and
/// reuses the underlying connection pool.
#[derive(Debug, Clone)]
pub struct CounterClient {
    http: Client,
    counter_url: Url,
}

impl CounterClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)?;
        Ok(Self {
            http: Client::new(),
            counter_url: base.join("counter")?,
        })
    }

    pub async fn get_counter(&self) -> Result<CounterPayload, ClientError> {
        let response = self.http.get(self.counter_url.clone()).send().await?;
        decode_counter(response).await
    }

    pub async fn update_counter(&self, operation: Operation) -> Result<CounterPayload, ClientError> {
        let response = self
            .http
            .post(self.counter_url.clone())
            .json(&UpdateCounterRequest { operation })
            .send()
            .await?;
        decode_counter(response).await
    }
}

async fn decode_counter(response: Response) -> Result<CounterPayload, ClientError> {
    if response.status().is_success() {
        return Ok(response.json::<CounterPayload>().await?);
    }

    let status = response.status();
    match response.json::<ApiError>().await {
        Ok(err) => Err(ApiException::from(err).into()),
        Err(_) => Err(ClientError::UnexpectedStatus(status)),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
