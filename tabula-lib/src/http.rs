//! HTTP JSON fetcher.
//!
//! [`HttpFetcher`] issues `GET <endpoint>?page=..&pageSize=..&<extra>` and
//! decodes the common admin-API envelope:
//!
//! ```json
//! { "code": 0, "message": "ok", "data": { "list": [...], "total": 37 } }
//! ```
//!
//! A bare `{ "list": [...], "total": 37 }` body is accepted too. `items`,
//! `records` and `rows` are accepted in place of `list`.
//!
//! Failures are classified for the table's error panel:
//!
//! | Failure                         | Error                    |
//! |---------------------------------|--------------------------|
//! | connect, timeout, reset         | [`FetchError::Network`]  |
//! | non-2xx status                  | [`FetchError::Http`]     |
//! | 2xx with a failing `code`       | [`FetchError::Business`] |
//! | undecodable body                | [`FetchError::Decode`]   |

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::ConfigError;
use crate::error::FetchError;
use crate::fetch::FetchParams;
use crate::fetch::FetchResult;
use crate::fetch::Fetcher;

/// Business codes treated as success when none are configured.
pub const DEFAULT_SUCCESS_CODES: [i64; 2] = [0, 200];

/// Fetches pages from a JSON HTTP endpoint.
///
/// Cheap to clone (uses `Arc` internally).
///
/// # Example
///
/// ```ignore
/// let fetcher = HttpFetcher::<User>::builder("https://admin.example.com/api/users")
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// let table = DataTable::builder()
///     .row_key(|u: &User, _| RowId::from(u.id))
///     .fetch(FetchConfig::new(fetcher))
///     .build()?;
/// ```
pub struct HttpFetcher<T> {
    inner: Arc<HttpFetcherInner>,
    _rows: PhantomData<fn() -> T>,
}

struct HttpFetcherInner {
    endpoint: Url,
    http_client: Client,
    timeout: Option<Duration>,
    success_codes: Vec<i64>,
}

impl<T> Clone for HttpFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _rows: PhantomData,
        }
    }
}

impl<T> HttpFetcher<T> {
    /// Creates a new builder for `endpoint`.
    pub fn builder(endpoint: impl Into<String>) -> HttpFetcherBuilder<T> {
        HttpFetcherBuilder {
            endpoint: endpoint.into(),
            timeout: None,
            connect_timeout: None,
            success_codes: DEFAULT_SUCCESS_CODES.to_vec(),
            http_client: None,
            _rows: PhantomData,
        }
    }

    /// The endpoint URL, without page parameters.
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// The request URL for `params`.
    pub fn request_url(&self, params: &FetchParams) -> Url {
        let mut url = self.inner.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params.query_pairs() {
                query.append_pair(&key, &value);
            }
        }
        url
    }
}

#[async_trait]
impl<T> Fetcher<T> for HttpFetcher<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self, params: FetchParams) -> Result<FetchResult<T>, FetchError> {
        let url = self.request_url(&params);
        log::debug!("GET {}", url);

        let mut request = self.inner.http_client.get(url);
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        decode_page(status, &body, &self.inner.success_codes)
    }
}

/// Builder for [`HttpFetcher`].
pub struct HttpFetcherBuilder<T> {
    endpoint: String,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    success_codes: Vec<i64>,
    http_client: Option<Client>,
    _rows: PhantomData<fn() -> T>,
}

impl<T> HttpFetcherBuilder<T> {
    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the business codes that mean success.
    ///
    /// Defaults to [`DEFAULT_SUCCESS_CODES`].
    pub fn success_codes(mut self, codes: impl IntoIterator<Item = i64>) -> Self {
        self.success_codes = codes.into_iter().collect();
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the [`HttpFetcher`].
    pub fn build(self) -> Result<HttpFetcher<T>, ConfigError> {
        let endpoint =
            Url::parse(&self.endpoint).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", self.endpoint, e)))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder
                    .build()
                    .map_err(|e| ConfigError::HttpClient(e.to_string()))?
            }
        };

        Ok(HttpFetcher {
            inner: Arc::new(HttpFetcherInner {
                endpoint,
                http_client,
                timeout: self.timeout,
                success_codes: self.success_codes,
            }),
            _rows: PhantomData,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: Option<i64>,
    #[serde(alias = "msg")]
    message: Option<String>,
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct PageBody<T> {
    #[serde(alias = "items", alias = "records", alias = "rows")]
    list: Vec<T>,
    total: u64,
}

/// Decode a response into a page.
pub fn decode_page<T: DeserializeOwned>(
    status: u16,
    body: &[u8],
    success_codes: &[i64],
) -> Result<FetchResult<T>, FetchError> {
    let envelope: Option<Envelope> = serde_json::from_slice(body).ok();

    if !(200..300).contains(&status) {
        let message = envelope
            .and_then(|e| e.message)
            .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
        return Err(FetchError::http(status, message));
    }

    let Some(envelope) = envelope else {
        return Err(FetchError::decode("response body is not a JSON object"));
    };

    if let Some(code) = envelope.code
        && !success_codes.contains(&code)
    {
        return Err(FetchError::business(code, envelope.message.unwrap_or_default()));
    }

    let page: PageBody<T> = match envelope.data {
        Some(data) => serde_json::from_value(data)?,
        None => serde_json::from_slice(body)?,
    };
    Ok(FetchResult::new(page.list, page.total))
}
