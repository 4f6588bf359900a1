use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ArbError, Result};
use crate::exchanges::parse_level;
use crate::models::{BookSide, CurrencyPair, Quote};
use crate::sources::QuoteSource;

const BOOKS_LITE_PATH: &str = "/api/v5/market/books-lite";
/// OKX code for an instrument id that does not exist.
const INSTRUMENT_MISSING: &str = "51001";

#[derive(Debug, Deserialize)]
struct BooksResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<BookSnapshot>,
}

#[derive(Debug, Deserialize)]
struct BookSnapshot {
    #[serde(default)]
    asks: Vec<Vec<String>>,
    #[serde(default)]
    bids: Vec<Vec<String>>,
}

/// OKX public `books-lite` depth snapshot over REST.
#[derive(Debug, Clone)]
pub struct OkxQuoteSource {
    client: reqwest::Client,
    base_url: String,
}

impl OkxQuoteSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }

    pub fn books_url(&self, pair: &CurrencyPair) -> Result<Url> {
        let base = format!("{}{}", self.base_url.trim_end_matches('/'), BOOKS_LITE_PATH);
        Url::parse_with_params(&base, &[("instId", pair.inst_id())]).map_err(|e| ArbError::QuoteFetch {
            pair: pair.to_string(),
            reason: format!("bad url {base}: {e}"),
        })
    }
}

#[async_trait]
impl QuoteSource for OkxQuoteSource {
    async fn fetch_quotes(&self, pair: &CurrencyPair, side: BookSide) -> Result<Vec<Quote>> {
        let url = self.books_url(pair)?;
        debug!("okx: GET {}", url);

        let fetch_err = |e: reqwest::Error| ArbError::QuoteFetch { pair: pair.to_string(), reason: e.to_string() };
        let resp = self.client.get(url).send().await.map_err(fetch_err)?;
        let status = resp.status();
        let body: BooksResponse = match resp.json().await {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(fetch_err(e)),
            Err(_) => {
                return Err(ArbError::QuoteFetch { pair: pair.to_string(), reason: format!("HTTP {status}") })
            }
        };

        check_status(pair, status, &body)?;
        quotes_from_response(pair, body, side)
    }
}

/// Non-2xx replies are failures unless OKX says the instrument is unknown.
fn check_status(pair: &CurrencyPair, status: StatusCode, body: &BooksResponse) -> Result<()> {
    if status.is_success() || body.code == INSTRUMENT_MISSING {
        return Ok(());
    }
    Err(ArbError::QuoteFetch {
        pair: pair.to_string(),
        reason: format!("HTTP {status}: {}: {}", body.code, body.msg),
    })
}

fn quotes_from_response(pair: &CurrencyPair, body: BooksResponse, side: BookSide) -> Result<Vec<Quote>> {
    match body.code.as_str() {
        "" | "0" => {}
        INSTRUMENT_MISSING => {
            warn!(pair = %pair, msg = %body.msg, "okx: no book");
            return Ok(Vec::new());
        }
        code => {
            return Err(ArbError::QuoteFetch { pair: pair.to_string(), reason: format!("{code}: {}", body.msg) });
        }
    }

    let Some(snapshot) = body.data.into_iter().next() else {
        return Ok(Vec::new());
    };

    let levels = match side {
        BookSide::Asks => snapshot.asks,
        BookSide::Bids => snapshot.bids,
    };
    let quotes: Vec<Quote> = levels.iter().filter_map(|l| parse_level(l)).collect();
    debug!(pair = %pair, ?side, levels = quotes.len(), "okx: book parsed");
    Ok(quotes)
}
