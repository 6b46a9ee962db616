use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError},
    time::Duration,
};

use ::reqwest::cookie::Jar;
use ::reqwest::header::{self, HeaderMap, HeaderValue};
use ::tokio::sync::Mutex;
use ::tokio::time::{Interval, MissedTickBehavior};
use serde::Serialize;

pub use ::reqwest::{multipart, redirect};
pub use ::reqwest::{Error, IntoUrl, Request, Response};
pub type UrlGlob = ::glob::Pattern;

type Lane = Arc<Mutex<Interval>>;

/// Minimum spacing between requests to the same URL, for every URL matching `scope`.
/// Each distinct URL gets its own ticker, so polling one program never delays another.
struct Throttle {
    scope: UrlGlob,
    period: Duration,
    lanes: StdMutex<HashMap<String, Lane>>,
}

impl Throttle {
    fn lane(&self, url: &str) -> Lane {
        let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
        lanes
            .entry(url.to_owned())
            .or_insert_with(|| {
                let mut interval = ::tokio::time::interval(self.period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                Arc::new(Mutex::new(interval))
            })
            .clone()
    }
}

#[derive(Clone)]
pub struct Client {
    inner: ::reqwest::Client,
    throttles: Arc<Vec<Throttle>>,
    pub cookie_jar: Arc<Jar>,
}

pub struct RequestBuilder {
    inner: ::reqwest::RequestBuilder,
    client: Client,
    disable_sleep: bool,
}

macro_rules! emit_request_fn {
    ($method:ident) => {
        pub fn $method(&self, u: impl IntoUrl) -> RequestBuilder {
            RequestBuilder::new(self.inner.$method(u), self.clone())
        }
    };
}

impl Client {
    /// A zero period disables throttling for its glob.
    pub fn new(
        redirection: self::redirect::Policy,
        timeout: Option<Duration>,
        url_wise_req_interval: impl IntoIterator<Item = (UrlGlob, Duration)>,
    ) -> Result<Self, Error> {
        let cookie_jar = Arc::new(Jar::default());
        let throttles = url_wise_req_interval
            .into_iter()
            .filter(|(_, period)| !period.is_zero())
            .map(|(scope, period)| Throttle {
                scope,
                period,
                lanes: StdMutex::new(HashMap::new()),
            })
            .collect();

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .cookie_provider(cookie_jar.clone())
            .default_headers(headers)
            .redirect(redirection)
            .gzip(true);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }

        Ok(Self {
            inner: builder.build()?,
            throttles: Arc::new(throttles),
            cookie_jar,
        })
    }

    emit_request_fn!(get);
    emit_request_fn!(post);

    async fn execute_request(&self, req: Request, disable_sleep: bool) -> Result<Response, Error> {
        let url_str = req.url().as_str();
        if let Some(throttle) = self.throttles.iter().find(|t| t.scope.matches(url_str)) {
            let lane = throttle.lane(url_str);
            let mut interval = lane.lock().await;
            if disable_sleep {
                interval.reset();
            } else {
                interval.tick().await;
            }
        }

        log::trace!("{} {}", req.method(), req.url());
        self.inner.execute(req).await
    }
}

impl RequestBuilder {
    fn new(b: ::reqwest::RequestBuilder, client: Client) -> Self {
        Self {
            inner: b,
            client,
            disable_sleep: false,
        }
    }

    pub async fn send(self) -> Result<Response, Error> {
        let req = self.inner.build()?;
        self.client.execute_request(req, self.disable_sleep).await
    }

    /// Skip the per-URL request interval. Cancel requests must not wait behind polls.
    pub fn disable_sleep(mut self) -> Self {
        self.disable_sleep = true;
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, json: &T) -> Self {
        self.inner = self.inner.json(json);
        self
    }

    pub fn multipart(mut self, form: multipart::Form) -> Self {
        self.inner = self.inner.multipart(form);
        self
    }
}
