use ::async_trait::async_trait;
use ::std::time::Duration;

use super::urls::GradingUrls;
use crate::{
    error::*,
    http::{self, multipart},
    model::*,
    util,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub base_url: String,
    /// Minimum spacing between two requests to the same endpoint. Zero disables it.
    pub request_interval: Duration,
    pub timeout: Option<Duration>,
    /// Raw `name=value` cookie of an already established session.
    pub session_cookie: Option<String>,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_interval: Duration::from_millis(200),
            timeout: None,
            session_cookie: None,
        }
    }
}

pub struct HttpGradingClient {
    http: http::Client,
    urls: GradingUrls,
}

impl HttpGradingClient {
    pub fn new(opts: ClientOptions) -> Result<Self> {
        let urls = GradingUrls::parse(&opts.base_url)?;

        let glob_src = format!("{}*", urls.base());
        let glob = http::UrlGlob::new(&glob_src).map_err(|e| Error::InvalidUrlGlob(glob_src, e))?;

        let http = http::Client::new(
            http::redirect::Policy::limited(5),
            opts.timeout,
            [(glob, opts.request_interval)],
        )?;

        if let Some(cookie) = &opts.session_cookie {
            http.cookie_jar.add_cookie_str(cookie, urls.base());
        }

        Ok(Self { http, urls })
    }

    pub fn urls(&self) -> &GradingUrls {
        &self.urls
    }

    fn upload_form(snapshot: &AssignmentDirectorySnapshot) -> multipart::Form {
        snapshot
            .files_recursive()
            .into_iter()
            .fold(multipart::Form::new(), |form, f| {
                let part = multipart::Part::bytes(f.content.clone())
                    .file_name(f.relative_path_slash());
                form.part("files[]", part)
            })
    }
}

#[async_trait]
impl GradingService for HttpGradingClient {
    async fn submit_specification(&self, spec: &serde_json::Value) -> Result<TaskId> {
        let url = self.urls.task()?;
        let resp = self.http.post(url.clone()).json(spec).send().await?;
        let envelope: DataEnvelope<TaskId> = util::read_json(resp, &url).await?;
        log::debug!("Submitted specification: task={}", envelope.data);
        Ok(envelope.data)
    }

    async fn register_program(
        &self,
        existing: Option<ProgramId>,
        task: TaskId,
        display_name: &str,
    ) -> Result<ProgramId> {
        let url = self.urls.program(existing)?;
        let body = RegisterProgramRequest {
            task,
            name: display_name,
        };
        let resp = self.http.post(url.clone()).json(&body).send().await?;
        let envelope: DataEnvelope<ProgramId> = util::read_json(resp, &url).await?;
        log::debug!(
            "Registered program {} for task {} (hint={:?})",
            envelope.data,
            task,
            existing
        );
        Ok(envelope.data)
    }

    async fn upload_snapshot(
        &self,
        program: ProgramId,
        snapshot: &AssignmentDirectorySnapshot,
    ) -> Result<()> {
        let url = self.urls.files(program)?;
        let form = Self::upload_form(snapshot);
        let resp = self.http.post(url.clone()).multipart(form).send().await?;
        util::ensure_success(resp, &url)?;
        log::debug!(
            "Uploaded {} file(s) ({} bytes) for program {}",
            snapshot.file_count(),
            snapshot.total_bytes(),
            program
        );
        Ok(())
    }

    async fn fetch_status(&self, program: ProgramId) -> Result<StatusReport> {
        let url = self.urls.status(program)?;
        let resp = self.http.get(url.clone()).send().await?;
        let raw: serde_json::Value = util::read_json(resp, &url).await?;
        Ok(StatusReport::from_value(raw)?)
    }

    async fn cancel_program(&self, program: ProgramId) -> Result<()> {
        let url = self.urls.cancel(program)?;
        let resp = self.http.post(url.clone()).disable_sleep().send().await?;
        util::ensure_success(resp, &url)?;
        Ok(())
    }
}
