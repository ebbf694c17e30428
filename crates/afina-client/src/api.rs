use afina_types::{
    ChatReply, ChatRequest, DatabaseEntry, GeneratorType, RagParameters, SelectionUpdate, UploadAck,
    UploadRejection,
};
use anyhow::{anyhow, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::intake::PendingFile;

/// Server verdict on an upload that reached the backend and came back as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Accepted(UploadAck),
    Rejected { status: u16, rejection: UploadRejection },
}

/// Thin typed wrapper over the chat/RAG backend's HTTP endpoints.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base: String,
}

fn record<T>(endpoint: &str, res: &Result<T>) {
    afina_telemetry::inc_request(endpoint, if res.is_ok() { "ok" } else { "error" });
}

impl BackendClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("afina-client/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("building reqwest client")?;
        Ok(Self { http, base: base.trim_end_matches('/').to_string() })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.base_url(), cfg.timeout())
    }

    pub fn base(&self) -> &str { &self.base }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base, path) }

    pub async fn chat(&self, req: &ChatRequest) -> Result<ChatReply> {
        let res: Result<ChatReply> = async {
            let resp = self.http.post(self.url("/chat")).json(req).send().await?;
            let status = resp.status();
            if !status.is_success() { return Err(anyhow!("chat: HTTP {}", status)); }
            let reply: ChatReply = resp.json().await.context("chat: decoding reply")?;
            Ok(reply)
        }
        .await;
        record("chat", &res);
        res
    }

    /// Multipart upload of `files` into a collection called `db_name`.
    ///
    /// `Err` means the exchange itself failed (network, or a body that was not JSON).
    pub async fn upload(&self, db_name: &str, generator: GeneratorType, files: &[PendingFile]) -> Result<UploadOutcome> {
        let res: Result<UploadOutcome> = async {
            let mut form = Form::new()
                .text("db_name", db_name.to_string())
                .text("generator_type", generator.as_str());
            for f in files {
                let mime = f.mime.as_deref().unwrap_or("application/octet-stream");
                let part = Part::bytes(f.content.clone()).file_name(f.name.clone()).mime_str(mime)?;
                form = form.part("files", part);
            }
            let resp = self.http.post(self.url("/upload")).multipart(form).send().await?;
            let status = resp.status();
            if status.is_success() {
                let ack: UploadAck = resp.json().await.context("upload: decoding reply")?;
                Ok(UploadOutcome::Accepted(ack))
            } else {
                let rejection: UploadRejection = resp.json().await.context("upload: decoding error reply")?;
                Ok(UploadOutcome::Rejected { status: status.as_u16(), rejection })
            }
        }
        .await;
        let outcome = match &res {
            Ok(UploadOutcome::Accepted(_)) => "ok",
            Ok(UploadOutcome::Rejected { .. }) => "rejected",
            Err(_) => "error",
        };
        afina_telemetry::inc_request("upload", outcome);
        res
    }

    pub async fn list_databases(&self) -> Result<Vec<DatabaseEntry>> {
        let res: Result<Vec<DatabaseEntry>> = async {
            let resp = self.http.get(self.url("/databases")).send().await?;
            let status = resp.status();
            if !status.is_success() { return Err(anyhow!("databases: HTTP {}", status)); }
            let rows: Vec<DatabaseEntry> = resp.json().await.context("databases: decoding listing")?;
            Ok(rows)
        }
        .await;
        record("databases", &res);
        res
    }

    /// The reply body is ignored; only transport and status failures are reported.
    pub async fn push_selection(&self, selected: &[i64]) -> Result<()> {
        let res: Result<()> = async {
            let body = SelectionUpdate { selected: selected.to_vec() };
            let resp = self.http.post(self.url("/selected_databases")).json(&body).send().await?;
            let status = resp.status();
            if !status.is_success() { return Err(anyhow!("selected_databases: HTTP {}", status)); }
            Ok(())
        }
        .await;
        record("selected_databases", &res);
        res
    }

    /// Server-side defaults for the generation parameters.
    pub async fn parameters(&self) -> Result<RagParameters> {
        let res: Result<RagParameters> = async {
            let resp = self.http.get(self.url("/parameters")).send().await?;
            let status = resp.status();
            if !status.is_success() { return Err(anyhow!("parameters: HTTP {}", status)); }
            let p: RagParameters = resp.json().await.context("parameters: decoding reply")?;
            Ok(p)
        }
        .await;
        record("parameters", &res);
        res
    }
}
