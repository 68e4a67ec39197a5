//! Replays the landing-page redirect dance to reach the current main bundle.
//!
//! One [`NavigationSession`] per cycle: a fresh client with its own cookie
//! jar, dropped when the cycle ends.

use std::sync::LazyLock;

use engine_logging::{engine_debug, engine_info};
use futures_util::StreamExt;
use regex::Regex;
use reqwest::{StatusCode, Url};
use scraper::{Html, Selector};

use crate::settings::RefreshSettings;
use crate::user_agent::UserAgentPool;
use crate::{CycleError, FailureKind, Stage};

static LOCATION_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:document|window)\.location(?:\.href)?\s*=\s*["']([^"']*)["']"#)
        .expect("location pattern is a valid regex")
});

/// Anything that can produce the current bundle text for one cycle.
#[async_trait::async_trait]
pub trait BundleSource: Send + Sync {
    async fn fetch_bundle(&self) -> Result<String, CycleError>;
}

/// The hidden form the redirect page auto-submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectForm {
    pub action: String,
    pub fields: Vec<(String, String)>,
}

/// Where the main bundle lives. The nonce is kept but never sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRef {
    pub url: String,
    pub nonce: Option<String>,
}

/// Real navigator against the configured origin.
#[derive(Debug, Clone)]
pub struct ReqwestNavigator {
    settings: RefreshSettings,
    user_agents: UserAgentPool,
}

impl ReqwestNavigator {
    pub fn new(settings: RefreshSettings, user_agents: UserAgentPool) -> Self {
        Self {
            settings,
            user_agents,
        }
    }

    fn choose_user_agent(&self) -> String {
        self.settings
            .user_agent
            .clone()
            .unwrap_or_else(|| self.user_agents.pick().to_string())
    }
}

#[async_trait::async_trait]
impl BundleSource for ReqwestNavigator {
    async fn fetch_bundle(&self) -> Result<String, CycleError> {
        let user_agent = self.choose_user_agent();
        engine_info!("Refreshing API details with user agent: {}", user_agent);

        let session = NavigationSession::new(&self.settings, &user_agent)?;

        engine_debug!("Requesting main page of {}", self.settings.origin);
        let redirect_url = session.discover_redirect().await?;
        engine_debug!("Redirecting to: {}", redirect_url);

        let form = session.discover_form(&redirect_url).await?;
        engine_debug!(
            "Submitting redirect form to {} with fields {:?}",
            form.action,
            form.fields.iter().map(|(name, _)| name).collect::<Vec<_>>()
        );
        session.submit_form(&form).await?;

        engine_debug!("Requesting main page with mx marker");
        let bundle = session.discover_bundle().await?;
        engine_debug!("Requesting main bundle from: {}", bundle.url);

        session.download_bundle(&bundle).await
    }
}

/// A single cycle's HTTP session; cookies accumulate across its steps.
pub struct NavigationSession {
    client: reqwest::Client,
    root: Url,
    max_bytes: u64,
}

impl NavigationSession {
    pub fn new(settings: &RefreshSettings, user_agent: &str) -> Result<Self, CycleError> {
        let root = Url::parse(&format!("{}/", settings.origin.trim_end_matches('/')))
            .map_err(|err| {
                CycleError::new(Stage::RedirectDiscovery, FailureKind::InvalidUrl, err.to_string())
            })?;

        // Redirects are never followed: the form POST's 302 must be observed.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .cookie_store(true)
            .user_agent(user_agent)
            .build()
            .map_err(|err| {
                CycleError::new(Stage::RedirectDiscovery, FailureKind::Network, err.to_string())
            })?;

        Ok(Self {
            client,
            root,
            max_bytes: settings.max_bytes,
        })
    }

    /// Step 1: the landing page's script assigns the next URL to `document.location`.
    pub async fn discover_redirect(&self) -> Result<Url, CycleError> {
        let stage = Stage::RedirectDiscovery;
        let (page_url, html) = self.get_text(self.root.clone(), stage).await?;
        let target = find_redirect_url(&html).ok_or_else(|| {
            CycleError::pattern(stage, "redirect script", "no script assigns document.location")
        })?;
        resolve(&page_url, &target, stage)
    }

    /// Step 2: the redirect page carries a form named `f`.
    pub async fn discover_form(&self, redirect_url: &Url) -> Result<RedirectForm, CycleError> {
        let stage = Stage::FormDiscovery;
        let (page_url, html) = self.get_text(redirect_url.clone(), stage).await?;
        let mut form = find_redirect_form(&html).ok_or_else(|| {
            CycleError::pattern(stage, "redirect form", "no form named \"f\" with an action")
        })?;
        form.action = resolve(&page_url, &form.action, stage)?.to_string();
        Ok(form)
    }

    /// Step 3: replay the form. Only a 302 counts as success.
    pub async fn submit_form(&self, form: &RedirectForm) -> Result<(), CycleError> {
        let stage = Stage::FormSubmission;
        let action = Url::parse(&form.action)
            .map_err(|err| CycleError::new(stage, FailureKind::InvalidUrl, err.to_string()))?;
        let response = self
            .client
            .post(action)
            .form(&form.fields)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, stage))?;

        let status = response.status();
        if status == StatusCode::FOUND {
            return Ok(());
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(CycleError::new(
                stage,
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Err(CycleError::new(
            stage,
            FailureKind::UnexpectedStatus(status.as_u16()),
            format!("expected 302 after form submission, got {status}"),
        ))
    }

    /// Step 4: the alternate rendering links the versioned main bundle.
    pub async fn discover_bundle(&self) -> Result<BundleRef, CycleError> {
        let stage = Stage::BundleDiscovery;
        let mut url = self.root.clone();
        url.set_query(Some("mx=1"));
        let (page_url, html) = self.get_text(url, stage).await?;
        let mut bundle = find_bundle_link(&html).ok_or_else(|| {
            CycleError::pattern(stage, "main bundle link", "no link to a main.*.js bundle")
        })?;
        bundle.url = resolve(&page_url, &bundle.url, stage)?.to_string();
        Ok(bundle)
    }

    /// Step 5: the bundle text itself.
    pub async fn download_bundle(&self, bundle: &BundleRef) -> Result<String, CycleError> {
        let stage = Stage::BundleDownload;
        let url = Url::parse(&bundle.url)
            .map_err(|err| CycleError::new(stage, FailureKind::InvalidUrl, err.to_string()))?;
        let (_, text) = self.get_text(url, stage).await?;
        Ok(text)
    }

    async fn get_text(&self, url: Url, stage: Stage) -> Result<(Url, String), CycleError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, stage))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CycleError::new(
                stage,
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(self.too_large(stage, Some(content_len)));
            }
        }

        let final_url = response.url().clone();
        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| map_reqwest_error(err, stage))?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(self.too_large(stage, Some(next_len)));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok((final_url, String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn too_large(&self, stage: Stage, actual: Option<u64>) -> CycleError {
        CycleError::new(
            stage,
            FailureKind::TooLarge {
                max_bytes: self.max_bytes,
                actual,
            },
            "response too large",
        )
    }
}

/// URL assigned to `document.location` by the first script that does so.
pub fn find_redirect_url(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let script_sel = Selector::parse("script").ok()?;

    doc.select(&script_sel)
        .map(|script| script.text().collect::<String>())
        .find_map(|source| {
            LOCATION_ASSIGNMENT
                .captures(&source)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
}

/// Action and `name`/`value` pairs of the form named `f`.
pub fn find_redirect_form(html: &str) -> Option<RedirectForm> {
    let doc = Html::parse_document(html);
    let form_sel = Selector::parse(r#"form[name="f"]"#).ok()?;
    let input_sel = Selector::parse("input[name]").ok()?;

    let form = doc.select(&form_sel).next()?;
    let action = form.value().attr("action")?.trim().to_string();
    let fields = form
        .select(&input_sel)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    Some(RedirectForm { action, fields })
}

/// First `<link>` whose href names a `main.*.js` bundle.
pub fn find_bundle_link(html: &str) -> Option<BundleRef> {
    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("link[href]").ok()?;

    doc.select(&link_sel).find_map(|link| {
        let href = link.value().attr("href")?;
        if !(href.contains("main.") && href.contains(".js")) {
            return None;
        }
        Some(BundleRef {
            url: href.trim().to_string(),
            nonce: link.value().attr("nonce").map(str::to_string),
        })
    })
}

fn resolve(base: &Url, reference: &str, stage: Stage) -> Result<Url, CycleError> {
    base.join(reference.trim())
        .map_err(|err| CycleError::new(stage, FailureKind::InvalidUrl, format!("{reference}: {err}")))
}

fn map_reqwest_error(err: reqwest::Error, stage: Stage) -> CycleError {
    if err.is_timeout() {
        return CycleError::new(stage, FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return CycleError::new(stage, FailureKind::InvalidUrl, err.to_string());
    }
    CycleError::new(stage, FailureKind::Network, err.to_string())
}
