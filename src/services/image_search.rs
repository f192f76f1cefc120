//! 图片搜索服务 - 业务能力层
//!
//! 只负责"给一个搜索词，返回候选图片 URL"，不下载、不判断质量

use crate::error::SearchError;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

const SEARCH_PAGE_URL: &str = "https://duckduckgo.com/";
const IMAGE_API_URL: &str = "https://duckduckgo.com/i.js";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

static VQD_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"vqd=["']?([0-9][0-9a-zA-Z_-]*)"#).expect("vqd pattern is valid")
});

/// 图片搜索能力
#[allow(async_fn_in_trait)]
pub trait ImageSearch {
    /// 按相关性返回最多 `max_results` 个候选 URL
    async fn search_images(&self, query: &str, max_results: usize)
        -> Result<Vec<String>, SearchError>;
}

/// DuckDuckGo 图片搜索
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ImageApiResponse {
    #[serde(default)]
    results: Vec<ImageApiResult>,
}

#[derive(Debug, Deserialize)]
struct ImageApiResult {
    image: Option<String>,
}

impl DuckDuckGoSearch {
    pub fn new(timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// 搜索页面里嵌着本次搜索需要的 vqd 令牌
    async fn fetch_token(&self, query: &str) -> Result<String, SearchError> {
        let page = self
            .client
            .get(SEARCH_PAGE_URL)
            .query(&[("q", query), ("iax", "images"), ("ia", "images")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        extract_vqd(&page).ok_or(SearchError::MissingToken)
    }
}

impl ImageSearch for DuckDuckGoSearch {
    async fn search_images(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>, SearchError> {
        let vqd = self.fetch_token(query).await?;
        debug!("图片搜索 '{}' vqd={}", query, vqd);

        let body = self
            .client
            .get(IMAGE_API_URL)
            .header(reqwest::header::REFERER, SEARCH_PAGE_URL)
            .query(&[
                ("l", "wt-wt"),
                ("o", "json"),
                ("q", query),
                ("vqd", vqd.as_str()),
                ("f", ",,,,,"),
                ("p", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let urls = parse_image_results(&body, max_results)?;
        debug!("图片搜索 '{}' 返回 {} 个候选", query, urls.len());
        Ok(urls)
    }
}

fn extract_vqd(page: &str) -> Option<String> {
    VQD_TOKEN
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn parse_image_results(body: &str, max_results: usize) -> Result<Vec<String>, SearchError> {
    let response: ImageApiResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::UnexpectedPayload(e.to_string()))?;

    Ok(response
        .results
        .into_iter()
        .filter_map(|r| r.image)
        .filter(|url| !url.is_empty())
        .take(max_results)
        .collect())
}
