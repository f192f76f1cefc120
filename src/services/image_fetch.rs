//! 图片下载服务 - 业务能力层
//!
//! 下载一个候选 URL 并解码，失败时给出明确的拒绝原因

use crate::error::CandidateRejection;
use crate::services::image_codec::{self, DecodedImage};
use std::time::Duration;

/// 下载并解码图片的能力
#[allow(async_fn_in_trait)]
pub trait ImageFetcher {
    async fn fetch_and_decode(&self, url: &str) -> Result<DecodedImage, CandidateRejection>;
}

/// 基于 reqwest 的实现
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpImageFetcher {
    async fn fetch_and_decode(&self, url: &str) -> Result<DecodedImage, CandidateRejection> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CandidateRejection::NetworkError(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CandidateRejection::NetworkError(e.to_string()))?;

        image_codec::decode(&bytes).ok_or(CandidateRejection::DecodeFailed)
    }
}
