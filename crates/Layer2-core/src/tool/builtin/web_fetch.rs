//! WebFetch Tool - URL 콘텐츠 가져오기
//!
//! HTTP GET으로 콘텐츠를 가져옵니다.
//! - 타임아웃 / 리다이렉트 횟수 제한 (FetchSettings)
//! - 바이트 상한 (청크 스트리밍, 상한 도달 시 수신 중단)
//! - 간단한 HTML → 텍스트 변환 (태그 제거)
//! - 취소 토큰 확인

use async_trait::async_trait;
use anvil_foundation::{
    CancellationToken, DeclarativeTool, Error, FetchSettings, Result, ToolEnv, ToolInvocation,
    ToolMeta, ToolOutput,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

/// WebFetch 도구 입력
#[derive(Debug, Deserialize)]
pub struct WebFetchInput {
    /// 가져올 URL (http/https만 허용)
    pub url: String,
}

/// WebFetch 도구
pub struct WebFetchTool;

impl WebFetchTool {
    pub fn new() -> Self {
        Self
    }

    pub const NAME: &'static str = "web_fetch";
}

impl Default for WebFetchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarativeTool for WebFetchTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Web Fetch")
            .description("Fetch the contents of a URL as plain text")
            .category("network")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The http or https URL to fetch"
                }
            },
            "required": ["url"]
        })
    }

    fn build(&self, params: Value, env: &ToolEnv) -> Result<Box<dyn ToolInvocation>> {
        let parsed: WebFetchInput = serde_json::from_value(params)
            .map_err(|e| Error::InvalidInput(format!("Invalid web_fetch input: {}", e)))?;

        let url = Url::parse(&parsed.url)
            .map_err(|e| Error::InvalidInput(format!("Invalid URL '{}': {}", parsed.url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidInput(format!(
                "unsupported URL scheme '{}'",
                url.scheme()
            )));
        }

        Ok(Box::new(WebFetchInvocation {
            url,
            settings: env.fetch.clone(),
        }))
    }
}

/// WebFetch 호출
struct WebFetchInvocation {
    url: Url,
    settings: FetchSettings,
}

/// 간단한 HTML → 텍스트 변환
///
/// script/style 블록을 버리고 나머지 태그를 제거합니다.
/// 완전한 파서가 아니라 모델 입력용 축약입니다.
fn html_to_text(html: &str) -> String {
    // script/style 블록 제거
    let cleaned = strip_blocks(html, "<script", "</script>");
    let cleaned = strip_blocks(&cleaned, "<style", "</style>");

    // 태그 제거
    let mut text = String::with_capacity(cleaned.len() / 2);
    let mut in_tag = false;
    for c in cleaned.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    // 공백 정리
    let mut result = String::with_capacity(text.len());
    let mut last_blank = false;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !last_blank && !result.is_empty() {
                result.push('\n');
            }
            last_blank = true;
        } else {
            result.push_str(trimmed);
            result.push('\n');
            last_blank = false;
        }
    }
    result
}

/// 청크를 상한까지만 버퍼에 추가
///
/// 상한에 걸려 잘렸으면 true를 반환합니다. 호출자는 수신을 중단해야
/// 합니다 (전체 본문을 메모리에 올리지 않음).
fn append_capped(buffer: &mut Vec<u8>, chunk: &[u8], max_bytes: usize) -> bool {
    let capacity = max_bytes.saturating_sub(buffer.len());
    if chunk.len() > capacity {
        buffer.extend_from_slice(&chunk[..capacity]);
        return true;
    }
    buffer.extend_from_slice(chunk);
    false
}

/// 여는 태그부터 닫는 태그까지의 블록을 모두 제거 (대소문자 무시)
fn strip_blocks(html: &str, open_tag: &str, close_tag: &str) -> String {
    let lower = html.to_lowercase();
    let mut result = String::with_capacity(html.len());
    let mut pos = 0;

    while let Some(start) = lower[pos..].find(open_tag).map(|i| i + pos) {
        result.push_str(&html[pos..start]);
        match lower[start..].find(close_tag) {
            Some(end) => pos = start + end + close_tag.len(),
            None => return result, // 닫는 태그가 없으면 나머지는 버림
        }
    }
    result.push_str(&html[pos..]);
    result
}

#[async_trait]
impl ToolInvocation for WebFetchInvocation {
    fn description(&self) -> String {
        format!("Fetch {}", self.url)
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<ToolOutput> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(
                self.settings.max_redirects,
            ))
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {}", e)))?;

        let mut response = tokio::select! {
            result = client.get(self.url.clone()).send() => {
                result.map_err(|e| Error::Http(format!("fetch failed: {}", e)))?
            }
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!(
                "fetch of {} returned status {}",
                self.url, status
            )));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);

        // 본문은 청크 단위로 수신, 상한 도달 시 즉시 중단
        let mut buffer: Vec<u8> = Vec::new();
        let mut truncated = false;
        loop {
            let chunk = tokio::select! {
                result = response.chunk() => {
                    result.map_err(|e| Error::Http(format!("failed to read body: {}", e)))?
                }
                _ = cancel.cancelled() => return Err(Error::Cancelled),
            };
            match chunk {
                Some(chunk) => {
                    if append_capped(&mut buffer, &chunk, self.settings.max_content_bytes) {
                        truncated = true;
                        break;
                    }
                }
                None => break,
            }
        }

        let body = String::from_utf8_lossy(&buffer);
        let mut content = if is_html {
            html_to_text(&body)
        } else {
            body.into_owned()
        };
        if truncated {
            content.push_str("\n... [content truncated]");
        }

        Ok(ToolOutput::new(
            content,
            format!(
                "Fetched {} ({} bytes{})",
                self.url,
                buffer.len(),
                if truncated { ", truncated" } else { "" }
            ),
        ))
    }
}

// ============================================================================
// 테스트
// ============================================================================
