use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

use crate::models::{ExtractionResult, DEFAULT_COMPANY};

/// Boundary over the external extraction service.
///
/// URL-basic and text extraction always produce a result: their input
/// string is itself a usable fallback, so internal failures degrade to a
/// default. Advanced URL and image extraction have no such fallback and
/// propagate failure to the caller.
pub trait ExtractionGateway {
    fn extract_from_url_advanced(&self, url: &str) -> Result<ExtractionResult>;
    fn extract_from_url_basic(&self, url: &str, hint: Option<&str>) -> ExtractionResult;
    fn extract_text(&self, text: &str, hint: Option<&str>) -> ExtractionResult;
    fn extract_image(&self, base64_image: &str) -> Result<ExtractionResult>;
}

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const PRO_MODEL: &str = "gemini-3-pro-preview";
const FLASH_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "googleSearch")]
    google_search: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

impl GenerationConfig {
    fn json() -> Self {
        Self {
            response_mime_type: "application/json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug)]
pub struct GeminiClient {
    api_key: String,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new() -> Result<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .context("GEMINI_API_KEY environment variable not set. Set it with: export GEMINI_API_KEY=your-key-here")?;
        let client = reqwest::blocking::Client::new();
        Ok(Self { api_key, client })
    }

    fn generate(&self, model: &str, request: &GenerateRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/{}:generateContent", GEMINI_API_URL, model))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .context("Failed to send request to Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "Gemini API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: GenerateResponse = response
            .json()
            .context("Failed to parse Gemini API response")?;

        api_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .and_then(|p| p.text.clone())
            .ok_or_else(|| anyhow!("No content in Gemini API response"))
    }

    fn generate_result(&self, model: &str, request: &GenerateRequest) -> Result<ExtractionResult> {
        let text = self.generate(model, request)?;
        parse_extraction(&text)
    }
}

impl ExtractionGateway for GeminiClient {
    /// Network-augmented extraction; the model may fall back to search for
    /// pages it cannot read from the URL alone.
    fn extract_from_url_advanced(&self, url: &str) -> Result<ExtractionResult> {
        let prompt = format!(
            "你是一个专业的招聘数据提取助手。\n\
            任务：识别此 URL 中的职位名称 (title)、公司 (company)、地点 (location)、薪资 (salary)、描述 (description)。\n\
            URL: {}\n\
            注意：如果页面内容难以直接抓取，请使用搜索工具辅助。\n\
            必须以 JSON 格式返回。",
            url
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
            tools: Some(vec![Tool {
                google_search: serde_json::json!({}),
            }]),
            generation_config: GenerationConfig::json(),
        };
        self.generate_result(PRO_MODEL, &request)
            .context("Advanced URL extraction failed")
    }

    fn extract_from_url_basic(&self, url: &str, hint: Option<&str>) -> ExtractionResult {
        let prompt = format!(
            "分析以下招聘链接，推测其职位名称 (title) 和公司 (company)，可能时给出地点 (location)。\n\
            链接: {}\n\
            已知公司参考: {}\n\
            要求：观察 URL 路径中的关键词（如 web_developer, hr_manager 等）。\n\
            以 JSON 格式返回。",
            url,
            hint.unwrap_or("未知")
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
            tools: None,
            generation_config: GenerationConfig::json(),
        };
        match self.generate_result(FLASH_MODEL, &request) {
            Ok(extracted) => fill_basic_defaults(extracted, hint),
            Err(e) => {
                warn!("basic URL extraction degraded to defaults: {e:#}");
                basic_fallback(hint)
            }
        }
    }

    fn extract_text(&self, text: &str, hint: Option<&str>) -> ExtractionResult {
        let prompt = format!(
            "从以下文本中提取招聘信息：职位名称 (title)、公司 (company)、地点 (location)、薪资 (salary)。\n\
            公司名称参考: {}\n\n文本内容: {}",
            hint.unwrap_or(""),
            text
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
            tools: None,
            generation_config: GenerationConfig::json(),
        };
        match self.generate_result(FLASH_MODEL, &request) {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!("text extraction degraded to defaults: {e:#}");
                text_fallback(text, hint)
            }
        }
    }

    /// OCR over a screenshot. There is no cheap fallback for an image, so
    /// failure is surfaced to the caller.
    fn extract_image(&self, base64_image: &str) -> Result<ExtractionResult> {
        // Accept full data URLs and keep only the payload.
        let data = match base64_image.split_once(',') {
            Some((_, payload)) => payload,
            None => base64_image,
        };
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: "image/png".to_string(),
                            data: data.to_string(),
                        }),
                    },
                    Part::text(
                        "这是一个招聘页面的截图，请识别并提取：职位名称 (title)、公司名称 (company)、\
                         工作地点 (location)、薪资范围 (salary)。请以 JSON 格式返回。"
                            .to_string(),
                    ),
                ],
            }],
            tools: None,
            generation_config: GenerationConfig::json(),
        };
        self.generate_result(FLASH_MODEL, &request)
            .context("Image extraction failed")
    }
}

/// Parse the model's JSON reply, tolerating a markdown code fence around it.
fn parse_extraction(text: &str) -> Result<ExtractionResult> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);
    serde_json::from_str(trimmed.trim()).context("Extraction reply was not valid JSON")
}

/// Basic URL inference never fails outward, so its successful-but-sparse
/// replies also get concrete placeholders.
fn fill_basic_defaults(extracted: ExtractionResult, hint: Option<&str>) -> ExtractionResult {
    ExtractionResult {
        title: Some(extracted.title.unwrap_or_else(|| "待补充职位".to_string())),
        company: Some(
            extracted
                .company
                .or_else(|| hint.map(str::to_string))
                .unwrap_or_else(|| DEFAULT_COMPANY.to_string()),
        ),
        location: Some(extracted.location.unwrap_or_default()),
        salary: extracted.salary,
        description: extracted.description,
        requirements: extracted.requirements,
    }
}

fn basic_fallback(hint: Option<&str>) -> ExtractionResult {
    ExtractionResult {
        title: Some("手动填写的职位".to_string()),
        company: Some(
            hint.map(str::to_string)
                .unwrap_or_else(|| DEFAULT_COMPANY.to_string()),
        ),
        ..Default::default()
    }
}

/// Degraded text result: a short prefix of the input stands in as a title.
fn text_fallback(text: &str, hint: Option<&str>) -> ExtractionResult {
    let title: String = text.chars().take(20).collect();
    ExtractionResult {
        title: Some(title),
        company: Some(hint.map(str::to_string).unwrap_or_else(|| "未知".to_string())),
        ..Default::default()
    }
}
