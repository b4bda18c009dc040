// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! AI financial advice: summarise the collections, prompt a hosted model,
//! and always hand back displayable text.

use crate::config::AdviceConfig;
use crate::dashboard::{CategoryTotal, category_breakdown, total_balance};
use crate::models::{Account, Category, Transaction, TransactionType};
use crate::utils::http_client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const FALLBACK_DISABLED: &str =
    "AI 模式未啟動 (請設定 API_KEY 環境變數)。目前僅提供基礎數據展示。";
pub const FALLBACK_EMPTY: &str = "AI 分析目前無法生成，請檢查輸入數據。";
pub const FALLBACK_ERROR: &str =
    "AI 服務暫時發生錯誤，請稍後再試。這可能是由於 API KEY 無效或配額限制。";

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("completion client error: {0}")]
    Client(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.75,
            top_p: 0.9,
        }
    }
}

/// A hosted text-completion endpoint.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String, AdviceError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub total_balance: Decimal,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub by_category: Vec<CategoryTotal>,
}

impl FinancialSummary {
    /// Totals over every transaction, not just the current month.
    pub fn from_collections(
        accounts: &[Account],
        transactions: &[Transaction],
        categories: &[Category],
    ) -> Self {
        let sum_of = |kind: TransactionType| -> Decimal {
            transactions
                .iter()
                .filter(|t| t.r#type == kind)
                .map(|t| t.amount)
                .sum()
        };
        Self {
            total_balance: total_balance(accounts),
            total_income: sum_of(TransactionType::Income),
            total_expense: sum_of(TransactionType::Expense),
            by_category: category_breakdown(transactions, categories),
        }
    }

    /// The category breakdown as a JSON object in first-seen order, e.g. `{"交通出行":45}`.
    pub fn breakdown_json(&self) -> String {
        let mut map = Map::new();
        for entry in &self.by_category {
            let text = entry.total.normalize().to_string();
            let value = text
                .parse::<Number>()
                .map(Value::Number)
                .unwrap_or(Value::String(text));
            map.insert(entry.label.clone(), value);
        }
        Value::Object(map).to_string()
    }
}

pub fn build_prompt(summary: &FinancialSummary) -> String {
    format!(
        "您是一位專業的財務顧問。請分析以下使用者的財務狀況並提供建議：

帳戶總餘額：${balance} TWD
本期總收入：${income} TWD
本期總支出：${expense} TWD
支出明細：{breakdown}

請以繁體中文提供大約 250 字的專業建議，包含：
1. 財務現狀簡要評論
2. 具體的開支優化或節流建議
3. 基於現有資產的未來理財規劃方向

請確保語氣親切且具有專業見解。",
        balance = summary.total_balance.normalize(),
        income = summary.total_income.normalize(),
        expense = summary.total_expense.normalize(),
        breakdown = summary.breakdown_json(),
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: SamplingConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// `generateContent` request body for a single-turn prompt.
pub fn request_body(prompt: &str, sampling: &SamplingConfig) -> Result<Value, AdviceError> {
    let body = GenerateRequest {
        contents: vec![Content {
            parts: vec![Part { text: prompt }],
        }],
        generation_config: *sampling,
    };
    Ok(serde_json::to_value(body)?)
}

/// Concatenated text of the first candidate; empty when the reply has none.
pub fn response_text(raw: &str) -> Result<String, AdviceError> {
    let parsed: GenerateResponse = serde_json::from_str(raw)?;
    Ok(parsed.text())
}

impl GenerateResponse {
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// `generateContent` client for the Gemini REST API.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(cfg: &AdviceConfig) -> Result<Self, AdviceError> {
        Ok(Self {
            // the request runs to completion or failure
            http: http_client(None)?,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl CompletionClient for GeminiClient {
    fn complete(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String, AdviceError> {
        let body = request_body(prompt, sampling)?;
        debug!(model = %self.model, "requesting completion");
        let raw = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?
            .error_for_status()?
            .text()?;
        response_text(&raw)
    }
}

/// Issues advice requests; at most one is in flight through [`try_advise`].
///
/// [`try_advise`]: AdviceRequester::try_advise
pub struct AdviceRequester {
    client: Option<Box<dyn CompletionClient>>,
    sampling: SamplingConfig,
    loading: AtomicBool,
}

struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AdviceRequester {
    pub fn new(client: Option<Box<dyn CompletionClient>>) -> Self {
        Self {
            client,
            sampling: SamplingConfig::default(),
            loading: AtomicBool::new(false),
        }
    }

    pub fn from_config(cfg: Option<&AdviceConfig>) -> Self {
        let client = cfg.and_then(|cfg| match GeminiClient::new(cfg) {
            Ok(c) => Some(Box::new(c) as Box<dyn CompletionClient>),
            Err(err) => {
                warn!(error = %err, "could not build the completion client, advice disabled");
                None
            }
        });
        Self::new(client)
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn sampling(&self) -> SamplingConfig {
        self.sampling
    }

    pub fn advise(
        &self,
        accounts: &[Account],
        transactions: &[Transaction],
        categories: &[Category],
    ) -> String {
        let summary = FinancialSummary::from_collections(accounts, transactions, categories);
        self.advise_summary(&summary)
    }

    /// Never fails: every error path ends in one of the fallback strings.
    pub fn advise_summary(&self, summary: &FinancialSummary) -> String {
        let Some(client) = &self.client else {
            return FALLBACK_DISABLED.to_string();
        };
        let prompt = build_prompt(summary);
        match client.complete(&prompt, &self.sampling) {
            Ok(text) if text.trim().is_empty() => {
                warn!("model returned an empty response");
                FALLBACK_EMPTY.to_string()
            }
            Ok(text) => {
                info!(chars = text.chars().count(), "advice received");
                text
            }
            Err(err) => {
                error!(error = %err, "advice request failed");
                FALLBACK_ERROR.to_string()
            }
        }
    }

    /// Like [`advise`](Self::advise) but returns `None` while another request
    /// is still outstanding.
    pub fn try_advise(
        &self,
        accounts: &[Account],
        transactions: &[Transaction],
        categories: &[Category],
    ) -> Option<String> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("advice request already in flight");
            return None;
        }
        let _guard = LoadingGuard(&self.loading);
        Some(self.advise(accounts, transactions, categories))
    }
}
