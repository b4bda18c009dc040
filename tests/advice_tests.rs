// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use smartfinance::advice::{
    AdviceError, AdviceRequester, CompletionClient, FALLBACK_DISABLED, FALLBACK_EMPTY,
    FALLBACK_ERROR, FinancialSummary, SamplingConfig, build_prompt, request_body, response_text,
};
use smartfinance::config::AdviceConfig;
use smartfinance::dashboard::CategoryTotal;
use smartfinance::fixtures;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

struct Canned {
    reply: Result<String, String>,
    prompts: Arc<Mutex<Vec<(String, SamplingConfig)>>>,
}

impl Canned {
    fn ok(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Arc::default(),
        }
    }
}

impl CompletionClient for Canned {
    fn complete(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String, AdviceError> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), *sampling));
        self.reply.clone().map_err(AdviceError::Client)
    }
}

/// Blocks inside `complete` until released.
struct Gate {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl CompletionClient for Gate {
    fn complete(&self, _prompt: &str, _sampling: &SamplingConfig) -> Result<String, AdviceError> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        Ok("slow advice".into())
    }
}

fn sample_summary() -> FinancialSummary {
    FinancialSummary {
        total_balance: Decimal::from(120000),
        total_income: Decimal::from(55000),
        total_expense: Decimal::from(1395),
        by_category: vec![
            CategoryTotal {
                label: "餐飲飲食".into(),
                total: Decimal::from(150),
            },
            CategoryTotal {
                label: "交通出行".into(),
                total: Decimal::from(45),
            },
            CategoryTotal {
                label: "日常購物".into(),
                total: Decimal::from(1200),
            },
        ],
    }
}

#[test]
fn disabled_requester_returns_fixed_notice() {
    let advisor = AdviceRequester::new(None);
    assert!(!advisor.is_enabled());
    assert_eq!(advisor.advise_summary(&sample_summary()), FALLBACK_DISABLED);
    let text = advisor.advise(
        &fixtures::demo_accounts(),
        &fixtures::demo_transactions(),
        fixtures::categories(),
    );
    assert_eq!(text, FALLBACK_DISABLED);
}

#[test]
fn model_text_is_returned_verbatim() {
    let advisor = AdviceRequester::new(Some(Box::new(Canned::ok("多存一點錢。"))));
    assert_eq!(advisor.advise_summary(&sample_summary()), "多存一點錢。");
}

#[test]
fn empty_and_failed_replies_fall_back() {
    let empty = AdviceRequester::new(Some(Box::new(Canned::ok("   "))));
    assert_eq!(empty.advise_summary(&sample_summary()), FALLBACK_EMPTY);

    let failing = AdviceRequester::new(Some(Box::new(Canned {
        reply: Err("quota exceeded".into()),
        prompts: Arc::default(),
    })));
    assert_eq!(failing.advise_summary(&sample_summary()), FALLBACK_ERROR);
    assert!(!failing.is_loading());
}

#[test]
fn prompt_carries_the_figures_and_sampling() {
    let client = Canned::ok("ok");
    let prompts = Arc::clone(&client.prompts);
    let advisor = AdviceRequester::new(Some(Box::new(client)));
    advisor.advise_summary(&sample_summary());

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    let (prompt, sampling) = &prompts[0];
    assert!(prompt.contains("$120000 TWD"));
    assert!(prompt.contains("$55000 TWD"));
    assert!(prompt.contains("$1395 TWD"));
    assert!(prompt.contains(r#"支出明細：{"餐飲飲食":150,"交通出行":45,"日常購物":1200}"#));
    assert!(prompt.contains("250 字"));
    assert_eq!(sampling.temperature, 0.75);
    assert_eq!(sampling.top_p, 0.9);
}

#[test]
fn summary_uses_all_time_totals() {
    let summary = FinancialSummary::from_collections(
        &fixtures::demo_accounts(),
        &fixtures::demo_transactions(),
        fixtures::categories(),
    );
    assert_eq!(summary.total_balance, Decimal::from(180400));
    assert_eq!(summary.total_income, Decimal::from(55000));
    assert_eq!(summary.total_expense, Decimal::from(1395));
    assert_eq!(summary.by_category.len(), 3);
    assert!(build_prompt(&summary).contains("$180400 TWD"));
}

#[test]
fn fractional_amounts_stay_numeric_in_breakdown() {
    let summary = FinancialSummary {
        total_balance: Decimal::ZERO,
        total_income: Decimal::ZERO,
        total_expense: Decimal::new(1250, 2),
        by_category: vec![CategoryTotal {
            label: "其他".into(),
            total: Decimal::new(1250, 2),
        }],
    };
    assert_eq!(summary.breakdown_json(), r#"{"其他":12.5}"#);
}

#[test]
fn second_request_is_refused_while_one_is_in_flight() {
    let (entered_tx, entered_rx) = channel();
    let (release_tx, release_rx) = channel();
    let advisor = AdviceRequester::new(Some(Box::new(Gate {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    })));
    let accounts = fixtures::demo_accounts();
    let txs = fixtures::demo_transactions();

    std::thread::scope(|s| {
        let first = s.spawn(|| advisor.try_advise(&accounts, &txs, fixtures::categories()));
        entered_rx.recv().unwrap();
        assert!(advisor.is_loading());
        assert_eq!(
            advisor.try_advise(&accounts, &txs, fixtures::categories()),
            None
        );
        release_tx.send(()).unwrap();
        assert_eq!(first.join().unwrap().as_deref(), Some("slow advice"));
    });

    assert!(!advisor.is_loading());
    release_tx.send(()).unwrap();
    assert_eq!(
        advisor.try_advise(&accounts, &txs, fixtures::categories()),
        Some("slow advice".to_string())
    );
}

#[test]
fn sampling_defaults() {
    let s = SamplingConfig::default();
    assert_eq!(s, AdviceRequester::new(None).sampling());
    assert_eq!(
        serde_json::to_string(&s).unwrap(),
        r#"{"temperature":0.75,"topP":0.9}"#
    );
}

struct Captured {
    request_line: String,
    api_key: String,
    body: serde_json::Value,
}

/// Answers a single HTTP request with `status` and `reply`, returning the
/// endpoint base URL and a handle yielding what the client sent.
fn serve_once(status: &'static str, reply: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut len = 0usize;
        let mut api_key = String::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                match name.trim().to_ascii_lowercase().as_str() {
                    "content-length" => len = value.trim().parse().unwrap(),
                    "x-goog-api-key" => api_key = value.trim().to_string(),
                    _ => {}
                }
            }
        }
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body).unwrap();
        write!(
            stream,
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reply.len(),
            reply
        )
        .unwrap();
        stream.flush().unwrap();
        Captured {
            request_line: request_line.trim_end().to_string(),
            api_key,
            body: serde_json::from_slice(&body).unwrap(),
        }
    });
    (format!("http://{}/v1beta", addr), handle)
}

fn hosted(endpoint: String) -> AdviceRequester {
    AdviceRequester::from_config(Some(&AdviceConfig {
        api_key: "test-key".into(),
        model: "gemini-test".into(),
        endpoint,
    }))
}

#[test]
fn request_body_carries_prompt_and_generation_config() {
    let body = request_body("hello", &SamplingConfig::default()).unwrap();
    assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
    assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    let config = &body["generationConfig"];
    assert_eq!(config["temperature"].as_f64().unwrap() as f32, 0.75);
    assert_eq!(config["topP"].as_f64().unwrap() as f32, 0.9);
}

#[test]
fn response_text_joins_parts_of_first_candidate() {
    let raw = r#"{"candidates":[
        {"content":{"parts":[{"text":"先存錢，"},{"text":"再投資。"}]}},
        {"content":{"parts":[{"text":"ignored"}]}}
    ]}"#;
    assert_eq!(response_text(raw).unwrap(), "先存錢，再投資。");
}

#[test]
fn replies_without_text_read_as_empty() {
    for raw in [
        "{}",
        r#"{"candidates":[]}"#,
        r#"{"candidates":[{}]}"#,
        r#"{"candidates":[{"content":{"parts":[]}}]}"#,
    ] {
        assert_eq!(response_text(raw).unwrap(), "", "reply {}", raw);
    }
    assert!(matches!(
        response_text("<html>busy</html>"),
        Err(AdviceError::Decode(_))
    ));
}

#[test]
fn hosted_client_posts_to_generate_content() {
    let (endpoint, server) = serve_once(
        "200 OK",
        r#"{"candidates":[{"content":{"parts":[{"text":"保持緊急預備金。"}]}}]}"#,
    );
    let advisor = hosted(endpoint);
    assert!(advisor.is_enabled());
    assert_eq!(advisor.advise_summary(&sample_summary()), "保持緊急預備金。");

    let seen = server.join().unwrap();
    assert_eq!(
        seen.request_line,
        "POST /v1beta/models/gemini-test:generateContent HTTP/1.1"
    );
    assert_eq!(seen.api_key, "test-key");
    let prompt = seen.body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("$120000 TWD"));
    assert!(seen.body["generationConfig"]["topP"].is_number());
}

#[test]
fn hosted_empty_reply_falls_back() {
    let (endpoint, server) = serve_once("200 OK", r#"{"candidates":[]}"#);
    assert_eq!(hosted(endpoint).advise_summary(&sample_summary()), FALLBACK_EMPTY);
    server.join().unwrap();
}

#[test]
fn hosted_error_status_falls_back() {
    let (endpoint, server) = serve_once(
        "429 Too Many Requests",
        r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#,
    );
    assert_eq!(hosted(endpoint).advise_summary(&sample_summary()), FALLBACK_ERROR);
    server.join().unwrap();
}
