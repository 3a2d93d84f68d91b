use chrono::{Duration as ChronoDuration, Utc};
use colored::*;
use governor::{Quota, RateLimiter};
use hdrhistogram::Histogram;
use reqwest::{header, Client, Response};
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

const DURATION_SECS: u64 = 20;
const BAND_SIZE: usize = 6;
const PASSWORD: &str = "Bench#Pass1";

struct Target {
    name: &'static str,
    method: &'static str,
    url: String,
    body: Option<Value>,
}

/// Cookie header and CSRF token of a logged-in user. Auth cookies are
/// `Secure`, so they are replayed by hand against plain-http targets.
#[derive(Clone)]
struct Session {
    email: String,
    cookie: String,
    csrf: String,
}

fn base_url() -> String {
    std::env::var("BENCH_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

#[tokio::main]
async fn main() {
    let base = base_url();
    println!("{}", "Starting Benchmark Suite".bold().green());
    println!("Target URL: {}", base);

    let client = Client::builder()
        .pool_max_idle_per_host(1000)
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to build HTTP client");

    if client.get(format!("{}/health", base)).send().await.is_err() {
        eprintln!("{}", format!("Server is NOT reachable at {}. Please start it first.", base).red().bold());
        return;
    }

    println!("\n{}", "Setting up benchmark data...".yellow());
    let (owner, band_id) = setup_band(&client, &base).await;

    println!("{}", "Data created successfully.".green());
    println!("   Band ID: {}", band_id);

    let start = Utc::now().date_naive() + ChronoDuration::days(1);
    let end = start + ChronoDuration::days(14);

    let targets = vec![
        Target {
            name: "Health Check (Public)",
            method: "GET",
            url: format!("{}/health", base),
            body: None,
        },
        Target {
            name: "Band Details (Authenticated Read)",
            method: "GET",
            url: format!("{}/api/v1/bands/{}", base, band_id),
            body: None,
        },
        Target {
            name: "Optimal Times (Resolver)",
            method: "GET",
            url: format!(
                "{}/api/v1/availability/optimal-times/{}?start_date={}&end_date={}&duration_minutes=120&preferred_days=1,3,5",
                base, band_id, start, end
            ),
            body: None,
        },
        Target {
            name: "Login Flow (Crypto Intensive)",
            method: "POST",
            url: format!("{}/api/v1/auth/login", base),
            body: Some(json!({ "email": owner.email, "password": PASSWORD })),
        },
    ];

    let rps_stages = vec![10, 50, 200, 1000];

    for target in targets {
        println!("\n{}", "=".repeat(60));
        println!("Benchmarking Endpoint: {}", target.name.cyan().bold());
        println!("URL: {}", target.url);
        println!("{}", "=".repeat(60));

        println!("{:<10} | {:<15} | {:<15} | {:<15}", "RPS", "Mean (ms)", "P99 (ms)", "Success Rate");
        println!("{:-<10}-+-{:-<15}-+-{:-<15}-+-{:-<15}", "", "", "", "");

        for &rps in &rps_stages {
            run_stage(&client, &target, &owner, rps).await;
        }
    }
}

fn cookie_header(res: &Response) -> String {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

async fn register(client: &Client, base: &str, email: &str) -> Session {
    let res = client.post(format!("{}/api/v1/auth/register", base))
        .json(&json!({
            "email": email,
            "password": PASSWORD,
            "first_name": "Bench",
            "last_name": "Player",
            "timezone": "Europe/Berlin"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    if !res.status().is_success() {
        panic!("Failed to register {}: status {}", email, res.status());
    }

    let cookie = cookie_header(&res);
    let body: Value = res.json().await.expect("Failed to parse register response");
    Session {
        email: email.to_string(),
        cookie,
        csrf: body["csrf_token"].as_str().expect("No csrf_token").to_string(),
    }
}

async fn post_json(client: &Client, url: String, session: &Session, body: Value) -> Value {
    let res = client.post(&url)
        .header(header::COOKIE, &session.cookie)
        .header("X-CSRF-Token", &session.csrf)
        .json(&body)
        .send()
        .await
        .expect("Request failed during setup");

    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().await.unwrap_or_default();
        panic!("Setup request to {} failed. Status: {}. Body: {}", url, status, txt);
    }
    res.json().await.unwrap_or(Value::Null)
}

/// Registers a band of users with weekly evening availability.
async fn setup_band(client: &Client, base: &str) -> (Session, String) {
    let run = Uuid::new_v4();
    let mut members = Vec::with_capacity(BAND_SIZE);
    for i in 0..BAND_SIZE {
        members.push(register(client, base, &format!("bench-{}-{}@example.com", run, i)).await);
    }

    let owner = register(client, base, &format!("bench-{}-owner@example.com", run)).await;

    let band = post_json(client, format!("{}/api/v1/bands", base), &owner, json!({ "name": format!("Bench {}", run) })).await;
    let band_id = band["id"].as_str().expect("No band id").to_string();

    for (i, member) in members.iter().enumerate() {
        post_json(
            client,
            format!("{}/api/v1/bands/{}/members", base, band_id),
            &owner,
            json!({ "email": member.email }),
        ).await;

        for day in [1, 3, 5] {
            post_json(
                client,
                format!("{}/api/v1/availability/recurring", base),
                member,
                json!({ "day_of_week": day, "start_time": format!("{:02}:00", 17 + i % 3), "end_time": "23:00" }),
            ).await;
        }
    }

    (owner, band_id)
}

async fn run_stage(client: &Client, target: &Target, session: &Session, rps: u32) {
    let limiter = Arc::new(RateLimiter::direct(
        Quota::per_second(NonZeroU32::new(rps).expect("rps must be positive"))
    ));

    let (tx, mut rx) = mpsc::channel(50000);
    let start_time = Instant::now();
    let duration = Duration::from_secs(DURATION_SECS);

    loop {
        if start_time.elapsed() > duration {
            break;
        }

        if limiter.check().is_ok() {
            let client = client.clone();
            let url = target.url.clone();
            let body = target.body.clone();
            let method = target.method;
            let session = session.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let req_start = Instant::now();
                let res = match method {
                    "POST" => {
                        let mut req = client.post(&url).header("X-CSRF-Token", &session.csrf);
                        if let Some(b) = body {
                            req = req.json(&b);
                        }
                        req.send().await
                    },
                    _ => client.get(&url).header(header::COOKIE, &session.cookie).send().await,
                };
                let latency = req_start.elapsed();

                let success = match res {
                    Ok(r) => r.status().is_success(),
                    Err(_) => false,
                };

                let _ = tx.send((latency, success)).await;
            });
        } else {
            tokio::task::yield_now().await;
        }
    }

    drop(tx);

    let mut histogram = Histogram::<u64>::new(3).expect("Failed to create histogram");
    let mut successes = 0;
    let mut total = 0;

    while let Some((latency, success)) = rx.recv().await {
        total += 1;
        if success { successes += 1; }
        let _ = histogram.record(latency.as_micros() as u64);
    }

    let mean_ms = histogram.mean() / 1000.0;
    let p99_ms = histogram.value_at_quantile(0.99) as f64 / 1000.0;
    let success_rate = if total > 0 { (successes as f64 / total as f64) * 100.0 } else { 0.0 };

    println!(
        "{:<10} | {:<15.2} | {:<15.2} | {:<14.1}%",
        rps,
        mean_ms,
        p99_ms,
        success_rate
    );

    tokio::time::sleep(Duration::from_millis(500)).await;
}
