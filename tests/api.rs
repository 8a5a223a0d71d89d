#![cfg(feature = "server")]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::ServiceExt;
use txn_report::{
    router, AggregateReport, AppState, CategoryMatcher, CsvParser, ErrorResponse, ReportStore,
    UploadResponse,
};

const BOUNDARY: &str = "txn-report-test-boundary";
const LIMIT: usize = 1024 * 1024;

fn test_app(parser: CsvParser) -> (Router, Arc<ReportStore>) {
    capped_app(parser, LIMIT)
}

fn capped_app(parser: CsvParser, max_upload_bytes: usize) -> (Router, Arc<ReportStore>) {
    let state = AppState::new(parser);
    let store = Arc::clone(&state.store);
    (router(state, max_upload_bytes), store)
}

fn upload(field: &str, content_type: &str, contents: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"transactions.csv\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/transactions/")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn upload_csv(contents: &[u8]) -> Request<Body> {
    upload("file", "text/csv", contents)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send<T: DeserializeOwned>(app: &Router, request: Request<Body>) -> (StatusCode, T) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn report(app: &Router) -> AggregateReport {
    let (status, report) = send(app, get("/report/")).await;
    assert_eq!(status, StatusCode::OK);
    report
}

#[tokio::test]
async fn test_ping() {
    let (app, _) = test_app(CsvParser::default());
    let (status, body): (_, String) = send(&app, get("/ping")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "pong");
}

#[tokio::test]
async fn test_report_starts_at_zero() {
    let (app, _) = test_app(CsvParser::default());
    assert_eq!(report(&app).await, AggregateReport::new(0.0, 0.0));
}

#[tokio::test]
async fn test_upload_income_and_expense() {
    let (app, store) = test_app(CsvParser::default());
    let csv = b"2024-01-01,income,100.0,Salary\n2024-01-02,expense,40.0,Rent\n";

    let (status, body): (_, UploadResponse) = send(&app, upload_csv(csv)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.message, "CSV received and processed");

    let report = report(&app).await;
    assert_eq!(report.gross_revenue, 100.0);
    assert_eq!(report.expense, 40.0);
    assert_eq!(report.net_revenue, 60.0);
    assert_eq!(*store.snapshot(), report);
}

#[tokio::test]
async fn test_report_without_trailing_slash() {
    let (app, _) = test_app(CsvParser::default());
    let (status, _): (_, AggregateReport) = send(&app, get("/report")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_non_numeric_amount_is_ignored() {
    let (app, _) = test_app(CsvParser::default());
    let csv = b"2024-01-01,income,100.0,Salary\n2024-01-01,expense,abc,Rent\n";

    let (status, _): (_, UploadResponse) = send(&app, upload_csv(csv)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report(&app).await, AggregateReport::new(100.0, 0.0));
}

#[tokio::test]
async fn test_three_field_row_is_dropped() {
    let (app, _) = test_app(CsvParser::default());
    let csv = b"2024-01-01,income,100.0\n2024-01-02,expense,7,Coffee\n";

    send::<UploadResponse>(&app, upload_csv(csv)).await;
    assert_eq!(report(&app).await, AggregateReport::new(0.0, 7.0));
}

#[tokio::test]
async fn test_wrong_content_type_leaves_report_untouched() {
    let (app, _) = test_app(CsvParser::default());
    send::<UploadResponse>(&app, upload_csv(b"2024-01-01,income,50,Gift\n")).await;
    let before = report(&app).await;

    let (status, body): (_, ErrorResponse) =
        send(&app, upload("file", "text/plain", b"2024-01-01,income,999,Nope\n")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error, "The file must be a CSV file");
    assert_eq!(report(&app).await, before);
}

#[tokio::test]
async fn test_same_upload_twice_replays_not_accumulates() {
    let (app, _) = test_app(CsvParser::default());
    let csv = b"2024-01-01,income,100.0,Salary\n2024-01-02,expense,40.0,Rent\n";

    send::<UploadResponse>(&app, upload_csv(csv)).await;
    let r1 = report(&app).await;
    send::<UploadResponse>(&app, upload_csv(csv)).await;
    let r2 = report(&app).await;

    assert_eq!(r1, r2);
}

#[tokio::test]
async fn test_empty_file_resets_report() {
    let (app, _) = test_app(CsvParser::default());
    send::<UploadResponse>(&app, upload_csv(b"2024-01-01,income,100.0,Salary\n")).await;

    let (status, _): (_, UploadResponse) = send(&app, upload_csv(b"")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report(&app).await, AggregateReport::new(0.0, 0.0));
}

#[tokio::test]
async fn test_missing_file_field() {
    let (app, _) = test_app(CsvParser::default());
    let (status, body): (_, ErrorResponse) =
        send(&app, upload("attachment", "text/csv", b"2024-01-01,income,1,x\n")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body.error, "No file uploaded");
    assert_eq!(report(&app).await, AggregateReport::default());
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let (app, _) = test_app(CsvParser::default());
    let request = Request::builder()
        .method("POST")
        .uri("/transactions/")
        .header("content-type", "text/csv")
        .body(Body::from("2024-01-01,income,1,x\n"))
        .unwrap();

    let (status, body): (_, ErrorResponse) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.error.starts_with("Invalid multipart body"));
}

#[tokio::test]
async fn test_upload_over_body_cap_is_too_large() {
    let (app, store) = capped_app(CsvParser::default(), 64);
    store.replace(AggregateReport::new(12.0, 2.0));

    let csv = "2024-01-01,income,100.0,Salary\n".repeat(128);
    let (status, body): (_, ErrorResponse) = send(&app, upload_csv(csv.as_bytes())).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body.error.starts_with("Invalid multipart body"));
    assert_eq!(*store.snapshot(), AggregateReport::new(12.0, 2.0));
}

#[tokio::test]
async fn test_exact_matcher_accepts_leading_space_tokens() {
    let (app, _) = test_app(CsvParser::new(CategoryMatcher::exact(" Income", " Expense")));
    let csv = b"2024-01-01, Income, 100.0, Salary\n\
                2024-01-02, Expense, 40.0, Rent\n\
                2024-01-03,income,5,Bonus\n";

    send::<UploadResponse>(&app, upload_csv(csv)).await;
    assert_eq!(report(&app).await, AggregateReport::new(100.0, 40.0));
}

#[tokio::test]
async fn test_mixed_batch_sums_only_valid_rows() {
    let (app, store) = test_app(CsvParser::default());

    let mut csv = String::new();
    let mut income = 0.0;
    let mut expense = 0.0;
    for i in 0..1000u32 {
        let amount = f64::from(i % 97) + 0.25;
        match i % 5 {
            0 => {
                csv.push_str(&format!("2024-01-01,income,{amount},Salary\n"));
                income += amount;
            }
            1 => {
                csv.push_str(&format!("2024-01-01,expense,{amount},\"Rent, flat\",extra\n"));
                expense += amount;
            }
            2 => csv.push_str(&format!("2024-01-01,expense,{amount}\n")),
            3 => csv.push_str("2024-01-01,income,invalid_amount,Groceries\n"),
            _ => csv.push_str(&format!("2024-01-01,income,-{amount},Refund\n")),
        }
    }

    let (status, _): (_, UploadResponse) = send(&app, upload_csv(csv.as_bytes())).await;
    assert_eq!(status, StatusCode::OK);

    let report = *store.snapshot();
    assert_eq!(report.gross_revenue, income);
    assert_eq!(report.expense, expense);
    assert_eq!(report.net_revenue, report.gross_revenue - report.expense);
}
