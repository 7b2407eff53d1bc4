use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::api::types::{PredictionInput, PredictionRecord, RiskLevel, ValidationError};
use crate::api::ApiError;
use crate::history::{
    HistoryPage, HistoryPager, HistorySource, RenderMode, ViewState, DEFAULT_PAGE_SIZE,
};
use crate::render::Renderer;

fn record(id: &str) -> PredictionRecord {
    PredictionRecord {
        id: id.to_string(),
        customer_name: format!("guest-{id}"),
        party_size: 2,
        probability: 0.25,
        risk_level: RiskLevel::Low,
        lead_time_days: 7,
        deposit_paid: false,
        timestamp: "2024-03-01T18:30:00".to_string(),
    }
}

fn page(ids: &[&str], total_count: usize, has_more: bool) -> HistoryPage {
    HistoryPage {
        records: ids.iter().map(|id| record(id)).collect(),
        total_count,
        has_more,
    }
}

fn loaded_ids<S: HistorySource>(pager: &HistoryPager<S>) -> Vec<String> {
    pager
        .snapshot()
        .records
        .iter()
        .map(|r| r.id.clone())
        .collect()
}

fn view_ids(view: &ViewState) -> Vec<String> {
    view.records.iter().map(|r| r.id.clone()).collect()
}

// Serves canned pages keyed by the requested skip, counting every call.
// The yield models the suspension a real request always has.
struct PagedSource {
    pages: HashMap<usize, HistoryPage>,
    calls: AtomicUsize,
}

impl PagedSource {
    fn new(pages: Vec<(usize, HistoryPage)>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HistorySource for PagedSource {
    async fn list_recent(&self, skip: usize, _limit: usize) -> Result<HistoryPage, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.pages
            .get(&skip)
            .cloned()
            .ok_or_else(|| ApiError::Rejected {
                endpoint: "predictions/recent".to_string(),
                message: format!("no canned page at skip={skip}"),
            })
    }
}

// Replays responses in call order; `None` slots fail the call.
struct SequencedSource {
    responses: Vec<Option<HistoryPage>>,
    cursor: AtomicUsize,
}

impl SequencedSource {
    fn new(responses: Vec<Option<HistoryPage>>) -> Self {
        Self {
            responses,
            cursor: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl HistorySource for SequencedSource {
    async fn list_recent(&self, _skip: usize, _limit: usize) -> Result<HistoryPage, ApiError> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        match self.responses.get(index) {
            Some(Some(page)) => Ok(page.clone()),
            _ => Err(ApiError::Status {
                endpoint: "predictions/recent".to_string(),
                status: 503,
                message: "database unavailable".to_string(),
            }),
        }
    }
}

// The listing used across the pager tests: 14 records served in three
// pages, where the second page re-returns two rows from the first (a
// racing write shifted the window server-side).
fn overlapping_source() -> PagedSource {
    PagedSource::new(vec![
        (0, page(&["r1", "r2", "r3", "r4", "r5", "r6"], 14, true)),
        (6, page(&["r5", "r6", "r7", "r8", "r9", "r10"], 14, true)),
        (10, page(&["r11", "r12", "r13", "r14"], 14, false)),
    ])
}

#[tokio::test]
async fn dedup_drops_re_returned_rows() {
    let pager = HistoryPager::new(overlapping_source());
    pager.reset().await.unwrap();
    let view = pager.load_next().await.unwrap();

    assert_eq!(view.mode, RenderMode::Append);
    assert_eq!(view_ids(&view), vec!["r7", "r8", "r9", "r10"]);

    let ids = loaded_ids(&pager);
    assert_eq!(ids.len(), 10);
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
}

#[tokio::test]
async fn full_history_load_scenario() {
    let source = overlapping_source();
    let pager = HistoryPager::new(source);

    let first = pager.reset().await.unwrap();
    assert_eq!(first.mode, RenderMode::Replace);
    assert_eq!(first.records.len(), 6);

    pager.load_next().await.unwrap();
    pager.load_next().await.unwrap();

    assert_eq!(pager.loaded_count(), 14);
    assert_eq!(pager.total_count(), 14);
    assert!(!pager.has_more());

    // everything loaded: one more call must not touch the network
    let calls_before = pager_calls(&pager);
    let view = pager.load_next().await.unwrap();
    assert!(view.records.is_empty());
    assert_eq!(pager_calls(&pager), calls_before);
}

// Accessor for the canned source behind a pager built in these tests.
fn pager_calls(pager: &HistoryPager<PagedSource>) -> usize {
    pager.source_for_tests().calls()
}

#[tokio::test]
async fn exhausted_load_is_a_no_op() {
    let source = PagedSource::new(vec![
        (0, page(&["a", "b", "c", "d", "e", "f"], 10, true)),
        (6, page(&["g", "h", "i", "j"], 10, false)),
    ]);
    let pager = HistoryPager::new(source);
    pager.reset().await.unwrap();
    pager.load_next().await.unwrap();
    assert_eq!(pager.loaded_count(), 10);
    assert_eq!(pager_calls(&pager), 2);

    let view = pager.load_next().await.unwrap();
    assert!(view.records.is_empty());
    assert_eq!(pager_calls(&pager), 2);
    assert_eq!(pager.loaded_count(), 10);
}

#[tokio::test]
async fn concurrent_load_next_fetches_once() {
    let source = PagedSource::new(vec![(0, page(&["a", "b", "c", "d", "e", "f"], 14, true))]);
    let pager = HistoryPager::new(source);

    let (first, second) = tokio::join!(pager.load_next(), pager.load_next());
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(pager_calls(&pager), 1);
    assert_eq!(first.records.len(), 6);
    assert!(second.records.is_empty());
    assert_eq!(pager.loaded_count(), 6);
}

#[tokio::test]
async fn reset_twice_yields_same_records() {
    let pager = HistoryPager::new(overlapping_source());
    pager.reset().await.unwrap();
    let first = loaded_ids(&pager);
    pager.reset().await.unwrap();
    assert_eq!(loaded_ids(&pager), first);
    assert_eq!(pager.total_count(), 14);
}

#[tokio::test]
async fn concurrent_resets_are_serialized() {
    let pager = HistoryPager::new(overlapping_source());
    let (first, second) = tokio::join!(pager.reset(), pager.reset());
    first.unwrap();
    second.unwrap();

    // both ran, one after the other, and the cache holds a single copy
    assert_eq!(pager_calls(&pager), 2);
    assert_eq!(pager.loaded_count(), 6);
}

#[tokio::test]
async fn collapse_truncates_to_first_page() {
    let source = PagedSource::new(vec![
        (0, page(&["a", "b", "c", "d", "e", "f"], 20, true)),
        (6, page(&["g", "h", "i", "j", "k", "l"], 20, true)),
        (12, page(&["m", "n"], 20, true)),
    ]);
    let pager = HistoryPager::new(source);
    pager.reset().await.unwrap();
    pager.load_next().await.unwrap();
    pager.load_next().await.unwrap();
    assert_eq!(pager.loaded_count(), 14);
    let calls_before = pager_calls(&pager);

    let view = pager.collapse();
    assert_eq!(view.mode, RenderMode::Replace);
    assert_eq!(view_ids(&view), vec!["a", "b", "c", "d", "e", "f"]);
    assert_eq!(pager.loaded_count(), 6);
    assert!(pager.has_more());
    assert_eq!(pager_calls(&pager), calls_before);
}

#[tokio::test]
async fn collapse_rebuilds_seen_ids_from_prefix() {
    let source = PagedSource::new(vec![
        (0, page(&["a", "b", "c", "d", "e", "f"], 12, true)),
        (6, page(&["g", "h", "i", "j", "k", "l"], 12, false)),
    ]);
    let pager = HistoryPager::new(source);
    pager.reset().await.unwrap();
    pager.load_next().await.unwrap();
    pager.collapse();

    // the truncated rows are unseen again and re-append cleanly
    let view = pager.load_next().await.unwrap();
    assert_eq!(view_ids(&view), vec!["g", "h", "i", "j", "k", "l"]);
    assert_eq!(pager.loaded_count(), 12);
}

#[tokio::test]
async fn duplicate_page_appends_nothing_but_updates_counters() {
    let source = PagedSource::new(vec![
        (0, page(&["a", "b", "c", "d", "e", "f"], 14, true)),
        (6, page(&["a", "b", "c", "d", "e", "f"], 15, true)),
    ]);
    let pager = HistoryPager::new(source);
    pager.reset().await.unwrap();
    let view = pager.load_next().await.unwrap();

    assert!(view.records.is_empty());
    assert_eq!(view.mode, RenderMode::Append);
    assert_eq!(pager.loaded_count(), 6);
    // server-reported counters are overwritten even when nothing was new
    assert_eq!(pager.total_count(), 15);
    assert!(pager.has_more());
}

#[tokio::test]
async fn failed_load_leaves_state_unchanged() {
    let source = PagedSource::new(vec![(0, page(&["a", "b", "c", "d", "e", "f"], 14, true))]);
    let pager = HistoryPager::new(source);
    pager.reset().await.unwrap();

    let err = pager.load_next().await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected { .. }));
    assert_eq!(pager.loaded_count(), 6);
    assert_eq!(pager.total_count(), 14);
    assert!(pager.has_more());
    assert_eq!(
        pager.load_more().map(|b| (b.loaded, b.total_count)),
        Some((6, 14))
    );
}

#[tokio::test]
async fn failed_reset_clears_records_but_keeps_counters() {
    let source = SequencedSource::new(vec![
        Some(page(&["a", "b", "c", "d", "e", "f"], 14, true)),
        None,
    ]);
    let pager = HistoryPager::new(source);
    pager.reset().await.unwrap();
    assert_eq!(pager.loaded_count(), 6);

    let err = pager.reset().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 503, .. }));
    assert_eq!(pager.loaded_count(), 0);
    assert_eq!(pager.total_count(), 14);
    assert!(pager.has_more());
    assert!(pager.load_more().is_none());
}

#[tokio::test]
async fn in_flight_flag_is_released_after_a_failure() {
    let source = SequencedSource::new(vec![None, None]);
    let pager = HistoryPager::new(source);

    assert!(pager.load_next().await.is_err());
    // a stuck flag would turn this into a silent no-op instead of a call
    assert!(pager.load_next().await.is_err());
    assert_eq!(pager.source_for_tests().calls(), 2);
}

#[tokio::test]
async fn load_more_button_lifecycle() {
    let pager = HistoryPager::new(overlapping_source());
    assert!(pager.load_more().is_none());

    pager.reset().await.unwrap();
    let button = pager.load_more().unwrap();
    assert_eq!((button.loaded, button.total_count), (6, 14));
    assert!(button.label().contains("6 OF 14"));

    pager.load_next().await.unwrap();
    pager.load_next().await.unwrap();
    assert!(pager.load_more().is_none());
}

#[tokio::test]
async fn page_size_is_clamped_to_one() {
    let source = PagedSource::new(vec![(0, page(&["a"], 1, false))]);
    let pager = HistoryPager::with_page_size(source, 0);
    assert_eq!(pager.page_size(), 1);
    pager.reset().await.unwrap();
    assert_eq!(pager.loaded_count(), 1);
}

// Models the visible list the way a real sink applies view states.
struct RecordingRenderer {
    visible: Vec<String>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, view: &ViewState) {
        match view.mode {
            RenderMode::Replace => self.visible = view_ids(view),
            RenderMode::Append => self.visible.extend(view_ids(view)),
        }
    }
}

#[tokio::test]
async fn rendered_list_tracks_pager_state() {
    let pager = HistoryPager::new(overlapping_source());
    let mut renderer = RecordingRenderer {
        visible: Vec::new(),
    };

    renderer.render(&pager.reset().await.unwrap());
    assert_eq!(renderer.visible, loaded_ids(&pager));

    renderer.render(&pager.load_next().await.unwrap());
    assert_eq!(renderer.visible, loaded_ids(&pager));
    assert_eq!(renderer.visible.len(), 10);

    renderer.render(&pager.collapse());
    assert_eq!(renderer.visible, loaded_ids(&pager));
    assert_eq!(renderer.visible.len(), DEFAULT_PAGE_SIZE);
}

#[test]
fn input_validation_rejects_bad_fields() {
    let input = PredictionInput {
        customer_name: "Dana Cruz".to_string(),
        party_size: 4,
        deposit_paid: true,
        lead_time_days: 21,
        is_repeated_guest: false,
        previous_cancellations: 0,
        special_requests_count: 1,
        visit_month: 7,
    };
    assert_eq!(input.validate(), Ok(()));

    let mut empty_name = input.clone();
    empty_name.customer_name = "   ".to_string();
    assert_eq!(empty_name.validate(), Err(ValidationError::EmptyCustomerName));

    let mut no_guests = input.clone();
    no_guests.party_size = 0;
    assert_eq!(no_guests.validate(), Err(ValidationError::ZeroPartySize));

    let mut bad_month = input;
    bad_month.visit_month = 13;
    assert_eq!(
        bad_month.validate(),
        Err(ValidationError::VisitMonthOutOfRange { value: 13 })
    );
}

#[test]
fn risk_level_parse_is_case_insensitive() {
    assert_eq!(RiskLevel::parse("low"), Some(RiskLevel::Low));
    assert_eq!(RiskLevel::parse("LOW"), Some(RiskLevel::Low));
    assert_eq!(RiskLevel::parse(" Moderate "), Some(RiskLevel::Moderate));
    assert_eq!(RiskLevel::parse("CRITICAL"), Some(RiskLevel::Critical));
    assert_eq!(RiskLevel::parse("severe"), None);
}

#[test]
fn record_decodes_wire_shapes() {
    let record: PredictionRecord = serde_json::from_value(serde_json::json!({
        "_id": "66f0",
        "customer_name": "Dana Cruz",
        "party_size": 4,
        "prediction_prob": 0.81,
        "risk_level": "CRITICAL",
        "lead_time_days": 30,
        "deposit_paid": 1,
        "timestamp": "2024-03-01T18:30:00.123456"
    }))
    .unwrap();
    assert_eq!(record.id, "66f0");
    assert_eq!(record.risk_level, RiskLevel::Critical);
    assert!(record.deposit_paid);

    // older documents: boolean flag, no risk level recorded
    let record: PredictionRecord = serde_json::from_value(serde_json::json!({
        "_id": "66f1",
        "customer_name": "Sam Ortiz",
        "party_size": 2,
        "prediction_prob": 0.1,
        "lead_time_days": 3,
        "deposit_paid": false,
        "timestamp": "2024-03-01T19:00:00"
    }))
    .unwrap();
    assert_eq!(record.risk_level, RiskLevel::Low);
    assert!(!record.deposit_paid);
}

#[test]
fn unknown_risk_level_is_a_decode_error() {
    let result: Result<PredictionRecord, _> = serde_json::from_value(serde_json::json!({
        "_id": "66f2",
        "customer_name": "Lee Park",
        "party_size": 2,
        "prediction_prob": 0.5,
        "risk_level": "severe",
        "lead_time_days": 3,
        "deposit_paid": 0,
        "timestamp": "2024-03-01T19:00:00"
    }));
    assert!(result.is_err());
}

#[test]
fn input_serializes_flags_as_integers() {
    let input = PredictionInput {
        customer_name: "Dana Cruz".to_string(),
        party_size: 4,
        deposit_paid: true,
        lead_time_days: 21,
        is_repeated_guest: false,
        previous_cancellations: 0,
        special_requests_count: 1,
        visit_month: 7,
    };
    let value = serde_json::to_value(&input).unwrap();
    assert_eq!(value["deposit_paid"], serde_json::json!(1));
    assert_eq!(value["is_repeated_guest"], serde_json::json!(0));
    assert_eq!(value["customer_name"], serde_json::json!("Dana Cruz"));
}

#[test]
fn stats_summarize_counts_critical_records() {
    let mut records = vec![record("a"), record("b"), record("c"), record("d")];
    records[0].probability = 0.8;
    records[0].risk_level = RiskLevel::Critical;
    records[1].probability = 0.6;
    records[1].risk_level = RiskLevel::Moderate;
    records[2].probability = 0.2;
    records[3].probability = 0.2;

    let stats = crate::stats::summarize(&records);
    assert_eq!(stats.total, 4);
    assert_eq!(stats.critical, 1);
    assert!((stats.average_probability - 0.45).abs() < 1e-9);
}

#[test]
fn stats_summarize_handles_empty_history() {
    let stats = crate::stats::summarize(&[]);
    assert_eq!(stats.total, 0);
    assert_eq!(stats.critical, 0);
    assert_eq!(stats.average_probability, 0.0);
}

#[test]
fn output_format_parse_and_inference() {
    use crate::output::{infer_format_from_path, OutputFormat};

    assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
    assert_eq!(OutputFormat::parse(" CSV "), Some(OutputFormat::Csv));
    assert_eq!(OutputFormat::parse("txt"), Some(OutputFormat::Text));
    assert_eq!(OutputFormat::parse("xml"), None);

    assert_eq!(
        infer_format_from_path("./history.JSON"),
        Some(OutputFormat::Json)
    );
    assert_eq!(
        infer_format_from_path("history.csv"),
        Some(OutputFormat::Csv)
    );
    assert_eq!(infer_format_from_path("history.dat"), None);
}

#[test]
fn export_renders_json_and_csv() {
    let mut source = vec![record("a"), record("b")];
    source[0].customer_name = "Cruz, Dana".to_string();
    source[0].risk_level = RiskLevel::Critical;
    let records = crate::output::build_records(&source);

    let json = crate::output::render_json(&records);
    let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(parsed[0]["risk_level"], serde_json::json!("Critical"));
    assert_eq!(parsed[1]["id"], serde_json::json!("b"));

    let csv = String::from_utf8(crate::output::render_csv(&records)).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("id,customer_name"));
    // the comma in the name forces quoting
    assert!(lines.next().unwrap().contains("\"Cruz, Dana\""));
    assert_eq!(csv.lines().count(), 3);

    let text = String::from_utf8(crate::output::render_text(&records)).unwrap();
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn timestamp_formatting_accepts_both_wire_shapes() {
    use crate::utils::format_timestamp;

    assert_eq!(format_timestamp("2024-03-01T18:30:00.123456"), "Mar 1, 18:30");
    assert_eq!(format_timestamp("2024-03-01T18:30:00+00:00"), "Mar 1, 18:30");
    assert_eq!(format_timestamp("not a date"), "not a date");
}

#[test]
fn percent_rounds_to_whole_numbers() {
    assert_eq!(crate::utils::percent(0.814), "81%");
    assert_eq!(crate::utils::percent(0.125), "13%");
    assert_eq!(crate::utils::percent(0.0), "0%");
    assert_eq!(crate::utils::percent(1.0), "100%");
}
