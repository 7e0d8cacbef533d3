//! End-to-end behavior of the acquisition strategy chain over scripted fetches

use serde_json::{Value, json};
use std::sync::Arc;

use tablescrape::acquisition::AcquisitionChain;
use tablescrape::acquisition::static_parse::extract_from_markup;
use tablescrape::diagnostics::DiagnosticSink;
use tablescrape::model::{AcquisitionMethod, Category, ExtractionResult, Record, StrategyOutcome};
use tablescrape::recovery_cache::{MemoryRecoveryCache, RecoveryCache};
use tablescrape::table_locator::TableLocator;

mod common;
use common::{
    CapturingSink, ScriptedFetcher, fast_context, html, ok, ranking_csv, ranking_page, redirected,
    transient,
};

const ENTRY: &str = "https://www.example.org/fr/classement";

const BARE_PAGE: &str = r#"<!DOCTYPE html><html><body>
    <h1>Classement</h1><p>Aucune donnée disponible.</p>
</body></html>"#;

fn category() -> Category {
    Category::new("chevaux", ENTRY)
}

fn chain_over(fetcher: Arc<ScriptedFetcher>) -> AcquisitionChain {
    AcquisitionChain::new(fast_context(fetcher))
}

#[tokio::test]
async fn aria_grid_row_keeps_link_and_normalized_amount() {
    let page = r#"<!DOCTYPE html><html><body>
        <div role="grid" class="ranking">
          <div role="row">
            <span role="columnheader">Nom</span><span role="columnheader">Gains</span>
          </div>
          <div role="row">
            <span role="gridcell"><a href="/cheval/123">Furioso</a></span>
            <span role="gridcell">12 500</span>
          </div>
        </div>
    </body></html>"#;
    let fetcher = Arc::new(ScriptedFetcher::new().script(ENTRY, vec![html(page)]));

    let result = chain_over(fetcher).acquire(&category()).await;

    assert!(result.is_success());
    assert_eq!(result.metadata.method, Some(AcquisitionMethod::StaticParse));
    assert_eq!(result.records.len(), 1);
    assert_eq!(
        Value::Object(result.records[0].clone()),
        json!({
            "Nom": "Furioso",
            "Nom_url": "https://www.example.org/cheval/123",
            "Gains": 12500
        })
    );
    assert_eq!(
        result.metadata.locator_strategy.as_deref(),
        Some("structural_role")
    );
}

#[tokio::test]
async fn transient_failures_fall_through_to_file_download() {
    let page = r#"<html><body>
        <p>Le classement est disponible en téléchargement.</p>
        <a href="export/classement.csv">Télécharger</a>
    </body></html>"#;
    let download = "https://www.example.org/fr/export/classement.csv";
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .script(
                ENTRY,
                vec![transient(), transient(), transient(), html(page)],
            )
            .script(download, vec![ok("text/csv; charset=utf-8", ranking_csv(50))]),
    );

    let result = chain_over(Arc::clone(&fetcher)).acquire(&category()).await;

    assert_eq!(result.records.len(), 50);
    assert_eq!(result.metadata.method, Some(AcquisitionMethod::FileDownload));
    assert_eq!(result.metadata.row_count, 50);
    assert_eq!(result.metadata.download_url.as_deref(), Some(download));
    assert_eq!(result.metadata.delimiter.as_deref(), Some(";"));
    assert_eq!(result.records[0].get("Gains"), Some(&json!(1250.5)));

    let first = &result.metadata.diagnostics[0];
    assert_eq!(first.method, AcquisitionMethod::StaticParse);
    assert_eq!(first.outcome, StrategyOutcome::Failed);
    assert!(first.message.starts_with("transient"), "{}", first.message);

    // Three static-parse attempts, then one fetch for the download strategy
    assert_eq!(fetcher.calls_to(ENTRY), 4);
    let serialized = serde_json::to_value(&result).expect("serialize");
    assert_eq!(serialized["metadata"]["method"], json!("File Download"));
}

#[tokio::test]
async fn download_request_carries_referer_and_browser_headers() {
    let page = r#"<a class="btn-export" href="/dl/classement.csv">CSV</a>"#;
    let download = "https://www.example.org/dl/classement.csv";
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .script(ENTRY, vec![html(page)])
            .script(download, vec![ok("text/csv", ranking_csv(2))]),
    );

    let result = chain_over(Arc::clone(&fetcher)).acquire(&category()).await;
    assert_eq!(result.metadata.method, Some(AcquisitionMethod::FileDownload));

    let request = fetcher
        .requests()
        .into_iter()
        .find(|r| r.url == download)
        .expect("download requested");
    let header = |name: &str| {
        request
            .headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };
    assert_eq!(header("Referer").as_deref(), Some("https://www.example.org"));
    assert!(header("User-Agent").is_some_and(|ua| ua.contains("Mozilla")));
    assert!(header("Accept-Language").is_some_and(|l| l.starts_with("fr-FR")));
}

#[tokio::test]
async fn embedded_payload_is_used_when_no_table_or_link_exists() {
    let page = r#"<html><body><div id="app"></div>
        <script>window.classementData = {"data": [
            ["Alpha", "3 200"],
            ["Beta", "1 100,5"]
        ]};</script>
    </body></html>"#;
    let fetcher = Arc::new(ScriptedFetcher::new().script(ENTRY, vec![html(page)]));

    let result = chain_over(fetcher).acquire(&category()).await;

    assert_eq!(result.metadata.method, Some(AcquisitionMethod::EmbeddedPayload));
    assert_eq!(result.metadata.script_variable.as_deref(), Some("classementData"));
    assert_eq!(
        Value::Object(result.records[1].clone()),
        json!({"Column_1": "Beta", "Column_2": 1100.5})
    );
    let outcomes: Vec<_> = result
        .metadata
        .diagnostics
        .iter()
        .map(|d| (d.method, d.outcome))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            (AcquisitionMethod::StaticParse, StrategyOutcome::Failed),
            (AcquisitionMethod::FileDownload, StrategyOutcome::Failed),
        ]
    );
}

#[tokio::test]
async fn json_export_is_read_as_a_payload_not_as_csv() {
    let page = r#"<a href="/dl/classement.json">Télécharger</a>"#;
    let download = "https://www.example.org/dl/classement.json";
    let body = r#"{"data": [{"Nom": "Alpha", "Gains": "3 200"}, {"Nom": "Beta", "Gains": "1 100,5"}]}"#;
    let sink = Arc::new(CapturingSink::default());
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .script(ENTRY, vec![html(page)])
            .script(download, vec![ok("application/json; charset=utf-8", body)]),
    );
    let mut ctx = fast_context(fetcher);
    ctx.sink = Arc::clone(&sink) as Arc<dyn DiagnosticSink>;

    let result = AcquisitionChain::new(ctx).acquire(&category()).await;

    assert_eq!(result.metadata.method, Some(AcquisitionMethod::FileDownload));
    assert_eq!(result.metadata.delimiter, None);
    assert_eq!(
        Value::Object(result.records[1].clone()),
        json!({"Nom": "Beta", "Gains": 1100.5})
    );
    assert!(sink.suffixes().contains(&"_download.json".to_string()));
}

#[tokio::test]
async fn binary_spreadsheet_export_falls_through_to_the_next_strategy() {
    let page = r#"<html><body>
        <a href="/dl/classement.xls">Export Excel</a>
        <script>window.classementData = {"data": [["Alpha", "3 200"]]};</script>
    </body></html>"#;
    let download = "https://www.example.org/dl/classement.xls";
    let mut xls = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0];
    xls.extend_from_slice(b",\x03\xFE\n;x,y\n");
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .script(ENTRY, vec![html(page)])
            .script(download, vec![ok("application/vnd.ms-excel", xls)]),
    );

    let result = chain_over(fetcher).acquire(&category()).await;

    assert_eq!(result.metadata.method, Some(AcquisitionMethod::EmbeddedPayload));
    let download_attempt = &result.metadata.diagnostics[1];
    assert_eq!(download_attempt.method, AcquisitionMethod::FileDownload);
    assert_eq!(download_attempt.outcome, StrategyOutcome::Failed);
    assert!(
        download_attempt.message.starts_with("decode"),
        "{}",
        download_attempt.message
    );
}

#[tokio::test]
async fn links_resolve_against_the_redirect_target() {
    let landed = "https://www.example.net/fr/classement/";
    let page = r#"<table><tr><th>Nom</th><th>Gains</th></tr>
        <tr><td><a href="/cheval/9">Zenith</a></td><td>800</td></tr></table>"#;
    let fetcher = Arc::new(ScriptedFetcher::new().script(ENTRY, vec![redirected(landed, page)]));

    let result = chain_over(fetcher).acquire(&category()).await;

    assert_eq!(
        result.records[0].get("Nom_url"),
        Some(&json!("https://www.example.net/cheval/9"))
    );
}

fn cached_result(rows: usize) -> ExtractionResult {
    let mut result = ExtractionResult::new("chevaux", ENTRY);
    result.metadata.method = Some(AcquisitionMethod::StaticParse);
    result.metadata.row_count = rows;
    result.records = (1..=rows)
        .map(|i| {
            let mut record = Record::new();
            record.insert("Rang".into(), json!(i));
            record
        })
        .collect();
    result
}

#[tokio::test]
async fn total_failure_serves_cached_result_flagged_recovered() {
    let cache = Arc::new(MemoryRecoveryCache::new());
    cache.put("chevaux", &cached_result(30)).await.expect("seed cache");
    let fetcher = Arc::new(ScriptedFetcher::new().script(ENTRY, vec![html(BARE_PAGE)]));

    let result = chain_over(fetcher)
        .with_cache(cache)
        .acquire(&category())
        .await;

    assert_eq!(result.records.len(), 30);
    assert!(result.metadata.recovered);
    assert!(result.metadata.recovered_at.is_some());
    assert!(result.metadata.error.is_none());
    assert_eq!(result.metadata.diagnostics.len(), 4);
    assert_eq!(
        result.metadata.diagnostics[3].outcome,
        StrategyOutcome::Skipped
    );
}

#[tokio::test]
async fn total_failure_without_cache_is_declared_not_thrown() {
    let fetcher = Arc::new(ScriptedFetcher::new().script(ENTRY, vec![html(BARE_PAGE)]));

    let result = chain_over(fetcher).acquire(&category()).await;

    assert!(!result.is_success());
    assert!(result.records.is_empty());
    assert!(result.metadata.error.is_some());
    assert!(!result.metadata.recovered);
    assert_eq!(result.metadata.method, None);
}

#[tokio::test]
async fn success_is_written_through_to_the_cache() {
    let cache = Arc::new(MemoryRecoveryCache::new());
    let fetcher = Arc::new(ScriptedFetcher::new().script(ENTRY, vec![html(&ranking_page(3))]));

    let result = chain_over(fetcher)
        .with_cache(Arc::clone(&cache) as Arc<dyn RecoveryCache>)
        .acquire(&category())
        .await;

    let cached = cache.get("chevaux").await.expect("cache read").expect("entry");
    assert_eq!(cached.records, result.records);
    assert!(!cached.metadata.recovered);
}

#[tokio::test]
async fn locator_failure_snapshots_the_document() {
    let sink = Arc::new(CapturingSink::default());
    let fetcher = Arc::new(ScriptedFetcher::new().script(ENTRY, vec![html(BARE_PAGE)]));
    let mut ctx = fast_context(fetcher);
    ctx.sink = Arc::clone(&sink) as Arc<dyn DiagnosticSink>;

    let _ = AcquisitionChain::new(ctx)
        .with_order(vec![AcquisitionMethod::StaticParse])
        .acquire(&category())
        .await;

    assert_eq!(sink.suffixes(), vec!["_page.html", "_notfound.html"]);
}

#[test]
fn static_parse_is_idempotent_on_identical_input() {
    let page = ranking_page(25);
    let locator = TableLocator::default();
    let first = extract_from_markup(&locator, &page, ENTRY).expect("table");
    let second = extract_from_markup(&locator, &page, ENTRY).expect("table");

    assert_eq!(first.records.len(), 25);
    assert_eq!(
        serde_json::to_vec(&first.records).expect("serialize"),
        serde_json::to_vec(&second.records).expect("serialize")
    );
}
