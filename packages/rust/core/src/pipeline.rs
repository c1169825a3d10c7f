//! End-to-end source run: collect → build records → fetch lead texts → write table.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use jaarverslag_collectors::SourceCollector;
use jaarverslag_fetcher::{BatchOptions, BatchSummary, DocumentFetcher, LeadText, fetch_all};
use jaarverslag_normalize::NameNormalizer;
use jaarverslag_shared::{AppConfig, FetchOptions, FetchStatus, NormalizeConfig, Result};

use crate::assembler::{attach_lead_texts, build_records};
use crate::table::{table_file_name, write_table};

/// Settings for one source run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory receiving `<source>_data.csv`.
    pub output_dir: PathBuf,
    /// Leading pages kept per document.
    pub max_pages: usize,
    /// Maximum concurrent downloads.
    pub concurrency: usize,
    /// Add the `Fetch Status` column to the table.
    pub include_status_column: bool,
    pub fetch: FetchOptions,
    pub normalize: NormalizeConfig,
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.defaults.output_dir),
            max_pages: config.defaults.max_pages,
            concurrency: config.defaults.concurrency,
            include_status_column: config.output.include_status_column,
            fetch: FetchOptions::from(config),
            normalize: config.normalize.clone(),
        }
    }
}

/// Result of [`run_source`].
#[derive(Debug)]
pub struct RunResult {
    /// Source name.
    pub source: String,
    /// Path of the written table.
    pub path: PathBuf,
    /// Pairs returned by the collector.
    pub pairs: usize,
    /// Rows in the table (pairs minus those without a URL).
    pub records: usize,
    /// Fetch outcome tally.
    pub summary: BatchSummary,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called each time a document finishes, in completion order.
    fn document_fetched(&self, url: &str, completed: usize, total: usize, status: FetchStatus);
    /// Called when the run completes.
    fn done(&self, result: &RunResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_fetched(&self, _url: &str, _completed: usize, _total: usize, _status: FetchStatus) {}
    fn done(&self, _result: &RunResult) {}
}

/// Run one source end to end and write its table.
///
/// A collector error aborts the run. Per-document fetch failures do not:
/// they end up as rows with an empty `Text` cell.
#[instrument(skip_all, fields(source = %collector.name(), output_dir = %config.output_dir.display()))]
pub async fn run_source<C: SourceCollector>(
    collector: &C,
    config: &RunConfig,
    progress: &dyn ProgressReporter,
) -> Result<RunResult> {
    let start = Instant::now();
    let source = collector.name().to_string();
    let normalizer = NameNormalizer::from_config(&config.normalize)?;
    let fetcher = DocumentFetcher::new(&config.fetch)?;

    info!(%source, "starting source run");

    // --- Phase 1: Collect ---
    progress.phase(&format!("Collecting {source} publications"));
    let pairs = collector.collect().await?;
    let pair_count = pairs.len();
    if pairs.is_empty() {
        warn!(%source, "collector returned no pairs");
    }

    // --- Phase 2: Records ---
    progress.phase("Normalizing organisation names");
    let mut records = build_records(pairs, &normalizer);

    // --- Phase 3: Fetch ---
    progress.phase("Fetching annual reports");
    let urls: Vec<String> = records.iter().map(|r| r.url.clone()).collect();
    let opts = BatchOptions {
        max_pages: config.max_pages,
        concurrency: config.concurrency,
    };
    let outcomes: Vec<LeadText> = fetch_all(&fetcher, urls, opts, |p| {
        progress.document_fetched(p.url, p.completed, p.total, p.outcome.status());
    })
    .await?;
    let summary = BatchSummary::of(&outcomes);
    attach_lead_texts(&mut records, outcomes)?;

    // --- Phase 4: Write ---
    progress.phase("Writing table");
    let path = config.output_dir.join(table_file_name(&source));
    write_table(&path, &records, config.include_status_column)?;

    let result = RunResult {
        source,
        path,
        pairs: pair_count,
        records: records.len(),
        summary,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        source = %result.source,
        records = result.records,
        text = summary.text,
        empty = summary.empty,
        failed = summary.failed,
        elapsed_ms = result.elapsed.as_millis(),
        "source run complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use jaarverslag_collectors::PairsFileCollector;
    use jaarverslag_fetcher::testing::pdf_with_pages;
    use jaarverslag_shared::{CollectedPair, JaarverslagError};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::table::read_table;

    struct StaticCollector(Vec<CollectedPair>);

    impl SourceCollector for StaticCollector {
        fn name(&self) -> &str {
            "static"
        }

        async fn collect(&self) -> Result<Vec<CollectedPair>> {
            Ok(self.0.clone())
        }
    }

    struct FailingCollector;

    impl SourceCollector for FailingCollector {
        fn name(&self) -> &str {
            "failing"
        }

        async fn collect(&self) -> Result<Vec<CollectedPair>> {
            Err(JaarverslagError::Network("listing page unavailable".into()))
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        phases: Mutex<Vec<String>>,
        fetched: Mutex<Vec<(usize, usize)>>,
        done: Mutex<bool>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.phases.lock().unwrap().push(name.to_string());
        }

        fn document_fetched(&self, _url: &str, completed: usize, total: usize, _status: FetchStatus) {
            self.fetched.lock().unwrap().push((completed, total));
        }

        fn done(&self, _result: &RunResult) {
            *self.done.lock().unwrap() = true;
        }
    }

    fn run_config(output_dir: PathBuf) -> RunConfig {
        let mut config = RunConfig::from(&AppConfig::default());
        config.output_dir = output_dir;
        config.include_status_column = true;
        config.fetch.timeout = Duration::from_secs(5);
        config
    }

    async fn serve_pdf(server: &MockServer, route: &str, pages: &[&str]) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(pdf_with_pages(pages), "application/pdf"),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn run_config_follows_app_config() {
        let mut app = AppConfig::default();
        app.defaults.max_pages = 3;
        app.defaults.output_dir = "out".into();
        app.output.include_status_column = true;

        let config = RunConfig::from(&app);
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.include_status_column);
        assert_eq!(config.concurrency, app.defaults.concurrency);
    }

    #[tokio::test]
    async fn run_writes_one_row_per_usable_pair() {
        let server = MockServer::start().await;
        serve_pdf(&server, "/vmm.pdf", &["p1", "p2", "p3", "p4", "p5", "p6", "p7"]).await;
        serve_pdf(&server, "/leeg.pdf", &[]).await;
        Mock::given(method("GET"))
            .and(path("/weg.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let collector = StaticCollector(vec![
            CollectedPair::new(
                "Jaarverslag 2022 Vlaamse Milieumaatschappij (VMM)",
                format!("{}/vmm.pdf", server.uri()),
            ),
            CollectedPair::new("Zonder link", ""),
            CollectedPair::new("Jaarrekening 2021 - De Lijn", format!("{}/leeg.pdf", server.uri())),
            CollectedPair::new("Agentschap (ANB)", format!("{}/weg.pdf", server.uri())),
        ]);

        let dir = tempfile::tempdir().unwrap();
        let progress = RecordingProgress::default();
        let result = run_source(&collector, &run_config(dir.path().to_path_buf()), &progress)
            .await
            .unwrap();

        assert_eq!(result.pairs, 4);
        assert_eq!(result.records, 3);
        assert_eq!(result.summary, BatchSummary { text: 1, empty: 1, failed: 1 });
        assert_eq!(result.path, dir.path().join("static_data.csv"));

        let rows = read_table(&result.path).unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].organisation_name, "VMM");
        assert_eq!(rows[0].extended_name.as_deref(), Some("Vlaamse Milieumaatschappij"));
        let text = rows[0].text.as_deref().unwrap();
        assert!(text.contains("p5"));
        assert!(!text.contains("p6"));

        assert_eq!(rows[1].organisation_name, "De Lijn");
        assert_eq!(rows[1].text.as_deref(), Some(""));
        assert_eq!(rows[1].status, FetchStatus::Empty);

        assert_eq!(rows[2].organisation_name, "ANB");
        assert_eq!(rows[2].text, None);
        assert_eq!(rows[2].status, FetchStatus::Transport);

        let mut fetched = progress.fetched.lock().unwrap().clone();
        fetched.sort_unstable();
        assert_eq!(fetched, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(progress.phases.lock().unwrap().len(), 4);
        assert!(*progress.done.lock().unwrap());
    }

    #[tokio::test]
    async fn pairs_file_source_runs_end_to_end() {
        let server = MockServer::start().await;
        serve_pdf(&server, "/fin.pdf", &["Federale Overheidsdienst Financien"]).await;

        let dir = tempfile::tempdir().unwrap();
        let pairs_path = dir.path().join("govsr_pairs.csv");
        std::fs::write(
            &pairs_path,
            format!("name,url\nFOD Financiën (FOD Fin),{}/fin.pdf\n", server.uri()),
        )
        .unwrap();

        let collector = PairsFileCollector::new("govsr", &pairs_path);
        let result = run_source(&collector, &run_config(dir.path().join("data")), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(result.path, dir.path().join("data").join("govsr_data.csv"));
        let rows = read_table(&result.path).unwrap();
        assert_eq!(rows[0].organisation_name, "FOD Fin");
        assert_eq!(rows[0].extended_name.as_deref(), Some("FOD Financiën"));
        assert!(rows[0].text.as_deref().unwrap().contains("Financien"));
    }

    #[tokio::test]
    async fn collector_failure_aborts_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_source(&FailingCollector, &run_config(dir.path().to_path_buf()), &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, JaarverslagError::Network(_)));
        assert!(!dir.path().join("failing_data.csv").exists());
    }

    #[tokio::test]
    async fn empty_source_writes_header_only_table() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_source(
            &StaticCollector(Vec::new()),
            &run_config(dir.path().to_path_buf()),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(result.records, 0);
        assert!(read_table(&result.path).unwrap().is_empty());
    }
}
