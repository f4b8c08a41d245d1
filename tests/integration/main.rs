//! Integration tests for vaulticon

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vaulticon::config::Config;

/// Temp config pointing every path into a scratch directory
struct Sandbox {
    dir: TempDir,
    config_path: PathBuf,
    config: Config,
}

impl Sandbox {
    fn new(entries: &[&str], base_url: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.icons.base_url = base_url.to_string();
        config.icons.cache_dir = dir.path().join("icons");
        config.icons.default_icon = dir.path().join("icon_blank.png");
        config.sync.lock_path = dir.path().join("sync.lock");
        config.sync.retry_delay_secs = 0;
        config.entries.command = entries.iter().map(|s| s.to_string()).collect();

        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();

        Self {
            dir,
            config_path,
            config,
        }
    }

    fn cache_dir(&self) -> &Path {
        &self.config.icons.cache_dir
    }

    fn lock_path(&self) -> &Path {
        &self.config.sync.lock_path
    }

    fn precache(&self, id: &str) -> PathBuf {
        std::fs::create_dir_all(self.cache_dir()).unwrap();
        let path = self.cache_dir().join(format!("{id}.png"));
        std::fs::write(&path, b"png").unwrap();
        path
    }
}

mod cli_tests {
    use super::Sandbox;
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use chrono::Utc;
    use predicates::prelude::*;
    use vaulticon::sync::LockInfo;

    const UNREACHABLE: &str = "http://127.0.0.1:1";

    fn vaulticon(sandbox: &Sandbox) -> Command {
        let mut cmd = cargo_bin_cmd!("vaulticon");
        cmd.env("VAULTICON_CONFIG", &sandbox.config_path);
        cmd
    }

    fn write_lock(sandbox: &Sandbox, pid: u32) {
        let info = LockInfo {
            pid,
            started_at: Utc::now(),
        };
        std::fs::write(sandbox.lock_path(), serde_json::to_string(&info).unwrap()).unwrap();
    }

    #[test]
    fn help_displays() {
        let sandbox = Sandbox::new(&["true"], UNREACHABLE);
        vaulticon(&sandbox)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("icon sync"));
    }

    #[test]
    fn version_displays() {
        let sandbox = Sandbox::new(&["true"], UNREACHABLE);
        vaulticon(&sandbox)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("vaulticon"));
    }

    #[test]
    fn config_path_uses_env() {
        let sandbox = Sandbox::new(&["true"], UNREACHABLE);
        vaulticon(&sandbox)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let sandbox = Sandbox::new(&["true"], UNREACHABLE);
        vaulticon(&sandbox)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[sync]"));
    }

    #[test]
    fn icon_falls_back_to_default() {
        let sandbox = Sandbox::new(&["true"], UNREACHABLE);
        vaulticon(&sandbox)
            .args(["icon", "nothing-cached"])
            .assert()
            .success()
            .stdout(predicate::str::contains("icon_blank.png"));
    }

    #[test]
    fn icon_prints_cached_path() {
        let sandbox = Sandbox::new(&["true"], UNREACHABLE);
        sandbox.precache("github.com");
        vaulticon(&sandbox)
            .args(["icon", "github.com"])
            .assert()
            .success()
            .stdout(predicate::str::contains("github.com.png"));
    }

    #[test]
    fn status_idle() {
        let sandbox = Sandbox::new(&["true"], UNREACHABLE);
        vaulticon(&sandbox)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("idle"))
            .stdout(predicate::str::contains("0 icons cached"));
        assert!(!sandbox.cache_dir().exists());
    }

    #[test]
    fn status_json_reports_lock() {
        let sandbox = Sandbox::new(&["true"], UNREACHABLE);
        write_lock(&sandbox, std::process::id());
        vaulticon(&sandbox)
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"sync_running\": true"));
    }

    #[test]
    fn sync_skips_when_lock_held() {
        let sandbox = Sandbox::new(&["printf", "a\\n"], UNREACHABLE);
        write_lock(&sandbox, std::process::id());

        vaulticon(&sandbox)
            .arg("sync")
            .assert()
            .success()
            .stdout(predicate::str::contains("Icons already syncing"));
        assert!(sandbox.lock_path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn sync_all_cached_makes_no_requests() {
        let sandbox = Sandbox::new(&["printf", "a\\nb\\n"], UNREACHABLE);
        sandbox.precache("a");
        sandbox.precache("b");

        vaulticon(&sandbox)
            .arg("sync")
            .assert()
            .success()
            .stdout(predicate::str::contains("Sync complete"))
            .stdout(predicate::str::contains("0 saved, 2 cached, 0 failed"));
        assert!(!sandbox.lock_path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn sync_json_output_is_clean() {
        let sandbox = Sandbox::new(&["printf", "a\\n"], UNREACHABLE);
        sandbox.precache("a");

        let output = vaulticon(&sandbox)
            .args(["sync", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["outcomes"][0]["id"], "a");
        assert_eq!(report["outcomes"][0]["outcome"], "cached_hit");
    }

    #[cfg(unix)]
    #[test]
    fn sync_reports_enumeration_failure_and_unlocks() {
        let sandbox = Sandbox::new(&["false"], UNREACHABLE);

        vaulticon(&sandbox)
            .arg("sync")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Command execution error"))
            .stderr(predicate::str::contains("rbw unlock"));
        assert!(!sandbox.lock_path().exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn sync_force_clears_stale_lock() {
        let sandbox = Sandbox::new(&["printf", "a\\n"], UNREACHABLE);
        sandbox.precache("a");
        write_lock(&sandbox, u32::MAX);

        vaulticon(&sandbox)
            .args(["sync", "--force"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 cached"));
        assert!(!sandbox.lock_path().exists());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let sandbox = Sandbox::new(&["true"], UNREACHABLE);
        std::fs::write(&sandbox.config_path, "[sync]\nmax_retries = 0\n").unwrap();

        vaulticon(&sandbox)
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("max_retries"));
    }

    #[test]
    fn sandbox_dir_is_scratch() {
        let sandbox = Sandbox::new(&["true"], UNREACHABLE);
        assert!(sandbox.config_path.starts_with(sandbox.dir.path()));
    }
}

mod sync_tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use vaulticon::cache::IconCache;
    use vaulticon::entries::EntryId;
    use vaulticon::fetch::{FetchOutcome, HttpIconSource, IconFetcher, RetryCause, RetryPolicy};
    use vaulticon::notify::Notifier;
    use vaulticon::sync::{SyncLock, SyncOrchestrator, WorkerPool};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Silent;

    impl Notifier for Silent {
        fn notify(&self, _summary: &str, _body: &str) {}
    }

    fn orchestrator(
        server: &MockServer,
        temp: &TempDir,
        timeout: Duration,
    ) -> SyncOrchestrator<HttpIconSource> {
        let cache =
            IconCache::open(temp.path().join("icons"), temp.path().join("blank.png")).unwrap();
        let source = HttpIconSource::new(&server.uri(), timeout).unwrap();
        SyncOrchestrator::new(
            SyncLock::new(temp.path().join("sync.lock")),
            WorkerPool::new(4),
            IconFetcher::new(source, cache, RetryPolicy::new(2, Duration::ZERO)),
            Arc::new(Silent),
        )
    }

    fn ids(raw: &[&str]) -> Vec<EntryId> {
        raw.iter().map(|r| EntryId::new(*r).unwrap()).collect()
    }

    fn png() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(b"\x89PNG\r\n".to_vec(), "image/png")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cached_saved_and_rate_limited_entries() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/a/icon.png"))
            .respond_with(png())
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b/icon.png"))
            .respond_with(png())
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/c/icon.png"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/c/icon.png"))
            .respond_with(png())
            .expect(1)
            .mount(&server)
            .await;

        let sync = orchestrator(&server, &temp, Duration::from_secs(2));
        std::fs::create_dir_all(temp.path().join("icons")).unwrap();
        std::fs::write(temp.path().join("icons").join("a.png"), b"cached").unwrap();

        let report = sync.sync(&ids(&["a", "b", "c"])).await.unwrap();

        let a = EntryId::new("a").unwrap();
        let b = EntryId::new("b").unwrap();
        let c = EntryId::new("c").unwrap();
        assert_eq!(report.outcome_for(&a), Some(&FetchOutcome::CachedHit));
        assert_eq!(report.outcome_for(&b), Some(&FetchOutcome::Saved));
        assert_eq!(report.outcome_for(&c), Some(&FetchOutcome::Saved));
        assert_eq!(
            std::fs::read(temp.path().join("icons").join("c.png")).unwrap(),
            b"\x89PNG\r\n"
        );
        assert!(!sync.lock().try_is_held());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn not_found_is_requested_once() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/gone/icon.png"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let sync = orchestrator(&server, &temp, Duration::from_secs(2));
        let report = sync.sync(&ids(&["gone"])).await.unwrap();

        assert_eq!(report.outcomes[0].outcome, FetchOutcome::ClientError(404));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn html_body_is_invalid_content() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/parked/icon.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .expect(1)
            .mount(&server)
            .await;

        let sync = orchestrator(&server, &temp, Duration::from_secs(2));
        let report = sync.sync(&ids(&["parked"])).await.unwrap();

        assert_eq!(
            report.outcomes[0].outcome,
            FetchOutcome::InvalidContent("text/html".to_string())
        );
        assert!(!temp.path().join("icons").join("parked.png").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn slow_server_exhausts_retries() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/slow/icon.png"))
            .respond_with(png().set_delay(Duration::from_millis(800)))
            .expect(2)
            .mount(&server)
            .await;

        let sync = orchestrator(&server, &temp, Duration::from_millis(100));
        let report = sync.sync(&ids(&["slow"])).await.unwrap();

        assert!(matches!(
            report.outcomes[0].outcome,
            FetchOutcome::ExhaustedRetries(RetryCause::Timeout(_))
        ));
        assert!(!temp.path().join("icons").join("slow.png").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resync_issues_no_requests() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/once/icon.png"))
            .respond_with(png())
            .expect(1)
            .mount(&server)
            .await;

        let sync = orchestrator(&server, &temp, Duration::from_secs(2));
        let first = sync.sync(&ids(&["once"])).await.unwrap();
        let second = sync.sync(&ids(&["once"])).await.unwrap();

        assert_eq!(first.outcomes[0].outcome, FetchOutcome::Saved);
        assert_eq!(second.outcomes[0].outcome, FetchOutcome::CachedHit);
    }
}
