fn main() {
    println!("Run `cargo test -p deploy-flow` to execute end-to-end deployment tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use fleetdeploy_deploy::{CopyOrchestrator, CopyRequest};
    use fleetdeploy_file_ops::{list_deployments, remove_build};
    use fleetdeploy_hostscan::{HostScanner, ScanConfig, TcpProber};
    use fleetdeploy_inventory::layout::{StagingLayout, TargetLayout};
    use fleetdeploy_inventory::build_inventory;
    use fleetdeploy_protocol::{
        ConfigFile, HostEntry, ProgressKind, SpecSet, parse_selections,
    };
    use fleetdeploy_shortcut::{LauncherScriptWriter, PublisherConfig, ShortcutPublisher};
    use tempfile::TempDir;

    const CONFIG: &str = r#"{
        "version": 1,
        "stagingRoot": "/replaced-at-runtime",
        "apps": [
            {
                "name": "Trader",
                "executable": "Trader.exe",
                "productGroup": "Trading"
            },
            {
                "name": "Installer",
                "executable": "Installer.msix",
                "productGroup": "Packages",
                "requiresEnvironment": true
            }
        ],
        "environments": ["Dev", "QA"],
        "hosts": [{"host": "WS01", "appRoot": "Apps"}]
    }"#;

    struct DirTarget {
        root: PathBuf,
    }

    impl TargetLayout for DirTarget {
        fn dest_root(&self, host: &str) -> PathBuf {
            self.root.join(host).join("Apps")
        }

        fn local_root(&self) -> PathBuf {
            PathBuf::from("/apps")
        }
    }

    struct Env {
        staging: TempDir,
        targets: TempDir,
        config: ConfigFile,
    }

    impl Env {
        fn new() -> Self {
            Self {
                staging: TempDir::new().unwrap(),
                targets: TempDir::new().unwrap(),
                config: ConfigFile::from_json(CONFIG).unwrap(),
            }
        }

        fn stage(&self, rel: &str, content: &[u8]) {
            let path = self.staging.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn specs(&self) -> SpecSet {
            SpecSet::new(self.config.apps.clone())
        }

        fn layout(&self) -> StagingLayout {
            StagingLayout::new(self.staging.path())
        }

        fn dest_root(&self, host: &str) -> PathBuf {
            self.targets.path().join(host).join("Apps")
        }

        fn orchestrator(&self) -> CopyOrchestrator {
            let pattern = self
                .targets
                .path()
                .join("{host}")
                .join("Apps")
                .to_string_lossy()
                .into_owned();
            let publisher = ShortcutPublisher::new(
                Arc::new(LauncherScriptWriter),
                PublisherConfig::new(pattern, "/apps"),
            );
            CopyOrchestrator::new(
                self.layout(),
                self.specs(),
                Arc::new(DirTarget {
                    root: self.targets.path().to_path_buf(),
                }),
                Arc::new(publisher),
            )
        }
    }

    #[test]
    fn inventory_reflects_staged_builds() {
        let env = Env::new();
        env.stage("Trading/1.0/Dev/Trader.exe", b"EXE");
        env.stage("Trading/2.0/Dev/Trader.exe", b"EXE");
        env.stage("Trading/2.0/QA/Trader.exe", b"EXE");
        env.stage("Packages/Dev/3.0.msix", b"MSIX");
        // A build directory without the executable must not surface.
        fs::create_dir_all(env.staging.path().join("Trading/9.9/Dev")).unwrap();

        let groups = build_inventory(&env.layout(), &env.specs());
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].app, "Installer");
        assert_eq!(groups[0].variants.len(), 1);
        assert_eq!(groups[0].variants[0].build, "3.0");
        assert_eq!(groups[0].variants[0].environment.as_deref(), Some("Dev"));

        assert_eq!(groups[1].app, "Trader");
        assert_eq!(groups[1].variants.len(), 3);
        assert!(groups[1].variants.iter().all(|v| v.build != "9.9"));
    }

    #[test]
    fn inventory_serializes_camel_case() {
        let env = Env::new();
        env.stage("Packages/Dev/3.0.msix", b"MSIX");

        let groups = build_inventory(&env.layout(), &env.specs());
        let json = serde_json::to_value(&groups).unwrap();
        assert_eq!(json[0]["app"], "Installer");
        assert_eq!(json[0]["variants"][0]["build"], "3.0");
        assert_eq!(json[0]["variants"][0]["environment"], "Dev");
    }

    #[tokio::test]
    async fn wire_selection_deploys_and_publishes_shortcut() {
        let env = Env::new();
        env.stage("Trading/1.0/Dev/Trader.exe", b"EXE");
        env.stage("Trading/1.0/Dev/lib/core.dll", b"DLL");

        let mut orch = env.orchestrator();
        let mut rx = orch.take_events().unwrap();

        let selections = parse_selections(&["Trader|1.0|Dev", "garbage||"]);
        assert_eq!(selections.len(), 1);

        let report = orch
            .run(CopyRequest {
                hosts: vec!["WS01".into()],
                selections,
                environments: env.config.environments.clone(),
                connection_id: "it".into(),
            })
            .await
            .unwrap();
        assert_eq!(report.total_jobs, 1);
        assert_eq!(report.outcomes[0].copied, 2);
        assert!(report.outcomes[0].succeeded());

        let dest = env.dest_root("WS01").join("Trading/Trader/1.0/Dev");
        assert!(dest.join("Trader.exe").is_file());
        assert!(dest.join("lib/core.dll").is_file());

        // Shortcut lands next to the deployed apps and points at the
        // host-local path.
        let shortcut = env.dest_root("WS01").join("Trader 1.0 Dev.cmd");
        assert!(shortcut.is_file());
        let body = fs::read_to_string(&shortcut).unwrap();
        assert!(body.contains(
            &PathBuf::from("/apps/Trading/Trader/1.0/Dev/Trader.exe")
                .to_string_lossy()
                .into_owned()
        ));

        drop(orch);
        let mut progress = Vec::new();
        while let Some(event) = rx.recv().await {
            if let ProgressKind::Progress(p) = event.kind {
                progress.push(p);
            }
        }
        assert_eq!(progress.last(), Some(&100));
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn second_deploy_run_copies_nothing() {
        let env = Env::new();
        env.stage("Trading/1.0/Dev/Trader.exe", b"EXE");
        env.stage("Trading/1.0/Dev/settings.ini", b"INI");

        let request = CopyRequest {
            hosts: vec!["WS01".into()],
            selections: parse_selections(&["Trader|1.0|Dev"]),
            environments: Vec::new(),
            connection_id: "it".into(),
        };

        let first = env.orchestrator().run(request.clone()).await.unwrap();
        assert_eq!(first.outcomes[0].copied, 2);

        let second = env.orchestrator().run(request).await.unwrap();
        assert_eq!(second.outcomes[0].copied, 0);
        assert_eq!(second.outcomes[0].skipped, 2);
    }

    #[tokio::test]
    async fn maintenance_lists_and_removes_deployed_builds() {
        let env = Env::new();
        env.stage("Trading/1.0/Dev/Trader.exe", b"EXE");
        env.stage("Trading/2.0/Dev/Trader.exe", b"EXE");

        let request = CopyRequest {
            hosts: vec!["WS01".into()],
            selections: parse_selections(&["Trader|1.0|Dev", "Trader|2.0|Dev"]),
            environments: Vec::new(),
            connection_id: "it".into(),
        };
        env.orchestrator().run(request).await.unwrap();

        let root = env.dest_root("WS01");
        let groups = list_deployments(&root).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].app, "Trader");
        assert_eq!(groups[0].builds, vec!["1.0", "2.0"]);

        remove_build(&root, "Trader", "1.0").unwrap();
        let groups = list_deployments(&root).unwrap();
        assert_eq!(groups[0].builds, vec!["2.0"]);
        assert!(root.join("Trading/Trader/2.0/Dev/Trader.exe").is_file());
    }

    #[tokio::test]
    async fn scanner_reports_deployed_host_healthy() {
        let env = Env::new();

        // The probe target is a real local listener.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let share_root = env.targets.path();
        fs::create_dir_all(share_root.join("127.0.0.1/Apps")).unwrap();

        let config = ScanConfig {
            probe_timeout: Duration::from_millis(800),
            share_pattern: share_root.join("{host}").to_string_lossy().into_owned(),
            ..ScanConfig::default()
        };
        let scanner = HostScanner::new(
            vec![HostEntry {
                host: "127.0.0.1".into(),
                app_root: None,
            }],
            config,
            Arc::new(TcpProber { port }),
        );

        scanner.scan_once().await;

        let snap = scanner.snapshot();
        assert!(snap.last_scan.is_some());
        assert!(!snap.scan_in_progress);
        assert_eq!(snap.completed, 1);
        assert_eq!(snap.total, 1);
        let status = &snap.statuses[0];
        assert!(status.accessible);
        assert_eq!(status.root_exists, Some(true));
        assert!(status.latency_ms.is_some());
        assert_eq!(status.message, None);
    }
}
