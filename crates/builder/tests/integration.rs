//! Integration tests for the build lifecycle against a real record store

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rbt_builder::dispatch::dispatch;
    use rbt_builder::*;
    use rbt_config::RunnerConfig;
    use rbt_errors::{BuildError, Error, PlatformError};
    use rbt_events::{AppEvent, BuildEvent, BuildLogLevel, EventReceiver};
    use rbt_platform::{
        PlatformContext, ProcessSpawner, SpawnCommand, SpawnOutcome, WorkingDirGuard,
    };
    use rbt_state::{BuildStore, SqliteBuildStore};
    use rbt_types::{BuildId, CommandTemplate, LifecycleOp, RepoId, Repository};
    use serial_test::serial;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Exporter writing a marker file instead of unpacking sources
    #[derive(Default)]
    struct RecordingExporter {
        calls: Mutex<Vec<(String, PathBuf)>>,
    }

    #[async_trait]
    impl SourceExporter for RecordingExporter {
        async fn export(
            &self,
            _repo: &Repository,
            treeish: &str,
            target: &Path,
        ) -> Result<(), Error> {
            std::fs::write(target.join("EXPORTED"), treeish)?;
            self.calls
                .lock()
                .unwrap()
                .push((treeish.to_string(), target.to_path_buf()));
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum SpawnBehavior {
        Exit(i32),
        Fail,
    }

    #[derive(Debug, Clone)]
    struct SpawnCall {
        argv: Vec<String>,
        cwd: PathBuf,
        lock_path: PathBuf,
        log_path: PathBuf,
    }

    /// Spawner recording what would have run and where
    struct RecordingSpawner {
        behavior: SpawnBehavior,
        calls: Mutex<Vec<SpawnCall>>,
    }

    impl RecordingSpawner {
        fn new(behavior: SpawnBehavior) -> Self {
            Self {
                behavior,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<SpawnCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessSpawner for RecordingSpawner {
        async fn spawn(
            &self,
            _ctx: &PlatformContext,
            command: &SpawnCommand,
            lock_path: &Path,
            log_path: &Path,
        ) -> Result<SpawnOutcome, Error> {
            self.calls.lock().unwrap().push(SpawnCall {
                argv: command.argv().to_vec(),
                cwd: std::env::current_dir()?,
                lock_path: lock_path.to_path_buf(),
                log_path: log_path.to_path_buf(),
            });
            match self.behavior {
                SpawnBehavior::Exit(code) => Ok(SpawnOutcome {
                    pid: Some(4242),
                    exit_code: Some(code),
                }),
                SpawnBehavior::Fail => Err(PlatformError::ProcessExecutionFailed {
                    command: command.argv().join(" "),
                    message: "spawn refused".to_string(),
                }
                .into()),
            }
        }
    }

    struct Fixture {
        dir: TempDir,
        store: Arc<SqliteBuildStore>,
        exporter: Arc<RecordingExporter>,
        spawner: Arc<RecordingSpawner>,
        ctx: LifecycleContext,
        events: EventReceiver,
    }

    impl Fixture {
        async fn new(behavior: SpawnBehavior) -> Self {
            let dir = TempDir::new().unwrap();
            let store = Arc::new(
                SqliteBuildStore::open(&dir.path().join("rbt.sqlite"))
                    .await
                    .unwrap(),
            );
            let exporter = Arc::new(RecordingExporter::default());
            let spawner = Arc::new(RecordingSpawner::new(behavior));
            let runner = RunnerConfig {
                root: dir.path().join("root"),
                db_user: "ci".to_string(),
                ..RunnerConfig::default()
            };
            let (tx, events) = rbt_events::channel();
            let ctx = LifecycleContext::new(store.clone(), runner)
                .with_exporter(exporter.clone())
                .with_spawner(spawner.clone())
                .with_event_sender(tx);

            Self {
                dir,
                store,
                exporter,
                spawner,
                ctx,
                events,
            }
        }

        fn root(&self) -> PathBuf {
            self.dir.path().join("root")
        }

        fn build_path(&self, dest: &str) -> PathBuf {
            self.root().join("build").join(dest)
        }

        async fn repo(&self, repo: Repository) -> RepoId {
            self.store.insert_repository(&repo).await.unwrap()
        }

        async fn build(&self, repo: RepoId, dest: &str, port: u16) -> BuildId {
            self.store
                .insert_build(repo, &format!("{dest}-head"), dest, port)
                .await
                .unwrap()
        }

        fn drain(&mut self) -> Vec<AppEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                events.push(event);
            }
            events
        }

        fn exported(&self) -> Vec<(String, PathBuf)> {
            self.exporter.calls.lock().unwrap().clone()
        }
    }

    fn regular_repo(name: &str) -> Repository {
        Repository::new(RepoId(0), name)
    }

    fn custom_repo(name: &str, build_dir: Option<&str>) -> Repository {
        let mut repo = Repository::new(RepoId(0), name);
        repo.is_custom_build = true;
        repo.custom_build_dir = build_dir.map(ToString::to_string);
        repo.custom_server_path = Some("server/odoo-bin".to_string());
        repo
    }

    fn lifecycle() -> CustomBuildLifecycle {
        CustomBuildLifecycle::new(DefaultLifecycle::new())
    }

    #[tokio::test]
    async fn custom_checkout_exports_into_build_dir() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let repo = fx.repo(custom_repo("acme/shop", Some("backend"))).await;
        let id = fx.build(repo, "00001-shop", 8069).await;

        lifecycle().checkout(&fx.ctx, &[id]).await.unwrap();

        let build_path = fx.build_path("00001-shop");
        assert_eq!(
            fx.exported(),
            vec![("00001-shop-head".to_string(), build_path.join("backend"))]
        );
        assert!(build_path.join("logs").is_dir());
        assert!(build_path.join("backend/EXPORTED").is_file());
    }

    #[tokio::test]
    async fn custom_checkout_without_build_dir_uses_build_path() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let unset = fx.repo(custom_repo("acme/unset", None)).await;
        let blank = fx.repo(custom_repo("acme/blank", Some(""))).await;
        let a = fx.build(unset, "00001-a", 8069).await;
        let b = fx.build(blank, "00002-b", 8070).await;

        lifecycle().checkout(&fx.ctx, &[a, b]).await.unwrap();

        let targets: Vec<PathBuf> = fx.exported().into_iter().map(|(_, t)| t).collect();
        assert_eq!(
            targets,
            vec![fx.build_path("00001-a"), fx.build_path("00002-b")]
        );
    }

    #[tokio::test]
    async fn checkout_replaces_previous_build_directory() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let repo = fx.repo(custom_repo("acme/shop", Some("backend"))).await;
        let id = fx.build(repo, "00001-shop", 8069).await;

        let stale = fx.build_path("00001-shop").join("stale.txt");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        lifecycle().checkout(&fx.ctx, &[id]).await.unwrap();
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn escaping_build_dir_is_rejected() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let repo = fx.repo(custom_repo("acme/evil", Some("../outside"))).await;
        let id = fx.build(repo, "00001-evil", 8069).await;

        let err = lifecycle().checkout(&fx.ctx, &[id]).await.unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::InvalidPath { .. })));
        assert!(fx.exported().is_empty());
    }

    #[tokio::test]
    async fn mixed_checkout_processes_each_build_once() {
        let mut fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let plain = fx.repo(regular_repo("odoo/odoo")).await;
        let custom = fx.repo(custom_repo("acme/shop", Some("backend"))).await;
        let c = fx.build(custom, "00001-c", 8069).await;
        let r = fx.build(plain, "00002-r", 8070).await;

        lifecycle().checkout(&fx.ctx, &[c, r, c]).await.unwrap();

        // Regular builds first, then custom ones
        assert_eq!(
            fx.exported(),
            vec![
                ("00002-r-head".to_string(), fx.build_path("00002-r")),
                (
                    "00001-c-head".to_string(),
                    fx.build_path("00001-c").join("backend")
                ),
            ]
        );

        let dispatched: Vec<_> = fx
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                AppEvent::Build(BuildEvent::Dispatched {
                    operation,
                    regular,
                    custom,
                }) => Some((operation, regular, custom)),
                _ => None,
            })
            .collect();
        assert_eq!(
            dispatched,
            vec![(LifecycleOp::Checkout, vec![r], vec![c])]
        );
    }

    #[tokio::test]
    async fn dispatch_runs_default_before_custom() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let plain = fx.repo(regular_repo("odoo/odoo")).await;
        let custom = fx.repo(custom_repo("acme/shop", None)).await;
        let r1 = fx.build(plain, "00001", 8069).await;
        let c1 = fx.build(custom, "00002", 8070).await;
        let r2 = fx.build(plain, "00003", 8071).await;

        let order = Mutex::new(Vec::new());
        let result = dispatch(
            &fx.ctx,
            LifecycleOp::PreBuild,
            &[c1, r1, r2],
            |regular| {
                order.lock().unwrap().push(("default", regular));
                async { Ok(None::<()>) }
            },
            |custom| {
                order.lock().unwrap().push(("custom", custom));
                async { Ok(None) }
            },
        )
        .await
        .unwrap();

        assert!(result.is_none());
        assert_eq!(
            order.into_inner().unwrap(),
            vec![("default", vec![r1, r2]), ("custom", vec![c1])]
        );
    }

    #[tokio::test]
    async fn dispatch_skips_strategies_with_nothing_to_do() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let plain = fx.repo(regular_repo("odoo/odoo")).await;
        let r = fx.build(plain, "00001", 8069).await;

        let result = dispatch(
            &fx.ctx,
            LifecycleOp::BuildCommand,
            &[r],
            |_| async { Ok(Some(1)) },
            |_| async { Err(Error::internal("custom strategy must not run")) },
        )
        .await
        .unwrap();
        assert_eq!(result, Some(1));
    }

    #[tokio::test]
    #[should_panic(expected = "default lifecycle returned a value")]
    async fn mixed_command_batch_is_a_contract_violation() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let plain = fx.repo(regular_repo("odoo/odoo")).await;
        let custom = fx.repo(custom_repo("acme/shop", None)).await;
        let r = fx.build(plain, "00001", 8069).await;
        let c = fx.build(custom, "00002", 8070).await;

        let _ = lifecycle().build_command(&fx.ctx, &[r, c]).await;
    }

    #[tokio::test]
    #[serial]
    async fn prebuilt_builds_are_left_alone() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let mut repo = custom_repo("acme/shop", Some("backend"));
        repo.custom_pre_build_cmd = Some(CommandTemplate::from("make deps"));
        let repo = fx.repo(repo).await;
        let id = fx.build(repo, "00001-shop", 8069).await;
        fx.store.mark_prebuilt(id).await.unwrap();

        let marker = fx.build_path("00001-shop").join("keep.txt");
        std::fs::create_dir_all(marker.parent().unwrap()).unwrap();
        std::fs::write(&marker, "keep").unwrap();

        let lc = lifecycle();
        lc.checkout(&fx.ctx, &[id]).await.unwrap();
        lc.pre_build(&fx.ctx, &[id], &fx.root().join("lock"), &fx.root().join("log"))
            .await
            .unwrap();

        assert!(marker.exists());
        assert!(fx.exported().is_empty());
        assert!(fx.spawner.calls().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn pre_build_runs_substituted_command_in_build_path() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let mut repo = custom_repo("acme/shop", Some("sub dir"));
        repo.custom_pre_build_cmd = Some(CommandTemplate::from(
            "make -C %(custom_build_dir)s SERVER=%(custom_server_path)s",
        ));
        let repo = fx.repo(repo).await;
        let id = fx.build(repo, "00001-shop", 8069).await;

        let lc = lifecycle();
        lc.checkout(&fx.ctx, &[id]).await.unwrap();

        let before = std::env::current_dir().unwrap();
        let lock = fx.root().join("job.lock");
        let log = fx.root().join("job.txt");
        lc.pre_build(&fx.ctx, &[id], &lock, &log).await.unwrap();
        assert_eq!(std::env::current_dir().unwrap(), before);

        let calls = fx.spawner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].argv,
            vec!["make", "-C", "sub dir", "SERVER=server/odoo-bin"]
        );
        assert_eq!(
            calls[0].cwd.canonicalize().unwrap(),
            fx.build_path("00001-shop").canonicalize().unwrap()
        );
        assert_eq!(calls[0].lock_path, lock);
        assert_eq!(calls[0].log_path, log);
    }

    #[tokio::test]
    #[serial]
    async fn failed_pre_build_restores_working_directory() {
        for behavior in [SpawnBehavior::Exit(2), SpawnBehavior::Fail] {
            let fx = Fixture::new(behavior).await;
            let mut repo = custom_repo("acme/shop", None);
            repo.custom_pre_build_cmd = Some(CommandTemplate::from("./setup.sh"));
            let repo = fx.repo(repo).await;
            let first = fx.build(repo, "00001-a", 8069).await;
            let second = fx.build(repo, "00002-b", 8070).await;

            let lc = lifecycle();
            lc.checkout(&fx.ctx, &[first, second]).await.unwrap();

            let before = std::env::current_dir().unwrap();
            let err = lc
                .pre_build(
                    &fx.ctx,
                    &[first, second],
                    &fx.root().join("lock"),
                    &fx.root().join("log"),
                )
                .await
                .unwrap_err();
            assert_eq!(std::env::current_dir().unwrap(), before);

            match behavior {
                SpawnBehavior::Exit(code) => assert!(matches!(
                    err,
                    Error::Build(BuildError::PreBuildFailed { exit_code: Some(c), .. }) if c == code
                )),
                SpawnBehavior::Fail => assert!(matches!(
                    err,
                    Error::Platform(PlatformError::ProcessExecutionFailed { .. })
                )),
            }
            // The batch stops at the first failure
            assert_eq!(fx.spawner.calls().len(), 1);
        }
    }

    #[tokio::test]
    #[serial]
    async fn relative_root_batch_runs_every_build_in_its_own_directory() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            SqliteBuildStore::open(&dir.path().join("rbt.sqlite"))
                .await
                .unwrap(),
        );
        let spawner = Arc::new(RecordingSpawner::new(SpawnBehavior::Exit(0)));
        let runner = RunnerConfig {
            root: PathBuf::from("runner"),
            db_user: "ci".to_string(),
            ..RunnerConfig::default()
        };
        let ctx = LifecycleContext::new(store.clone(), runner)
            .with_exporter(Arc::new(RecordingExporter::default()))
            .with_spawner(spawner.clone());

        let mut repo = custom_repo("acme/shop", None);
        repo.custom_pre_build_cmd = Some(CommandTemplate::from("./setup.sh"));
        let repo = store.insert_repository(&repo).await.unwrap();
        let a = store.insert_build(repo, "a-head", "00001-a", 8069).await.unwrap();
        let b = store.insert_build(repo, "b-head", "00002-b", 8070).await.unwrap();

        let cwd = WorkingDirGuard::save().unwrap();
        cwd.enter(dir.path()).unwrap();
        let base = std::env::current_dir().unwrap();

        let lc = lifecycle();
        lc.checkout(&ctx, &[a, b]).await.unwrap();
        lc.pre_build(
            &ctx,
            &[a, b],
            Path::new("runner/job.lock"),
            Path::new("runner/job.txt"),
        )
        .await
        .unwrap();
        assert_eq!(std::env::current_dir().unwrap(), base);
        drop(cwd);

        let calls = spawner.calls();
        assert_eq!(calls.len(), 2);
        for (call, dest) in calls.iter().zip(["00001-a", "00002-b"]) {
            assert_eq!(
                call.cwd.canonicalize().unwrap(),
                base.join("runner/build").join(dest).canonicalize().unwrap()
            );
            assert_eq!(call.lock_path, base.join("runner/job.lock"));
            assert_eq!(call.log_path, base.join("runner/job.txt"));
        }
    }

    #[tokio::test]
    #[serial]
    async fn malformed_pre_build_template_is_a_warning() {
        let mut fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let mut repo = custom_repo("acme/shop", None);
        repo.custom_pre_build_cmd = Some(CommandTemplate::from("make %(nope)s"));
        let repo = fx.repo(repo).await;
        let id = fx.build(repo, "00001-shop", 8069).await;

        lifecycle()
            .pre_build(&fx.ctx, &[id], &fx.root().join("lock"), &fx.root().join("log"))
            .await
            .unwrap();

        assert!(fx.spawner.calls().is_empty());
        let warned = fx.drain().into_iter().any(|event| {
            matches!(
                event,
                AppEvent::Build(BuildEvent::Log {
                    build_id,
                    level: BuildLogLevel::Warning,
                    ..
                }) if build_id == id
            )
        });
        assert!(warned);
    }

    #[tokio::test]
    #[serial]
    async fn regular_builds_have_no_pre_build() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let plain = fx.repo(regular_repo("odoo/odoo")).await;
        let unset = fx.repo(custom_repo("acme/nocmd", None)).await;
        let r = fx.build(plain, "00001", 8069).await;
        let c = fx.build(unset, "00002", 8070).await;

        lifecycle()
            .pre_build(&fx.ctx, &[r, c], &fx.root().join("lock"), &fx.root().join("log"))
            .await
            .unwrap();
        assert!(fx.spawner.calls().is_empty());
    }

    #[tokio::test]
    async fn custom_command_uses_runner_settings() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let repo = fx.repo(custom_repo("acme/shop", None)).await;
        let id = fx.build(repo, "00001-shop", 8069).await;

        let command = lifecycle().build_command(&fx.ctx, &[id]).await.unwrap();

        let server = fx.build_path("00001-shop").join("server/odoo-bin");
        assert_eq!(
            command.args,
            vec![
                "python3".to_string(),
                server.display().to_string(),
                "--no-xmlrpcs".to_string(),
                "--xmlrpc-port=8069".to_string(),
                "--db_user=ci".to_string(),
                "--workers=0".to_string(),
            ]
        );
        assert_eq!(command.modules, vec!["base".to_string()]);
    }

    #[tokio::test]
    async fn custom_command_appends_parameters_and_modules() {
        let mut fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let mut repo = custom_repo("acme/shop", Some("backend"));
        repo.modules = Some(vec!["sale".into(), "stock".into()]);
        repo.custom_server_params = Some(CommandTemplate::Tokens(vec![
            "--addons-path=%(custom_build_dir)s/addons".into(),
            "--log-level=debug".into(),
        ]));
        let shop = fx.repo(repo).await;
        let first = fx.build(shop, "00001-shop", 8070).await;
        let second = fx.build(shop, "00002-shop", 8071).await;

        let command = lifecycle()
            .build_command(&fx.ctx, &[first, second])
            .await
            .unwrap();

        assert_eq!(
            &command.args[6..],
            ["--addons-path=backend/addons", "--log-level=debug"]
        );
        assert_eq!(command.args[3], "--xmlrpc-port=8070");
        assert_eq!(command.modules_arg(), "sale,stock");

        let built: Vec<BuildId> = fx
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                AppEvent::Build(BuildEvent::CommandBuilt { build_id, .. }) => Some(build_id),
                _ => None,
            })
            .collect();
        assert_eq!(built, vec![first]);
    }

    #[tokio::test]
    async fn malformed_server_params_are_dropped() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let mut repo = custom_repo("acme/shop", None);
        repo.custom_server_params = Some(CommandTemplate::from("--limit=50%"));
        let repo = fx.repo(repo).await;
        let id = fx.build(repo, "00001-shop", 8069).await;

        let command = lifecycle().build_command(&fx.ctx, &[id]).await.unwrap();
        assert_eq!(command.args.len(), 6);
        assert_eq!(command.args.last().map(String::as_str), Some("--workers=0"));
    }

    #[tokio::test]
    async fn missing_server_path_is_an_error() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let mut repo = custom_repo("acme/shop", None);
        repo.custom_server_path = None;
        let repo = fx.repo(repo).await;
        let id = fx.build(repo, "00001-shop", 8069).await;

        let err = lifecycle().build_command(&fx.ctx, &[id]).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Build(BuildError::MissingServerPath { ref repo }) if repo == "acme/shop"
        ));
    }

    #[tokio::test]
    async fn default_command_probes_server_candidates() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let mut repo = regular_repo("odoo/odoo");
        repo.modules = Some(vec!["web".into()]);
        let plain = fx.repo(repo).await;
        let id = fx.build(plain, "00001-odoo", 8069).await;

        let build_path = fx.build_path("00001-odoo");
        let lc = lifecycle();

        let command = lc.build_command(&fx.ctx, &[id]).await.unwrap();
        assert_eq!(command.args[1], build_path.join("odoo-bin").display().to_string());

        std::fs::create_dir_all(&build_path).unwrap();
        std::fs::write(build_path.join("openerp-server"), "").unwrap();
        let command = lc.build_command(&fx.ctx, &[id]).await.unwrap();
        assert_eq!(
            command.args,
            vec![
                "python3".to_string(),
                build_path.join("openerp-server").display().to_string(),
                "--no-xmlrpcs".to_string(),
                "--xmlrpc-port=8069".to_string(),
            ]
        );
        assert_eq!(command.modules, vec!["web".to_string()]);
    }

    #[tokio::test]
    async fn empty_command_batch_is_an_error() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let err = lifecycle().build_command(&fx.ctx, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::EmptyBatch { .. })));
    }

    #[tokio::test]
    #[serial]
    async fn prebuild_job_marks_custom_build() {
        let mut fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let mut repo = custom_repo("acme/shop", Some("backend"));
        repo.custom_pre_build_cmd = Some(CommandTemplate::from("./bootstrap"));
        let repo = fx.repo(repo).await;
        let id = fx.build(repo, "00001-shop", 8069).await;

        let lock = fx.root().join("job.lock");
        let log = fx.root().join("job.txt");
        run_prebuild_job(&lifecycle(), &fx.ctx, id, &lock, &log)
            .await
            .unwrap();

        assert!(fx.store.get(id).await.unwrap().prebuilt);
        assert_eq!(fx.exported().len(), 1);
        assert_eq!(fx.spawner.calls().len(), 1);

        let events = fx.drain();
        assert!(events.iter().any(|event| matches!(
            event,
            AppEvent::Build(BuildEvent::Log { step, message, .. })
                if step == PREBUILD_STEP && message == "Start pre-build commands"
        )));
        assert!(events.iter().any(|event| matches!(
            event,
            AppEvent::Build(BuildEvent::MarkedPrebuilt { build_id }) if *build_id == id
        )));

        // A second run finds the build prebuilt and does nothing
        run_prebuild_job(&lifecycle(), &fx.ctx, id, &lock, &log)
            .await
            .unwrap();
        assert_eq!(fx.exported().len(), 1);
        assert_eq!(fx.spawner.calls().len(), 1);
    }

    #[tokio::test]
    async fn prebuild_job_skips_pre_build_for_regular_build() {
        let fx = Fixture::new(SpawnBehavior::Exit(0)).await;
        let plain = fx.repo(regular_repo("odoo/odoo")).await;
        let id = fx.build(plain, "00001-odoo", 8069).await;

        run_prebuild_job(
            &DefaultLifecycle::new(),
            &fx.ctx,
            id,
            &fx.root().join("lock"),
            &fx.root().join("log"),
        )
        .await
        .unwrap();

        assert!(fx.store.get(id).await.unwrap().prebuilt);
        assert_eq!(
            fx.exported(),
            vec![("00001-odoo-head".to_string(), fx.build_path("00001-odoo"))]
        );
        assert!(fx.spawner.calls().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn failed_prebuild_job_leaves_build_unmarked() {
        let fx = Fixture::new(SpawnBehavior::Exit(1)).await;
        let mut repo = custom_repo("acme/shop", None);
        repo.custom_pre_build_cmd = Some(CommandTemplate::from("false"));
        let repo = fx.repo(repo).await;
        let id = fx.build(repo, "00001-shop", 8069).await;

        let err = run_prebuild_job(
            &lifecycle(),
            &fx.ctx,
            id,
            &fx.root().join("lock"),
            &fx.root().join("log"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Build(BuildError::PreBuildFailed { .. })));
        assert!(!fx.store.get(id).await.unwrap().prebuilt);
    }
}
