#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use std::io::Write;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lightspawn::cli;
use lightspawn::config::{ProjectConfiguration, RunMode, SpawnConfig};
use lightspawn::constants::PHP_CGI_BINARY;
use lightspawn::logging::{self, SupervisorLogger};
use lightspawn::models::{ServerHandle, ServerOptions};
use lightspawn::output;
use lightspawn::project::Project;
use lightspawn::render::Renderer;
use lightspawn::rules::{ConfigGenerator, RuleSnapshotBuilder};
use lightspawn::server::{self, Lighttpd, Server};
use lightspawn::supervisor::{RestartMarker, RestartSupervisor, SupervisorState, WorkerExit};
use lightspawn::tail::{MultiTail, Tail};

/// Time left to the event printer to drain the channel after the supervisor returns
const EVENT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// How often single-process mode checks for a pending signal
const SIGNAL_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// How long single-process mode waits for the server to exit after SIGTERM
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = cli::parse_args()?;
    logging::init(args.verbose);

    let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
    let file_config = match args.config {
        Some(ref path) => ProjectConfiguration::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ProjectConfiguration::discover(&cwd)?,
    };
    let config = SpawnConfig::resolve(&args, &file_config, &cwd)?;
    let project = Project::from_config(&config)?;

    output::print_version();

    if config.mode == RunMode::Kill {
        return Ok(kill(&project));
    }

    let server: Arc<dyn Server> = Arc::new(Lighttpd::new(config.lighttpd_cmd.clone()));
    if server.is_running(&project.pid_file()) {
        log::warn!(
            "A server is already running for this project, stop it with --kill ({})",
            project.pid_file().display()
        );
    }

    project
        .rotate(true)
        .context("Failed to prepare the cache and log directories")?;

    let php_cgi_cmd = config.php_cgi_cmd.clone().unwrap_or_else(|| {
        server::find_executable(PHP_CGI_BINARY)
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| PHP_CGI_BINARY.to_string())
    });

    let server_options = ServerOptions {
        document_root: project.web_dir().to_path_buf(),
        port: config.port,
        bind: config.bind.clone(),
        error_log: project.error_log(),
        access_log: project.access_log(),
        pid_file: project.pid_file(),
        rules_file: Some(project.rules_file()),
        php_cgi_cmd,
        fastcgi_socket: project.fastcgi_socket(),
    };

    let builder = RuleSnapshotBuilder::new(Renderer::new()?, config.scan.clone(), server_options);
    let generator = Arc::new(ConfigGenerator::new(builder, project.config_file(), project.rules_file()));

    let executable = server.resolve_executable()?;

    let (rules, snapshot) = generator
        .generate()
        .context("Failed to generate the lighttpd configuration")?;
    generator
        .write(&snapshot, true)
        .context("Failed to write the lighttpd configuration")?;

    let handle = ServerHandle {
        pid_file: project.pid_file(),
        config_file: project.config_file(),
        rules_file: project.rules_file(),
        command: server.build_command(&executable, &project.config_file()),
        working_dir: project.root_dir().to_path_buf(),
    };
    log::debug!("Server command: {}", handle.command);

    print!(
        "{}",
        output::format_banner(server.name(), config.bind.as_deref(), config.port, rules.allowed_scripts())
    );
    std::io::stdout().flush()?;

    match config.mode {
        RunMode::SingleProcess => run_single_process(server, handle).await,
        _ => run_supervised(server, generator, handle, &project, &config).await,
    }
}

/// Stop the server of a previous invocation; exit 1 when nothing was running
fn kill(project: &Project) -> ExitCode {
    if let Err(e) = RestartMarker::new(project.restart_marker()).consume() {
        log::warn!("Failed to remove the restart marker: {}", e);
    }

    if Lighttpd::default().kill_by_pid_file(&project.pid_file()) {
        println!("Server stopped.");
        ExitCode::SUCCESS
    } else {
        println!("No running server found.");
        ExitCode::FAILURE
    }
}

async fn run_single_process(server: Arc<dyn Server>, handle: ServerHandle) -> Result<ExitCode> {
    // Stay alive on Ctrl+C or SIGTERM to stop the server and report its exit
    let interrupted = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, interrupted.clone())
        .context("Failed to register SIGINT handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, interrupted.clone())
        .context("Failed to register SIGTERM handler")?;

    let pid_file = handle.pid_file.clone();
    let runner = server.clone();
    let mut task = tokio::task::spawn_blocking(move || runner.start(&handle.command, &handle.working_dir));

    let mut ticker = tokio::time::interval(SIGNAL_CHECK_INTERVAL);
    let mut deadline = None;
    let status = loop {
        tokio::select! {
            result = &mut task => break result.context("Server task failed")??,
            _ = ticker.tick() => {}
        }

        match deadline {
            None if interrupted.load(Ordering::Relaxed) => {
                log::debug!("Signal received, stopping {}", server.name());
                server.kill_by_pid_file(&pid_file);
                deadline = Some(Instant::now() + SHUTDOWN_GRACE);
            }
            Some(at) if Instant::now() >= at => {
                log::warn!("{} did not exit after SIGTERM", server.name());
                println!("Terminated.");
                // The blocking start cannot be joined; leave without waiting for it
                std::process::exit(WorkerExit::Interrupted.exit_code());
            }
            _ => {}
        }
    };
    log::debug!("Server exited with {}", status);

    println!("Terminated.");
    Ok(ExitCode::SUCCESS)
}

async fn run_supervised(
    server: Arc<dyn Server>,
    generator: Arc<ConfigGenerator>,
    handle: ServerHandle,
    project: &Project,
    config: &SpawnConfig,
) -> Result<ExitCode> {
    let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel::<lightspawn::supervisor::SupervisorEvent>();
    let printer = tokio::spawn(async move {
        let mut state = SupervisorState::default();
        while let Some(event) = receiver.recv().await {
            if event.state() != state {
                log::debug!("Supervisor state {:?} -> {:?}", state, event.state());
                state = event.state();
            }
            output::print_event(&event);
        }
    });

    let mut supervisor = RestartSupervisor::new(
        server,
        generator,
        handle,
        RestartMarker::new(project.restart_marker()),
        config.polling_interval,
        SupervisorLogger::new(project.root_dir()),
    )
    .with_events(sender);

    if config.tail {
        let mut tail = MultiTail::new();
        tail.add("access", Tail::attach(project.access_log()));
        tail.add("error", Tail::attach(project.error_log()));
        supervisor = supervisor.with_tail(tail);
    }

    let exit = supervisor.run().await?;
    let _ = tokio::time::timeout(EVENT_DRAIN_TIMEOUT, printer).await;

    if exit == WorkerExit::Interrupted {
        // The blocking worker cannot be joined; leave without waiting for it
        std::process::exit(exit.exit_code());
    }

    Ok(ExitCode::from(exit.exit_code() as u8))
}
