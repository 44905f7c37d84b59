use clap::Parser;
use cutter_console::core::orchestrator::DEPLOY_ACK;
use cutter_console::utils::{logger, validation::Validate};
use cutter_console::{
    CliArgs, Classifier, HttpProbe, ProcessOrchestrator, RequestAdapter, ReqwestTransport,
    Session, SystemRunner,
};
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting cutter-console");

    // 載入並驗證配置
    let config = match args.load_config().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(
                "❌ Configuration failed: {} (Category: {:?})",
                e,
                e.category()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    tracing::debug!("Config: {:?}", config);

    let transport = ReqwestTransport::new(config.backend.request_timeout())?;
    let backend = RequestAdapter::new(transport, config.backend.resolved_base_url());
    tracing::info!("📡 Backend base URL: {}", backend.base_url());

    let mut session: Session<_, SystemRunner, HttpProbe> =
        Session::new(backend, Classifier::new(config.classifier.precedence))
            .with_clean_start(config.lifecycle.clean_start)
            .with_stop_on_success(config.lifecycle.stop_on_success);

    if args.attach {
        tracing::info!("Attached mode: backend process is not managed");
    } else {
        let probe = HttpProbe::new(
            &config.backend.host,
            &config.lifecycle.health_path,
            PROBE_TIMEOUT,
        )?;
        let mut orchestrator = ProcessOrchestrator::new(SystemRunner, probe, &config);

        if config.lifecycle.auto_start
            && orchestrator.start(config.lifecycle.clean_start).await.is_some()
            && config.lifecycle.auto_deploy
            && orchestrator.deploy().is_some()
        {
            println!("{}", DEPLOY_ACK);
        }

        session = session.with_orchestrator(orchestrator);
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let summary = session.run(stdin, &mut stdout).await?;

    if session.shutdown().await {
        println!("Backend service stopped.");
    }

    tracing::info!(
        "✅ Goodbye ({} command(s), {} request(s))",
        summary.commands,
        summary.dispatched
    );

    Ok(())
}
