use clap::Parser;
use proposal_gen::core::{pricing, ConfigProvider, Storage};
use proposal_gen::utils::error::ProposalError;
use proposal_gen::utils::{logger, validation::Validate};
use proposal_gen::{Catalog, CliConfig, LocalStorage, ProposalEngine, ProposalPipeline};

const FORM_INCOMPLETE: &str = "Preencha o nome do cliente e selecione o modelo.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting proposal-gen CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證命令列參數
    if let Err(e) = cli.validate() {
        tracing::error!("❌ Input validation failed: {}", e);
        if matches!(&e, ProposalError::InvalidConfigValueError { field, .. } if field == "client_name") {
            eprintln!("❌ {}", FORM_INCOMPLETE);
            std::process::exit(1);
        }
        exit_with(e);
    }

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(e);
    }

    if !std::path::Path::new(config.dataset_path()).exists() {
        tracing::error!("❌ Dataset not found: {}", config.dataset_path());
        eprintln!("❌ Arquivo {} não encontrado.", config.dataset_path());
        std::process::exit(1);
    }

    let storage = LocalStorage::new(".");
    let catalog = match load_catalog(&storage, config.dataset_path(), config.dataset_delimiter()).await {
        Ok(catalog) => catalog,
        Err(e) => exit_with(e),
    };
    tracing::info!("📚 Loaded {} kits from {}", catalog.len(), config.dataset_path());

    if cli.list_kits {
        for kit in catalog.search(&cli.search) {
            println!("{}\t{}\t{}", kit.code, kit.description, kit.area);
        }
        return Ok(());
    }

    let request = match cli.build_request(&catalog) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("❌ {}", e);
            eprintln!("❌ {}", FORM_INCOMPLETE);
            std::process::exit(1);
        }
    };

    if cli.dry_run {
        let summary = pricing::calculate(&catalog, &request, chrono::Local::now().date_naive());
        for (token, value) in summary.substitutions().iter() {
            println!("{:<26} {}", token, value);
        }
        if cli.verbose {
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(e) => exit_with(e.into()),
            }
        }
        return Ok(());
    }

    let monitor_enabled = cli.monitor || config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = ProposalPipeline::new(storage, config, request);
    let engine = ProposalEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Proposal generated successfully!");
            println!("✅ Proposta gerada com sucesso!");
            println!("📁 {}", output_path);
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

async fn load_catalog(storage: &LocalStorage, path: &str, delimiter: u8) -> proposal_gen::Result<Catalog> {
    let data = storage.read_file(path).await?;
    Catalog::from_csv(&data, delimiter)
}

fn exit_with(e: ProposalError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Proposal generation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    std::process::exit(e.exit_code())
}
