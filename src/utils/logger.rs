use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "proposal_gen=info";
const VERBOSE_FILTER: &str = "proposal_gen=debug,info";

/// `RUST_LOG` 優先；否則依 `--verbose` 決定層級
pub fn init_cli_logger(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}
