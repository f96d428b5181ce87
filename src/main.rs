use admin_collections::adapters::outbound::console::{
    LoadingSpinner, StderrNotifier, TablePresenter,
};
use admin_collections::adapters::outbound::network::{
    AdminApiClient, HttpCollectionTransport, HttpGrantProvider,
};
use admin_collections::adapters::outbound::system::SystemClock;
use admin_collections::application::collection_cache::CollectionCache;
use admin_collections::application::list_view::ListViewModel;
use admin_collections::application::read_models::{ContentState, ListViewSnapshot};
use admin_collections::application::use_cases::PermissionResolver;
use admin_collections::cli::{Args, Command, FilterArg};
use admin_collections::collections::domain::{QuerySignature, ResourceId, SearchMode};
use admin_collections::config::{
    discover_config, load_config_from_path, AppConfig, ConfigOverrides, ResourceBinding,
    TOKEN_ENV_VAR,
};
use admin_collections::observability::init_tracing;
use admin_collections::ports::inbound::{CollectionViewPort, ViewIntent};
use admin_collections::ports::outbound::{Notifier, ViewPresenter};
use admin_collections::shared::error::{AdminError, ConfirmError, ExitCode};
use admin_collections::shared::Result;
use std::io::{self, BufRead, IsTerminal, Write};
use std::process;
use std::sync::Arc;

type Session = ListViewModel<Arc<HttpCollectionTransport>, Arc<HttpGrantProvider>>;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();
    init_tracing(args.verbose);

    let code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            ExitCode::ApplicationError
        }
    };
    process::exit(code.as_i32());
}

async fn run(args: Args) -> Result<ExitCode> {
    let file = match &args.config {
        Some(path) => Some(load_config_from_path(path)?),
        None => discover_config(&std::env::current_dir()?)?,
    };
    let overrides = ConfigOverrides {
        base_url: args.base_url,
        token: args.token,
    };
    let config = AppConfig::resolve(file, overrides, std::env::var(TOKEN_ENV_VAR).ok())?;

    match args.command {
        Command::Resources => {
            print_resources(&config);
            Ok(ExitCode::Success)
        }
        Command::List {
            class,
            search,
            page,
            page_size,
            filter,
        } => {
            let binding = config.binding(&class)?;
            let signature = build_signature(&config, binding, search, page, page_size, filter);
            let view = open_view(&config, binding)?.with_signature(signature);
            list(&view).await
        }
        Command::Delete { class, ids, yes } => {
            let binding = config.binding(&class)?;
            let signature = QuerySignature::new(binding.descriptor.class.clone())
                .with_page_size(config.default_page_size);
            let view = open_view(&config, binding)?.with_signature(signature);
            delete(&view, ids, yes).await
        }
    }
}

fn print_resources(config: &AppConfig) {
    println!(
        "{:<16} {:<8} {:<32} IMMUTABLE WHEN",
        "CLASS", "SEARCH", "LIST PATH"
    );
    for binding in &config.resources {
        let descriptor = &binding.descriptor;
        let mode = match descriptor.search_mode {
            SearchMode::Client => "client",
            SearchMode::Server => "server",
        };
        println!(
            "{:<16} {:<8} {:<32} {}",
            descriptor.class.as_str(),
            mode,
            binding.endpoint.list_path,
            descriptor.immutability.describe()
        );
    }
}

fn build_signature(
    config: &AppConfig,
    binding: &ResourceBinding,
    search: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
    filters: Vec<FilterArg>,
) -> QuerySignature {
    let mut signature = QuerySignature::new(binding.descriptor.class.clone())
        .with_page_size(page_size.unwrap_or(config.default_page_size))
        .with_page(page.unwrap_or(1));
    for filter in filters {
        signature = signature.with_filter(filter.key, filter.value);
    }
    match search {
        Some(text) => signature.with_search(text),
        None => signature,
    }
}

/// Wires the adapters for one resource class
fn open_view(config: &AppConfig, binding: &ResourceBinding) -> Result<Session> {
    let base_url = config
        .base_url
        .as_deref()
        .ok_or_else(|| AdminError::InvalidConfig {
            message: "base_url is not set".to_string(),
            hint: "Pass --base-url or set base_url in admin-collections.config.yml".to_string(),
        })?;

    let api = Arc::new(AdminApiClient::new(
        base_url,
        config.api_token.clone(),
        config.request_timeout_secs,
    )?);
    let transport = Arc::new(
        HttpCollectionTransport::new(api.clone())
            .with_endpoint(binding.descriptor.class.clone(), binding.endpoint.clone()),
    );
    let grants = Arc::new(HttpGrantProvider::new(api));
    let notifier: Arc<dyn Notifier> = Arc::new(StderrNotifier::new(io::stderr().is_terminal()));

    let cache = CollectionCache::new(
        transport,
        notifier.clone(),
        Arc::new(SystemClock),
        config.cache,
    );
    let resolver = Arc::new(PermissionResolver::new(grants));

    Ok(ListViewModel::new(
        binding.descriptor.clone(),
        config.caller_identity(),
        resolver,
        cache,
        notifier,
    ))
}

async fn mount_with_spinner(view: &Session) -> ListViewSnapshot {
    let message = format!("Loading {}...", view.descriptor().class);
    let spinner = if io::stderr().is_terminal() {
        LoadingSpinner::start(message)
    } else {
        LoadingSpinner::hidden()
    };
    let snapshot = view.mount().await;
    spinner.finish();
    snapshot
}

fn ensure_loaded(snapshot: &ListViewSnapshot, action: &str) -> Result<()> {
    let class = snapshot.resource_class.to_string();
    match snapshot.content {
        ContentState::Forbidden => Err(AdminError::AccessDenied {
            class,
            action: action.to_string(),
        }
        .into()),
        ContentState::Unavailable => Err(AdminError::CollectionUnavailable {
            class,
            details: snapshot
                .last_error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
        }
        .into()),
        _ => Ok(()),
    }
}

async fn list(view: &Session) -> Result<ExitCode> {
    let snapshot = mount_with_spinner(view).await;
    ensure_loaded(&snapshot, "read")?;
    TablePresenter::new().present(&snapshot)?;
    Ok(ExitCode::Success)
}

async fn delete(view: &Session, ids: Vec<String>, yes: bool) -> Result<ExitCode> {
    let snapshot = mount_with_spinner(view).await;
    if !snapshot.permissions.can_delete {
        return Err(AdminError::AccessDenied {
            class: snapshot.resource_class.to_string(),
            action: "delete".to_string(),
        }
        .into());
    }

    let ids: Vec<ResourceId> = ids.into_iter().map(ResourceId::new).collect();
    view.dispatch(ViewIntent::RequestDelete(ids)).await?;

    // The gate holds the deduplicated targets
    let confirmation = view.confirmation();
    let count = confirmation.target_ids.len();
    let targets = confirmation
        .target_ids
        .iter()
        .map(ResourceId::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let class = snapshot.resource_class;

    if !yes && !prompt_yes_no(&format!("Delete {} {} ({})?", count, class, targets))? {
        view.dispatch(ViewIntent::Cancel).await?;
        eprintln!("Cancelled.");
        return Ok(ExitCode::Success);
    }

    match view.dispatch(ViewIntent::Confirm).await {
        Ok(()) => {
            eprintln!("✅ Deleted {} {} ({}).", count, class, targets);
            Ok(ExitCode::Success)
        }
        Err(ConfirmError::Mutation(error)) => {
            // Backend rejections were already reported by the notifier
            if error.is_precondition() {
                eprintln!("❌ {}", error);
            }
            Ok(ExitCode::MutationRejected)
        }
        Err(error) => Err(error.into()),
    }
}

fn prompt_yes_no(question: &str) -> Result<bool> {
    eprint!("{} [y/N] ", question);
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
