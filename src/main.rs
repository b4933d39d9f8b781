use std::{
    io::{self, Read, Write},
    path::Path,
    process,
    sync::Arc,
};

use coralpress::{
    application::{
        error::AppError,
        pages::PageService,
        repos::ContentRepo,
        revalidation::{ContentChange, RevalidationClient, RevalidationHook},
        richtext::{RichTextRenderer, SlugPathResolver, SubmissionData},
    },
    cache::{CacheConfig, CacheState},
    config,
    domain::richtext::Document,
    infra::{
        content::FsContentRepo,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use coralpress_api_types::InvalidationRequest;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Render(args) => run_render(args).await,
        config::Command::Revalidate(args) => run_revalidate(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repo = FsContentRepo::new(&settings.content.root);
    repo.check_root().await?;
    let content: Arc<dyn ContentRepo> = Arc::new(repo);
    let pages = Arc::new(PageService::new(content, RichTextRenderer::default()));
    let cache = CacheState::new(CacheConfig::from(&settings.cache));

    if settings.revalidate.secret.is_none() {
        info!(
            target = "coralpress::serve",
            "revalidation secret not configured; /api/revalidate will reject every request"
        );
    }

    let state = HttpState {
        pages,
        cache,
        revalidate_secret: settings.revalidate.secret.as_deref().map(Arc::from),
        default_locale: Arc::from(settings.content.default_locale.as_str()),
    };

    serve_http(&settings, state).await
}

async fn run_render(args: config::RenderArgs) -> Result<(), AppError> {
    let raw = read_input(&args.file).await?;
    let document: Document = serde_json::from_slice(&raw)
        .map_err(|err| AppError::validation(format!("document is not valid JSON: {err}")))?;

    let mut renderer = RichTextRenderer::default();
    if let Some(locale) = args.locale {
        renderer = renderer.with_resolver(Arc::new(SlugPathResolver::new(locale)));
    }

    let submission: SubmissionData = args.submission.into_iter().collect();
    let submission = (!submission.is_empty()).then_some(&submission);

    let html = renderer.render(&document, submission)?.unwrap_or_default();

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{html}").map_err(InfraError::from)?;
    Ok(())
}

async fn read_input(path: &Path) -> Result<Vec<u8>, AppError> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .map_err(|err| InfraError::input("<stdin>", err))?;
        return Ok(buf);
    }
    Ok(tokio::fs::read(path)
        .await
        .map_err(|err| InfraError::input(path, err))?)
}

async fn run_revalidate(
    settings: config::Settings,
    args: config::RevalidateArgs,
) -> Result<(), AppError> {
    let client = RevalidationClient::from_settings(&settings.revalidate)?;

    if let Some(kind) = args.target.change {
        let change = ContentChange::from_kind(
            kind,
            args.locale.as_deref(),
            args.slug.as_deref(),
            args.id.as_deref(),
        )?;
        let report = RevalidationHook::new(client).after_change(&change).await;
        if report.sent == 0 && (report.failed > 0 || report.skipped > 0) {
            return Err(AppError::unexpected(format!(
                "no invalidation delivered ({} failed, {} skipped)",
                report.failed, report.skipped
            )));
        }
        return Ok(());
    }

    let request = match (args.target.tag, args.target.path) {
        (Some(tag), _) => InvalidationRequest::tag(tag),
        (None, Some(path)) => InvalidationRequest::path(path),
        (None, None) => {
            return Err(AppError::validation(
                "one of --tag, --path or --change is required",
            ));
        }
    };

    let response = client.send(&request).await?;

    info!(
        target = "coralpress::revalidate",
        endpoint = %client.endpoint(),
        kind = request.kind(),
        key = request.key(),
        ok = response.ok,
        "revalidation request accepted"
    );
    Ok(())
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| InfraError::bind(settings.server.addr, err))?;

    info!(
        target = "coralpress::serve",
        addr = %settings.server.addr,
        content_root = %settings.content.root.display(),
        "listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InfraError::from)?;

    info!(target = "coralpress::serve", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            target = "coralpress::serve",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
