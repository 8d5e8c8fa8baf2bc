use dotenvy::dotenv;
use portal_core::observability::init_tracing;
use session_store::config::get_configuration;
use session_store::SessionStore;

/// Report the persisted session; `session-status logout` clears it first.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let settings = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "session-store",
        &settings.telemetry.log_level,
        settings.telemetry.otlp_endpoint.as_deref(),
    );

    let store = SessionStore::from_settings(&settings)?;
    store.initialize_auth().await?;

    if std::env::args().nth(1).as_deref() == Some("logout") {
        store.logout()?;
    }

    let state = store.snapshot();
    match state.user() {
        Some(user) if state.is_authenticated() => println!(
            "authenticated as [{}] {} <{}> (role: {})",
            user.initials(),
            user.full_name(),
            user.email,
            user.role
        ),
        _ => println!("anonymous"),
    }

    Ok(())
}
