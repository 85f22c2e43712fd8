use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use apphub::cluster::NoopPodClient;
use apphub::db::{identity_repo, Database};
use apphub::lifecycle::Manager;
use apphub::reaper::Supervisor;
use apphub::secret::Cipher;
use apphub::seed::Seeder;
use apphub::settings::Settings;
use secrecy::ExposeSecret;

fn main() {
    if let Err(e) = run() {
        eprintln!("apphub: {}", e);
        std::process::exit(1);
    }
}

fn run() -> apphub::Result<()> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load(path.as_deref())?;
    apphub::logging::init(&settings.log)?;
    settings.validate()?;
    let settings = Arc::new(settings);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting hub");

    let db = Database::open(&settings.hub.db.path)?;
    Seeder::new(
        db.clone(),
        &settings.hub.db.seed_path,
        &settings.hub.file.path,
    )
    .seed()?;

    let cipher = Cipher::new(settings.encryption.passphrase.expose_secret())?;
    let sealed = identity_repo::seal_all(&db, &cipher)?;
    if sealed > 0 {
        tracing::info!(count = sealed, "Encrypted plaintext identity secrets");
    }

    let mut manager = Manager::new(
        db.clone(),
        Duration::from_secs(settings.shutdown.timeout),
    );
    manager.register(Box::new(Supervisor::new(
        db,
        Arc::clone(&settings),
        Arc::new(NoopPodClient),
    )));
    manager.run();

    let (tx, rx) = crossbeam_channel::bounded(1);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    }) {
        tracing::error!(error = %e, "Failed to install signal handler");
    }
    let _ = rx.recv();

    tracing::info!("Shutdown requested");
    manager.stop();
    Ok(())
}
