pub mod logging;
pub mod service_runner;

use crate::config::Settings;

pub use logging::init_tracing;

/// Run the sync engine for `user_id` until the process is asked to stop
pub async fn setup_and_run(settings: Settings, user_id: String) -> std::io::Result<()> {
    let runtime = service_runner::build_runtime(&settings)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    service_runner::run_until_shutdown(runtime, user_id).await
}
