use std::path::PathBuf;

use clap::Parser;
use log::warn;

use gtx_keepalive::browser::chrome::ChromeDriver;
use gtx_keepalive::core::runner::BatchRunner;
use gtx_keepalive::utils::logging::init_logging;
use gtx_keepalive::Settings;

/// Command-line arguments. Credentials and server targets come from the
/// environment: REMEMBER_WEB_COOKIE, LOGIN_EMAIL, LOGIN_PASSWORD,
/// SERVER_LIST (JSON array of {url, name}) and SERVER_URLS
/// (comma-separated URLs).
#[derive(Parser, Debug)]
#[command(name = "gtx_keepalive", version)]
struct Args {
    /// Run with a visible browser window for local debugging
    #[arg(long)]
    headed: bool,

    /// Chrome/Chromium executable to launch (auto-detected when omitted)
    #[arg(long, env = "CHROME_PATH")]
    chrome: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    init_logging();
    let args = Args::parse();

    let mut settings = Settings::from_env();
    settings.browser.headless = !args.headed;
    settings.browser.chrome_path = args.chrome;

    // Configuration errors never start a browser.
    if let Err(e) = settings.ensure_runnable() {
        eprintln!("configuration error: {e}");
        std::process::exit(1);
    }

    let driver = match ChromeDriver::launch(&settings.browser).await {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("browser error: {e}");
            std::process::exit(1);
        }
    };

    // The runner absorbs every failure into the summary, so the browser is
    // torn down on all paths before the process exits.
    let summary = BatchRunner::new(&driver, &settings).run().await;
    if let Err(e) = driver.close().await {
        warn!("browser did not shut down cleanly: {}", e);
    }

    std::process::exit(if summary.is_success() { 0 } else { 1 });
}
