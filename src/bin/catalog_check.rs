use std::env;
use std::sync::mpsc;

use anyhow::{Context, Result, bail};

use support_gtk::helpers::pending_summary;
use support_gtk::logger::setup_logger;
use support_gtk::settings::load_app_settings;
use support_gtk::state::CatalogController;

fn main() -> Result<()> {
    let settings = load_app_settings();
    setup_logger(settings.log_level_filter(), None)?;

    let update_target = parse_update_target(env::args().skip(1))?;

    let (sender, receiver) = mpsc::channel();
    let controller = CatalogController::from_settings(&settings, sender);

    if !controller.catalog_installed() {
        bail!(
            "App Catalog is not installed ({} / {}) or no authorization is stored",
            settings.app_path.display(),
            settings.cli_path.display()
        );
    }

    let started = match update_target.as_deref() {
        Some(id) => controller.update_app(id),
        None => controller.check_updates(),
    };
    if !started {
        bail!("Nothing was started; see the log for details");
    }

    while controller.is_checking() || !controller.snapshot().apps_updating.is_empty() {
        let msg = receiver
            .recv()
            .context("Worker exited without reporting a result")?;
        controller.handle_message(msg);
    }

    let state = controller.snapshot();
    if state.last_update_check.is_none() {
        bail!("No update results were published; see the log for details");
    }

    println!("{}", pending_summary(state.app_updates));
    for item in &state.update_details {
        println!("  {:<40} {:<30} {}", item.id, item.name, item.version_label());
    }

    Ok(())
}

fn parse_update_target(mut args: impl Iterator<Item = String>) -> Result<Option<String>> {
    match args.next().as_deref() {
        None => Ok(None),
        Some("--update") => match args.next() {
            Some(id) => Ok(Some(id)),
            None => bail!("--update requires an application identifier"),
        },
        Some(other) => bail!("Unknown argument '{}'. Usage: catalog_check [--update <id>]", other),
    }
}
