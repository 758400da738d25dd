mod ui;

use adw::prelude::*;
use gtk4::gio;
use gtk4::glib;
use libadwaita as adw;

use support_gtk::logger::setup_logger;
use support_gtk::settings::{app_cache_dir, load_app_settings};

use crate::ui::build_ui;

const APP_ID: &str = "nl.root3.Support";

fn main() -> glib::ExitCode {
    let settings = load_app_settings();
    let log_dir = if settings.log_to_file {
        app_cache_dir()
    } else {
        None
    };
    match setup_logger(settings.log_level_filter(), log_dir.as_deref()) {
        Ok(Some(path)) => log::info!("Logging to {}", path.display()),
        Ok(None) => {}
        Err(err) => eprintln!("Failed to initialize logging: {:#}", err),
    }

    adw::init().expect("Failed to initialize libadwaita");

    let app = adw::Application::builder()
        .application_id(APP_ID)
        .flags(gio::ApplicationFlags::FLAGS_NONE)
        .build();

    app.connect_activate(move |app| build_ui(app, &settings));

    app.run()
}
