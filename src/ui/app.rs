use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;
use gtk::glib;

use support_gtk::settings::{AppSettings, save_app_settings};
use support_gtk::state::{CatalogController, CatalogMessage};

use crate::ui::build_updates_page;

const MESSAGE_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub(crate) fn build_ui(app: &adw::Application, settings: &AppSettings) {
    let settings = Rc::new(RefCell::new(settings.clone()));
    let (initial_width, initial_height) = {
        let settings = settings.borrow();
        (
            settings.window_width.unwrap_or(720),
            settings.window_height.unwrap_or(560),
        )
    };

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Support")
        .default_width(initial_width)
        .default_height(initial_height)
        .build();

    let root_box = gtk::Box::new(gtk::Orientation::Vertical, 0);
    window.set_content(Some(&root_box));

    let header_bar = adw::HeaderBar::new();
    header_bar.set_title_widget(Some(&adw::WindowTitle::new("Support", "App Catalog")));
    root_box.append(&header_bar);

    let (page, widgets) = build_updates_page();
    root_box.append(&page);

    let (sender, receiver) = mpsc::channel::<CatalogMessage>();
    let controller = Rc::new(CatalogController::from_settings(&settings.borrow(), sender));
    let widgets = Rc::new(widgets);

    {
        let controller_weak = Rc::downgrade(&controller);
        let widgets = widgets.clone();
        controller.connect_changed(move |state| {
            let Some(controller) = controller_weak.upgrade() else {
                return;
            };
            widgets.render(state, controller.catalog_installed(), &controller_weak);
        });
    }

    // Worker results are applied here, on the GLib main context.
    let controller_clone = controller.clone();
    glib::timeout_add_local(MESSAGE_POLL_INTERVAL, move || {
        while let Ok(msg) = receiver.try_recv() {
            controller_clone.handle_message(msg);
        }
        glib::ControlFlow::Continue
    });

    for button in [&widgets.check_button, &widgets.refresh_button] {
        let controller_weak = Rc::downgrade(&controller);
        button.connect_clicked(move |_| {
            if let Some(controller) = controller_weak.upgrade() {
                controller.check_updates();
            }
        });
    }

    {
        let controller_weak = Rc::downgrade(&controller);
        let settings = settings.clone();
        widgets.visible_switch.connect_active_notify(move |switch| {
            let visible = switch.is_active();
            settings.borrow_mut().show_app_updates = visible;
            if let Some(controller) = controller_weak.upgrade() {
                controller.set_show_app_updates(visible);
            }
        });
    }

    let settings_for_close = settings.clone();
    window.connect_close_request(move |win| {
        let width = win.width();
        let height = win.height();
        if width > 0 && height > 0 {
            let mut data = settings_for_close.borrow_mut();
            data.window_width = Some(width);
            data.window_height = Some(height);
        }
        if let Err(err) = save_app_settings(&settings_for_close.borrow()) {
            log::warn!("Failed to save settings: {}", err);
        }
        glib::Propagation::Proceed
    });

    widgets.render(
        &controller.snapshot(),
        controller.catalog_installed(),
        &Rc::downgrade(&controller),
    );
    if controller.show_app_updates() {
        controller.check_updates();
    }

    window.present();
}
