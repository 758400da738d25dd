use std::rc::Weak;

use gtk::pango;
use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;

use support_gtk::helpers::{last_checked_text, pending_summary};
use support_gtk::state::{CatalogController, CatalogState};
use support_gtk::types::UpdateItem;

pub(crate) struct UpdatesWidgets {
    pub(crate) summary_label: gtk::Label,
    pub(crate) spinner: gtk::Spinner,
    pub(crate) list: gtk::ListBox,
    pub(crate) scroller: gtk::ScrolledWindow,
    pub(crate) placeholder: gtk::Box,
    pub(crate) placeholder_label: gtk::Label,
    pub(crate) check_button: gtk::Button,
    pub(crate) refresh_button: gtk::Button,
    pub(crate) visible_switch: gtk::Switch,
    pub(crate) footer_label: gtk::Label,
}

pub(crate) fn build_page() -> (gtk::Box, UpdatesWidgets) {
    let container = gtk::Box::builder()
        .orientation(gtk::Orientation::Vertical)
        .spacing(12)
        .margin_start(16)
        .margin_end(16)
        .margin_top(8)
        .margin_bottom(16)
        .build();
    container.set_vexpand(true);

    let summary_row = gtk::Box::builder()
        .orientation(gtk::Orientation::Horizontal)
        .spacing(8)
        .hexpand(true)
        .build();

    let summary_label = gtk::Label::builder()
        .halign(gtk::Align::Start)
        .wrap(true)
        .wrap_mode(pango::WrapMode::WordChar)
        .build();
    summary_label.add_css_class("dim-label");
    summary_label.set_hexpand(true);
    summary_label.set_valign(gtk::Align::Center);
    summary_row.append(&summary_label);

    let spinner = gtk::Spinner::new();
    spinner.set_visible(false);
    spinner.set_valign(gtk::Align::Center);
    summary_row.append(&spinner);

    let switch_label = gtk::Label::new(Some("Show app updates"));
    switch_label.set_valign(gtk::Align::Center);
    summary_row.append(&switch_label);

    let visible_switch = gtk::Switch::new();
    visible_switch.set_valign(gtk::Align::Center);
    summary_row.append(&visible_switch);

    let refresh_button = gtk::Button::builder()
        .icon_name("view-refresh-symbolic")
        .valign(gtk::Align::Center)
        .tooltip_text("Check for app updates")
        .build();
    refresh_button.set_focus_on_click(false);
    refresh_button.add_css_class("flat");
    summary_row.append(&refresh_button);

    container.append(&summary_row);

    let placeholder = gtk::Box::builder()
        .orientation(gtk::Orientation::Vertical)
        .spacing(12)
        .build();
    placeholder.set_valign(gtk::Align::Center);
    placeholder.set_halign(gtk::Align::Center);
    placeholder.set_vexpand(true);

    let placeholder_label = gtk::Label::builder()
        .halign(gtk::Align::Center)
        .wrap(true)
        .wrap_mode(pango::WrapMode::WordChar)
        .build();
    placeholder_label.add_css_class("title-4");
    placeholder.append(&placeholder_label);

    let check_button = gtk::Button::builder().label("Check for updates").build();
    check_button.add_css_class("suggested-action");
    check_button.set_halign(gtk::Align::Center);
    placeholder.append(&check_button);
    container.append(&placeholder);

    let list = gtk::ListBox::new();
    list.set_selection_mode(gtk::SelectionMode::None);
    list.add_css_class("boxed-list");

    let scroller = gtk::ScrolledWindow::builder()
        .hscrollbar_policy(gtk::PolicyType::Never)
        .vexpand(true)
        .child(&list)
        .build();
    scroller.set_visible(false);
    container.append(&scroller);

    let footer_label = gtk::Label::builder().halign(gtk::Align::Start).build();
    footer_label.add_css_class("dim-label");
    footer_label.add_css_class("caption");
    container.append(&footer_label);

    let widgets = UpdatesWidgets {
        summary_label,
        spinner,
        list,
        scroller,
        placeholder,
        placeholder_label,
        check_button,
        refresh_button,
        visible_switch,
        footer_label,
    };

    (container, widgets)
}

impl UpdatesWidgets {
    /// Mirrors the published catalog state into the page.
    pub(crate) fn render(
        &self,
        state: &CatalogState,
        installed: bool,
        controller: &Weak<CatalogController>,
    ) {
        let loading = state.updates_loading;
        self.spinner.set_visible(loading);
        if loading {
            self.spinner.start();
        } else {
            self.spinner.stop();
        }

        self.check_button.set_sensitive(installed && !loading);
        self.refresh_button.set_sensitive(installed && !loading);
        if self.visible_switch.is_active() != state.show_app_updates {
            self.visible_switch.set_active(state.show_app_updates);
        }

        self.summary_label.set_text(&pending_summary(state.app_updates));
        self.footer_label
            .set_text(&last_checked_text(state.last_update_check, loading));

        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }

        let placeholder_text = if !installed {
            Some("App Catalog is not installed.")
        } else if !state.show_app_updates {
            Some("App updates are hidden.")
        } else if state.update_details.is_empty() {
            Some("All apps are up to date!")
        } else {
            None
        };

        match placeholder_text {
            Some(text) => {
                self.placeholder_label.set_text(text);
                self.placeholder.set_visible(true);
                self.scroller.set_visible(false);
            }
            None => {
                for item in &state.update_details {
                    let row = build_update_row(item, state.is_updating(&item.id), controller);
                    self.list.append(&row);
                }
                self.placeholder.set_visible(false);
                self.scroller.set_visible(true);
            }
        }
    }
}

fn build_update_row(
    item: &UpdateItem,
    updating: bool,
    controller: &Weak<CatalogController>,
) -> adw::ActionRow {
    let row = adw::ActionRow::builder()
        .title(item.name.as_str())
        .subtitle(item.version_label().as_str())
        .use_markup(false)
        .build();
    row.set_tooltip_text(Some(item.id.as_str()));

    if updating {
        let spinner = gtk::Spinner::new();
        spinner.set_valign(gtk::Align::Center);
        spinner.start();
        row.add_suffix(&spinner);
        return row;
    }

    let button = gtk::Button::builder()
        .label("Update")
        .valign(gtk::Align::Center)
        .build();
    let controller = controller.clone();
    let id = item.id.clone();
    button.connect_clicked(move |_| {
        if let Some(controller) = controller.upgrade() {
            controller.update_app(&id);
        }
    });
    row.add_suffix(&button);
    row
}
