pub(crate) mod app;
pub(crate) mod updates;

pub(crate) use app::build_ui;
pub(crate) use updates::build_page as build_updates_page;
