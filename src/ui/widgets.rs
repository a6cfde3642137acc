use adw::{self, NavigationSplitView, NavigationPage};
use relm4::gtk;
use gtk::prelude::*;

use crate::ui::sidebar::NavButton;

pub struct AppWidgets {
    pub window_title: adw::WindowTitle,
    pub navigation_split_view: NavigationSplitView,
    pub navigation_page: NavigationPage,
    pub content_stack: gtk::Stack,

    // Header buttons
    pub back_button: gtk::Button,
    pub sidebar_toggle_button: gtk::Button,

    // Sidebar entries, in sidebar order
    pub nav_buttons: Vec<NavButton>,

    // Settings widgets
    pub theme_combo: adw::ComboRow,
    pub hide_console_switch: adw::SwitchRow,
    pub confirm_switch: adw::SwitchRow,

    // Error page
    pub error_label: gtk::Label,
}

impl AppWidgets {
    pub fn nav_button(&self, section: crate::models::Section) -> Option<&NavButton> {
        self.nav_buttons.iter().find(|b| b.section == section)
    }

    pub fn clear_sidebar_selection(&self) {
        for nav in &self.nav_buttons {
            nav.button.remove_css_class("suggested-action");
        }
    }
}
