use adw::prelude::*;
use relm4::gtk;
use relm4::ComponentSender;

use crate::models::Section;
use crate::system::network::{self, ConnectionKind, ConnectionReport, UptimeResult};
use crate::ui::category::{
    add_subpage, boxed_list, clear_list, create_category_page, page_container, placeholder_row, text_row,
    CategoryOption,
};
use crate::ui::model::AppModel;
use crate::ui::msg::{AppMsg, NetworkMsg};

const OPTIONS: &[CategoryOption] = &[
    CategoryOption::page("Connections", "Wired and wireless connections", "network-wired-symbolic", "connection"),
    CategoryOption::page("Service Status", "Check whether common websites respond", "network-server-symbolic", "uptime"),
];

pub struct NetworkPage {
    pub root: gtk::Stack,
    check_button: gtk::Button,
    check_spinner: gtk::Spinner,
    report_label: gtk::Label,
    uptime_button: gtk::Button,
    uptime_spinner: gtk::Spinner,
    uptime_list: gtk::ListBox,
}

fn action_button(sender: &ComponentSender<AppModel>, label: &str, msg: impl Fn() -> NetworkMsg + 'static) -> gtk::Button {
    let button = gtk::Button::builder()
        .label(label)
        .css_classes(vec!["pill".to_string()])
        .build();
    let sender_clone = sender.clone();
    button.connect_clicked(move |_| {
        sender_clone.input(AppMsg::Network(msg()));
    });
    button
}

impl NetworkPage {
    pub fn new(sender: &ComponentSender<AppModel>) -> Self {
        let root = create_category_page(sender, Section::Network, OPTIONS);

        // Connections
        let (connection_page, connection_content) = page_container("Connections");
        let manage_box = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        manage_box.append(&action_button(sender, "Wired Connection", || {
            NetworkMsg::ManageConnection(ConnectionKind::Wired)
        }));
        manage_box.append(&action_button(sender, "Wireless Connection", || {
            NetworkMsg::ManageConnection(ConnectionKind::Wireless)
        }));

        let check_box = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        let check_button = action_button(sender, "Check Connection", || NetworkMsg::CheckConnection);
        check_button.add_css_class("suggested-action");
        let check_spinner = gtk::Spinner::new();
        check_box.append(&check_button);
        check_box.append(&check_spinner);

        let report_label = gtk::Label::builder()
            .wrap(true)
            .xalign(0.0)
            .selectable(true)
            .css_classes(vec!["monospace".to_string()])
            .build();

        connection_content.append(&manage_box);
        connection_content.append(&check_box);
        connection_content.append(&report_label);
        add_subpage(&root, "connection", &connection_page);

        // Service status
        let (uptime_page, uptime_content) = page_container("Service Status");
        let uptime_box = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        let uptime_button = action_button(sender, "Check Service Status", || NetworkMsg::CheckUptime);
        uptime_button.add_css_class("suggested-action");
        let uptime_spinner = gtk::Spinner::new();
        uptime_box.append(&uptime_button);
        uptime_box.append(&uptime_spinner);
        let uptime_list = boxed_list();
        uptime_list.append(&placeholder_row("No checks run yet"));
        uptime_content.append(&uptime_box);
        uptime_content.append(&uptime_list);
        add_subpage(&root, "uptime", &uptime_page);

        Self {
            root,
            check_button,
            check_spinner,
            report_label,
            uptime_button,
            uptime_spinner,
            uptime_list,
        }
    }

    fn show_report(&self, report: &ConnectionReport) {
        self.check_spinner.stop();
        self.check_button.set_sensitive(true);
        self.report_label.set_text(&report.render());
    }

    fn show_uptime(&self, results: &[UptimeResult]) {
        self.uptime_spinner.stop();
        self.uptime_button.set_sensitive(true);
        clear_list(&self.uptime_list);
        for result in results {
            let row = text_row(&result.domain, result.status());
            let icon = gtk::Image::from_icon_name(if result.up {
                "emblem-ok-symbolic"
            } else {
                "dialog-warning-symbolic"
            });
            row.add_suffix(&icon);
            self.uptime_list.append(&row);
        }
        if results.is_empty() {
            self.uptime_list.append(&placeholder_row("No websites configured"));
        }
    }
}

impl AppModel {
    pub(super) fn update_network(&mut self, msg: NetworkMsg) {
        match msg {
            NetworkMsg::ManageConnection(kind) => {
                if let Err(e) = network::open_connection_settings(kind) {
                    self.message("Could Not Open Network Settings", &e.user_message());
                }
            }
            NetworkMsg::CheckConnection => {
                self.network.check_button.set_sensitive(false);
                self.network.check_spinner.start();
                self.network.report_label.set_text("Checking connection...");
                let hosts = self.settings.ping_hosts.clone();
                self.spawn_load(async move { network::check_connection(&hosts).await }, |report| {
                    AppMsg::Network(NetworkMsg::ConnectionChecked(report))
                });
            }
            NetworkMsg::ConnectionChecked(report) => {
                self.log(&report.render());
                self.network.show_report(&report);
            }
            NetworkMsg::CheckUptime => {
                self.network.uptime_button.set_sensitive(false);
                self.network.uptime_spinner.start();
                let urls = self.settings.uptime_urls.clone();
                self.spawn_load(async move { network::check_uptime(&urls).await }, |result| {
                    AppMsg::Network(NetworkMsg::UptimeChecked(result.map_err(|e| e.user_message())))
                });
            }
            NetworkMsg::UptimeChecked(Ok(results)) => self.network.show_uptime(&results),
            NetworkMsg::UptimeChecked(Err(e)) => {
                self.network.show_uptime(&[]);
                self.message("Service Check Failed", &e);
            }
        }
    }
}
