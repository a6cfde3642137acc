use std::cell::Cell;
use std::rc::Rc;

use adw::prelude::*;
use relm4::gtk;
use relm4::ComponentSender;

use crate::models::Section;
use crate::system::security::{self, FirewallStatus};
use crate::ui::category::{
    add_subpage, boxed_list, clear_list, create_category_page, info_row, page_container, placeholder_row,
    section_label, suffix_button, text_row, CategoryOption,
};
use crate::ui::dialogs;
use crate::ui::model::AppModel;
use crate::ui::msg::{AppMsg, SecurityMsg};
use crate::ui::task::{AfterTask, Task};

const OPTIONS: &[CategoryOption] = &[CategoryOption::page(
    "Firewall",
    "Control incoming connections with firewalld",
    "security-high-symbolic",
    "firewall",
)];

pub struct SecurityPage {
    pub root: gtk::Stack,
    status_row: adw::ActionRow,
    zone_row: adw::ActionRow,
    enabled_switch: adw::SwitchRow,
    applying_status: Rc<Cell<bool>>,
    install_button: gtk::Button,
    services_group: gtk::Box,
    services_list: gtk::ListBox,
}

fn security_msg(msg: SecurityMsg) -> AppMsg {
    AppMsg::Security(msg)
}

impl SecurityPage {
    pub fn new(sender: &ComponentSender<AppModel>) -> Self {
        let root = create_category_page(sender, Section::Security, OPTIONS);
        let (firewall_page, content) = page_container("Firewall");

        let status_list = boxed_list();
        let status_row = info_row("Status", "Checking...");
        let zone_row = info_row("Default Zone", "Unknown");
        let enabled_switch = adw::SwitchRow::builder()
            .title("Firewall")
            .subtitle("Run firewalld now and at every boot")
            .sensitive(false)
            .build();
        let applying_status = Rc::new(Cell::new(false));
        let sender_clone = sender.clone();
        let applying = applying_status.clone();
        enabled_switch.connect_active_notify(move |switch| {
            if !applying.get() {
                sender_clone.input(security_msg(SecurityMsg::SetEnabled(switch.is_active())));
            }
        });
        status_list.append(&status_row);
        status_list.append(&zone_row);
        status_list.append(&enabled_switch);

        let buttons = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        let install_button = gtk::Button::builder()
            .label("Install Firewall")
            .visible(false)
            .css_classes(vec!["pill".to_string(), "suggested-action".to_string()])
            .build();
        let sender_clone = sender.clone();
        install_button.connect_clicked(move |_| {
            sender_clone.input(security_msg(SecurityMsg::Install));
        });
        let config_button = gtk::Button::builder()
            .label("Advanced Configuration")
            .css_classes(vec!["pill".to_string()])
            .build();
        let sender_clone = sender.clone();
        config_button.connect_clicked(move |_| {
            sender_clone.input(security_msg(SecurityMsg::OpenConfig));
        });
        buttons.append(&install_button);
        buttons.append(&config_button);

        let services_group = gtk::Box::builder()
            .orientation(gtk::Orientation::Vertical)
            .spacing(12)
            .visible(false)
            .build();
        let services_list = boxed_list();
        let add_button = gtk::Button::builder()
            .label("Allow Service")
            .halign(gtk::Align::Start)
            .css_classes(vec!["pill".to_string()])
            .build();
        let sender_clone = sender.clone();
        add_button.connect_clicked(move |_| {
            sender_clone.input(security_msg(SecurityMsg::RequestAddService));
        });
        services_group.append(&section_label("Allowed Services"));
        services_group.append(&services_list);
        services_group.append(&add_button);

        content.append(&status_list);
        content.append(&buttons);
        content.append(&services_group);
        add_subpage(&root, "firewall", &firewall_page);

        Self {
            root,
            status_row,
            zone_row,
            enabled_switch,
            applying_status,
            install_button,
            services_group,
            services_list,
        }
    }

    fn show_status(&self, status: &FirewallStatus, sender: &ComponentSender<AppModel>) {
        self.status_row.set_subtitle(&status.summary());
        self.zone_row
            .set_subtitle(status.default_zone.as_deref().unwrap_or("Unknown"));
        self.install_button.set_visible(!status.installed);

        self.applying_status.set(true);
        self.enabled_switch.set_sensitive(status.installed);
        self.enabled_switch.set_active(status.running && status.enabled);
        self.applying_status.set(false);

        self.services_group.set_visible(status.running);
        clear_list(&self.services_list);
        for service in &status.services {
            let row = text_row(service, "");
            let button = suffix_button("Remove", Some("destructive-action"));
            let sender_clone = sender.clone();
            let name = service.clone();
            button.connect_clicked(move |_| {
                sender_clone.input(security_msg(SecurityMsg::RequestRemoveService(name.clone())));
            });
            row.add_suffix(&button);
            self.services_list.append(&row);
        }
        if status.services.is_empty() {
            self.services_list.append(&placeholder_row("No services are allowed"));
        }
    }
}

impl AppModel {
    pub(super) fn load_firewall(&self) {
        self.spawn_load(security::status(), |status| security_msg(SecurityMsg::StatusLoaded(status)));
    }

    fn show_add_service(&self, available: Vec<String>) {
        let choices: Vec<&str> = available
            .iter()
            .map(String::as_str)
            .filter(|s| !self.firewall.services.iter().any(|allowed| allowed.as_str() == *s))
            .collect();
        if choices.is_empty() {
            self.message("Allow Service", "Every known service is already allowed.");
            return;
        }
        let dropdown = gtk::DropDown::builder()
            .model(&gtk::StringList::new(&choices))
            .enable_search(true)
            .build();
        let names: Vec<String> = choices.iter().map(|s| s.to_string()).collect();
        let dialog = dialogs::form(
            self.window.as_ref(),
            "Allow Service",
            "Incoming connections for the selected service will be accepted in the default zone.",
            &dropdown,
            "Allow",
        );
        let sender = self.sender.clone();
        dialog.connect_response(None, move |d, response| {
            if response == "accept" {
                if let Some(name) = names.get(dropdown.selected() as usize) {
                    sender.input(security_msg(SecurityMsg::AddService(name.clone())));
                }
            }
            d.close();
        });
        dialog.present();
    }

    pub(super) fn update_security(&mut self, msg: SecurityMsg) {
        match msg {
            SecurityMsg::StatusLoaded(status) => {
                self.security.show_status(&status, &self.sender);
                self.firewall = status;
            }
            SecurityMsg::Install => {
                let task = Task::install("Firewall", &[security::FIREWALLD_PACKAGE]).after(AfterTask::ReloadFirewall);
                self.request_task(task);
            }
            SecurityMsg::SetEnabled(enable) => {
                self.log(&format!("$ {}", security::toggle_spec(enable).display()));
                self.spawn_action("Firewall", AfterTask::ReloadFirewall, async move {
                    security::set_enabled(enable).await?;
                    Ok(format!("Firewall {}", if enable { "enabled" } else { "disabled" }))
                });
            }
            SecurityMsg::RequestAddService => {
                self.spawn_load(security::available_services(), |result| {
                    security_msg(SecurityMsg::ServicesAvailable(result.map_err(|e| e.user_message())))
                });
            }
            SecurityMsg::ServicesAvailable(Ok(available)) => self.show_add_service(available),
            SecurityMsg::ServicesAvailable(Err(e)) => self.message("Could Not List Services", &e),
            SecurityMsg::AddService(name) => {
                self.spawn_action("Firewall", AfterTask::ReloadFirewall, async move {
                    security::set_service(&name, true).await?;
                    Ok(format!("{} is now allowed", name))
                });
            }
            SecurityMsg::RequestRemoveService(name) => {
                self.confirm(
                    "Remove Service",
                    &format!("Stop accepting incoming connections for {}?", name),
                    "Remove",
                    true,
                    security_msg(SecurityMsg::RemoveService(name.clone())),
                );
            }
            SecurityMsg::RemoveService(name) => {
                self.spawn_action("Firewall", AfterTask::ReloadFirewall, async move {
                    security::set_service(&name, false).await?;
                    Ok(format!("{} has been removed", name))
                });
            }
            SecurityMsg::OpenConfig => {
                if let Err(e) = security::open_firewall_config() {
                    self.message("Could Not Open Firewall Configuration", &e.user_message());
                }
            }
        }
    }
}
