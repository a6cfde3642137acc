use adw::prelude::*;
use relm4::gtk;
use relm4::ComponentSender;

use crate::system::services::{self, ServiceAction, ServiceInfo, StatusFilter};
use crate::ui::category::{boxed_list, clear_list, page_container, placeholder_row, suffix_button, text_row};
use crate::ui::model::AppModel;
use crate::ui::msg::{AppMsg, ServicesMsg};
use crate::ui::task::AfterTask;

pub struct ServicesPage {
    pub root: gtk::ScrolledWindow,
    count_label: gtk::Label,
    spinner: gtk::Spinner,
    list: gtk::ListBox,
}

fn services_msg(msg: ServicesMsg) -> AppMsg {
    AppMsg::Services(msg)
}

impl ServicesPage {
    pub fn new(sender: &ComponentSender<AppModel>) -> Self {
        let (root, content) = page_container("Services");

        let toolbar = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        let search = gtk::SearchEntry::builder()
            .placeholder_text("Search services")
            .hexpand(true)
            .build();
        let sender_clone = sender.clone();
        search.connect_search_changed(move |entry| {
            sender_clone.input(services_msg(ServicesMsg::SearchChanged(entry.text().to_string())));
        });

        let filters: Vec<String> = StatusFilter::ALL.iter().map(|f| f.to_string()).collect();
        let filter_names: Vec<&str> = filters.iter().map(String::as_str).collect();
        let status_filter = gtk::DropDown::builder()
            .model(&gtk::StringList::new(&filter_names))
            .build();
        let sender_clone = sender.clone();
        status_filter.connect_selected_notify(move |dropdown| {
            sender_clone.input(services_msg(ServicesMsg::FilterChanged(StatusFilter::from_index(
                dropdown.selected(),
            ))));
        });

        let refresh = gtk::Button::builder()
            .icon_name("view-refresh-symbolic")
            .tooltip_text("Refresh")
            .build();
        let sender_clone = sender.clone();
        refresh.connect_clicked(move |_| {
            sender_clone.input(services_msg(ServicesMsg::Refresh));
        });
        let spinner = gtk::Spinner::new();

        toolbar.append(&search);
        toolbar.append(&status_filter);
        toolbar.append(&refresh);
        toolbar.append(&spinner);

        let count_label = gtk::Label::builder()
            .halign(gtk::Align::Start)
            .css_classes(vec!["dim-label".to_string()])
            .build();
        let list = boxed_list();
        list.append(&placeholder_row("Loading services..."));

        content.append(&toolbar);
        content.append(&count_label);
        content.append(&list);

        Self {
            root,
            count_label,
            spinner,
            list,
        }
    }

    fn show(&self, shown: &[&ServiceInfo], total: usize, sender: &ComponentSender<AppModel>) {
        self.spinner.stop();
        self.count_label
            .set_text(&format!("Showing {} of {} services", shown.len(), total));
        clear_list(&self.list);
        for service in shown {
            let row = text_row(
                &service.name,
                &format!("{} ({}, {})", service.description, service.active_state, service.sub_state),
            );
            let indicator = gtk::Image::from_icon_name(if service.is_active() {
                "media-playback-start-symbolic"
            } else {
                "media-playback-stop-symbolic"
            });
            row.add_prefix(&indicator);
            for action in service.available_actions() {
                let button = suffix_button(
                    &action.to_string(),
                    (*action == ServiceAction::Stop).then_some("destructive-action"),
                );
                let sender_clone = sender.clone();
                let action = *action;
                let name = service.name.clone();
                button.connect_clicked(move |_| {
                    sender_clone.input(services_msg(ServicesMsg::RequestAction(action, name.clone())));
                });
                row.add_suffix(&button);
            }
            self.list.append(&row);
        }
        if shown.is_empty() {
            self.list.append(&placeholder_row("No services match"));
        }
    }
}

impl AppModel {
    pub(super) fn load_services(&self) {
        self.services.spinner.start();
        self.spawn_load(services::list(), |result| {
            services_msg(ServicesMsg::Loaded(result.map_err(|e| e.user_message())))
        });
    }

    fn show_services(&self) {
        let shown = services::filter(&self.service_list, &self.service_search, self.service_filter);
        self.services.show(&shown, self.service_list.len(), &self.sender);
    }

    pub(super) fn update_services(&mut self, msg: ServicesMsg) {
        match msg {
            ServicesMsg::Loaded(Ok(list)) => {
                self.service_list = list;
                self.show_services();
            }
            ServicesMsg::Loaded(Err(e)) => {
                self.services.spinner.stop();
                self.message("Could Not List Services", &e);
            }
            ServicesMsg::Refresh => self.load_services(),
            ServicesMsg::SearchChanged(text) => {
                self.service_search = text;
                self.show_services();
            }
            ServicesMsg::FilterChanged(filter) => {
                self.service_filter = filter;
                self.show_services();
            }
            ServicesMsg::RequestAction(action, name) => {
                self.confirm(
                    &format!("{} Service", action),
                    &format!("Do you want to {} the {} service?", action.verb(), name),
                    &action.to_string(),
                    action == ServiceAction::Stop,
                    services_msg(ServicesMsg::Perform(action, name.clone())),
                );
            }
            ServicesMsg::Perform(action, name) => {
                if let Ok(spec) = services::action_spec(action, &name) {
                    self.log(&format!("$ {}", spec.display()));
                }
                self.spawn_action(format!("{} Service", action), AfterTask::ReloadServices, async move {
                    services::perform(action, &name).await?;
                    Ok(format!("Service {} {}", name, action.past_tense()))
                });
            }
        }
    }
}
