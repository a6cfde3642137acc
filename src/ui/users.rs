use adw::prelude::*;
use relm4::gtk;
use relm4::ComponentSender;

use crate::system::users::{self, Accounts, NewUser, COMMON_GROUPS, GUEST_PACKAGE};
use crate::ui::category::{boxed_list, clear_list, page_container, placeholder_row, section_label, suffix_button, text_row};
use crate::ui::dialogs;
use crate::ui::model::AppModel;
use crate::ui::msg::{AppMsg, UsersMsg};
use crate::ui::task::{AfterTask, Task};
use crate::utils::current_username;

pub struct UsersPage {
    pub root: gtk::ScrolledWindow,
    users_list: gtk::ListBox,
    groups_list: gtk::ListBox,
}

fn users_msg(msg: UsersMsg) -> AppMsg {
    AppMsg::Users(msg)
}

fn pill(sender: &ComponentSender<AppModel>, label: &str, msg: impl Fn() -> UsersMsg + 'static) -> gtk::Button {
    let button = gtk::Button::builder()
        .label(label)
        .css_classes(vec!["pill".to_string()])
        .build();
    let sender_clone = sender.clone();
    button.connect_clicked(move |_| {
        sender_clone.input(users_msg(msg()));
    });
    button
}

fn row_button(
    sender: &ComponentSender<AppModel>,
    label: &str,
    css: Option<&str>,
    msg: impl Fn() -> UsersMsg + 'static,
) -> gtk::Button {
    let button = suffix_button(label, css);
    let sender_clone = sender.clone();
    button.connect_clicked(move |_| {
        sender_clone.input(users_msg(msg()));
    });
    button
}

/// Check buttons for `names`, ticked when listed in `selected`.
fn check_list(names: &[String], selected: &[String]) -> (gtk::ListBox, Vec<(String, gtk::CheckButton)>) {
    let list = boxed_list();
    let mut checks = Vec::with_capacity(names.len());
    for name in names {
        let check = gtk::CheckButton::builder()
            .active(selected.contains(name))
            .build();
        let row = text_row(name, "");
        row.add_prefix(&check);
        row.set_activatable_widget(Some(&check));
        list.append(&row);
        checks.push((name.clone(), check));
    }
    (list, checks)
}

fn checked(checks: &[(String, gtk::CheckButton)]) -> Vec<String> {
    checks
        .iter()
        .filter(|(_, check)| check.is_active())
        .map(|(name, _)| name.clone())
        .collect()
}

fn form_box() -> gtk::Box {
    gtk::Box::builder()
        .orientation(gtk::Orientation::Vertical)
        .spacing(12)
        .width_request(360)
        .build()
}

impl UsersPage {
    pub fn new(sender: &ComponentSender<AppModel>) -> Self {
        let (root, content) = page_container("Users & Groups");

        let user_buttons = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        let add_user = pill(sender, "Add User", || UsersMsg::ShowAddUser);
        add_user.add_css_class("suggested-action");
        user_buttons.append(&add_user);
        user_buttons.append(&pill(sender, "Install Guest Account", || UsersMsg::InstallGuest));

        let users_list = boxed_list();
        users_list.append(&placeholder_row("Loading users..."));

        let groups_list = boxed_list();
        groups_list.append(&placeholder_row("Loading groups..."));
        let add_group = pill(sender, "Add Group", || UsersMsg::ShowAddGroup);
        add_group.set_halign(gtk::Align::Start);

        content.append(&section_label("Users"));
        content.append(&users_list);
        content.append(&user_buttons);
        content.append(&section_label("Groups"));
        content.append(&groups_list);
        content.append(&add_group);

        Self {
            root,
            users_list,
            groups_list,
        }
    }

    fn show_accounts(&self, accounts: &Accounts, sender: &ComponentSender<AppModel>) {
        let me = current_username();

        clear_list(&self.users_list);
        for user in &accounts.users {
            let mut details = format!("{} (UID {})", user.name, user.uid);
            if user.is_admin() {
                details.push_str(", administrator");
            }
            let row = text_row(user.display_name(), &details);
            row.add_prefix(&gtk::Image::from_icon_name("avatar-default-symbolic"));
            let name = user.name.clone();
            row.add_suffix(&row_button(sender, "Edit", None, move || UsersMsg::EditUser(name.clone())));
            let name = user.name.clone();
            let delete = row_button(sender, "Delete", Some("destructive-action"), move || {
                UsersMsg::RequestDeleteUser(name.clone())
            });
            delete.set_sensitive(me.as_deref() != Some(user.name.as_str()));
            row.add_suffix(&delete);
            self.users_list.append(&row);
        }
        if accounts.users.is_empty() {
            self.users_list.append(&placeholder_row("No user accounts found"));
        }

        clear_list(&self.groups_list);
        for group in &accounts.groups {
            let members = if group.members.is_empty() {
                "No members".to_string()
            } else {
                group.members.join(", ")
            };
            let row = text_row(&group.name, &format!("GID {}: {}", group.gid, members));
            let name = group.name.clone();
            row.add_suffix(&row_button(sender, "Members", None, move || UsersMsg::EditMembers(name.clone())));
            let name = group.name.clone();
            row.add_suffix(&row_button(sender, "Delete", Some("destructive-action"), move || {
                UsersMsg::RequestDeleteGroup(name.clone())
            }));
            self.groups_list.append(&row);
        }
        if accounts.groups.is_empty() {
            self.groups_list.append(&placeholder_row("No groups found"));
        }
    }
}

impl AppModel {
    pub(super) fn load_accounts(&self) {
        self.spawn_load(users::load(), |result| {
            users_msg(UsersMsg::AccountsLoaded(result.map_err(|e| e.user_message())))
        });
    }

    fn apply_account_steps(&self, title: &str, steps: Vec<crate::exec::CommandSpec>, done: String) {
        for step in &steps {
            self.log(&format!("$ {}", step.display()));
        }
        self.spawn_action(title, AfterTask::ReloadAccounts, async move {
            users::apply(&steps).await?;
            Ok(done)
        });
    }

    fn show_add_user(&self) {
        let content = form_box();
        let fields = boxed_list();
        let username = adw::EntryRow::builder().title("Username").build();
        let full_name = adw::EntryRow::builder().title("Full Name").build();
        let password = adw::PasswordEntryRow::builder().title("Password").build();
        let confirm = adw::PasswordEntryRow::builder().title("Confirm Password").build();
        let admin = adw::SwitchRow::builder()
            .title("Administrator")
            .subtitle("Member of the wheel group")
            .build();
        fields.append(&username);
        fields.append(&full_name);
        fields.append(&password);
        fields.append(&confirm);
        fields.append(&admin);

        let names: Vec<String> = COMMON_GROUPS
            .iter()
            .filter(|g| **g != users::ADMIN_GROUP)
            .map(|g| g.to_string())
            .collect();
        let (groups, checks) = check_list(&names, &[]);
        content.append(&fields);
        content.append(&section_label("Additional Groups"));
        content.append(&groups);

        let dialog = dialogs::form(self.window.as_ref(), "Add User", "", &content, "Create");
        let sender = self.sender.clone();
        dialog.connect_response(None, move |d, response| {
            if response == "accept" {
                let user = NewUser {
                    username: username.text().to_string(),
                    full_name: full_name.text().to_string(),
                    password: password.text().to_string(),
                    confirm: confirm.text().to_string(),
                    admin: admin.is_active(),
                    groups: checked(&checks),
                };
                sender.input(users_msg(UsersMsg::CreateUser(user)));
            }
            d.close();
        });
        dialog.present();
    }

    fn show_edit_user(&self, name: &str) {
        let Some(user) = self.accounts.user(name) else {
            return;
        };
        let content = form_box();
        let fields = boxed_list();
        let full_name = adw::EntryRow::builder().title("Full Name").text(&user.full_name).build();
        fields.append(&full_name);

        let mut names: Vec<String> = COMMON_GROUPS.iter().map(|g| g.to_string()).collect();
        for group in &user.groups {
            if !names.contains(group) && *group != user.name {
                names.push(group.clone());
            }
        }
        let (groups, checks) = check_list(&names, &user.groups);
        content.append(&fields);
        content.append(&section_label("Groups"));
        content.append(&groups);

        let dialog = dialogs::form(self.window.as_ref(), &format!("Edit {}", user.name), "", &content, "Save");
        let sender = self.sender.clone();
        let name = user.name.clone();
        dialog.connect_response(None, move |d, response| {
            if response == "accept" {
                sender.input(users_msg(UsersMsg::SaveUser {
                    name: name.clone(),
                    full_name: full_name.text().to_string(),
                    groups: checked(&checks),
                }));
            }
            d.close();
        });
        dialog.present();
    }

    fn show_add_group(&self) {
        let fields = boxed_list();
        let entry = adw::EntryRow::builder().title("Group Name").build();
        fields.append(&entry);
        let dialog = dialogs::form(self.window.as_ref(), "Add Group", "", &fields, "Create");
        let sender = self.sender.clone();
        dialog.connect_response(None, move |d, response| {
            if response == "accept" {
                sender.input(users_msg(UsersMsg::AddGroup(entry.text().trim().to_string())));
            }
            d.close();
        });
        dialog.present();
    }

    fn show_members(&self, group: &str) {
        let Some(entry) = self.accounts.group(group) else {
            return;
        };
        let names: Vec<String> = self.accounts.users.iter().map(|u| u.name.clone()).collect();
        if names.is_empty() {
            self.message("Group Members", "There are no user accounts to add.");
            return;
        }
        let (list, checks) = check_list(&names, &entry.members);
        let content = form_box();
        content.append(&list);
        let dialog = dialogs::form(
            self.window.as_ref(),
            &format!("Members of {}", entry.name),
            "",
            &content,
            "Save",
        );
        let sender = self.sender.clone();
        let group = entry.name.clone();
        dialog.connect_response(None, move |d, response| {
            if response == "accept" {
                sender.input(users_msg(UsersMsg::SaveMembers {
                    group: group.clone(),
                    members: checked(&checks),
                }));
            }
            d.close();
        });
        dialog.present();
    }

    pub(super) fn update_users(&mut self, msg: UsersMsg) {
        match msg {
            UsersMsg::AccountsLoaded(Ok(accounts)) => {
                self.users.show_accounts(&accounts, &self.sender);
                self.accounts = accounts;
            }
            UsersMsg::AccountsLoaded(Err(e)) => self.message("Could Not Read Accounts", &e),
            UsersMsg::ShowAddUser => self.show_add_user(),
            UsersMsg::CreateUser(user) => match user.steps() {
                Ok(steps) => {
                    let name = user.username.trim().to_string();
                    self.apply_account_steps("Add User", steps, format!("User {} has been created", name));
                }
                Err(e) => self.message("Invalid User", &e.user_message()),
            },
            UsersMsg::EditUser(name) => self.show_edit_user(&name),
            UsersMsg::SaveUser { name, full_name, groups } => {
                let Some(user) = self.accounts.user(&name) else {
                    return;
                };
                let steps = users::edit_steps(user, &full_name, &groups);
                if steps.is_empty() {
                    self.toast("No changes to save");
                } else {
                    self.apply_account_steps("Edit User", steps, format!("User {} has been updated", name));
                }
            }
            UsersMsg::RequestDeleteUser(name) => {
                self.confirm(
                    "Delete User",
                    &format!(
                        "Delete the account {} and its home directory? This cannot be undone.",
                        name
                    ),
                    "Delete",
                    true,
                    users_msg(UsersMsg::DeleteUser(name.clone())),
                );
            }
            UsersMsg::DeleteUser(name) => match users::delete_user_spec(&name) {
                Ok(spec) => self.apply_account_steps("Delete User", vec![spec], format!("User {} has been deleted", name)),
                Err(e) => self.message("Delete User", &e.user_message()),
            },
            UsersMsg::ShowAddGroup => self.show_add_group(),
            UsersMsg::AddGroup(name) => match users::add_group_spec(&name) {
                Ok(spec) => self.apply_account_steps("Add Group", vec![spec], format!("Group {} has been created", name)),
                Err(e) => self.message("Invalid Group Name", &e.user_message()),
            },
            UsersMsg::RequestDeleteGroup(name) => {
                self.confirm(
                    "Delete Group",
                    &format!("Delete the group {}?", name),
                    "Delete",
                    true,
                    users_msg(UsersMsg::DeleteGroup(name.clone())),
                );
            }
            UsersMsg::DeleteGroup(name) => match users::delete_group_spec(&name) {
                Ok(spec) => self.apply_account_steps("Delete Group", vec![spec], format!("Group {} has been deleted", name)),
                Err(e) => self.message("Delete Group", &e.user_message()),
            },
            UsersMsg::EditMembers(group) => self.show_members(&group),
            UsersMsg::SaveMembers { group, members } => {
                let Some(entry) = self.accounts.group(&group) else {
                    return;
                };
                let steps = users::member_steps(&group, &entry.members, &members);
                if steps.is_empty() {
                    self.toast("No changes to save");
                } else {
                    self.apply_account_steps("Group Members", steps, format!("Members of {} updated", group));
                }
            }
            UsersMsg::InstallGuest => {
                let task = Task::install("Guest Account", &[GUEST_PACKAGE])
                    .success("The guest account has been installed. It is available from the login screen.")
                    .after(AfterTask::ReloadAccounts);
                self.request_task(task);
            }
        }
    }
}
