//! Local user and group accounts, read from the account databases and changed
//! through the shadow-utils tools.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::error::{ControlError, Result};
use crate::exec::{run_checked, CommandSpec};
use crate::system::packages;

pub const PASSWD: &str = "/etc/passwd";
pub const GROUP: &str = "/etc/group";
pub const NOBODY_ID: u32 = 65534;
pub const FIRST_REGULAR_ID: u32 = 1000;
pub const ADMIN_GROUP: &str = "wheel";
pub const GUEST_PACKAGE: &str = "xguest";
const SYSTEM_GROUPS_SHOWN: [u32; 5] = [0, 10, 20, 27, 33];
const MAX_USERNAME_LEN: usize = 32;

/// Groups offered as checkboxes in the user dialog.
pub const COMMON_GROUPS: &[&str] = &["audio", "video", "render", "wheel", "network", "storage"];

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_-]*[$]?$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub full_name: String,
    pub home: String,
    pub shell: String,
    pub groups: Vec<String>,
}

impl UserAccount {
    pub fn is_admin(&self) -> bool {
        self.groups.iter().any(|g| g == ADMIN_GROUP || g == "sudo")
    }

    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() { &self.name } else { &self.full_name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub name: String,
    pub gid: u32,
    pub members: Vec<String>,
}

pub fn parse_group(content: &str) -> Vec<GroupEntry> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() < 4 {
                return None;
            }
            Some(GroupEntry {
                name: fields[0].to_string(),
                gid: fields[2].parse().ok()?,
                members: fields[3]
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(String::from)
                    .collect(),
            })
        })
        .collect()
}

/// Supplementary groups of `user`, as listed in the group database.
pub fn groups_of(user: &str, groups: &[GroupEntry]) -> Vec<String> {
    groups
        .iter()
        .filter(|g| g.members.iter().any(|m| m == user))
        .map(|g| g.name.clone())
        .collect()
}

pub fn parse_passwd(content: &str, groups: &[GroupEntry]) -> Vec<UserAccount> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() < 7 {
                return None;
            }
            let name = fields[0].to_string();
            Some(UserAccount {
                uid: fields[2].parse().ok()?,
                gid: fields[3].parse().ok()?,
                full_name: fields[4].split(',').next().unwrap_or_default().to_string(),
                home: fields[5].to_string(),
                shell: fields[6].to_string(),
                groups: groups_of(&name, groups),
                name,
            })
        })
        .collect()
}

pub fn is_listed_user(user: &UserAccount) -> bool {
    user.uid != NOBODY_ID && (user.uid == 0 || user.uid >= FIRST_REGULAR_ID)
}

pub fn is_listed_group(group: &GroupEntry) -> bool {
    group.gid != NOBODY_ID && (group.gid >= FIRST_REGULAR_ID || SYSTEM_GROUPS_SHOWN.contains(&group.gid))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accounts {
    pub users: Vec<UserAccount>,
    pub groups: Vec<GroupEntry>,
}

impl Accounts {
    pub fn from_databases(passwd: &str, group: &str) -> Self {
        let all_groups = parse_group(group);
        let users = parse_passwd(passwd, &all_groups)
            .into_iter()
            .filter(is_listed_user)
            .collect();
        let groups = all_groups.into_iter().filter(is_listed_group).collect();
        Self { users, groups }
    }

    pub fn user(&self, name: &str) -> Option<&UserAccount> {
        self.users.iter().find(|u| u.name == name)
    }

    pub fn group(&self, name: &str) -> Option<&GroupEntry> {
        self.groups.iter().find(|g| g.name == name)
    }
}

pub async fn load() -> Result<Accounts> {
    let passwd = tokio::fs::read_to_string(PASSWD).await?;
    let group = tokio::fs::read_to_string(GROUP).await?;
    Ok(Accounts::from_databases(&passwd, &group))
}

pub fn validate_username(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ControlError::validation("Username is required"));
    }
    if name.len() > MAX_USERNAME_LEN {
        return Err(ControlError::validation("Username must be at most 32 characters"));
    }
    if !USERNAME_RE.is_match(name) {
        return Err(ControlError::validation(
            "Username must start with a lowercase letter or underscore and contain only lowercase letters, digits, '-' or '_'",
        ));
    }
    Ok(())
}

/// Names already in the account databases may predate the creation rules, so
/// removal only refuses what the tools would misread.
fn check_existing_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('-') || name.contains(|c: char| c.is_whitespace() || c == ':') {
        return Err(ControlError::validation(format!("'{}' is not an account name", name)));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub password: String,
    pub confirm: String,
    pub admin: bool,
    pub groups: Vec<String>,
}

impl NewUser {
    /// Account creation, password and extra groups, in order.
    pub fn steps(&self) -> Result<Vec<CommandSpec>> {
        let username = self.username.trim();
        validate_username(username)?;
        if self.password.is_empty() {
            return Err(ControlError::validation("Password is required"));
        }
        if self.password != self.confirm {
            return Err(ControlError::validation("Passwords do not match"));
        }
        if self.password.contains(['\n', ':']) {
            return Err(ControlError::validation("Password cannot contain ':' or line breaks"));
        }

        let comment = match self.full_name.trim() {
            "" => username,
            name => name,
        };
        let mut useradd = CommandSpec::new("useradd").args(["-m", "-c", comment]);
        if self.admin {
            useradd = useradd.args(["-G", ADMIN_GROUP]);
        }
        let mut steps = vec![
            useradd.arg(username).privileged(),
            CommandSpec::new("chpasswd")
                .stdin(format!("{}:{}\n", username, self.password))
                .privileged(),
        ];

        let extra: Vec<&str> = self
            .groups
            .iter()
            .map(String::as_str)
            .filter(|g| !(self.admin && *g == ADMIN_GROUP))
            .collect();
        if !extra.is_empty() {
            steps.push(
                CommandSpec::new("usermod")
                    .args(["-a", "-G", extra.join(",").as_str(), username])
                    .privileged(),
            );
        }
        Ok(steps)
    }
}

/// Commands that bring `user` to the given name and group selection.
/// The group named after the user is never removed.
pub fn edit_steps(user: &UserAccount, full_name: &str, selected: &[String]) -> Vec<CommandSpec> {
    let mut steps = Vec::new();
    let full_name = full_name.trim();
    if full_name != user.full_name {
        steps.push(
            CommandSpec::new("usermod")
                .args(["-c", full_name, user.name.as_str()])
                .privileged(),
        );
    }

    let to_add: Vec<&str> = selected
        .iter()
        .filter(|g| !user.groups.contains(*g))
        .map(String::as_str)
        .collect();
    if !to_add.is_empty() {
        steps.push(
            CommandSpec::new("usermod")
                .args(["-a", "-G", to_add.join(",").as_str(), user.name.as_str()])
                .privileged(),
        );
    }
    for group in user.groups.iter().filter(|g| !selected.contains(*g) && **g != user.name) {
        steps.push(
            CommandSpec::new("gpasswd")
                .args(["-d", user.name.as_str(), group.as_str()])
                .privileged(),
        );
    }
    steps
}

pub fn delete_user_spec(name: &str) -> Result<CommandSpec> {
    check_existing_name(name)?;
    Ok(CommandSpec::new("userdel").args(["-r", name]).privileged())
}

pub fn add_group_spec(name: &str) -> Result<CommandSpec> {
    validate_username(name)?;
    Ok(CommandSpec::new("groupadd").arg(name).privileged())
}

pub fn delete_group_spec(name: &str) -> Result<CommandSpec> {
    check_existing_name(name)?;
    Ok(CommandSpec::new("groupdel").arg(name).privileged())
}

/// `gpasswd -a` for new members and `gpasswd -d` for dropped ones.
pub fn member_steps(group: &str, current: &[String], selected: &[String]) -> Vec<CommandSpec> {
    let current: BTreeSet<&String> = current.iter().collect();
    let selected: BTreeSet<&String> = selected.iter().collect();
    let added = selected
        .difference(&current)
        .map(|m| CommandSpec::new("gpasswd").args(["-a", m.as_str(), group]).privileged());
    let removed = current
        .difference(&selected)
        .map(|m| CommandSpec::new("gpasswd").args(["-d", m.as_str(), group]).privileged());
    added.chain(removed).collect()
}

pub fn guest_install_spec() -> CommandSpec {
    packages::install_spec(&[GUEST_PACKAGE], &[])
}

pub async fn apply(steps: &[CommandSpec]) -> Result<()> {
    for step in steps {
        info!(command = %step.display(), "changing accounts");
        run_checked(step).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWD_DB: &str = "\
root:x:0:0:root:/root:/bin/bash
bin:x:1:1:bin:/bin:/sbin/nologin
nobody:x:65534:65534:Kernel Overflow User:/:/sbin/nologin
alice:x:1000:1000:Alice Smith,,,:/home/alice:/bin/zsh
bob:x:1001:1001::/home/bob:/bin/bash
";

    const GROUP_DB: &str = "\
root:x:0:
wheel:x:10:alice
audio:x:63:alice,bob
users:x:100:
www:x:33:
nogroup:x:65534:
alice:x:1000:
bob:x:1001:
";

    #[test]
    fn lists_regular_accounts_and_their_groups() {
        let accounts = Accounts::from_databases(PASSWD_DB, GROUP_DB);
        let names: Vec<_> = accounts.users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["root", "alice", "bob"]);

        let alice = accounts.user("alice").unwrap();
        assert_eq!(alice.full_name, "Alice Smith");
        assert_eq!(alice.groups, vec!["wheel", "audio"]);
        assert!(alice.is_admin());
        assert_eq!(accounts.user("bob").unwrap().display_name(), "bob");

        let groups: Vec<_> = accounts.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(groups, vec!["root", "wheel", "www", "alice", "bob"]);
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("_svc-1").is_ok());
        assert!(validate_username("machine$").is_ok());
        assert!(validate_username("Alice").is_err());
        assert!(validate_username("1alice").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
    }

    #[test]
    fn new_user_steps() {
        let request = NewUser {
            username: "carol".into(),
            full_name: String::new(),
            password: "s3cret".into(),
            confirm: "s3cret".into(),
            admin: true,
            groups: vec!["wheel".into(), "audio".into(), "video".into()],
        };
        let steps: Vec<String> = request.steps().unwrap().iter().map(|s| s.display()).collect();
        assert_eq!(
            steps,
            vec![
                "useradd -m -c carol -G wheel carol",
                "chpasswd",
                "usermod -a -G audio,video carol",
            ]
        );

        let mismatch = NewUser { confirm: "other".into(), ..request };
        assert!(mismatch.steps().is_err());
    }

    #[test]
    fn edit_never_drops_own_group() {
        let user = UserAccount {
            name: "alice".into(),
            uid: 1000,
            gid: 1000,
            full_name: "Alice".into(),
            home: "/home/alice".into(),
            shell: "/bin/zsh".into(),
            groups: vec!["alice".into(), "wheel".into(), "audio".into()],
        };
        let selected = vec!["audio".to_string(), "video".to_string()];
        let steps: Vec<String> = edit_steps(&user, "Alice", &selected).iter().map(|s| s.display()).collect();
        assert_eq!(steps, vec!["usermod -a -G video alice", "gpasswd -d alice wheel"]);
    }

    #[test]
    fn member_diff() {
        let current = vec!["alice".to_string(), "bob".to_string()];
        let selected = vec!["bob".to_string(), "carol".to_string()];
        let steps: Vec<String> = member_steps("audio", &current, &selected).iter().map(|s| s.display()).collect();
        assert_eq!(steps, vec!["gpasswd -a carol audio", "gpasswd -d alice audio"]);
    }

    #[test]
    fn legacy_names_can_still_be_removed() {
        let user = delete_user_spec("John.Doe").unwrap();
        assert_eq!(user.display(), "userdel -r John.Doe");
        assert!(user.is_privileged());
        assert!(delete_group_spec("Domain Users").is_err());
        assert_eq!(delete_group_spec("OldStaff").unwrap().display(), "groupdel OldStaff");
        assert!(delete_user_spec("-r").is_err());
        assert!(delete_user_spec("").is_err());
        assert!(add_group_spec("OldStaff").is_err());
    }
}
