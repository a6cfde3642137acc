use crate::exec::CommandSpec;
use crate::system::hardware_tools::ExternalTool;
use crate::system::packages;

/// What to refresh or launch once a task or action is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfterTask {
    #[default]
    Nothing,
    ReloadKernels,
    ReloadShells,
    ClearUpdates,
    ReloadPolicy,
    ReloadRepositories,
    ReloadApps,
    AppInstalled(&'static str),
    ReloadAudio,
    ReloadTools,
    ReloadFirewall,
    ReloadAccounts,
    ReloadServices,
    ReloadTime,
    Launch(&'static str),
    LaunchTool(&'static ExternalTool),
}

impl AfterTask {
    /// Launches and install bookkeeping only make sense when the install went through.
    pub fn runs_on_failure(&self) -> bool {
        !matches!(
            self,
            AfterTask::Launch(_) | AfterTask::LaunchTool(_) | AfterTask::AppInstalled(_)
        )
    }
}

/// A privileged streaming job shown in the progress dialog.
#[derive(Debug, Clone)]
pub struct Task {
    pub title: String,
    pub status: String,
    pub steps: Vec<CommandSpec>,
    pub success: String,
    pub confirm: Option<String>,
    pub after: AfterTask,
    pub suggest_repositories: bool,
}

impl Task {
    pub fn new(title: impl Into<String>, steps: Vec<CommandSpec>) -> Self {
        let title = title.into();
        Self {
            status: format!("{}...", title),
            success: format!("{} completed successfully.", title),
            title,
            steps,
            confirm: None,
            after: AfterTask::Nothing,
            suggest_repositories: false,
        }
    }

    /// `dnf install` of `packages` with the usual wording.
    pub fn install(name: &str, packages: &[&str]) -> Self {
        Task::new(format!("Installing {}", name), vec![packages::install_spec(packages, &[])])
            .success(format!("{} has been installed successfully.", name))
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn success(mut self, success: impl Into<String>) -> Self {
        self.success = success.into();
        self
    }

    /// Always ask before starting, whatever the settings say.
    pub fn confirm(mut self, body: impl Into<String>) -> Self {
        self.confirm = Some(body.into());
        self
    }

    pub fn after(mut self, after: AfterTask) -> Self {
        self.after = after;
        self
    }

    pub fn suggest_repositories(mut self) -> Self {
        self.suggest_repositories = true;
        self
    }

    /// Commands listed in the default confirmation body.
    pub fn command_summary(&self) -> String {
        self.steps
            .iter()
            .map(|step| step.display())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::hardware_tools::GPARTED;

    #[test]
    fn install_task_wording() {
        let task = Task::install("GParted", &["gparted"]).after(AfterTask::LaunchTool(&GPARTED));
        assert_eq!(task.title, "Installing GParted");
        assert_eq!(task.status, "Installing GParted...");
        assert_eq!(task.success, "GParted has been installed successfully.");
        assert_eq!(task.command_summary(), "dnf install -y gparted");
        assert!(task.confirm.is_none());
        assert!(!task.after.runs_on_failure());
    }

    #[test]
    fn refreshes_run_even_after_failures() {
        assert!(AfterTask::ReloadKernels.runs_on_failure());
        assert!(!AfterTask::Launch("/usr/bin/yumex").runs_on_failure());
    }
}
