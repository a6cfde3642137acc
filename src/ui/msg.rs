use chrono::NaiveDateTime;

use crate::models::{Section, Theme};
use crate::progress::{ProgressUpdate, TaskEvent};
use crate::settings::Settings;
use crate::system::audio::{AudioState, SoundServer, VolumeTarget};
use crate::system::datetime::TimeSyncStatus;
use crate::system::hardware_info::HardwareInfo;
use crate::system::kernels::KernelStatus;
use crate::system::logs::CollectedLogs;
use crate::system::network::{ConnectionKind, ConnectionReport, UptimeResult};
use crate::system::news::NewsEntry;
use crate::system::repositories::RepoState;
use crate::system::security::FirewallStatus;
use crate::system::services::{ServiceAction, ServiceInfo, StatusFilter};
use crate::system::system_info::SystemInfo;
use crate::system::updates::{AutoUpdatePolicy, PendingUpdate};
use crate::system::users::{Accounts, NewUser};
use crate::ui::task::{AfterTask, Task};

#[derive(Debug)]
pub enum AppMsg {
    NavigateToSection(Section),
    OpenSubpage(Section, &'static str),
    GoBack,
    ToggleSidebar,
    NotImplemented(&'static str),
    Tick,

    SettingsLoaded(Settings),
    ThemeSelected(Theme),
    ToggleHideConsole(bool),
    ToggleConfirmPrivileged(bool),
    OpenConfigFolder,
    ClearConsole,

    Log(String),
    ShowToast(String),
    ShowMessage(String, String),
    ShowError(String, String),
    Error(String),

    RequestTask(Box<Task>),
    StartTask(Box<Task>),
    TaskProgress(TaskEvent),
    TaskFinished(Result<ProgressUpdate, String>),
    ActionFinished {
        title: String,
        result: Result<String, String>,
        after: AfterTask,
    },

    System(SystemMsg),
    Software(SoftwareMsg),
    Network(NetworkMsg),
    Hardware(HardwareMsg),
    Security(SecurityMsg),
    Users(UsersMsg),
    Services(ServicesMsg),
}

#[derive(Debug)]
pub enum SystemMsg {
    InfoLoaded(SystemInfo),
    HardwareLoaded(HardwareInfo),
    TimeStatusLoaded(Result<TimeSyncStatus, String>),
    TimezonesLoaded(Vec<String>),
    SetNtp(bool),
    NtpSyncFinished(bool),
    ApplyManualTime,
    SetTime(NaiveDateTime),
    ApplyTimezone,
    SetTimezone(String),
    CollectLogs,
    LogsCollected(Result<CollectedLogs, String>),
    KernelsLoaded(Result<Vec<KernelStatus>, String>),
    InstallKernel(&'static str),
    RemoveKernel(&'static str),
    LaunchTweaks,
    InstallShell(&'static str),
    SetDefaultShell(&'static str),
    ApplyDefaultShell(&'static str),
    NewsLoaded(Vec<NewsEntry>),
}

#[derive(Debug)]
pub enum SoftwareMsg {
    CheckUpdates,
    UpdatesChecked(Result<Vec<PendingUpdate>, String>),
    ApplyUpdates,
    PolicyLoaded(AutoUpdatePolicy),
    PolicySelected(AutoUpdatePolicy),
    ReposLoaded(Result<Vec<RepoState>, String>),
    ToggleRepo(usize),
    ToggleAllRepos,
    SetRepos(Vec<String>, bool),
    InstallApp(&'static str),
    LaunchApp(&'static str),
    InstallExternal(&'static str),
    RestrictedRepoResolved(String),
    InstallCodecs,
    InstallDriver(&'static str),
    OpenYumex,
}

#[derive(Debug)]
pub enum NetworkMsg {
    ManageConnection(ConnectionKind),
    CheckConnection,
    ConnectionChecked(ConnectionReport),
    CheckUptime,
    UptimeChecked(Result<Vec<UptimeResult>, String>),
}

#[derive(Debug)]
pub enum HardwareMsg {
    AudioLoaded(Result<AudioState, String>),
    SinkSelected(u32),
    VolumeChanged(VolumeTarget, f64),
    MuteToggled(VolumeTarget, bool),
    ServerLoaded(SoundServer),
    SwitchServer,
    OpenMixer,
    OpenTool(&'static str),
    InstallPrinterDrivers(&'static str),
}

#[derive(Debug)]
pub enum SecurityMsg {
    StatusLoaded(FirewallStatus),
    Install,
    SetEnabled(bool),
    RequestAddService,
    ServicesAvailable(Result<Vec<String>, String>),
    AddService(String),
    RequestRemoveService(String),
    RemoveService(String),
    OpenConfig,
}

#[derive(Debug)]
pub enum UsersMsg {
    AccountsLoaded(Result<Accounts, String>),
    ShowAddUser,
    CreateUser(NewUser),
    EditUser(String),
    SaveUser {
        name: String,
        full_name: String,
        groups: Vec<String>,
    },
    RequestDeleteUser(String),
    DeleteUser(String),
    ShowAddGroup,
    AddGroup(String),
    RequestDeleteGroup(String),
    DeleteGroup(String),
    EditMembers(String),
    SaveMembers {
        group: String,
        members: Vec<String>,
    },
    InstallGuest,
}

#[derive(Debug)]
pub enum ServicesMsg {
    Loaded(Result<Vec<ServiceInfo>, String>),
    Refresh,
    SearchChanged(String),
    FilterChanged(StatusFilter),
    RequestAction(ServiceAction, String),
    Perform(ServiceAction, String),
}
