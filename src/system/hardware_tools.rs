//! Graphical disk and printer tools: launch them when present, otherwise
//! hand back the install command.

use crate::error::Result;
use crate::exec::{spawn_detached, CommandSpec};
use crate::system::packages;
use crate::utils::binary_exists;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalTool {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub binary: &'static str,
    pub package: &'static str,
    pub needs_root: bool,
}

impl ExternalTool {
    pub fn is_installed(&self) -> bool {
        binary_exists(self.binary)
    }

    pub fn launch(&self) -> Result<()> {
        if self.needs_root {
            spawn_detached("pkexec", &[self.binary])
        } else {
            spawn_detached(self.binary, &[])
        }
    }

    pub fn install_spec(&self) -> CommandSpec {
        packages::install_spec(&[self.package], &[])
    }

    pub fn install_prompt(&self) -> String {
        format!("{} is not installed. Would you like to install it?", self.name)
    }
}

pub const GNOME_DISKS: ExternalTool = ExternalTool {
    id: "gnome-disks",
    name: "GNOME Disks",
    description: "Manage drives and media",
    binary: "/usr/bin/gnome-disks",
    package: "gnome-disk-utility",
    needs_root: false,
};

pub const GPARTED: ExternalTool = ExternalTool {
    id: "gparted",
    name: "GParted",
    description: "Partition editor",
    binary: "/usr/bin/gparted",
    package: "gparted",
    needs_root: true,
};

pub const PRINTER_CONFIG: ExternalTool = ExternalTool {
    id: "printers",
    name: "Printer configuration",
    description: "Configure and manage printers",
    binary: "/usr/bin/system-config-printer",
    package: "system-config-printer-gui",
    needs_root: false,
};

pub const HP_TOOLBOX: ExternalTool = ExternalTool {
    id: "hplip",
    name: "HPLIP",
    description: "HP Linux Imaging and Printing system",
    binary: "/usr/bin/hp-toolbox",
    package: "hplip-gui",
    needs_root: false,
};

pub const TOOLS: &[ExternalTool] = &[GNOME_DISKS, GPARTED, PRINTER_CONFIG, HP_TOOLBOX];

pub fn tool(id: &str) -> Option<&'static ExternalTool> {
    TOOLS.iter().find(|t| t.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterDrivers {
    pub id: &'static str,
    pub name: &'static str,
    pub package: &'static str,
}

pub const PRINTER_DRIVERS: &[PrinterDrivers] = &[
    PrinterDrivers { id: "epson", name: "Epson", package: "task-printing-epson" },
    PrinterDrivers { id: "canon", name: "Canon", package: "task-printing-canon" },
    PrinterDrivers { id: "all", name: "All printer", package: "task-printing" },
];

pub fn printer_drivers(id: &str) -> Option<&'static PrinterDrivers> {
    PRINTER_DRIVERS.iter().find(|d| d.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tools_install_their_packages() {
        assert_eq!(tool("gparted").map(|t| t.needs_root), Some(true));
        assert_eq!(GNOME_DISKS.install_spec().display(), "dnf install -y gnome-disk-utility");
        assert_eq!(HP_TOOLBOX.install_spec().display(), "dnf install -y hplip-gui");
        assert_eq!(
            GPARTED.install_prompt(),
            "GParted is not installed. Would you like to install it?"
        );
        assert!(tool("scanner").is_none());
    }

    #[test]
    fn printer_driver_bundles() {
        assert_eq!(printer_drivers("canon").map(|d| d.package), Some("task-printing-canon"));
        assert_eq!(PRINTER_DRIVERS.len(), 3);
    }
}
