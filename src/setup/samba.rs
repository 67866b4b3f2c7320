use anyhow::{Context, Result, bail};
use duct::cmd;
use std::fs;
use std::io::Write;
use std::os::unix::fs::{MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::common::paths;
use crate::common::shell::shell_quote;
use crate::ui::prelude::*;

const FSTAB: &str = "/etc/fstab";

/// A CIFS share to mount at boot
#[derive(Debug, Clone)]
pub struct NetworkShare {
    /// `//server/share`, or `server/share`
    pub share: String,
    pub mount_point: PathBuf,
    pub username: String,
    pub password: String,
}

impl NetworkShare {
    /// The share as `//server/share`, adding the leading slashes if missing
    pub fn unc_path(&self) -> String {
        format!("//{}", self.share.trim().trim_start_matches(['/', '\\']))
    }

    pub fn credentials_contents(&self) -> String {
        format!("username={}\npassword={}\n", self.username, self.password)
    }

    /// The `/etc/fstab` entry mounting this share with `credentials`
    pub fn fstab_line(&self, credentials: &Path, uid: u32, gid: u32) -> String {
        format!(
            "{} {} cifs credentials={},uid={},gid={},_netdev,nofail 0 0",
            fstab_escape(&self.unc_path()),
            fstab_escape(&self.mount_point.to_string_lossy()),
            fstab_escape(&credentials.to_string_lossy()),
            uid,
            gid
        )
    }
}

/// fstab fields are whitespace separated; spaces are written as `\040`
fn fstab_escape(field: &str) -> String {
    field.replace(' ', "\\040").replace('\t', "\\011")
}

/// Root-side step: create the mount point and append `line` to fstab once
pub fn fstab_script(mount_point: &Path, line: &str) -> String {
    let line = shell_quote(line);
    format!(
        "mkdir -p {mp} && (grep -qxF {line} {FSTAB} || printf '%s\\n' {line} >> {FSTAB})",
        mp = shell_quote(&mount_point.to_string_lossy()),
    )
}

/// Write the credentials file readable by the owner only
pub fn write_credentials(path: &Path, share: &NetworkShare) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    // mode() only applies on creation
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("restricting permissions on {}", path.display()))?;
    file.write_all(share.credentials_contents().as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Store the credentials and register the share in fstab
pub fn add_network_share(share: &NetworkShare, elevation: &[String]) -> Result<()> {
    if share.unc_path() == "//" {
        bail!("no share given, expected something like 192.168.1.10/backup");
    }

    let credentials = paths::smb_credentials_file()?;
    write_credentials(&credentials, share)?;

    let home = dirs::home_dir().context("Unable to determine home directory")?;
    let meta = fs::metadata(&home).with_context(|| format!("reading {}", home.display()))?;
    let line = share.fstab_line(&credentials, meta.uid(), meta.gid());
    let script = fstab_script(&share.mount_point, &line);

    emit(
        Level::Debug,
        "setup.samba.script",
        &script,
        None,
    );

    let mut argv: Vec<String> = elevation.to_vec();
    argv.extend(["sh".to_string(), "-c".to_string(), script]);
    let (program, args) = argv
        .split_first()
        .context("empty command line for the fstab step")?;
    cmd(program, args)
        .run()
        .context("registering the share in /etc/fstab")?;

    emit(
        Level::Success,
        "setup.samba.added",
        &format!(
            "{} {} will be mounted at {}",
            char::from(NerdFont::HardDrive),
            share.unc_path(),
            share.mount_point.display()
        ),
        None,
    );
    emit(
        Level::Info,
        "setup.samba.credentials",
        &format!(
            "{} Credentials stored in {}",
            char::from(NerdFont::Key),
            credentials.display()
        ),
        None,
    );
    Ok(())
}
