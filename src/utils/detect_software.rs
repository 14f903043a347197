use log::debug;
use log::info;
use std::process::{Command, Stdio};

use crate::runtime::Error;

pub fn check_gzip() -> Result<(), Error> {
    debug!("Checking for gzip");
    let status = Command::new("gzip")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if status.is_ok() {
        info!("Found gzip");
        Ok(())
    } else {
        Err(Error::utility_not_executable("gzip"))
    }
}
