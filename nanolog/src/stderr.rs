use std::fs::File;

/// Points the process's standard-error descriptor at `file`.
#[cfg(unix)]
pub(crate) fn redirect(file: &File) -> Result<(), std::io::Error> {
    nix::unistd::dup2_stderr(file)?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn redirect(_file: &File) -> Result<(), std::io::Error> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "standard error redirection is only supported on unix",
    ))
}
