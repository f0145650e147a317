// src/guard.rs

//! Privilege guard.
//!
//! The harness drives `docker` and spawns a build, both of which are meant
//! to run as the operator's own user. Running the whole pipeline as root
//! would also leave root-owned artifacts behind in the working directory,
//! so an elevated effective uid is refused before anything is acquired.

use crate::errors::{HarnessError, Result};

/// Refuse to proceed under an elevated execution context.
///
/// Must be called before any resource is acquired; on the error path there
/// is nothing for the cleanup stack to unwind.
pub fn ensure_unprivileged() -> Result<()> {
    check_euid(effective_uid())
}

/// Pure check, split out so it can be tested under any uid.
pub(crate) fn check_euid(euid: u32) -> Result<()> {
    if euid == 0 {
        return Err(HarnessError::PrivilegeViolation(
            "effective uid is 0; re-run as a regular user with access to the \
             docker daemon (e.g. a member of the docker group)"
                .to_string(),
        ));
    }
    Ok(())
}

#[cfg(unix)]
fn effective_uid() -> u32 {
    // geteuid cannot fail.
    unsafe { libc::geteuid() }
}

#[cfg(not(unix))]
fn effective_uid() -> u32 {
    // No euid concept; treat as unprivileged.
    u32::MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_rejected() {
        let err = check_euid(0).unwrap_err();
        assert!(matches!(err, HarnessError::PrivilegeViolation(_)));
        assert!(err.to_string().contains("elevated"));
    }

    #[test]
    fn regular_user_is_accepted() {
        assert!(check_euid(1000).is_ok());
        assert!(check_euid(u32::MAX).is_ok());
    }
}
