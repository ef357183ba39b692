//! Injected platform queries.
//!
//! Callers that need to branch on the host OS (mostly tests deciding whether a
//! permission failure is observable) take a `&dyn PlatformProbe` instead of
//! reading process-wide state.

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumOsFamily {
    Linux,
    MacOs,
    Windows,
    Other,
}

/// Platform capability object.
pub trait PlatformProbe {
    fn os_family(&self) -> EnumOsFamily;

    /// Whether the process bypasses permission checks (root on unix).
    fn is_privileged(&self) -> bool;

    fn is_unix_like(&self) -> bool {
        matches!(self.os_family(), EnumOsFamily::Linux | EnumOsFamily::MacOs)
    }
}

/// Probe answering for the running host.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPlatform;

impl PlatformProbe for HostPlatform {
    fn os_family(&self) -> EnumOsFamily {
        if cfg!(target_os = "linux") {
            EnumOsFamily::Linux
        } else if cfg!(target_os = "macos") {
            EnumOsFamily::MacOs
        } else if cfg!(target_os = "windows") {
            EnumOsFamily::Windows
        } else {
            EnumOsFamily::Other
        }
    }

    fn is_privileged(&self) -> bool {
        #[cfg(unix)]
        {
            nix::unistd::geteuid().is_root()
        }
        #[cfg(not(unix))]
        {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EnumOsFamily, HostPlatform, PlatformProbe};

    struct FixedPlatform(EnumOsFamily);

    impl PlatformProbe for FixedPlatform {
        fn os_family(&self) -> EnumOsFamily {
            self.0
        }

        fn is_privileged(&self) -> bool {
            false
        }
    }

    #[test]
    fn unix_like_follows_family() {
        assert!(FixedPlatform(EnumOsFamily::Linux).is_unix_like());
        assert!(FixedPlatform(EnumOsFamily::MacOs).is_unix_like());
        assert!(!FixedPlatform(EnumOsFamily::Windows).is_unix_like());
    }

    #[test]
    fn host_matches_compile_target() {
        let platform = HostPlatform;
        assert_eq!(platform.is_unix_like(), cfg!(any(target_os = "linux", target_os = "macos")));
    }
}
