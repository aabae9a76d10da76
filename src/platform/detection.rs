use super::Platform;

/// Compile-time host detection.
pub(super) fn detect() -> Option<Platform> {
    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    {
        Some(Platform::LinuxX64)
    }
    #[cfg(all(target_os = "linux", target_arch = "aarch64"))]
    {
        Some(Platform::LinuxArm64)
    }
    #[cfg(all(target_os = "macos", target_arch = "x86_64"))]
    {
        Some(Platform::MacosX64)
    }
    #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
    {
        Some(Platform::MacosArm64)
    }
    #[cfg(all(target_os = "windows", target_arch = "x86_64"))]
    {
        Some(Platform::WindowsX64)
    }
    #[cfg(not(any(
        all(target_os = "linux", target_arch = "x86_64"),
        all(target_os = "linux", target_arch = "aarch64"),
        all(target_os = "macos", target_arch = "x86_64"),
        all(target_os = "macos", target_arch = "aarch64"),
        all(target_os = "windows", target_arch = "x86_64"),
    )))]
    {
        None
    }
}
