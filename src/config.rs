//! Build and upload configuration.
//!
//! [`LinkerSettings`] selects where the kernel and the program end up on the target and how
//! aggressively the loader erases. The settings are fixed for the lifetime of a build
//! session; a forked session must use identical settings.

/// Configuration of a build session and its upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct LinkerSettings {
    /// Erase the complete target (RAM and flash) before anything is uploaded
    pub force_flash_write: bool,

    /// Upload the kernel snapshot as a separate image before the program
    pub create_kernel_for_flashing: bool,

    /// Commit the kernel image to flash
    pub use_flash_for_kernel: bool,

    /// Commit the program image to flash
    pub use_flash_for_program: bool,

    /// Ask the device to restart the program after a crash (flash images only)
    pub auto_restart_program: bool,
}

impl LinkerSettings {
    /// Program and kernel live in RAM only and are lost on reset
    #[must_use]
    pub fn ram_only() -> Self {
        Self::default()
    }

    /// Flash a kernel and load programs into RAM on top of it
    #[must_use]
    pub fn kernel() -> Self {
        Self {
            force_flash_write: false,
            create_kernel_for_flashing: true,
            use_flash_for_kernel: true,
            use_flash_for_program: false,
            auto_restart_program: false,
        }
    }

    /// Flash kernel and program, restarting the program after crashes
    #[must_use]
    pub fn flash_program() -> Self {
        Self {
            force_flash_write: false,
            create_kernel_for_flashing: true,
            use_flash_for_kernel: true,
            use_flash_for_program: true,
            auto_restart_program: true,
        }
    }

    /// Returns true if the kernel (`for_kernel`) or program upload is committed to flash
    #[must_use]
    pub fn copy_to_flash(&self, for_kernel: bool) -> bool {
        if for_kernel {
            self.use_flash_for_kernel
        } else {
            self.use_flash_for_program
        }
    }

    /// Returns true if any part of the build ends up in flash
    #[must_use]
    pub fn uses_flash(&self) -> bool {
        self.use_flash_for_kernel || self.use_flash_for_program
    }
}
