//! The device side of an upload.

use bitflags::bitflags;

use crate::{
    catalog::Catalog,
    snapshot::{Snapshot, SnapshotDiff},
    symbols::MethodSig,
    token::{FieldEntry, SpecialTypeGroup, StringEntry, Token},
    Result,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Startup behaviour stored in the flash header. The empty set starts nothing special.
    pub struct StartupFlags: u32 {
        /// Restart the program when it terminates with an unhandled exception
        const AUTO_RESTART_AFTER_CRASH = 0x0001;
    }
}

/// Transport to an embedded execution engine.
///
/// The [`Loader`](crate::loader::Loader) calls these operations strictly in upload order and
/// never retries. Transport details, framing and timeouts belong to the implementation; every
/// failure is reported as [`Error::Device`](crate::Error::Device) and aborts the upload.
///
/// Each `send_*` operation receives the complete table plus the [`SnapshotDiff`] selecting
/// what is missing on the device. Implementations transmit only the entries whose token is
/// listed in the diff, in the order of the table.
///
/// # Examples
///
/// ```rust,ignore
/// struct SerialChannel { port: Box<dyn std::io::Write> }
///
/// impl DeviceChannel for SerialChannel {
///     type Task = u16;
///
///     fn erase_all(&mut self, full: bool, include_flash: bool) -> Result<()> {
///         self.send_command(Command::Erase, &[u8::from(full), u8::from(include_flash)])
///     }
///     // ...
/// }
/// ```
pub trait DeviceChannel {
    /// Handle of a method ready to run on the device
    type Task;

    /// Clear the target. `full` drops every loaded image from RAM, `include_flash` also
    /// erases the flash.
    ///
    /// # Errors
    /// Transport failures.
    fn erase_all(&mut self, full: bool, include_flash: bool) -> Result<()>;

    /// Returns true if the image described by `snapshot` is resident on the device
    ///
    /// # Errors
    /// Transport failures.
    fn has_kernel_loaded(&mut self, snapshot: &Snapshot) -> Result<bool>;

    /// Send the class declarations listed in `diff`
    ///
    /// # Errors
    /// Transport failures.
    fn send_class_declarations(
        &mut self,
        catalog: &Catalog,
        diff: &SnapshotDiff,
        for_kernel: bool,
    ) -> Result<()>;

    /// Send the method declarations and bodies listed in `diff`
    ///
    /// # Errors
    /// Transport failures.
    fn send_methods(&mut self, catalog: &Catalog, diff: &SnapshotDiff, for_kernel: bool)
        -> Result<()>;

    /// Send the initializer data of the fields listed in `diff`
    ///
    /// # Errors
    /// Transport failures.
    fn send_constants(
        &mut self,
        constants: &[FieldEntry],
        diff: &SnapshotDiff,
        for_kernel: bool,
    ) -> Result<()>;

    /// Announce a string upload of `total_size` bytes
    ///
    /// # Errors
    /// Transport failures.
    fn prepare_string_load(&mut self, offset: usize, total_size: usize) -> Result<()>;

    /// Send the string constants listed in `diff`
    ///
    /// # Errors
    /// Transport failures.
    fn send_strings(
        &mut self,
        strings: &[StringEntry],
        diff: &SnapshotDiff,
        for_kernel: bool,
    ) -> Result<()>;

    /// Send the special type groups listed in `diff`
    ///
    /// # Errors
    /// Transport failures.
    fn send_special_types(
        &mut self,
        groups: &[SpecialTypeGroup],
        diff: &SnapshotDiff,
        for_kernel: bool,
    ) -> Result<()>;

    /// Commit everything received so far to flash
    ///
    /// # Errors
    /// Transport failures.
    fn copy_to_flash(&mut self) -> Result<()>;

    /// Write the flash header identifying the image of `snapshot`
    ///
    /// # Errors
    /// Transport failures.
    fn write_flash_header(
        &mut self,
        snapshot: &Snapshot,
        startup_token: Token,
        flags: StartupFlags,
    ) -> Result<()>;

    /// Make the image of `catalog` the active one
    ///
    /// # Errors
    /// Transport failures.
    fn activate(&mut self, catalog: &Catalog) -> Result<()>;

    /// Prepare `method` for execution
    ///
    /// # Errors
    /// Transport failures, or the method is unknown on the device.
    fn get_task(&mut self, catalog: &Catalog, method: &MethodSig) -> Result<Self::Task>;

    /// Run the static constructors of every uploaded class
    ///
    /// # Errors
    /// Transport failures.
    fn execute_static_initializers(&mut self, catalog: &Catalog) -> Result<()>;
}
