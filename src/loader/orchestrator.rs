use strum::{Display, EnumCount, EnumIter};

use crate::{
    catalog::Catalog,
    loader::{DeviceChannel, StartupFlags},
    snapshot::{Snapshot, SnapshotDiff},
    token::Token,
    Error, Result,
};

/// Phase of an image upload.
///
/// Phases only move forward within one image. The program upload starts again at
/// [`LoadState::Idle`] after the kernel image is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumCount, EnumIter)]
pub enum LoadState {
    /// Nothing sent yet
    Idle,
    /// Clearing the target
    ErasingIfNeeded,
    /// Sending class declarations
    SendingClasses,
    /// Sending methods
    SendingMethods,
    /// Sending field constants
    SendingConstants,
    /// Sending string constants
    SendingStrings,
    /// Sending special type groups
    SendingSpecialTypes,
    /// Committing to flash and writing the header
    Committing,
    /// Image complete
    Done,
}

/// Drives the upload of a catalog over a [`DeviceChannel`].
///
/// A loader is used for a single [`Loader::load`]. It records the phases it went through,
/// which is what [`Loader::history`] reports afterwards.
pub struct Loader<'a, C: DeviceChannel> {
    catalog: &'a Catalog,
    channel: &'a mut C,
    state: LoadState,
    history: Vec<LoadState>,
}

impl<'a, C: DeviceChannel> Loader<'a, C> {
    /// Prepare the upload of `catalog` through `channel`
    pub fn new(catalog: &'a Catalog, channel: &'a mut C) -> Self {
        Loader {
            catalog,
            channel,
            state: LoadState::Idle,
            history: Vec::new(),
        }
    }

    /// The current phase
    #[must_use]
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Every phase entered so far, including the restart at `Idle` per image
    #[must_use]
    pub fn history(&self) -> &[LoadState] {
        &self.history
    }

    fn begin_image(&mut self) {
        self.state = LoadState::Idle;
        self.history.push(LoadState::Idle);
    }

    fn enter(&mut self, state: LoadState) -> Result<()> {
        if state <= self.state {
            return Err(config_error!(
                "Upload cannot move from {} back to {}",
                self.state,
                state
            ));
        }

        log::trace!("Upload phase {} -> {}", self.state, state);
        self.state = state;
        self.history.push(state);
        Ok(())
    }

    /// Upload the catalog and prepare its entry point.
    ///
    /// With `create_kernel_for_flashing` the kernel image is sent first unless the device
    /// already holds it. The program image follows, diffed against the kernel snapshot.
    /// `run_static_initializers` runs the static constructors before the entry point task is
    /// returned.
    ///
    /// # Errors
    /// Returns [`Error::NoEntryPoint`] before any device I/O if the catalog has no entry
    /// point; otherwise propagates the first failure of the channel.
    pub fn load(&mut self, run_static_initializers: bool) -> Result<C::Task> {
        let Some(entry_point) = self.catalog.entry_point().cloned() else {
            return Err(Error::NoEntryPoint);
        };

        let settings = *self.catalog.settings();
        let kernel = self
            .catalog
            .kernel_snapshot()
            .cloned()
            .unwrap_or_else(Snapshot::empty);

        if settings.force_flash_write {
            self.channel.erase_all(true, true)?;
        }

        if settings.create_kernel_for_flashing {
            if self.channel.has_kernel_loaded(&kernel)? {
                log::info!("Kernel already loaded");
            } else {
                self.upload_kernel(&kernel)?;
            }
        } else if !settings.uses_flash() {
            // Stale flash images would conflict with a RAM-only upload
            self.channel.erase_all(true, true)?;
        }

        let program = self.catalog.snapshot();
        self.upload_program(&kernel, &program)?;

        let task = self.channel.get_task(self.catalog, &entry_point)?;
        if run_static_initializers {
            log::info!("Running static initializers");
            self.channel.execute_static_initializers(self.catalog)?;
        }

        Ok(task)
    }

    fn upload_kernel(&mut self, kernel: &Snapshot) -> Result<()> {
        self.begin_image();
        log::info!("Uploading kernel, fingerprint 0x{:08x}", kernel.fingerprint());

        self.enter(LoadState::ErasingIfNeeded)?;
        self.channel.erase_all(true, true)?;

        let diff = Snapshot::empty().diff_to(kernel);
        self.send_image(&diff, true, true)?;

        self.enter(LoadState::Committing)?;
        self.channel.copy_to_flash()?;
        // The kernel runs nothing by itself
        self.channel
            .write_flash_header(kernel, Token::NULL, StartupFlags::empty())?;

        self.enter(LoadState::Done)
    }

    fn upload_program(&mut self, baseline: &Snapshot, program: &Snapshot) -> Result<()> {
        self.begin_image();

        if self.channel.has_kernel_loaded(program)? {
            log::info!("Program already loaded, activating");
            self.channel.activate(self.catalog)?;
            return self.enter(LoadState::Done);
        }

        let settings = *self.catalog.settings();
        let commit = settings.copy_to_flash(false);

        self.enter(LoadState::ErasingIfNeeded)?;
        if baseline.is_empty() || commit {
            self.channel.erase_all(true, true)?;
        } else {
            self.channel.erase_all(true, false)?;
        }

        self.channel.activate(self.catalog)?;
        let diff = baseline.diff_to(program);
        self.send_image(&diff, false, commit)?;

        self.enter(LoadState::Committing)?;
        log::info!("Finalizing...");
        if commit {
            let flags = if settings.auto_restart_program {
                StartupFlags::AUTO_RESTART_AFTER_CRASH
            } else {
                StartupFlags::empty()
            };
            let startup = self.catalog.startup_token().unwrap_or(Token::NULL);
            self.channel.write_flash_header(program, startup, flags)?;
        }

        log::info!("Upload successfully completed");
        self.enter(LoadState::Done)
    }

    fn send_image(&mut self, diff: &SnapshotDiff, for_kernel: bool, commit: bool) -> Result<()> {
        let catalog = self.catalog;
        let tokens = catalog.tokens();

        self.enter(LoadState::SendingClasses)?;
        log::info!("1/5 Uploading class declarations...");
        self.channel
            .send_class_declarations(catalog, diff, for_kernel)?;

        self.enter(LoadState::SendingMethods)?;
        log::info!("2/5 Uploading methods...");
        self.channel.send_methods(catalog, diff, for_kernel)?;

        self.enter(LoadState::SendingConstants)?;
        log::info!("3/5 Uploading constants...");
        self.channel.send_constants(tokens.fields(), diff, for_kernel)?;
        if commit {
            self.channel.copy_to_flash()?;
        }

        self.enter(LoadState::SendingStrings)?;
        self.channel
            .prepare_string_load(0, diff.string_payload_size())?;
        log::info!("4/5 Uploading strings...");
        self.channel
            .send_strings(tokens.strings().entries(), diff, for_kernel)?;

        self.enter(LoadState::SendingSpecialTypes)?;
        log::info!("5/5 Uploading special types...");
        self.channel
            .send_special_types(tokens.special_types().groups(), diff, for_kernel)
    }
}
