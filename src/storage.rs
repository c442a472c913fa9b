//! Persistent settings and keymap storage.
//!
//! Uses the nRF52840's internal flash via the `sequential-storage` map
//! so the device comes back with its last profile, timings and keymap
//! after power loss.
//!
//! Storage layout:
//!   - Key 0x01: serialized `SystemConfig` blob (see its byte codec).
//!   - Key 0x02: raw JSON bytes of the active keymap file.
//!   - Wear levelling and GC are handled by `sequential-storage`.

use crate::config::{MAX_KEYMAP_ITEM, STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START};
use crate::profile::{SystemConfig, CONFIG_BLOB_MAX};
use defmt::{debug, error, info};
use embedded_storage_async::nor_flash::NorFlash;

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Map key for the system configuration blob.
const KEY_CONFIG: u8 = 0x01;

/// Map key for the active keymap JSON.
const KEY_KEYMAP: u8 = 0x02;

/// Working buffer size for map operations; must hold the largest item.
const MAP_BUF_SIZE: usize = MAX_KEYMAP_ITEM + 16;

/// In-memory view of the persisted configuration, synced with flash.
pub struct ConfigStore {
    config: SystemConfig,
    /// Dirty flag - true if the cached config differs from flash.
    dirty: bool,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            config: SystemConfig::default(),
            dirty: false,
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Replace the cached configuration and mark it for writeback.
    pub fn update(&mut self, config: SystemConfig) {
        if self.config != config {
            self.config = config;
            self.dirty = true;
        }
    }

    /// Load the configuration from flash; absent or corrupt blobs fall
    /// back to the defaults.
    ///
    /// Returns whether the flash itself was readable, for the boot-time
    /// self test.  A missing or corrupt blob still counts as readable -
    /// only a flash access error fails the storage check.
    pub async fn load(&mut self, flash: &mut impl NorFlash) -> bool {
        let mut buf = [0u8; MAP_BUF_SIZE];
        let mut readable = true;

        match sequential_storage::map::fetch_item::<u8, &[u8], _>(
            flash,
            STORAGE_START..STORAGE_END,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_CONFIG,
        )
        .await
        {
            Ok(Some(data)) => match SystemConfig::decode(data) {
                Some(config) => {
                    info!("Loaded config: profile {}", config.current_profile);
                    self.config = config;
                }
                None => {
                    error!("Config blob corrupt - using defaults");
                    self.config = SystemConfig::default();
                }
            },
            Ok(None) => {
                info!("No config in flash - using defaults");
                self.config = SystemConfig::default();
            }
            Err(e) => {
                error!("Flash read error: {:?}", defmt::Debug2Format(&e));
                self.config = SystemConfig::default();
                readable = false;
            }
        }
        self.dirty = false;
        readable
    }

    /// Write the configuration back to flash if it changed.
    pub async fn save(&mut self, flash: &mut impl NorFlash) {
        if !self.dirty {
            debug!("ConfigStore: no changes to save");
            return;
        }

        let mut buf = [0u8; MAP_BUF_SIZE];
        let mut blob = [0u8; CONFIG_BLOB_MAX];
        let len = self.config.encode(&mut blob);
        let item = &blob[..len];

        match sequential_storage::map::store_item::<u8, &[u8], _>(
            flash,
            STORAGE_START..STORAGE_END,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_CONFIG,
            &item,
        )
        .await
        {
            Ok(_) => {
                info!("Saved config to flash");
                self.dirty = false;
            }
            Err(e) => {
                error!("Flash write error: {:?}", defmt::Debug2Format(&e));
            }
        }
    }

    /// Read the active keymap JSON into `out`.  Returns the number of
    /// bytes read; 0 when no keymap is stored (callers fall back to the
    /// built-in profiles).
    pub async fn load_keymap(&mut self, flash: &mut impl NorFlash, out: &mut [u8]) -> usize {
        let mut buf = [0u8; MAP_BUF_SIZE];

        match sequential_storage::map::fetch_item::<u8, &[u8], _>(
            flash,
            STORAGE_START..STORAGE_END,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_KEYMAP,
        )
        .await
        {
            Ok(Some(data)) => {
                if data.len() > out.len() {
                    error!("Stored keymap too large: {} bytes", data.len());
                    return 0;
                }
                out[..data.len()].copy_from_slice(data);
                info!("Loaded keymap: {} bytes", data.len());
                data.len()
            }
            Ok(None) => {
                info!("No keymap in flash");
                0
            }
            Err(e) => {
                error!("Flash read error: {:?}", defmt::Debug2Format(&e));
                0
            }
        }
    }

    /// Store keymap JSON as the active keymap.  Blobs larger than
    /// [`MAX_KEYMAP_ITEM`] are rejected: a map item must fit one flash
    /// page.
    pub async fn save_keymap(&mut self, flash: &mut impl NorFlash, json: &[u8]) {
        if json.len() > MAX_KEYMAP_ITEM {
            error!("Keymap too large to store: {} bytes", json.len());
            return;
        }

        let mut buf = [0u8; MAP_BUF_SIZE];
        match sequential_storage::map::store_item::<u8, &[u8], _>(
            flash,
            STORAGE_START..STORAGE_END,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_KEYMAP,
            &json,
        )
        .await
        {
            Ok(_) => info!("Saved keymap: {} bytes", json.len()),
            Err(e) => error!("Flash write error: {:?}", defmt::Debug2Format(&e)),
        }
    }

    /// Factory reset: erase the whole storage region and return the
    /// cached configuration to the defaults.  The next boot comes up
    /// with the built-in profiles.
    pub async fn factory_reset(&mut self, flash: &mut impl NorFlash) {
        match sequential_storage::erase_all(flash, STORAGE_START..STORAGE_END).await {
            Ok(()) => info!("Factory reset: storage erased"),
            Err(e) => error!("Flash erase error: {:?}", defmt::Debug2Format(&e)),
        }
        self.config = SystemConfig::default();
        self.dirty = false;
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
