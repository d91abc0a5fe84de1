//! # Validation Scheme Selector
//!
//! Decides which host-control bits (long poll 0x7B) the active validation
//! scheme and the current device state allow, and keeps the set in force
//! persisted.
//!
//! | Condition              | Bits removed                                            |
//! |------------------------|---------------------------------------------------------|
//! | scheme is `None`       | all                                                     |
//! | scheme is `System`     | validate handpays, handpay printer, SE configuration    |
//! | printer cannot print   | printer as cash-out device, printer as handpay device   |
//! | note acceptor disabled | ticket redemption                                       |

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use sas_core::{
    ConfigurationProvider, DeviceStatus, FeatureFlags, HostControlBits, ValidationScheme,
};
use sas_store::{
    load_optional_record, PersistedRecord, PersistentStore, SaveReceipt, StorageError, WriteQueue,
};

/// Persisted host-control bits in force.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFeatures {
    /// Bits in force.
    pub bits: HostControlBits,
}

impl PersistedRecord for ValidationFeatures {
    const KEY: &'static str = "sas.validation.features";
}

/// Bits the scheme and devices allow out of `requested`.
pub fn allowed_bits(
    scheme: ValidationScheme,
    requested: HostControlBits,
    device: &dyn DeviceStatus,
) -> HostControlBits {
    let mut bits = match scheme {
        ValidationScheme::None => return HostControlBits::EMPTY,
        ValidationScheme::System => requested.without(HostControlBits::SECURE_ENHANCED_ONLY),
        ValidationScheme::SecureEnhanced => requested,
    };
    if !device.printer_can_print() {
        bits = bits.without(HostControlBits::PRINTER);
    }
    if !device.note_acceptor_enabled() {
        bits = bits.without(HostControlBits::TICKET_REDEMPTION);
    }
    bits
}

/// Bits implied by the configured feature flags.
pub fn configured_bits(scheme: ValidationScheme, features: &FeatureFlags) -> HostControlBits {
    HostControlBits::EMPTY
        .with(
            HostControlBits::USE_PRINTER_AS_CASHOUT_DEVICE,
            features.printer_as_cashout_device,
        )
        .with(
            HostControlBits::USE_PRINTER_AS_HANDPAY_DEVICE,
            features.printer_as_handpay_device,
        )
        .with(HostControlBits::VALIDATE_HANDPAYS, features.validate_handpays)
        .with(
            HostControlBits::PRINT_RESTRICTED_TICKETS,
            features.restricted_tickets,
        )
        .with(
            HostControlBits::TICKETS_FOR_FOREIGN_RESTRICTED_AMOUNTS,
            features.foreign_restricted_tickets,
        )
        .with(HostControlBits::TICKET_REDEMPTION, features.ticket_redemption)
        .with(
            HostControlBits::SECURE_ENHANCED_CONFIGURATION,
            scheme == ValidationScheme::SecureEnhanced,
        )
}

/// Result of applying a host-control request.
#[derive(Debug)]
pub struct FeatureChange {
    /// Bits in force after the request.
    pub bits: HostControlBits,
    /// Persistence of the new set; `None` when nothing changed.
    pub receipt: Option<SaveReceipt>,
}

impl FeatureChange {
    /// Whether the set in force changed, which requires the validation
    /// handler to reinitialize.
    pub fn changed(&self) -> bool {
        self.receipt.is_some()
    }
}

/// Keeper of the host-control bits in force.
pub struct ValidationSchemeSelector {
    features: Mutex<ValidationFeatures>,
    writer: WriteQueue<ValidationFeatures>,
    config: Arc<dyn ConfigurationProvider>,
    device: Arc<dyn DeviceStatus>,
}

impl std::fmt::Debug for ValidationSchemeSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationSchemeSelector")
            .field("features", &*self.features.lock())
            .finish()
    }
}

impl ValidationSchemeSelector {
    /// Load the bits in force, deriving them from configuration on first
    /// boot.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn load(
        store: Arc<dyn PersistentStore>,
        config: Arc<dyn ConfigurationProvider>,
        device: Arc<dyn DeviceStatus>,
    ) -> Result<Self, StorageError> {
        let features = match load_optional_record::<ValidationFeatures>(store.as_ref())? {
            Some(features) => features,
            None => {
                let scheme = config.validation_scheme();
                let bits = allowed_bits(
                    scheme,
                    configured_bits(scheme, &config.features()),
                    device.as_ref(),
                );
                tracing::debug!(bits = %bits, "validation features derived from configuration");
                ValidationFeatures { bits }
            }
        };
        Ok(Self {
            features: Mutex::new(features),
            writer: WriteQueue::spawn(store)?,
            config,
            device,
        })
    }

    /// Bits in force.
    pub fn current(&self) -> HostControlBits {
        self.features.lock().bits
    }

    /// Apply a host request: bits under `mask` take their value from
    /// `status`; the result is filtered by scheme and devices.
    pub fn apply(&self, mask: HostControlBits, status: HostControlBits) -> FeatureChange {
        let mut features = self.features.lock();
        let requested = (features.bits & !mask) | (status & mask);
        self.set(&mut features, requested)
    }

    /// Re-filter the bits in force after a scheme or device change.
    pub fn refresh(&self) -> FeatureChange {
        let mut features = self.features.lock();
        let requested = features.bits;
        self.set(&mut features, requested)
    }

    /// Re-derive the bits from configuration, discarding host requests, as
    /// a full validation reset does.
    pub fn reset(&self) -> FeatureChange {
        let mut features = self.features.lock();
        let requested = configured_bits(self.config.validation_scheme(), &self.config.features());
        self.set(&mut features, requested)
    }

    /// Queue the bits in force behind any pending writes.
    pub fn flush(&self) -> SaveReceipt {
        self.writer.enqueue(*self.features.lock())
    }

    fn set(&self, features: &mut ValidationFeatures, requested: HostControlBits) -> FeatureChange {
        let bits = allowed_bits(
            self.config.validation_scheme(),
            requested,
            self.device.as_ref(),
        );
        if bits == features.bits {
            return FeatureChange {
                bits,
                receipt: None,
            };
        }
        tracing::info!(from = %features.bits, to = %bits, "validation features changed");
        features.bits = bits;
        FeatureChange {
            bits,
            receipt: Some(self.writer.enqueue(*features)),
        }
    }
}
